//! Listens on a single page.

use super::Session;
use crate::output::Printer;
use anyhow::Result;
use std::io::Write;
use tracing::warn;
use wikilisten_core::SeenUrls;

/// Print the page's listens, each URL once, in document order.
pub async fn listens<W: Write>(session: &Session, title: &str, printer: &mut Printer<W>) -> Result<()> {
    let page = session.store.get_by_title(title).await?;
    let listens = page.listens(&session.query, &session.resolver).await?;
    if listens.is_empty() {
        warn!(title, "No matching templates on page");
    }
    printer.listens(&SeenUrls::new().retain_new(listens))
}
