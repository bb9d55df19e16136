//! Listens on the pages linked from one page.

use super::Session;
use crate::output::Printer;
use anyhow::Result;
use futures::TryStreamExt;
use std::io::Write;
use wikilisten_core::{SeenUrls, linked_pages};

/// Print listens of every qualifying linked page, in completion order.
pub async fn links<W: Write>(session: &Session, title: &str, printer: &mut Printer<W>) -> Result<()> {
    let mut pages = Box::pin(linked_pages(&session.store, title, session.query.clone()));
    let mut seen = SeenUrls::new();

    while let Some(page) = pages.try_next().await? {
        let listens = page.listens(&session.query, &session.resolver).await?;
        printer.listens(&seen.retain_new(listens))?;
    }
    Ok(())
}
