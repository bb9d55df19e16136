//! Discover every page embedding the configured template.

use super::Session;
use crate::output::Printer;
use anyhow::Result;
use futures::TryStreamExt;
use std::io::Write;
use tracing::info;
use wikilisten_core::discovery::embedded_in_params;
use wikilisten_core::{SeenUrls, discover as discover_pages};

/// Print each discovered page's listens, skipping URLs already printed.
///
/// With `follow_links`, the linked pages of each discovered page are expanded
/// before moving on to the next one.
pub async fn discover<W: Write>(
    session: &Session,
    limit: Option<usize>,
    follow_links: bool,
    printer: &mut Printer<W>,
) -> Result<()> {
    let discovery = &session.config.discovery;
    let params = embedded_in_params(&discovery.template, &discovery.limit);
    let mut pages = Box::pin(discover_pages(&session.store, params));
    let mut seen = SeenUrls::new();
    let mut visited = 0usize;

    while !limit.is_some_and(|limit| visited >= limit) {
        let Some(page) = pages.try_next().await? else {
            break;
        };
        let listens = page.listens(&session.query, &session.resolver).await?;
        printer.listens(&seen.retain_new(listens))?;

        if follow_links {
            let mut linked = Box::pin(page.linked_pages(session.query.clone()));
            while let Some(linked_page) = linked.try_next().await? {
                let listens = linked_page
                    .listens(&session.query, &session.resolver)
                    .await?;
                printer.listens(&seen.retain_new(listens))?;
            }
        }

        visited += 1;
    }

    info!(pages = visited, files = seen.len(), "Discovery finished");
    Ok(())
}
