//! Listens read from a local multistream dump.

use crate::output::Printer;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use wikilisten_core::dump::{find_page, pages_at};
use wikilisten_core::{AssetResolver, DumpIndex, SeenUrls, TemplateQuery};

/// Print the listens of `title` as found in the dump, each URL once.
///
/// With `whole_stream`, every page sharing the title's compressed stream is
/// printed instead.
pub fn dump_listens<W: Write>(
    dump: &Path,
    index: &Path,
    title: &str,
    whole_stream: bool,
    query: &TemplateQuery,
    resolver: &AssetResolver,
    printer: &mut Printer<W>,
) -> Result<()> {
    let index = DumpIndex::from_path(index)
        .with_context(|| format!("Failed to read dump index {}", index.display()))?;
    let mut seen = SeenUrls::new();

    if whole_stream {
        let entry = index
            .get(title)
            .with_context(|| format!("No index entry for '{title}'"))?;
        let pages = pages_at(dump, entry.offset)
            .with_context(|| format!("Failed to read stream at offset {}", entry.offset))?;
        for page in &pages {
            printer.listens(&seen.retain_new(page.listens(query, resolver)))?;
        }
        info!(pages = pages.len(), files = seen.len(), "Read dump stream");
        return Ok(());
    }

    let page = find_page(dump, &index, title)
        .with_context(|| format!("Failed to read '{title}' from {}", dump.display()))?;
    let listens = page.listens(query, resolver);
    if listens.is_empty() {
        warn!(title = %page.title, "No matching templates in page source");
    }
    printer.listens(&seen.retain_new(listens))
}
