//! Dump index lookup.

use crate::output::Printer;
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::Path;
use wikilisten_core::DumpIndex;

pub fn seek<W: Write>(index: &Path, title: &str, printer: &mut Printer<W>) -> Result<()> {
    let index = DumpIndex::from_path(index)
        .with_context(|| format!("Failed to read dump index {}", index.display()))?;

    let Some(entry) = index.get(title) else {
        bail!("No index entry for '{title}'");
    };
    printer.seek(title, entry)
}
