//! # Output Formatting
//!
//! Every command prints records as they become available, one per line, so
//! long traversals can be piped and consumed incrementally.
//!
//! - **Text**: tab-separated fields
//! - **JSON**: one JSON object per line

use anyhow::Result;
use clap::ValueEnum;
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use wikilisten_core::{AssetReference, DumpIndexEntry, Listen};

/// Output format for CLI results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated text (default for terminals).
    #[default]
    Text,
    /// One JSON object per line (default for pipes).
    Json,
}

impl OutputFormat {
    /// Check if this format is machine-readable.
    #[must_use]
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns `Text` for interactive terminals, `Json` for pipes/redirects.
    #[must_use]
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Writes records in the selected format.
pub struct Printer<W: Write> {
    out: W,
    format: OutputFormat,
}

impl Printer<std::io::Stdout> {
    /// Printer writing to stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write> Printer<W> {
    pub const fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn listen(&mut self, listen: &Listen) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}\t{}", listen.page_title, listen.url)?,
            OutputFormat::Json => self.json_line(listen)?,
        }
        Ok(())
    }

    pub fn listens(&mut self, listens: &[Listen]) -> Result<()> {
        for listen in listens {
            self.listen(listen)?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn asset(&mut self, reference: &AssetReference) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "{}\t{}", reference.original, reference.url)?;
            },
            OutputFormat::Json => self.json_line(reference)?,
        }
        Ok(())
    }

    pub fn seek(&mut self, query: &str, entry: &DumpIndexEntry) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{}\t{}\t{}", entry.offset, entry.id, entry.title)?,
            OutputFormat::Json => self.json_line(&json!({
                "query": query,
                "title": entry.title,
                "id": entry.id,
                "offset": entry.offset,
            }))?,
        }
        Ok(())
    }

    fn json_line<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
