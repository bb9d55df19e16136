//! Lookup over the index file shipped with multistream database dumps.
//!
//! Each line of the index reads `offset:id:title`: the byte offset of the
//! compressed stream holding the article, the article id, and its title. The
//! title may itself contain colons, so only the first two are separators.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, info};

/// One record of a dump index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpIndexEntry {
    /// Byte offset to seek to in the dump archive
    pub offset: u64,
    /// Article id
    pub id: u64,
    /// Article title
    pub title: String,
}

impl DumpIndexEntry {
    /// Parse a single `offset:id:title` line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the line has fewer than three fields or
    /// the numeric fields are not numbers.
    pub fn parse_line(line: &str) -> Result<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).splitn(3, ':');
        let (Some(offset), Some(id), Some(title)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::Parse(format!("Couldn't parse index line: '{line}'")));
        };

        let offset = offset
            .trim()
            .parse()
            .map_err(|e| Error::Parse(format!("Bad offset in index line '{line}': {e}")))?;
        let id = id
            .trim()
            .parse()
            .map_err(|e| Error::Parse(format!("Bad article id in index line '{line}': {e}")))?;

        Ok(Self {
            offset,
            id,
            title: title.to_string(),
        })
    }
}

/// In-memory title lookup over a dump index.
#[derive(Debug, Default)]
pub struct DumpIndex {
    entries: HashMap<String, DumpIndexEntry>,
    folded: HashMap<String, String>,
    skipped: usize,
}

impl DumpIndex {
    /// Read an index, skipping lines that do not parse.
    ///
    /// A title listed more than once keeps its last record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut index = Self::default();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match DumpIndexEntry::parse_line(&line) {
                Ok(entry) => index.insert(entry),
                Err(e) => {
                    error!("{e}");
                    index.skipped += 1;
                },
            }
        }
        info!(entries = index.len(), skipped = index.skipped, "Loaded dump index");
        Ok(index)
    }

    /// Read an index file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or
    /// [`Error::Io`] if it cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("Dump index not found: {}", path.display()))
            },
            _ => Error::Io(e),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    fn insert(&mut self, entry: DumpIndexEntry) {
        self.folded
            .insert(entry.title.to_ascii_lowercase(), entry.title.clone());
        self.entries.insert(entry.title.clone(), entry);
    }

    /// Record for `title`: exact match first, then ASCII case-insensitive.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&DumpIndexEntry> {
        if let Some(entry) = self.entries.get(title) {
            return Some(entry);
        }
        debug!(title, "Falling back to case-insensitive lookup");
        let entry = self
            .folded
            .get(&title.to_ascii_lowercase())
            .and_then(|exact| self.entries.get(exact));
        if entry.is_none() {
            debug!(title, "No index entry");
        }
        entry
    }

    /// Byte offset to seek to for `title`.
    #[must_use]
    pub fn seek_offset(&self, title: &str) -> Option<u64> {
        self.get(title).map(|entry| entry.offset)
    }

    /// Number of distinct titles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no titles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines that were skipped as malformed.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = "\
600:10:AccessibleComputing
600:12:Anarchism
601234:25:Star Wars: Episode IV
not a line
abc:1:Bad offset

601234:39:Apollo 11
";

    fn sample() -> DumpIndex {
        DumpIndex::from_reader(Cursor::new(SAMPLE)).unwrap()
    }

    #[test]
    fn test_parse_line_keeps_colons_in_title() {
        let entry = DumpIndexEntry::parse_line("601234:25:Star Wars: Episode IV").unwrap();
        assert_eq!(entry.offset, 601_234);
        assert_eq!(entry.id, 25);
        assert_eq!(entry.title, "Star Wars: Episode IV");
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(matches!(
            DumpIndexEntry::parse_line("12:Title"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            DumpIndexEntry::parse_line("x:1:Title"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            DumpIndexEntry::parse_line("1:y:Title"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_from_reader_skips_malformed_lines() {
        let index = sample();
        assert_eq!(index.len(), 4);
        assert_eq!(index.skipped(), 2);
    }

    #[test]
    fn test_exact_lookup() {
        let index = sample();
        assert_eq!(index.seek_offset("Anarchism"), Some(600));
        assert_eq!(index.seek_offset("Star Wars: Episode IV"), Some(601_234));
        assert_eq!(index.get("Apollo 11").unwrap().id, 39);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let index = sample();
        assert_eq!(index.seek_offset("anarchism"), Some(600));
        assert_eq!(index.seek_offset("APOLLO 11"), Some(601_234));
        assert_eq!(index.seek_offset("Nonexistent"), None);
    }

    #[test]
    fn test_exact_match_preferred_over_folded() {
        let index =
            DumpIndex::from_reader(Cursor::new("100:1:Mercury\n200:2:MERCURY\n")).unwrap();
        assert_eq!(index.seek_offset("Mercury"), Some(100));
        assert_eq!(index.seek_offset("MERCURY"), Some(200));
        assert_eq!(index.seek_offset("mercury"), Some(200));
    }

    #[test]
    fn test_later_duplicate_replaces_earlier() {
        let index = DumpIndex::from_reader(Cursor::new("100:1:Title\n900:2:Title\n")).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.seek_offset("Title"), Some(900));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let index = DumpIndex::from_path(file.path()).unwrap();
        assert_eq!(index.seek_offset("AccessibleComputing"), Some(600));
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = DumpIndex::from_path(&dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(err.category(), "not_found");
    }
}
