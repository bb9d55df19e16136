//! Offline page reading from multistream XML dumps.
//!
//! A multistream archive is a concatenation of independent bzip2 streams.
//! The first holds the `<mediawiki>` header and site info; each later one
//! holds a run of `<page>` elements with no enclosing root. The
//! [`DumpIndex`] gives the byte offset of the stream holding a title, so a
//! page can be read by decompressing that single stream.
//!
//! ```no_run
//! use std::path::Path;
//! use wikilisten_core::{AssetResolver, DumpIndex, TemplateQuery};
//! use wikilisten_core::dump::find_page;
//!
//! # fn example() -> wikilisten_core::Result<()> {
//! let index = DumpIndex::from_path(Path::new("enwiki-multistream-index.txt"))?;
//! let page = find_page(Path::new("enwiki-multistream.xml.bz2"), &index, "Anarchism")?;
//! let resolver = AssetResolver::new("https://upload.wikimedia.org/wikipedia/commons");
//! for listen in page.listens(&TemplateQuery::listen(), &resolver) {
//!     println!("{}", listen.url);
//! }
//! # Ok(())
//! # }
//! ```

use crate::assets::AssetResolver;
use crate::dump_index::DumpIndex;
use crate::listen::Listen;
use crate::template::TemplateQuery;
use crate::{Error, Result};
use bzip2::bufread::BzDecoder;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// A page as stored in the dump: title, id, and the wikitext of its first
/// revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpPage {
    /// Page title
    pub title: String,
    /// Page id, when present and numeric
    pub id: Option<u64>,
    /// Wikitext source
    pub text: String,
}

impl DumpPage {
    /// Matching template parameter values in the page source.
    #[must_use]
    pub fn template_values(&self, query: &TemplateQuery) -> Vec<String> {
        query.extract_wikitext(&self.text)
    }

    /// Listens in the page source, in document order.
    #[must_use]
    pub fn listens(&self, query: &TemplateQuery, resolver: &AssetResolver) -> Vec<Listen> {
        self.template_values(query)
            .iter()
            .map(|filename| Listen::new(&self.title, filename, resolver))
            .collect()
    }
}

/// Successive decompressed streams of a multistream archive.
///
/// Iteration stops at end of input or after the first error.
pub struct DumpStreams<R> {
    reader: Option<R>,
    decoded: usize,
}

impl DumpStreams<BufReader<File>> {
    /// Streams of the archive at `path`, starting at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or
    /// [`Error::Io`] if it cannot be opened or seeked.
    pub fn open(path: &Path, offset: u64) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("Dump not found: {}", path.display()))
            },
            _ => Error::Io(e),
        })?;
        file.seek(SeekFrom::Start(offset))?;
        debug!(path = %path.display(), offset, "Opened dump");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> DumpStreams<R> {
    /// Streams read from `reader`, which must be positioned at the start of
    /// a bzip2 stream.
    pub const fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            decoded: 0,
        }
    }

    fn next_stream(&mut self) -> Result<Option<String>> {
        let Some(mut reader) = self.reader.take() else {
            return Ok(None);
        };
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        // The bufread decoder consumes exactly one stream, leaving the
        // reader at the start of the next.
        let mut decoder = BzDecoder::new(reader);
        let mut xml = String::new();
        decoder.read_to_string(&mut xml)?;
        self.reader = Some(decoder.into_inner());

        self.decoded += 1;
        debug!(stream = self.decoded, bytes = xml.len(), "Decompressed dump stream");
        Ok(Some(xml))
    }
}

impl<R: BufRead> Iterator for DumpStreams<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_stream().transpose()
    }
}

/// Decompress the single stream starting at `offset`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file is missing or `offset` is at or
/// past its end, and [`Error::Io`] if the bytes there are not a bzip2 stream.
pub fn read_stream_at(path: &Path, offset: u64) -> Result<String> {
    DumpStreams::open(path, offset)?.next().unwrap_or_else(|| {
        Err(Error::NotFound(format!(
            "No stream at offset {offset} in {}",
            path.display()
        )))
    })
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Id,
    Text,
}

/// Pages in a decompressed stream, in document order.
///
/// Header-only streams yield nothing; stray closing tags from the archive's
/// root element are tolerated.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the XML is malformed.
pub fn parse_pages(xml: &str) -> Result<Vec<DumpPage>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = false;

    let mut pages = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<DumpPage> = None;
    let mut seen_text = false;
    let mut field: Option<Field> = None;
    let mut buffer = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let parent = path.last().map(String::as_str);
                if name == "page" {
                    current = Some(DumpPage::default());
                    seen_text = false;
                } else if current.is_some() {
                    field = match (name.as_str(), parent) {
                        ("title", Some("page")) => Some(Field::Title),
                        ("id", Some("page")) => Some(Field::Id),
                        ("text", Some("revision")) if !seen_text => Some(Field::Text),
                        _ => None,
                    };
                    buffer.clear();
                }
                path.push(name);
            },
            Event::Text(e) if field.is_some() => {
                let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                buffer.push_str(&text);
            },
            Event::CData(e) if field.is_some() => {
                buffer.push_str(&String::from_utf8_lossy(&e));
            },
            Event::End(e) => {
                path.pop();
                if let (Some(page), Some(done)) = (current.as_mut(), field.take()) {
                    match done {
                        Field::Title => page.title = std::mem::take(&mut buffer),
                        Field::Id => page.id = buffer.trim().parse().ok(),
                        Field::Text => {
                            page.text = std::mem::take(&mut buffer);
                            seen_text = true;
                        },
                    }
                }
                if e.name().as_ref() == b"page" {
                    if let Some(page) = current.take() {
                        pages.push(page);
                    }
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if let Some(page) = current {
        warn!(title = %page.title, "Stream ended inside a page");
    }
    Ok(pages)
}

/// Every page in the stream starting at `offset`.
///
/// # Errors
///
/// See [`read_stream_at`] and [`parse_pages`].
pub fn pages_at(path: &Path, offset: u64) -> Result<Vec<DumpPage>> {
    parse_pages(&read_stream_at(path, offset)?)
}

/// Look `title` up in the index and read its page from the archive.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the index has no entry for `title` or the
/// indexed stream does not contain the page, plus the errors of [`pages_at`].
pub fn find_page(path: &Path, index: &DumpIndex, title: &str) -> Result<DumpPage> {
    let entry = index
        .get(title)
        .ok_or_else(|| Error::NotFound(format!("No index entry for '{title}'")))?;
    let pages = pages_at(path, entry.offset)?;
    debug!(title = %entry.title, offset = entry.offset, pages = pages.len(), "Read indexed stream");

    pages
        .into_iter()
        .find(|page| page.title == entry.title)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "'{}' is not in the stream at offset {}",
                entry.title, entry.offset
            ))
        })
}
