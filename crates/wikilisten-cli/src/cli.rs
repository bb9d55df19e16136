//! # CLI Structure and Argument Parsing
//!
//! `wikilisten` finds the audio files wiki pages embed through a listen-style
//! template and prints their direct download URLs.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Every page embedding the template, first 20 pages
//! wikilisten discover --limit 20
//!
//! # Also walk the links of each discovered page
//! wikilisten discover --limit 5 --follow-links
//!
//! # One page, or the pages it links to
//! wikilisten listens "Symphony No. 5 (Beethoven)"
//! wikilisten links "Ludwig van Beethoven"
//!
//! # Offline helpers
//! wikilisten resolve "Example.ogg"
//! wikilisten seek enwiki-pages-articles-multistream-index.txt "Anarchism"
//! wikilisten dump-listens enwiki-pages-articles-multistream.xml.bz2 \
//!     enwiki-pages-articles-multistream-index.txt "Anarchism"
//! ```
//!
//! ## Output Formats
//!
//! - **text**: one tab-separated record per line (default for terminals)
//! - **json**: one JSON object per line (default when piped)

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `wikilisten` command
#[derive(Parser, Clone, Debug)]
#[command(name = "wikilisten")]
#[command(version)]
#[command(about = "Find audio files embedded in wiki pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only errors are logged)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Path to a configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "WIKILISTEN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to text on a terminal, json otherwise)
    #[arg(short = 'f', long, global = true, value_enum)]
    pub format: Option<OutputFormat>,
}

impl Cli {
    /// Output format after terminal detection.
    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(OutputFormat::detect)
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List the files of every page embedding the configured template
    Discover {
        /// Stop after this many pages
        #[arg(short = 'l', long, value_name = "N")]
        limit: Option<usize>,

        /// Also list files of the pages each discovered page links to
        #[arg(long)]
        follow_links: bool,
    },

    /// List the files of pages linked from a page, fastest first
    Links {
        /// Page title
        title: String,
    },

    /// List the files embedded on one page
    Listens {
        /// Page title
        title: String,
    },

    /// Resolve file names to download URLs without contacting the wiki
    Resolve {
        /// File names as written in the template
        #[arg(required = true)]
        filenames: Vec<String>,
    },

    /// Look up the byte offset of an article in a dump index file
    Seek {
        /// Path to the `offset:id:title` index file
        index: PathBuf,

        /// Article title (exact, then case-insensitive)
        title: String,
    },

    /// List the files embedded on a page, read from a local multistream dump
    DumpListens {
        /// Path to the `.xml.bz2` multistream archive
        dump: PathBuf,

        /// Path to the archive's `offset:id:title` index file
        index: PathBuf,

        /// Article title (exact, then case-insensitive)
        title: String,

        /// List every page in the article's compressed stream
        #[arg(long)]
        whole_stream: bool,
    },
}
