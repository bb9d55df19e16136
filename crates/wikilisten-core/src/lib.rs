//! # wikilisten-core
//!
//! Core functionality for wikilisten - discovery of wiki pages that embed an
//! audio template, and resolution of the media files they reference.
//!
//! The crate talks to a MediaWiki query API, caches pages for the lifetime of
//! a session, and turns template parameters into direct download URLs on the
//! media storage host.
//!
//! ## Architecture
//!
//! - **Query/Transport**: query-string construction with the fixed protocol
//!   parameters, and a retrying HTTP client that decodes response envelopes
//! - **Page Store**: memoizing title → page cache with single-flight fetches
//! - **Templates**: parse-tree XML and template parameter extraction
//! - **Assets**: hash-sharded media URL resolution
//! - **Traversals**: paginated discovery and completion-ordered link expansion
//! - **Dump Index**: title → byte offset lookup for multistream dumps
//! - **Dump Reading**: offline page source from a single compressed stream,
//!   with templates found in raw wikitext
//!
//! ## Quick Start
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use wikilisten_core::{discover, AssetResolver, Config, PageStore, ApiClient, TemplateQuery};
//! use wikilisten_core::discovery::embedded_in_params;
//!
//! # async fn example() -> wikilisten_core::Result<()> {
//! let config = Config::load()?;
//! let store = PageStore::new(ApiClient::from_config(&config.api)?);
//! let resolver = AssetResolver::new(&config.assets.base_url);
//! let query = TemplateQuery::from_config(&config.discovery);
//!
//! let params = embedded_in_params(&config.discovery.template, &config.discovery.limit);
//! let mut pages = Box::pin(discover(&store, params));
//! while let Some(page) = pages.try_next().await? {
//!     for listen in page.listens(&query, &resolver).await? {
//!         println!("{}: {}", listen.page_title, listen.url);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Errors report whether a retry
//! could help:
//!
//! ```rust
//! use wikilisten_core::{Error, ParseTree};
//!
//! match ParseTree::parse("<root><template>") {
//!     Ok(_) => println!("Parsed successfully"),
//!     Err(Error::Parse(msg)) => eprintln!("Parse error: {msg}"),
//!     Err(e) if e.is_recoverable() => eprintln!("Recoverable error: {e}"),
//!     Err(e) => eprintln!("Fatal error: {e}"),
//! }
//! ```

/// Hash-sharded media URL resolution
pub mod assets;
/// Configuration file and environment overrides
pub mod config;
/// Paginated discovery of pages embedding a template
pub mod discovery;
/// Offline page reading from multistream dumps
pub mod dump;
/// Dump index parsing and title lookup
pub mod dump_index;
/// Error types and result aliases
pub mod error;
/// Completion-ordered expansion of a page's links
pub mod links;
/// Media files referenced from pages
pub mod listen;
/// Parse-tree XML documents
pub mod parse_tree;
/// Query-string construction
pub mod query;
/// Memoizing page store
pub mod store;
/// Template parameter extraction
pub mod template;
/// HTTP transport and response envelopes
pub mod transport;
/// Template invocations in raw wikitext
pub mod wikitext;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use assets::{AssetReference, AssetResolver};
pub use config::{ApiConfig, AssetsConfig, Config, DiscoveryConfig};
pub use discovery::discover;
pub use dump::{DumpPage, DumpStreams};
pub use dump_index::{DumpIndex, DumpIndexEntry};
pub use error::{Error, Result};
pub use links::linked_pages;
pub use listen::{Listen, SeenUrls};
pub use parse_tree::ParseTree;
pub use query::QueryParams;
pub use store::{Page, PageStore};
pub use template::TemplateQuery;
pub use transport::{ApiClient, ApiResponse};
