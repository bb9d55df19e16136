//! Memoizing page store.
//!
//! A [`PageStore`] maps titles to [`Page`] entities for the lifetime of a
//! session. Two guarantees hold for every title:
//!
//! - **Identity**: every lookup returns the same `Arc<Page>`.
//! - **Single-flight**: concurrent lookups share one parse-tree fetch; the
//!   second caller waits on the first caller's request instead of issuing
//!   its own.
//!
//! The cache only grows. Entries are never evicted or replaced.
//!
//! ```no_run
//! use wikilisten_core::{ApiClient, PageStore};
//!
//! # async fn example() -> wikilisten_core::Result<()> {
//! let store = PageStore::new(ApiClient::new("https://en.wikipedia.org/w/api.php")?);
//! let page = store.get_by_title("Ludwig van Beethoven").await?;
//! let again = store.get_by_title("Ludwig van Beethoven").await?;
//! assert!(std::sync::Arc::ptr_eq(&page, &again));
//! # Ok(())
//! # }
//! ```

use crate::parse_tree::ParseTree;
use crate::query::QueryParams;
use crate::transport::ApiClient;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument};

/// Session-scoped cache of pages, cheap to clone.
#[derive(Clone)]
pub struct PageStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    client: ApiClient,
    pages: Mutex<HashMap<String, Arc<Page>>>,
}

impl PageStore {
    /// Create an empty store that fetches through `client`.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                client,
                pages: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The transport pages are fetched through.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Look up a page, fetching its parse tree on first use.
    ///
    /// On error the page entry stays cached without a tree; a later lookup
    /// tries the fetch again.
    #[instrument(skip(self))]
    pub async fn get_by_title(&self, title: &str) -> Result<Arc<Page>> {
        let page = self.entry(title).await;
        page.parse_tree().await?;
        Ok(page)
    }

    /// The cached page for `title`, without fetching anything.
    pub async fn cached(&self, title: &str) -> Option<Arc<Page>> {
        self.inner.pages.lock().await.get(title).cloned()
    }

    /// Whether `title` has an entry.
    pub async fn contains(&self, title: &str) -> bool {
        self.inner.pages.lock().await.contains_key(title)
    }

    /// Number of cached pages.
    pub async fn len(&self) -> usize {
        self.inner.pages.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.pages.lock().await.is_empty()
    }

    async fn entry(&self, title: &str) -> Arc<Page> {
        let mut pages = self.inner.pages.lock().await;
        let page = pages.entry(title.to_string()).or_insert_with(|| {
            debug!(title, "Caching new page");
            Arc::new(Page::new(title.to_string(), Arc::downgrade(&self.inner)))
        });
        Arc::clone(page)
    }

    fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for PageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStore")
            .field("endpoint", &self.inner.client.endpoint().as_str())
            .finish_non_exhaustive()
    }
}

/// A page, identified by its title.
///
/// The parse tree is fetched lazily and kept on the page; it is never fetched
/// twice once loaded.
pub struct Page {
    title: String,
    tree: OnceCell<ParseTree>,
    store: Weak<StoreInner>,
}

impl Page {
    fn new(title: String, store: Weak<StoreInner>) -> Self {
        Self {
            title,
            tree: OnceCell::new(),
            store,
        }
    }

    /// Page title (its identity).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The parse tree if it has already been fetched.
    #[must_use]
    pub fn tree(&self) -> Option<&ParseTree> {
        self.tree.get()
    }

    /// Whether the parse tree has been fetched.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.tree.initialized()
    }

    /// The parse tree, fetching it on first access.
    pub async fn parse_tree(&self) -> Result<&ParseTree> {
        self.tree.get_or_try_init(|| self.fetch_parse_tree()).await
    }

    /// The store this page belongs to.
    ///
    /// # Errors
    ///
    /// Fails if the store has been dropped.
    pub fn store(&self) -> Result<PageStore> {
        self.store
            .upgrade()
            .map(PageStore::from_inner)
            .ok_or_else(|| Error::Other(format!("Page store for '{}' was dropped", self.title)))
    }

    #[instrument(skip(self), fields(title = %self.title))]
    async fn fetch_parse_tree(&self) -> Result<ParseTree> {
        let store = self.store()?;
        let params = QueryParams::new()
            .with("action", "parse")
            .with("page", &self.title)
            .with("prop", "parsetree");

        let body = store.client().query(&params).await?;
        let xml = body
            .pointer("/parse/parsetree")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                Error::Serialization(format!(
                    "Response for '{}' has no parse.parsetree",
                    self.title
                ))
            })?;

        let tree = ParseTree::parse(xml)?;
        debug!(bytes = xml.len(), "Parsed parse tree");
        Ok(tree)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("title", &self.title)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
