//! Outbound link expansion.
//!
//! Given a page, fetch the titles it links to, keep the ones the server
//! reports as existing, and resolve them all concurrently through the
//! [`PageStore`]. Pages are yielded in **completion order**: whichever
//! resolution finishes first comes out first, regardless of link order.
//! Only pages on which the [`TemplateQuery`] finds something are yielded.
//!
//! Each resolution runs as its own task. Dropping the stream early detaches
//! the remaining tasks instead of aborting them, so their pages still land
//! in the store for later lookups. The first error ends the stream.

use crate::query::QueryParams;
use crate::store::{Page, PageStore};
use crate::template::TemplateQuery;
use crate::{Error, Result};
use futures::future;
use futures::stream::{self, FuturesUnordered};
use futures::{Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Titles of existing pages linked from `title`, in the order returned,
/// without duplicates.
#[instrument(skip(store))]
pub async fn existing_links(store: &PageStore, title: &str) -> Result<Vec<String>> {
    let params = QueryParams::new()
        .with("action", "parse")
        .with("page", title)
        .with("prop", "links");
    let body = store.client().query(&params).await?;

    let links = body
        .pointer("/parse/links")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::Serialization(format!("Response for '{title}' has no parse.links"))
        })?;

    let mut seen = HashSet::new();
    let titles: Vec<String> = links
        .iter()
        .filter(|link| link.get("exists").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|link| link.get("title").and_then(Value::as_str))
        .filter(|link| seen.insert(*link))
        .map(ToString::to_string)
        .collect();

    debug!(total = links.len(), existing = titles.len(), "Fetched links");
    Ok(titles)
}

/// Resolve every existing link of `title`, yielding qualifying pages as
/// they complete.
pub fn linked_pages(
    store: &PageStore,
    title: &str,
    query: TemplateQuery,
) -> impl Stream<Item = Result<Arc<Page>>> + Send + 'static {
    let store = store.clone();
    let title = title.to_string();
    resolve_links(async move { Ok(store) }, title, query)
}

impl Page {
    /// Linked pages containing a matching template, in completion order.
    pub fn linked_pages(
        &self,
        query: TemplateQuery,
    ) -> impl Stream<Item = Result<Arc<Page>>> + Send + 'static {
        let store = self.store();
        resolve_links(async move { store }, self.title().to_string(), query)
    }
}

fn resolve_links<S>(
    store: S,
    title: String,
    query: TemplateQuery,
) -> impl Stream<Item = Result<Arc<Page>>> + Send + 'static
where
    S: Future<Output = Result<PageStore>> + Send + 'static,
{
    let pending = async move {
        let store = store.await?;
        let titles = existing_links(&store, &title).await?;

        let resolutions: FuturesUnordered<_> = titles
            .into_iter()
            .map(|link| {
                let store = store.clone();
                tokio::spawn(async move { store.get_by_title(&link).await })
            })
            .collect();

        Ok::<_, Error>(resolutions.map(|joined| {
            joined.map_err(|e| Error::Other(format!("Link resolution task failed: {e}")))?
        }))
    };

    stream::once(pending)
        .try_flatten()
        .try_filter_map(move |page| {
            let query = query.clone();
            async move {
                let values = page.template_values(&query).await?;
                if values.is_empty() {
                    debug!(title = page.title(), "Linked page has no matching templates");
                    Ok(None)
                } else {
                    Ok(Some(page))
                }
            }
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{self, listen_tree, mount_links, mount_parse_tree};
    use std::time::Duration;
    use wiremock::MockServer;

    const SLOW: Duration = Duration::from_millis(400);

    #[tokio::test]
    async fn test_existing_links_filters_and_dedups() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_links(
            &server,
            "Root",
            &[("A", true), ("Red link", false), ("B", true), ("A", true)],
        )
        .await;
        let store = test_support::store(&server);

        let links = existing_links(&store, "Root").await?;

        assert_eq!(links, ["A", "B"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_yields_in_completion_order() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_links(
            &server,
            "Root",
            &[("A", true), ("B", true), ("C", true), ("Missing", false)],
        )
        .await;
        mount_parse_tree(&server, "A", &listen_tree(&["a.ogg"]), SLOW, 1).await;
        mount_parse_tree(&server, "B", &listen_tree(&["b.ogg"]), Duration::ZERO, 1).await;
        mount_parse_tree(&server, "C", &listen_tree(&["c.ogg"]), SLOW, 1).await;
        let store = test_support::store(&server);

        let pages: Vec<Arc<Page>> = linked_pages(&store, "Root", TemplateQuery::listen())
            .try_collect()
            .await?;

        let titles: Vec<_> = pages.iter().map(|p| p.title()).collect();
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0], "B");
        assert!(titles[1..].contains(&"A"));
        assert!(titles[1..].contains(&"C"));
        assert!(!store.contains("Missing").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_pages_without_templates_are_filtered() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_links(&server, "Root", &[("Quiet", true), ("Loud", true)]).await;
        mount_parse_tree(&server, "Quiet", &listen_tree(&[]), Duration::ZERO, 1).await;
        mount_parse_tree(&server, "Loud", &listen_tree(&["l.ogg"]), Duration::ZERO, 1).await;
        let store = test_support::store(&server);

        let pages: Vec<_> = linked_pages(&store, "Root", TemplateQuery::listen())
            .try_collect()
            .await?;

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title(), "Loud");
        // Filtered pages are still cached.
        assert!(store.cached("Quiet").await.unwrap().is_loaded());
        Ok(())
    }

    #[tokio::test]
    async fn test_page_method_uses_owning_store() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_parse_tree(&server, "Root", &listen_tree(&[]), Duration::ZERO, 1).await;
        mount_links(&server, "Root", &[("A", true)]).await;
        mount_parse_tree(&server, "A", &listen_tree(&["a.ogg"]), Duration::ZERO, 1).await;
        let store = test_support::store(&server);

        let root = store.get_by_title("Root").await?;
        let pages: Vec<_> = root
            .linked_pages(TemplateQuery::listen())
            .try_collect()
            .await?;
        let cached = store.get_by_title("A").await?;

        assert_eq!(pages.len(), 1);
        assert!(Arc::ptr_eq(&pages[0], &cached));
        Ok(())
    }

    #[tokio::test]
    async fn test_early_stop_lets_resolutions_finish() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        mount_links(&server, "Root", &[("Fast", true), ("Slow", true)]).await;
        mount_parse_tree(&server, "Fast", &listen_tree(&["f.ogg"]), Duration::ZERO, 1).await;
        mount_parse_tree(&server, "Slow", &listen_tree(&["s.ogg"]), SLOW, 1).await;
        let store = test_support::store(&server);

        let first: Vec<_> = linked_pages(&store, "Root", TemplateQuery::listen())
            .take(1)
            .try_collect()
            .await?;
        assert_eq!(first[0].title(), "Fast");

        tokio::time::sleep(SLOW * 2).await;
        let slow = store.cached("Slow").await.unwrap();
        assert!(slow.is_loaded());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_resolution_ends_stream() {
        let server = MockServer::start().await;
        mount_links(&server, "Root", &[("Slow", true), ("Broken", true)]).await;
        mount_parse_tree(&server, "Slow", &listen_tree(&["s.ogg"]), SLOW, 1).await;
        mount_parse_tree(&server, "Broken", "<root><template>", Duration::ZERO, 1).await;
        let store = test_support::store(&server);

        let results: Vec<_> = linked_pages(&store, "Root", TemplateQuery::listen())
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(err) => assert_eq!(err.category(), "parse"),
            Ok(page) => panic!("expected parse error, got {}", page.title()),
        }

        // The outstanding resolution still completes in the background.
        tokio::time::sleep(SLOW * 2).await;
        assert!(store.cached("Slow").await.unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_links_request_error_surfaces() {
        let server = MockServer::start().await;
        let store = test_support::store(&server);

        let results: Vec<_> = linked_pages(&store, "Nowhere", TemplateQuery::listen())
            .collect()
            .await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
