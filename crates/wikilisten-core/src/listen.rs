//! Playable files found on pages.
//!
//! A [`Listen`] pairs a page with one media file referenced by a matching
//! template and the URL the file can be downloaded from.

use crate::Result;
use crate::assets::AssetResolver;
use crate::store::Page;
use crate::template::TemplateQuery;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// A media file referenced from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listen {
    /// Title of the page the reference was found on
    pub page_title: String,
    /// File name as written in the template, trimmed
    pub filename: String,
    /// Resolved download URL
    pub url: String,
}

impl Listen {
    /// Build a listen, resolving the file's URL.
    #[must_use]
    pub fn new(page_title: &str, filename: &str, resolver: &AssetResolver) -> Self {
        Self {
            page_title: page_title.to_string(),
            filename: filename.trim().to_string(),
            url: resolver.resolve(filename),
        }
    }
}

impl Page {
    /// Matching template parameter values on this page, fetching the parse
    /// tree if needed.
    pub async fn template_values(&self, query: &TemplateQuery) -> Result<Vec<String>> {
        Ok(query.extract(self.parse_tree().await?))
    }

    /// Listens on this page in document order.
    pub async fn listens(
        &self,
        query: &TemplateQuery,
        resolver: &AssetResolver,
    ) -> Result<Vec<Listen>> {
        let listens: Vec<Listen> = self
            .template_values(query)
            .await?
            .iter()
            .map(|filename| Listen::new(self.title(), filename, resolver))
            .collect();
        for listen in &listens {
            debug!(page = %listen.page_title, url = %listen.url, "Found listen");
        }
        Ok(listens)
    }
}

/// Tracks URLs already handed to a consumer, so each file is emitted once.
#[derive(Debug, Default)]
pub struct SeenUrls {
    seen: HashSet<String>,
}

impl SeenUrls {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a listen; `true` the first time its URL is seen.
    pub fn first_sighting(&mut self, listen: &Listen) -> bool {
        self.seen.insert(listen.url.clone())
    }

    /// Keep only listens whose URL has not been seen, preserving order.
    pub fn retain_new(&mut self, listens: Vec<Listen>) -> Vec<Listen> {
        listens
            .into_iter()
            .filter(|listen| self.first_sighting(listen))
            .collect()
    }

    /// Number of distinct URLs seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
