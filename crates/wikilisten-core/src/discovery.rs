//! Paginated discovery of pages embedding a template.
//!
//! [`discover`] returns a lazy stream over the result set of a generator
//! query. Each round issues one request; the pages it lists are resolved
//! through the [`PageStore`] and yielded one at a time. When the response
//! carries a `continue` object its keys are merged into the parameters for the
//! next round; when it does not, the stream ends.
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use wikilisten_core::discovery::{discover, embedded_in_params};
//! use wikilisten_core::{ApiClient, PageStore};
//!
//! # async fn example() -> wikilisten_core::Result<()> {
//! let store = PageStore::new(ApiClient::new("https://en.wikipedia.org/w/api.php")?);
//! let mut pages = Box::pin(discover(&store, embedded_in_params("Template:Listen", "max")));
//! while let Some(page) = pages.try_next().await? {
//!     println!("{}", page.title());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The stream is single-use; build a new one to start over. Dropping it early
//! is fine. After an error it yields nothing further.

use crate::query::QueryParams;
use crate::store::{Page, PageStore};
use crate::{Error, Result};
use futures::Stream;
use futures::stream;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters listing every page that embeds `template`.
///
/// `prop=templates` is limited to `template` itself via `tltemplates`;
/// `tllimit` is deliberately left unset so continuation stays on the page
/// generator.
#[must_use]
pub fn embedded_in_params(template: &str, limit: &str) -> QueryParams {
    QueryParams::new()
        .with("action", "query")
        .with("generator", "embeddedin")
        .with("geititle", template)
        .with("geilimit", limit)
        .with("prop", "templates")
        .with("tltemplates", template)
}

enum State {
    Fetching(QueryParams),
    Done,
}

struct Traversal {
    store: PageStore,
    state: State,
    pending: VecDeque<String>,
    emitted: HashSet<String>,
    round: usize,
}

impl Traversal {
    async fn next_page(&mut self) -> Result<Option<Arc<Page>>> {
        loop {
            if let Some(title) = self.pending.pop_front() {
                if !self.emitted.insert(title.clone()) {
                    debug!(%title, "Skipping page already yielded");
                    continue;
                }
                return self.store.get_by_title(&title).await.map(Some);
            }

            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return Ok(None),
                State::Fetching(params) => self.fetch_round(params).await?,
            }
        }
    }

    async fn fetch_round(&mut self, mut params: QueryParams) -> Result<()> {
        self.round += 1;
        let body = self.store.client().query(&params).await?;

        self.pending.extend(page_titles(&body));
        let continuation = body.get("continue").and_then(Value::as_object);

        info!(
            round = self.round,
            pages = self.pending.len(),
            more = continuation.is_some(),
            "Discovery round complete"
        );

        if let Some(token) = continuation {
            params.merge_continuation(token);
            self.state = State::Fetching(params);
        }
        Ok(())
    }
}

fn page_titles(body: &Value) -> Vec<String> {
    body.pointer("/query/pages")
        .and_then(Value::as_array)
        .map(|pages| {
            pages
                .iter()
                .filter_map(|page| page.get("title").and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Stream every page matched by `params`, following continuations.
pub fn discover(
    store: &PageStore,
    params: QueryParams,
) -> impl Stream<Item = Result<Arc<Page>>> + Send + 'static {
    let traversal = Traversal {
        store: store.clone(),
        state: State::Fetching(params),
        pending: VecDeque::new(),
        emitted: HashSet::new(),
        round: 0,
    };

    stream::try_unfold(traversal, |mut traversal| async move {
        let next = traversal.next_page().await?;
        Ok::<_, Error>(next.map(|page| (page, traversal)))
    })
}
