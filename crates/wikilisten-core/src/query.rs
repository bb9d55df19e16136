//! Query string construction for the remote API.
//!
//! Every request carries three protocol parameters (`format=json`,
//! `formatversion=2`, `origin=*`). They are applied last, so a caller-supplied
//! value for one of those keys is always replaced, never merged.
//!
//! Keys and values are form-encoded, which keeps titles such as
//! `AT&T` or `E=mc2` intact on the wire.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Parameters injected into every request, overwriting caller values.
pub const FIXED_PARAMS: [(&str, &str); 3] =
    [("format", "json"), ("formatversion", "2"), ("origin", "*")];

/// Request parameters for one API call.
///
/// Keys are unique; inserting an existing key replaces its value. Iteration
/// and serialization use sorted key order, which callers must not rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter. Numbers and strings are both accepted.
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.params.insert(key.into(), value.to_string());
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Number of caller-visible parameters (fixed parameters excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Merge a server-supplied continuation object into these parameters.
    ///
    /// Values are copied verbatim: strings as-is, everything else in its
    /// JSON rendering. Continuation keys overwrite existing keys.
    pub fn merge_continuation(&mut self, token: &Map<String, Value>) {
        for (key, value) in token {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.params.insert(key.clone(), value);
        }
    }

    /// Serialize to a query string with the fixed protocol parameters applied.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut merged = self.params.clone();
        for (key, value) in FIXED_PARAMS {
            merged.insert(key.to_string(), value.to_string());
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &merged {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: fmt::Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
