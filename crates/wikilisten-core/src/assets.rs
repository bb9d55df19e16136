//! Media file name → download URL resolution.
//!
//! Uploads are stored in a hash-sharded directory layout
//! (`$wgHashedUploadDirectory`): a file lives under the first hex character
//! and the first two hex characters of the MD5 of its normalized name.
//!
//! ```text
//! "Example.jpg" → md5 a9… → {base}/a/a9/Example.jpg
//! ```
//!
//! ```rust
//! use wikilisten_core::assets::AssetResolver;
//!
//! let resolver = AssetResolver::default();
//! assert_eq!(
//!     resolver.resolve("Example.jpg"),
//!     "https://upload.wikimedia.org/wikipedia/commons/a/a9/Example.jpg"
//! );
//! ```

use std::fmt::Write;

use md5::{Digest, Md5};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Upload root for Wikimedia Commons.
pub const DEFAULT_BASE_URL: &str = "https://upload.wikimedia.org/wikipedia/commons";

/// Characters `encodeURIComponent` leaves alone: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Every intermediate of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetReference {
    /// File name exactly as written in the page
    pub original: String,
    /// Trimmed, spaces replaced by underscores
    pub normalized: String,
    /// Lowercase hex MD5 of `normalized`
    pub digest: String,
    /// Resolved download URL
    pub url: String,
}

impl AssetReference {
    /// First-level shard: `digest[0]`.
    #[must_use]
    pub fn shard1(&self) -> &str {
        &self.digest[..1]
    }

    /// Second-level shard: `digest[0..2]`.
    #[must_use]
    pub fn shard2(&self) -> &str {
        &self.digest[..2]
    }
}

/// Pure file name → URL mapping for one upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    base_url: String,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AssetResolver {
    /// Resolver for the given upload root. A trailing `/` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Upload root, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a file name to its download URL.
    #[must_use]
    pub fn resolve(&self, filename: &str) -> String {
        self.reference(filename).url
    }

    /// Resolve a file name, keeping every intermediate value.
    #[must_use]
    pub fn reference(&self, filename: &str) -> AssetReference {
        let normalized = normalize_filename(filename);
        let digest = md5_hex(&normalized);
        let url = format!(
            "{}/{}/{}/{}",
            self.base_url,
            &digest[..1],
            &digest[..2],
            utf8_percent_encode(&normalized, URI_COMPONENT)
        );
        AssetReference {
            original: filename.to_string(),
            normalized,
            digest,
            url,
        }
    }
}

/// Trim surrounding whitespace and replace every space with `_`.
#[must_use]
pub fn normalize_filename(filename: &str) -> String {
    filename.trim().replace(' ', "_")
}

fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    digest.iter().fold(String::with_capacity(32), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
