//! Error types and handling for wikilisten-core operations.
//!
//! One error type covers every failure in the discovery pipeline. Errors are
//! categorized for easier handling and report whether a retry could help.
//!
//! ## Error Categories
//!
//! - **Network Errors**: the HTTP call itself failed (transport failures)
//! - **API Errors**: the server answered with a structured `error` envelope
//! - **Parse Errors**: a page's parse tree or a dump index line was malformed
//! - **Serialization Errors**: a JSON body could not be decoded
//! - **Configuration Errors**: invalid settings or config files
//!
//! ## Recovery Hints
//!
//! ```rust
//! use wikilisten_core::Error;
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         println!("Temporary failure ({}), retrying...", err.category());
//!     } else {
//!         println!("Permanent failure: {err}");
//!     }
//! }
//! ```

use thiserror::Error;

/// The main error type for wikilisten-core operations.
///
/// All public functions return `Result<T, Error>`. The error keeps its source
/// chain so callers can inspect the underlying `reqwest` or I/O failure.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Raised while reading configuration files or dump index files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Connection failures, timeouts and non-success HTTP statuses. These are
    /// never retried by the traversals; the transport retries them itself
    /// when they look transient.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with an `error` envelope.
    ///
    /// The server's error object is carried verbatim in `details`. This means
    /// the request itself was wrong, so it is never retried.
    #[error("API error [{code}]: {info}")]
    Api {
        /// Machine-readable error code reported by the server.
        code: String,
        /// Human-readable explanation reported by the server.
        info: String,
        /// The complete error object as returned.
        details: serde_json::Value,
    },

    /// A structural document or index record failed to parse.
    ///
    /// No fallback document is substituted when a parse tree is malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization or deserialization failed.
    ///
    /// Also used when a response decodes as JSON but lacks a field the
    /// protocol promises (for example `parse.parsetree`).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(format!("Failed to serialize config: {err}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("Failed to parse config: {err}"))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(format!("XML parse error: {err}"))
    }
}

impl Error {
    /// Build an [`Error::Api`] from the `error` object of a response envelope.
    ///
    /// Missing `code`/`info` fields degrade to `"unknown"` and the raw JSON
    /// respectively; `details` always holds the object untouched.
    #[must_use]
    pub fn from_api_payload(details: serde_json::Value) -> Self {
        let code = details
            .get("code")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let info = details
            .get("info")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| details.to_string(), ToString::to_string);
        Self::Api {
            code,
            info,
            details,
        }
    }

    /// Check if the error might be recoverable through retry logic.
    ///
    /// Timeouts, connection failures and server-side (5xx) statuses are
    /// transient. API errors are not: retrying the same request yields the
    /// same error envelope.
    ///
    /// ```rust
    /// use wikilisten_core::Error;
    /// use std::io;
    ///
    /// assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout")).is_recoverable());
    /// assert!(!Error::Parse("bad tree".to_string()).is_recoverable());
    /// assert!(!Error::from_api_payload(serde_json::json!({"code": "badtitle"})).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            },
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Stable values, suitable for structured logging:
    /// `io`, `network`, `api`, `parse`, `config`, `not_found`, `invalid_url`,
    /// `serialization`, `other`.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Api { .. } => "api",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
