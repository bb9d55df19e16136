//! HTTP transport for the remote query API.
//!
//! [`ApiClient`] issues one GET per request and decodes the JSON envelope
//! exactly once, at this boundary, into an [`ApiResponse`]. An `error` key in
//! the envelope becomes [`Error::Api`]; a `warnings` key is logged and kept on
//! the response.
//!
//! Transient transport failures (timeouts, refused connections, 5xx) are
//! retried with exponential backoff. API error envelopes are not.

use crate::config::ApiConfig;
use crate::query::QueryParams;
use crate::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, instrument, warn};
use url::Url;

/// Upper bound for a single backoff delay.
const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(2);

/// A decoded response envelope that was not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Clean response.
    Ok(Value),
    /// Response accompanied by server warnings (non-fatal).
    WithWarnings(Value, Value),
}

impl ApiResponse {
    /// Classify a raw JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] carrying the server's error object when the
    /// envelope has an `error` key.
    pub fn from_envelope(mut envelope: Value) -> Result<Self> {
        let Some(fields) = envelope.as_object_mut() else {
            return Ok(Self::Ok(envelope));
        };

        if let Some(error) = fields.remove("error") {
            return Err(Error::from_api_payload(error));
        }

        match fields.remove("warnings") {
            Some(warnings) => Ok(Self::WithWarnings(envelope, warnings)),
            None => Ok(Self::Ok(envelope)),
        }
    }

    /// The response body.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        match self {
            Self::Ok(payload) | Self::WithWarnings(payload, _) => payload,
        }
    }

    /// Consume the response, returning the body.
    #[must_use]
    pub fn into_payload(self) -> Value {
        match self {
            Self::Ok(payload) | Self::WithWarnings(payload, _) => payload,
        }
    }

    /// Server warnings, if any.
    #[must_use]
    pub const fn warnings(&self) -> Option<&Value> {
        match self {
            Self::Ok(_) => None,
            Self::WithWarnings(_, warnings) => Some(warnings),
        }
    }
}

/// HTTP client bound to one API endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Url,
    max_retries: usize,
    retry_base: Duration,
}

impl ApiClient {
    /// Create a client for `endpoint` with default transport settings.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::from_config(&ApiConfig {
            url: endpoint.to_string(),
            ..ApiConfig::default()
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.url)))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            endpoint,
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms.max(1)),
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for a parameter set.
    #[must_use]
    pub fn request_url(&self, params: &QueryParams) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&params.to_query_string()));
        url
    }

    /// Issue a request and classify the envelope.
    ///
    /// Warnings are logged here so callers only need to look at them when
    /// they care.
    #[instrument(skip_all, fields(action = params.get("action").unwrap_or("")))]
    pub async fn request(&self, params: &QueryParams) -> Result<ApiResponse> {
        let url = self.request_url(params);

        // 2^n * base/2: base, 2*base, 4*base, ...
        let half_base = u64::try_from(self.retry_base.as_millis() / 2)
            .unwrap_or(u64::MAX)
            .max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(half_base)
            .max_delay(MAX_BACKOFF_DELAY)
            .take(self.max_retries);

        let envelope = RetryIf::start(
            strategy,
            || self.fetch_envelope(url.clone()),
            |err: &Error| {
                let retry = err.is_recoverable();
                if retry {
                    warn!(error = %err, "Transient transport failure; retrying");
                }
                retry
            },
        )
        .await?;

        let response = ApiResponse::from_envelope(envelope)?;
        if let Some(warnings) = response.warnings() {
            warn!(%warnings, "API returned warnings");
        }
        Ok(response)
    }

    /// Issue a request and return just the body.
    pub async fn query(&self, params: &QueryParams) -> Result<Value> {
        Ok(self.request(params).await?.into_payload())
    }

    async fn fetch_envelope(&self, url: Url) -> Result<Value> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
