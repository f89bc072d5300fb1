//! Best-effort post freshness check via the platform's public oEmbed endpoint.
//!
//! No platform API key is assumed, so the publication time is only known when
//! the embed HTML happens to carry a `datetime="..."` attribute. Unknown age
//! never blocks an attestation.

use std::time::Duration;

use async_trait::async_trait;
use faucet_types::Timestamp;
use serde::Deserialize;
use tracing::debug;

use crate::AttestationError;

/// Default public oEmbed endpoint.
pub const DEFAULT_OEMBED_URL: &str = "https://publish.twitter.com/oembed";

/// Timeout for the metadata lookup.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(4);

/// Source of a post's publication time.
#[async_trait]
pub trait PostMetadataSource: Send + Sync {
    /// `Ok(None)` when the source answered but did not reveal a date.
    async fn published_at(&self, post_url: &str) -> Result<Option<Timestamp>, AttestationError>;
}

/// Verdict of a freshness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    TooOld { age_ms: u64 },
    Unknown,
}

impl Freshness {
    /// Judge a lookup result against `max_age_ms`. Lookup errors count as unknown.
    pub fn evaluate(
        lookup: Result<Option<Timestamp>, AttestationError>,
        now: Timestamp,
        max_age_ms: u64,
    ) -> Self {
        match lookup {
            Ok(Some(published)) => {
                let age_ms = published.elapsed_since(now);
                if age_ms > max_age_ms {
                    Freshness::TooOld { age_ms }
                } else {
                    Freshness::Fresh
                }
            }
            Ok(None) => Freshness::Unknown,
            Err(e) => {
                debug!(error = %e, "post metadata unavailable, age unknown");
                Freshness::Unknown
            }
        }
    }

    pub fn is_acceptable(&self) -> bool {
        !matches!(self, Freshness::TooOld { .. })
    }
}

/// Find the first `datetime="..."` attribute in embed HTML.
pub fn extract_datetime(html: &str) -> Option<Timestamp> {
    const ATTR: &str = "datetime=\"";
    let start = html.find(ATTR)? + ATTR.len();
    let len = html[start..].find('"')?;
    Timestamp::parse_rfc3339(&html[start..start + len])
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    html: Option<String>,
}

/// oEmbed HTTP client.
pub struct OEmbedClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl OEmbedClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }
}

impl Default for OEmbedClient {
    fn default() -> Self {
        Self::new(DEFAULT_OEMBED_URL)
    }
}

#[async_trait]
impl PostMetadataSource for OEmbedClient {
    async fn published_at(&self, post_url: &str) -> Result<Option<Timestamp>, AttestationError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("omit_script", "1"), ("hide_thread", "1"), ("url", post_url)])
            .send()
            .await
            .map_err(|e| AttestationError::Metadata(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AttestationError::Metadata(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| AttestationError::Metadata(format!("invalid oEmbed response: {e}")))?;
        Ok(body.html.as_deref().and_then(extract_datetime))
    }
}
