//! Nullable post metadata source.

use async_trait::async_trait;
use faucet_attestation::{AttestationError, PostMetadataSource};
use faucet_types::Timestamp;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted publication times. Unknown posts return `Ok(None)`, or an error
/// when the source is set to fail.
#[derive(Default)]
pub struct NullPostMetadata {
    published: Mutex<HashMap<String, Timestamp>>,
    failing: Mutex<bool>,
}

impl NullPostMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_published(&self, post_url: &str, at: Timestamp) {
        self.published
            .lock()
            .unwrap()
            .insert(post_url.to_string(), at);
    }

    /// Make every lookup fail as if the endpoint were down.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl PostMetadataSource for NullPostMetadata {
    async fn published_at(&self, post_url: &str) -> Result<Option<Timestamp>, AttestationError> {
        if *self.failing.lock().unwrap() {
            return Err(AttestationError::Metadata("null metadata source offline".into()));
        }
        Ok(self.published.lock().unwrap().get(post_url).copied())
    }
}
