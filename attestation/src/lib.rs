//! Attestations: proof that a wallet's owner published a qualifying social post.
//!
//! - [`AttestationCodec`] issues and verifies stateless HMAC-signed tokens
//! - [`ReplayGuard`] records which posts (and legacy opaque tokens) are spent
//! - [`parse_post_url`] extracts the post id from a post URL
//! - [`OEmbedClient`] looks up a post's publication time, best effort

pub mod codec;
pub mod error;
pub mod freshness;
pub mod post_url;
pub mod replay;

pub use codec::{AttestationCodec, AttestationPayload, TokenError, MAX_FUTURE_SKEW_MS};
pub use error::AttestationError;
pub use freshness::{extract_datetime, Freshness, OEmbedClient, PostMetadataSource};
pub use post_url::parse_post_url;
pub use replay::ReplayGuard;
