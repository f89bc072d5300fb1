//! Top-level error type shared across crates.

use thiserror::Error;

/// Validation errors for the faucet's fundamental types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaucetError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid post id: {0:?}")]
    InvalidPostId(String),

    #[error("invalid transaction signature: {0}")]
    InvalidSignature(String),
}
