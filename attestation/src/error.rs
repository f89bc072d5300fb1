use faucet_crypto::CryptoError;
use faucet_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("invalid post url: {0}")]
    InvalidPostUrl(String),

    #[error("post metadata lookup failed: {0}")]
    Metadata(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
