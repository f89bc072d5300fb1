use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("randomness unavailable: {0}")]
    Randomness(String),
}
