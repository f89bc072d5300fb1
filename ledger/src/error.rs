use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("ledger request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("not found on ledger: {0}")]
    NotFound(String),

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("funding account not configured: {0}")]
    NotConfigured(String),

    #[error("insufficient funding balance: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("transaction rejected: {0}")]
    SubmissionRejected(String),
}

impl LedgerError {
    /// The endpoint could not be reached or answered garbage. Worth retrying,
    /// or trying the next endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LedgerError::Unreachable(_)
                | LedgerError::RequestFailed(_)
                | LedgerError::InvalidResponse(_)
        )
    }
}
