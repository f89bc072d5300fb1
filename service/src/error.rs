use faucet_attestation::AttestationError;
use faucet_ledger::LedgerError;
use faucet_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable rejection code, surfaced to clients as `reason`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidWalletAddress,
    InvalidPostUrl,
    InvalidSignature,
    PostAlreadyUsed,
    PostTooOld,
    RecentlyVerified,
    MissingToken,
    InvalidToken,
    TokenAlreadyUsed,
    WalletMismatch,
    ClaimInProgress,
    Ineligible,
    InsufficientFunds,
    InvalidRecipient,
    NotConfigured,
    TransportFailure,
    ConfirmationFailed,
    InternalError,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidWalletAddress => "invalid_wallet_address",
            RejectReason::InvalidPostUrl => "invalid_post_url",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::PostAlreadyUsed => "post_already_used",
            RejectReason::PostTooOld => "post_too_old",
            RejectReason::RecentlyVerified => "recently_verified",
            RejectReason::MissingToken => "missing_token",
            RejectReason::InvalidToken => "invalid_token",
            RejectReason::TokenAlreadyUsed => "token_already_used",
            RejectReason::WalletMismatch => "wallet_mismatch",
            RejectReason::ClaimInProgress => "claim_in_progress",
            RejectReason::Ineligible => "ineligible",
            RejectReason::InsufficientFunds => "insufficient_funds",
            RejectReason::InvalidRecipient => "invalid_recipient",
            RejectReason::NotConfigured => "not_configured",
            RejectReason::TransportFailure => "transport_failure",
            RejectReason::ConfirmationFailed => "confirmation_failed",
            RejectReason::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a faucet operation can be rejected.
///
/// Validation, replay and eligibility errors are final for the request and
/// never retried. Transport errors have already been retried by the time
/// they surface here.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        reason: RejectReason,
        message: String,
    },

    #[error("{message}")]
    Replay {
        reason: RejectReason,
        message: String,
    },

    #[error("{message}")]
    Eligibility {
        reason: RejectReason,
        message: String,
        remaining_hours: u64,
    },

    #[error("faucet not configured: {0}")]
    Configuration(String),

    #[error("{message}")]
    Transport {
        reason: RejectReason,
        message: String,
    },

    #[error("insufficient funding balance: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(reason: RejectReason, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            reason,
            message: message.into(),
        }
    }

    pub fn replay(reason: RejectReason, message: impl Into<String>) -> Self {
        ServiceError::Replay {
            reason,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport {
            reason: RejectReason::TransportFailure,
            message: message.into(),
        }
    }

    pub fn reason(&self) -> RejectReason {
        match self {
            ServiceError::Validation { reason, .. }
            | ServiceError::Replay { reason, .. }
            | ServiceError::Eligibility { reason, .. }
            | ServiceError::Transport { reason, .. } => *reason,
            ServiceError::Configuration(_) => RejectReason::NotConfigured,
            ServiceError::InsufficientFunds { .. } => RejectReason::InsufficientFunds,
            ServiceError::Store(_) | ServiceError::Internal(_) => RejectReason::InternalError,
        }
    }

    /// Hours to wait before retrying, for cooldown rejections.
    pub fn remaining_hours(&self) -> Option<u64> {
        match self {
            ServiceError::Eligibility {
                remaining_hours, ..
            } => Some(*remaining_hours),
            _ => None,
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidRecipient(m) => ServiceError::validation(
                RejectReason::InvalidRecipient,
                format!("invalid recipient address: {m}"),
            ),
            LedgerError::NotConfigured(m) => ServiceError::Configuration(m),
            LedgerError::InsufficientFunds { needed, available } => {
                ServiceError::InsufficientFunds { needed, available }
            }
            other => ServiceError::transport(other.to_string()),
        }
    }
}

impl From<AttestationError> for ServiceError {
    fn from(e: AttestationError) -> Self {
        match e {
            AttestationError::InvalidPostUrl(url) => ServiceError::validation(
                RejectReason::InvalidPostUrl,
                format!("invalid post URL: {url}"),
            ),
            AttestationError::Metadata(m) => ServiceError::transport(m),
            AttestationError::Store(e) => ServiceError::Store(e),
            AttestationError::Crypto(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_onto_taxonomy() {
        let e: ServiceError = LedgerError::InsufficientFunds {
            needed: 5,
            available: 1,
        }
        .into();
        assert_eq!(e.reason(), RejectReason::InsufficientFunds);

        let e: ServiceError = LedgerError::Unreachable("down".into()).into();
        assert_eq!(e.reason(), RejectReason::TransportFailure);

        let e: ServiceError = LedgerError::NotConfigured("no key".into()).into();
        assert!(matches!(e, ServiceError::Configuration(_)));

        let e: ServiceError = LedgerError::InvalidRecipient("x".into()).into();
        assert_eq!(e.reason(), RejectReason::InvalidRecipient);
    }

    #[test]
    fn reason_codes_are_snake_case() {
        assert_eq!(RejectReason::PostAlreadyUsed.as_str(), "post_already_used");
        assert_eq!(
            serde_json::to_value(RejectReason::RecentlyVerified).unwrap(),
            "recently_verified"
        );
    }

    #[test]
    fn only_cooldowns_carry_remaining_hours() {
        let e = ServiceError::Eligibility {
            reason: RejectReason::Ineligible,
            message: "wait".into(),
            remaining_hours: 3,
        };
        assert_eq!(e.remaining_hours(), Some(3));
        assert_eq!(ServiceError::transport("x").remaining_hours(), None);
    }
}
