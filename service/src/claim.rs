//! Claim Orchestrator: the end-to-end claim protocol.
//!
//! ```text
//! AwaitingAttestation → AttestationIssued → Dispatching → Confirming → Recorded
//!                     ↘                   ↘             ↘            ↘ Rejected
//! ```
//!
//! The post is reserved before eligibility is checked and released on any
//! failure, so a failed claim leaves its attestation usable and two claims
//! can never both dispatch for one post.

use std::sync::Arc;
use std::time::Instant;

use faucet_attestation::{AttestationCodec, ReplayGuard};
use faucet_ledger::{
    ConfirmationOutcome, ConfirmationVerifier, TransferDispatcher, VerificationReport,
};
use faucet_store::{ClaimHistoryStore, StoreError};
use faucet_types::{ClaimRecord, Clock, Lamports, PostId, Timestamp, TxSignature, WalletAddress};
use tracing::{debug, info, warn, Instrument};

use crate::config::{explorer_link, UnverifiedPolicy};
use crate::eligibility::EligibilityResolver;
use crate::error::RejectReason;
use crate::history::HistoryView;
use crate::metrics::FaucetMetrics;
use crate::tracing_spans::{claim_span, confirm_span, dispatch_span};
use crate::wallet_locks::WalletLocks;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimStage {
    AwaitingAttestation,
    AttestationIssued,
    Dispatching,
    Confirming,
    Recorded,
    Rejected,
}

impl ClaimStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStage::AwaitingAttestation => "awaiting_attestation",
            ClaimStage::AttestationIssued => "attestation_issued",
            ClaimStage::Dispatching => "dispatching",
            ClaimStage::Confirming => "confirming",
            ClaimStage::Recorded => "recorded",
            ClaimStage::Rejected => "rejected",
        }
    }
}

/// Proof of a recorded claim.
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimReceipt {
    pub signature: TxSignature,
    pub amount: Lamports,
    pub recipient: WalletAddress,
    pub post_id: PostId,
    pub confirmation: VerificationReport,
    /// Recorded without positive confirmation.
    pub provisional: bool,
    pub explorer_url: Option<String>,
    pub claimed_at: Timestamp,
}

/// An attestation that passed verification.
struct Attestation {
    wallet: WalletAddress,
    post: PostId,
    token: String,
    legacy: bool,
}

#[derive(Clone, Debug)]
pub struct ClaimSettings {
    pub amount: Lamports,
    pub unverified_policy: UnverifiedPolicy,
    pub explorer_base_url: Option<String>,
}

pub struct ClaimOrchestrator {
    codec: Option<Arc<AttestationCodec>>,
    guard: ReplayGuard,
    eligibility: Arc<EligibilityResolver>,
    history: Arc<HistoryView>,
    dispatcher: Arc<TransferDispatcher>,
    verifier: Arc<ConfirmationVerifier>,
    claims: Arc<dyn ClaimHistoryStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<FaucetMetrics>,
    settings: ClaimSettings,
    locks: WalletLocks,
}

impl ClaimOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        codec: Option<Arc<AttestationCodec>>,
        guard: ReplayGuard,
        eligibility: Arc<EligibilityResolver>,
        history: Arc<HistoryView>,
        dispatcher: Arc<TransferDispatcher>,
        verifier: Arc<ConfirmationVerifier>,
        claims: Arc<dyn ClaimHistoryStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<FaucetMetrics>,
        settings: ClaimSettings,
    ) -> Self {
        Self {
            codec,
            guard,
            eligibility,
            history,
            dispatcher,
            verifier,
            claims,
            clock,
            metrics,
            settings,
            locks: WalletLocks::new(),
        }
    }

    /// Claim the faucet amount for `wallet` with an attestation token.
    pub async fn claim(
        &self,
        wallet: &str,
        token: Option<&str>,
    ) -> Result<ClaimReceipt, ServiceError> {
        let result = self.run(wallet, token).instrument(claim_span(wallet)).await;
        match &result {
            Ok(receipt) => {
                self.metrics.claims_succeeded.inc();
                if receipt.provisional {
                    self.metrics.claims_provisional.inc();
                }
            }
            Err(e) => {
                self.metrics
                    .claims_rejected
                    .with_label_values(&[e.reason().as_str()])
                    .inc();
                info!(
                    wallet = %wallet,
                    stage = ClaimStage::Rejected.as_str(),
                    reason = %e.reason(),
                    error = %e,
                    "claim rejected"
                );
            }
        }
        result
    }

    async fn run(&self, wallet: &str, token: Option<&str>) -> Result<ClaimReceipt, ServiceError> {
        debug!(stage = ClaimStage::AwaitingAttestation.as_str());
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
            ServiceError::validation(RejectReason::MissingToken, "verification token is required")
        })?;
        let wallet = WalletAddress::parse(wallet).map_err(|e| {
            ServiceError::validation(RejectReason::InvalidWalletAddress, e.to_string())
        })?;

        let attestation = self.verify_attestation(token)?;
        if attestation.wallet != wallet {
            return Err(ServiceError::validation(
                RejectReason::WalletMismatch,
                "verification token was issued for a different wallet",
            ));
        }
        debug!(stage = ClaimStage::AttestationIssued.as_str(), post = %attestation.post);

        let _wallet_guard = self.locks.lock(&wallet).await;

        if self.guard.is_post_used(&attestation.post)? {
            return Err(post_already_used());
        }
        if !self.guard.reserve_post(&attestation.post)? {
            if self.guard.is_post_used(&attestation.post)? {
                return Err(post_already_used());
            }
            return Err(ServiceError::replay(
                RejectReason::ClaimInProgress,
                "a claim for this post is already in progress",
            ));
        }

        let result = self.execute(&wallet, &attestation).await;
        if result.is_err() {
            if let Err(e) = self.guard.release_post(&attestation.post) {
                warn!(post = %attestation.post, error = %e, "failed to release post reservation");
            }
        }
        result
    }

    /// Signed tokens first; a token that fails signed verification may still
    /// be a legacy opaque token.
    fn verify_attestation(&self, token: &str) -> Result<Attestation, ServiceError> {
        let signed_error = match &self.codec {
            Some(codec) => match codec.verify(token, self.clock.now()) {
                Ok(payload) => {
                    return Ok(Attestation {
                        wallet: payload.wallet_address,
                        post: payload.post_id,
                        token: token.to_string(),
                        legacy: false,
                    })
                }
                Err(e) => Some(e),
            },
            None => None,
        };

        match self.guard.lookup_opaque_token(token)? {
            Some(record) if record.used => Err(ServiceError::replay(
                RejectReason::TokenAlreadyUsed,
                "verification token has already been used",
            )),
            Some(record) => Ok(Attestation {
                wallet: record.wallet_address,
                post: record.post_id,
                token: record.token,
                legacy: true,
            }),
            None => match signed_error {
                Some(e) => Err(ServiceError::validation(
                    RejectReason::InvalidToken,
                    format!("invalid verification token: {e}"),
                )),
                None => Err(ServiceError::Configuration(
                    "attestation secret not configured".into(),
                )),
            },
        }
    }

    /// Eligibility, dispatch, confirmation and record, under the wallet lock
    /// with the post reserved.
    async fn execute(
        &self,
        wallet: &WalletAddress,
        attestation: &Attestation,
    ) -> Result<ClaimReceipt, ServiceError> {
        let eligibility = self.eligibility.check(wallet, true).await?;
        if !eligibility.eligible {
            return Err(ServiceError::Eligibility {
                reason: RejectReason::Ineligible,
                message: eligibility.message,
                remaining_hours: eligibility.remaining_hours.unwrap_or(0),
            });
        }

        debug!(stage = ClaimStage::Dispatching.as_str());
        let amount = self.settings.amount;
        let started = Instant::now();
        let signature = self
            .dispatcher
            .dispatch(wallet, amount)
            .instrument(dispatch_span(wallet.as_str(), amount.raw()))
            .await?;
        self.metrics
            .dispatch_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        debug!(stage = ClaimStage::Confirming.as_str(), signature = %signature);
        let report = self
            .verifier
            .verify(&signature, wallet)
            .instrument(confirm_span(signature.as_str()))
            .await;
        let outcome = report.outcome();
        self.metrics
            .confirmations
            .with_label_values(&[
                report.method.map(|m| m.as_str()).unwrap_or("none"),
                outcome_label(outcome),
            ])
            .inc();

        let provisional = match (outcome, self.settings.unverified_policy) {
            (ConfirmationOutcome::Confirmed, _) => false,
            (ConfirmationOutcome::Failed, _) => {
                return Err(ServiceError::Transport {
                    reason: RejectReason::ConfirmationFailed,
                    message: format!("transfer {signature} failed on the ledger"),
                });
            }
            (ConfirmationOutcome::Unverified, UnverifiedPolicy::AcceptProvisionally) => {
                warn!(signature = %signature, attempts = report.attempts, "transfer unverified, accepting provisionally");
                true
            }
            (ConfirmationOutcome::Unverified, UnverifiedPolicy::Reject) => {
                return Err(ServiceError::Transport {
                    reason: RejectReason::ConfirmationFailed,
                    message: format!("transfer {signature} could not be confirmed"),
                });
            }
        };

        let claimed_at = self.clock.now();
        self.claims.append_claim(ClaimRecord::new(
            wallet.clone(),
            claimed_at,
            amount,
            signature.clone(),
        ))?;
        self.guard
            .mark_post_used(&attestation.post, &attestation.token, wallet, claimed_at)
            .map_err(|e| match e {
                StoreError::Duplicate(_) => post_already_used(),
                other => other.into(),
            })?;
        if attestation.legacy {
            if let Err(e) = self.guard.mark_opaque_token_used(&attestation.token, claimed_at) {
                warn!(error = %e, "failed to mark legacy token used");
            }
        }
        self.eligibility.invalidate(wallet);
        self.history.invalidate(wallet);

        info!(
            stage = ClaimStage::Recorded.as_str(),
            wallet = %wallet,
            post = %attestation.post,
            signature = %signature,
            provisional,
            "claim recorded"
        );
        Ok(ClaimReceipt {
            explorer_url: explorer_link(
                self.settings.explorer_base_url.as_deref(),
                signature.as_str(),
            ),
            signature,
            amount,
            recipient: wallet.clone(),
            post_id: attestation.post.clone(),
            confirmation: report,
            provisional,
            claimed_at,
        })
    }
}

fn post_already_used() -> ServiceError {
    ServiceError::replay(
        RejectReason::PostAlreadyUsed,
        "This post has already been used to claim tokens",
    )
}

pub(crate) fn outcome_label(outcome: ConfirmationOutcome) -> &'static str {
    match outcome {
        ConfirmationOutcome::Confirmed => "confirmed",
        ConfirmationOutcome::Failed => "failed",
        ConfirmationOutcome::Unverified => "unverified",
    }
}
