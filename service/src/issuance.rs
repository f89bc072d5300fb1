//! Attestation issuance: turn a post URL and a wallet into a verification token.

use std::sync::Arc;

use faucet_attestation::{
    parse_post_url, AttestationCodec, Freshness, PostMetadataSource, ReplayGuard,
};
use faucet_store::{IssuanceLog, ISSUANCE_RETENTION_MS};
use faucet_types::{Clock, PostId, Timestamp, WalletAddress, HOUR_MS};
use tracing::{info, Instrument};

use crate::eligibility::hours_until;
use crate::error::RejectReason;
use crate::metrics::FaucetMetrics;
use crate::tracing_spans::issue_attestation_span;
use crate::ServiceError;

/// A wallet may be issued one attestation per this interval.
pub const REVERIFY_COOLDOWN_MS: u64 = ISSUANCE_RETENTION_MS;

/// Posts older than this are rejected when their age is known.
pub const MAX_POST_AGE_MS: u64 = 24 * HOUR_MS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedAttestation {
    pub post_id: PostId,
    pub wallet_address: WalletAddress,
    pub verified_at: Timestamp,
    pub token: String,
    /// The token is an opaque legacy token rather than a signed one.
    pub legacy: bool,
}

pub struct AttestationIssuer {
    codec: Option<Arc<AttestationCodec>>,
    guard: ReplayGuard,
    issuance: Arc<dyn IssuanceLog>,
    metadata: Arc<dyn PostMetadataSource>,
    clock: Arc<dyn Clock>,
    issue_legacy: bool,
    metrics: Arc<FaucetMetrics>,
}

impl AttestationIssuer {
    pub fn new(
        codec: Option<Arc<AttestationCodec>>,
        guard: ReplayGuard,
        issuance: Arc<dyn IssuanceLog>,
        metadata: Arc<dyn PostMetadataSource>,
        clock: Arc<dyn Clock>,
        issue_legacy: bool,
        metrics: Arc<FaucetMetrics>,
    ) -> Self {
        Self {
            codec,
            guard,
            issuance,
            metadata,
            clock,
            issue_legacy,
            metrics,
        }
    }

    /// Checks, in order: wallet address, post URL, re-verification limit,
    /// post reuse, post age. Nothing is recorded unless every check passes.
    pub async fn issue(
        &self,
        post_url: &str,
        wallet: &str,
    ) -> Result<IssuedAttestation, ServiceError> {
        let result = self
            .issue_checked(post_url, wallet)
            .instrument(issue_attestation_span(wallet))
            .await;
        match &result {
            Ok(issued) => {
                self.metrics.attestations_issued.inc();
                info!(
                    wallet = %issued.wallet_address,
                    post = %issued.post_id,
                    legacy = issued.legacy,
                    "attestation issued"
                );
            }
            Err(e) => {
                self.metrics
                    .attestations_rejected
                    .with_label_values(&[e.reason().as_str()])
                    .inc();
                info!(wallet = %wallet, reason = %e.reason(), error = %e, "attestation rejected");
            }
        }
        result
    }

    async fn issue_checked(
        &self,
        post_url: &str,
        wallet: &str,
    ) -> Result<IssuedAttestation, ServiceError> {
        let wallet = WalletAddress::parse(wallet).map_err(|e| {
            ServiceError::validation(RejectReason::InvalidWalletAddress, e.to_string())
        })?;
        let post = parse_post_url(post_url)?;

        let codec = match (&self.codec, self.issue_legacy) {
            (_, true) => None,
            (Some(codec), false) => Some(codec),
            (None, false) => {
                return Err(ServiceError::Configuration(
                    "attestation secret not configured".into(),
                ))
            }
        };

        let now = self.clock.now();
        if let Some(last) = self.issuance.last_issuance(&wallet)? {
            if !last.has_expired(REVERIFY_COOLDOWN_MS, now) {
                let remaining = hours_until(last.plus_millis(REVERIFY_COOLDOWN_MS), now);
                return Err(ServiceError::Eligibility {
                    reason: RejectReason::RecentlyVerified,
                    message: format!(
                        "Wallet already verified recently. Try again in {remaining} hours"
                    ),
                    remaining_hours: remaining,
                });
            }
        }

        if self.guard.is_post_used(&post)? {
            return Err(ServiceError::replay(
                RejectReason::PostAlreadyUsed,
                "This post has already been used to claim tokens",
            ));
        }

        let freshness =
            Freshness::evaluate(self.metadata.published_at(post_url).await, now, MAX_POST_AGE_MS);
        if let Freshness::TooOld { age_ms } = freshness {
            return Err(ServiceError::validation(
                RejectReason::PostTooOld,
                format!(
                    "Post must be within the last 24 hours (it is {} hours old)",
                    age_ms / HOUR_MS
                ),
            ));
        }

        let token = match codec {
            Some(codec) => codec.issue(&wallet, &post, now),
            None => self.guard.create_opaque_token(&wallet, &post, now)?,
        };
        self.issuance.record_issuance(&wallet, now)?;

        Ok(IssuedAttestation {
            post_id: post,
            wallet_address: wallet,
            verified_at: now,
            token,
            legacy: codec.is_none(),
        })
    }
}
