//! The faucet service: every boundary operation over one set of components.

use std::sync::Arc;
use std::time::Duration;

use faucet_attestation::{AttestationCodec, OEmbedClient, PostMetadataSource, ReplayGuard};
use faucet_ledger::{
    ConfirmationVerifier, FundingCredential, JsonRpcClient, LedgerRpc, TransferDispatcher,
    TransferScanner, VerificationReport,
};
use faucet_store::{ClaimHistoryStore, IssuanceLog, LegacyTokenStore, MemoryStore, PostUsageStore};
use faucet_types::{Clock, Lamports, PostId, SystemClock, TxSignature, WalletAddress};
use tracing::{info, warn};

use crate::claim::{outcome_label, ClaimOrchestrator, ClaimReceipt, ClaimSettings};
use crate::config::FaucetConfig;
use crate::eligibility::{Eligibility, EligibilityResolver};
use crate::endpoints::LedgerEndpoints;
use crate::error::RejectReason;
use crate::history::{ClaimHistory, HistoryView};
use crate::issuance::{AttestationIssuer, IssuedAttestation};
use crate::metrics::FaucetMetrics;
use crate::ServiceError;

/// Storage behind the service.
#[derive(Clone)]
pub struct Stores {
    pub posts: Arc<dyn PostUsageStore>,
    pub legacy: Arc<dyn LegacyTokenStore>,
    pub claims: Arc<dyn ClaimHistoryStore>,
    pub issuance: Arc<dyn IssuanceLog>,
}

impl Stores {
    /// Process-lifetime maps.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            posts: store.clone(),
            legacy: store.clone(),
            claims: store.clone(),
            issuance: store,
        }
    }
}

/// The outside world as the service sees it.
pub struct ServiceDeps {
    /// Primary first.
    pub endpoints: Vec<Arc<dyn LedgerRpc>>,
    pub metadata: Arc<dyn PostMetadataSource>,
    pub clock: Arc<dyn Clock>,
    pub stores: Stores,
}

impl ServiceDeps {
    /// Real HTTP clients for every configured endpoint, the system clock and
    /// in-memory stores.
    pub fn from_config(config: &FaucetConfig) -> Self {
        let endpoints = config
            .ledger_endpoints
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(|url| Arc::new(JsonRpcClient::new(url)) as Arc<dyn LedgerRpc>)
            .collect();
        Self {
            endpoints,
            metadata: Arc::new(OEmbedClient::new(config.oembed_url.clone())),
            clock: Arc::new(SystemClock),
            stores: Stores::in_memory(),
        }
    }
}

/// Answer to a status request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaucetStatus {
    pub faucet_configured: bool,
    pub faucet_address: Option<WalletAddress>,
    pub balance: Option<Lamports>,
    /// Why the balance is missing, when the lookup failed.
    pub balance_error: Option<String>,
    pub ledger_endpoint: String,
    pub claim_amount: Lamports,
    pub total_claims: u64,
}

pub struct FaucetService {
    config: FaucetConfig,
    endpoints: Arc<LedgerEndpoints>,
    guard: ReplayGuard,
    claims: Arc<dyn ClaimHistoryStore>,
    issuer: AttestationIssuer,
    eligibility: Arc<EligibilityResolver>,
    history: Arc<HistoryView>,
    dispatcher: Arc<TransferDispatcher>,
    verifier: Arc<ConfirmationVerifier>,
    orchestrator: ClaimOrchestrator,
    metrics: Arc<FaucetMetrics>,
}

impl FaucetService {
    pub fn new(config: FaucetConfig, deps: ServiceDeps) -> Result<Self, ServiceError> {
        config.validate()?;
        let ServiceDeps {
            endpoints,
            metadata,
            clock,
            stores,
        } = deps;

        let endpoints = Arc::new(LedgerEndpoints::new(endpoints)?);
        let metrics = Arc::new(FaucetMetrics::new());
        let amount = Lamports::new(config.claim_amount);
        let scanner = TransferScanner::new(amount);

        let codec = if config.attestation_secret.is_empty() {
            warn!("no attestation secret configured, signed tokens disabled");
            None
        } else {
            Some(Arc::new(
                AttestationCodec::new(config.attestation_secret.as_bytes())
                    .with_max_age(Duration::from_secs(config.attestation_max_age_secs)),
            ))
        };

        let credential = FundingCredential::from_secret(config.funding_secret.as_deref());
        match &credential {
            FundingCredential::Loaded(kp) => info!(address = %kp.address(), "funding account loaded"),
            FundingCredential::Missing => warn!("no funding secret configured, claims disabled"),
            FundingCredential::Invalid(reason) => {
                warn!(reason = %reason, "funding secret undecodable, claims disabled")
            }
        }

        let guard = ReplayGuard::new(stores.posts.clone(), stores.legacy.clone());
        let eligibility = Arc::new(EligibilityResolver::new(
            endpoints.clone(),
            scanner,
            stores.claims.clone(),
            clock.clone(),
            config.eligibility_transport_policy,
            metrics.clone(),
        ));
        let history = Arc::new(HistoryView::new(
            endpoints.clone(),
            scanner,
            stores.claims.clone(),
            clock.clone(),
        ));
        let dispatcher = Arc::new(TransferDispatcher::new(
            endpoints.primary().clone(),
            credential,
        ));
        let verifier = Arc::new(ConfirmationVerifier::with_schedule(
            endpoints.primary().clone(),
            config.confirmation_attempts,
            Duration::from_millis(config.confirmation_backoff_ms),
        ));
        let issuer = AttestationIssuer::new(
            codec.clone(),
            guard.clone(),
            stores.issuance.clone(),
            metadata,
            clock.clone(),
            config.issue_legacy_tokens,
            metrics.clone(),
        );
        let orchestrator = ClaimOrchestrator::new(
            codec,
            guard.clone(),
            eligibility.clone(),
            history.clone(),
            dispatcher.clone(),
            verifier.clone(),
            stores.claims.clone(),
            clock,
            metrics.clone(),
            ClaimSettings {
                amount,
                unverified_policy: config.unverified_confirmation_policy,
                explorer_base_url: config.explorer_base_url.clone(),
            },
        );

        info!(
            endpoints = endpoints.len(),
            claim_amount = amount.raw(),
            policy = ?config.eligibility_transport_policy,
            "faucet service ready"
        );

        Ok(Self {
            config,
            endpoints,
            guard,
            claims: stores.claims,
            issuer,
            eligibility,
            history,
            dispatcher,
            verifier,
            orchestrator,
            metrics,
        })
    }

    /// Build a service talking to the configured endpoints.
    pub fn from_config(config: FaucetConfig) -> Result<Self, ServiceError> {
        let deps = ServiceDeps::from_config(&config);
        Self::new(config, deps)
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<FaucetMetrics> {
        &self.metrics
    }

    pub async fn issue_attestation(
        &self,
        post_url: &str,
        wallet: &str,
    ) -> Result<IssuedAttestation, ServiceError> {
        self.issuer.issue(post_url, wallet).await
    }

    pub async fn claim(
        &self,
        wallet: &str,
        token: Option<&str>,
    ) -> Result<ClaimReceipt, ServiceError> {
        self.orchestrator.claim(wallet, token).await
    }

    pub async fn check_eligibility(
        &self,
        wallet: &str,
        force_refresh: bool,
    ) -> Result<Eligibility, ServiceError> {
        let wallet = parse_wallet(wallet)?;
        self.eligibility.check(&wallet, force_refresh).await
    }

    pub async fn history(&self, wallet: &str) -> Result<ClaimHistory, ServiceError> {
        let wallet = parse_wallet(wallet)?;
        self.history.get(&wallet).await
    }

    /// Run the confirmation methods against the primary endpoint.
    pub async fn verify_transaction(
        &self,
        signature: &str,
        wallet: &str,
    ) -> Result<VerificationReport, ServiceError> {
        let signature = TxSignature::parse(signature).map_err(|e| {
            ServiceError::validation(RejectReason::InvalidSignature, e.to_string())
        })?;
        let wallet = parse_wallet(wallet)?;
        let report = self.verifier.verify(&signature, &wallet).await;
        self.metrics
            .confirmations
            .with_label_values(&[
                report.method.map(|m| m.as_str()).unwrap_or("none"),
                outcome_label(report.outcome()),
            ])
            .inc();
        Ok(report)
    }

    /// Funding account, balance and settings. A failed balance lookup is
    /// reported in the answer.
    pub async fn status(&self) -> FaucetStatus {
        let faucet_address = self.dispatcher.credential().address();
        let (balance, balance_error) = match &faucet_address {
            Some(address) => match self.endpoints.primary().get_balance(address).await {
                Ok(balance) => (Some(balance), None),
                Err(e) => {
                    warn!(error = %e, "funding balance lookup failed");
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };
        let total_claims = self.claims.claim_count().unwrap_or_else(|e| {
            warn!(error = %e, "claim count unavailable");
            0
        });
        FaucetStatus {
            faucet_configured: faucet_address.is_some(),
            faucet_address,
            balance,
            balance_error,
            ledger_endpoint: self.endpoints.primary().endpoint().to_string(),
            claim_amount: Lamports::new(self.config.claim_amount),
            total_claims,
        }
    }

    /// Whether `token` is the configured admin token. Always false when
    /// admin access is disabled.
    pub fn is_admin(&self, token: &str) -> bool {
        match self.config.admin_token.as_deref().map(str::trim) {
            Some(expected) if !expected.is_empty() => {
                faucet_crypto::secrets_equal(expected.as_bytes(), token.trim().as_bytes())
            }
            _ => false,
        }
    }

    pub fn admin_enabled(&self) -> bool {
        self.config
            .admin_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Forget a post's usage so it can back a claim again.
    pub fn reset_post(&self, post_id: &str) -> Result<bool, ServiceError> {
        let post = PostId::parse(post_id).map_err(|e| {
            ServiceError::validation(RejectReason::InvalidPostUrl, e.to_string())
        })?;
        Ok(self.guard.reset_post(&post)?)
    }
}

fn parse_wallet(wallet: &str) -> Result<WalletAddress, ServiceError> {
    WalletAddress::parse(wallet)
        .map_err(|e| ServiceError::validation(RejectReason::InvalidWalletAddress, e.to_string()))
}
