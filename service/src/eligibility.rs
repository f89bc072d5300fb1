//! Eligibility Resolver: may this wallet claim now?
//!
//! The last claim time is the later of the most recent faucet-like transfer
//! found on the ledger and the wallet's local claim records. A wallet may
//! claim once that time is at least 24 hours old.

use std::sync::Arc;

use faucet_ledger::TransferScanner;
use faucet_store::ClaimHistoryStore;
use faucet_types::{Clock, Timestamp, WalletAddress, HOUR_MS};
use tracing::{debug, info, warn, Instrument};

use crate::cache::TtlCache;
use crate::config::TransportPolicy;
use crate::endpoints::LedgerEndpoints;
use crate::metrics::FaucetMetrics;
use crate::tracing_spans::eligibility_span;
use crate::ServiceError;

/// Minimum interval between two claims of one wallet.
pub const CLAIM_COOLDOWN_MS: u64 = 24 * HOUR_MS;

/// Warning attached to answers given without the ledger.
pub const LEDGER_UNAVAILABLE_WARNING: &str = "ledger_unavailable";

/// Whole hours from `now` until `until`, rounded up.
pub fn hours_until(until: Timestamp, now: Timestamp) -> u64 {
    until.as_millis().saturating_sub(now.as_millis()).div_ceil(HOUR_MS)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub last_claim_time: Option<Timestamp>,
    /// When the cooldown ends; `None` while eligible.
    pub next_claim_time: Option<Timestamp>,
    pub remaining_hours: Option<u64>,
    pub message: String,
    /// Set when the ledger could not be consulted.
    pub warning: Option<String>,
    pub checked_at: Timestamp,
}

impl Eligibility {
    /// Apply the cooldown rule to a last claim time.
    pub fn evaluate(last_claim_time: Option<Timestamp>, now: Timestamp) -> Self {
        let Some(last) = last_claim_time else {
            return Self::eligible(None, now);
        };
        if last.has_expired(CLAIM_COOLDOWN_MS, now) {
            return Self::eligible(Some(last), now);
        }
        let next = last.plus_millis(CLAIM_COOLDOWN_MS);
        let remaining = hours_until(next, now);
        Self {
            eligible: false,
            last_claim_time: Some(last),
            next_claim_time: Some(next),
            remaining_hours: Some(remaining),
            message: format!("Wallet must wait {remaining} hours before claiming again"),
            warning: None,
            checked_at: now,
        }
    }

    fn eligible(last_claim_time: Option<Timestamp>, now: Timestamp) -> Self {
        Self {
            eligible: true,
            last_claim_time,
            next_claim_time: None,
            remaining_hours: None,
            message: "Wallet is eligible to claim tokens".to_string(),
            warning: None,
            checked_at: now,
        }
    }

    fn fail_open(last_claim_time: Option<Timestamp>, now: Timestamp) -> Self {
        Self {
            message: "Eligibility check failed due to network issues, allowing claim".to_string(),
            warning: Some(LEDGER_UNAVAILABLE_WARNING.to_string()),
            ..Self::eligible(last_claim_time, now)
        }
    }
}

pub struct EligibilityResolver {
    endpoints: Arc<LedgerEndpoints>,
    scanner: TransferScanner,
    claims: Arc<dyn ClaimHistoryStore>,
    clock: Arc<dyn Clock>,
    policy: TransportPolicy,
    cache: TtlCache<Eligibility>,
    metrics: Arc<FaucetMetrics>,
}

impl EligibilityResolver {
    pub fn new(
        endpoints: Arc<LedgerEndpoints>,
        scanner: TransferScanner,
        claims: Arc<dyn ClaimHistoryStore>,
        clock: Arc<dyn Clock>,
        policy: TransportPolicy,
        metrics: Arc<FaucetMetrics>,
    ) -> Self {
        Self {
            endpoints,
            scanner,
            claims,
            clock,
            policy,
            cache: TtlCache::default(),
            metrics,
        }
    }

    /// Eligibility of `wallet`. A cached answer younger than 30 s is returned
    /// as is unless `force_refresh` is set.
    pub async fn check(
        &self,
        wallet: &WalletAddress,
        force_refresh: bool,
    ) -> Result<Eligibility, ServiceError> {
        self.resolve(wallet, force_refresh)
            .instrument(eligibility_span(wallet.as_str(), force_refresh))
            .await
    }

    /// Drop the cached answer for `wallet`.
    pub fn invalidate(&self, wallet: &WalletAddress) {
        self.cache.invalidate(wallet);
    }

    async fn resolve(
        &self,
        wallet: &WalletAddress,
        force_refresh: bool,
    ) -> Result<Eligibility, ServiceError> {
        let now = self.clock.now();
        if !force_refresh {
            if let Some(cached) = self.cache.get(wallet, now) {
                self.metrics.eligibility_cache_hits.inc();
                debug!(eligible = cached.eligible, "eligibility served from cache");
                return Ok(cached);
            }
        }
        self.metrics.eligibility_cache_misses.inc();

        let local_last = self.claims.last_claim_time(wallet)?;

        let result = match self.endpoints.scan_history(&self.scanner, wallet, now).await {
            Ok(transfers) => {
                let ledger_last = transfers.first().map(|r| r.timestamp);
                Eligibility::evaluate(ledger_last.max(local_last), now)
            }
            Err(e) => {
                let local = Eligibility::evaluate(local_last, now);
                if !local.eligible {
                    warn!(error = %e, "ledger unavailable, local claim record applies");
                    Eligibility {
                        warning: Some(LEDGER_UNAVAILABLE_WARNING.to_string()),
                        ..local
                    }
                } else {
                    match self.policy {
                        TransportPolicy::FailOpen => {
                            self.metrics.eligibility_fail_open.inc();
                            warn!(error = %e, "every ledger endpoint failed, allowing claim");
                            Eligibility::fail_open(local_last, now)
                        }
                        TransportPolicy::FailClosed => {
                            warn!(error = %e, "every ledger endpoint failed, refusing");
                            return Err(ServiceError::transport(format!(
                                "eligibility could not be checked: {e}"
                            )));
                        }
                    }
                }
            }
        };

        info!(
            eligible = result.eligible,
            remaining_hours = result.remaining_hours,
            "eligibility resolved"
        );
        self.cache.insert(wallet, result.clone(), now);
        Ok(result)
    }
}
