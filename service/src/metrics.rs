//! Prometheus metrics for the faucet.
//!
//! [`FaucetMetrics`] owns a dedicated [`Registry`] that the API's `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct FaucetMetrics {
    pub registry: Registry,

    // ── Attestations ────────────────────────────────────────────────────
    pub attestations_issued: IntCounter,
    /// Rejected issuance attempts, by reason code.
    pub attestations_rejected: IntCounterVec,

    // ── Claims ──────────────────────────────────────────────────────────
    pub claims_succeeded: IntCounter,
    /// Claims accepted without positive confirmation.
    pub claims_provisional: IntCounter,
    /// Rejected claims, by reason code.
    pub claims_rejected: IntCounterVec,

    // ── Eligibility ─────────────────────────────────────────────────────
    pub eligibility_cache_hits: IntCounter,
    pub eligibility_cache_misses: IntCounter,
    /// Eligibility answers given without any ledger endpoint responding.
    pub eligibility_fail_open: IntCounter,

    // ── Confirmation ────────────────────────────────────────────────────
    /// Verification runs, by deciding method and outcome.
    pub confirmations: IntCounterVec,
    /// Time from dispatch start to submission accepted, in milliseconds.
    pub dispatch_latency_ms: Histogram,
}

impl FaucetMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    ///
    /// Registration only fails on duplicate names, which a fresh registry
    /// cannot have.
    pub fn new() -> Self {
        let registry = Registry::new();

        let attestations_issued = register_int_counter_with_registry!(
            Opts::new("faucet_attestations_issued_total", "Attestation tokens issued"),
            registry
        )
        .expect("failed to register attestations_issued counter");

        let attestations_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "faucet_attestations_rejected_total",
                "Attestation requests rejected"
            ),
            &["reason"],
            registry
        )
        .expect("failed to register attestations_rejected counter");

        let claims_succeeded = register_int_counter_with_registry!(
            Opts::new("faucet_claims_succeeded_total", "Claims recorded"),
            registry
        )
        .expect("failed to register claims_succeeded counter");

        let claims_provisional = register_int_counter_with_registry!(
            Opts::new(
                "faucet_claims_provisional_total",
                "Claims recorded without positive confirmation"
            ),
            registry
        )
        .expect("failed to register claims_provisional counter");

        let claims_rejected = register_int_counter_vec_with_registry!(
            Opts::new("faucet_claims_rejected_total", "Claims rejected"),
            &["reason"],
            registry
        )
        .expect("failed to register claims_rejected counter");

        let eligibility_cache_hits = register_int_counter_with_registry!(
            Opts::new(
                "faucet_eligibility_cache_hits_total",
                "Eligibility answers served from cache"
            ),
            registry
        )
        .expect("failed to register eligibility_cache_hits counter");

        let eligibility_cache_misses = register_int_counter_with_registry!(
            Opts::new(
                "faucet_eligibility_cache_misses_total",
                "Eligibility answers computed from the ledger"
            ),
            registry
        )
        .expect("failed to register eligibility_cache_misses counter");

        let eligibility_fail_open = register_int_counter_with_registry!(
            Opts::new(
                "faucet_eligibility_fail_open_total",
                "Eligibility checks answered without the ledger"
            ),
            registry
        )
        .expect("failed to register eligibility_fail_open counter");

        let confirmations = register_int_counter_vec_with_registry!(
            Opts::new("faucet_confirmations_total", "Transaction verification runs"),
            &["method", "outcome"],
            registry
        )
        .expect("failed to register confirmations counter");

        // 1 ms → ~16 s.
        let buckets = prometheus::exponential_buckets(1.0, 2.0, 15).unwrap_or_default();
        let dispatch_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "faucet_dispatch_latency_ms",
                "Transfer dispatch latency in milliseconds"
            )
            .buckets(buckets),
            registry
        )
        .expect("failed to register dispatch_latency_ms histogram");

        Self {
            registry,
            attestations_issued,
            attestations_rejected,
            claims_succeeded,
            claims_provisional,
            claims_rejected,
            eligibility_cache_hits,
            eligibility_cache_misses,
            eligibility_fail_open,
            confirmations,
            dispatch_latency_ms,
        }
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for FaucetMetrics {
    fn default() -> Self {
        Self::new()
    }
}
