//! Faucet service: orchestrates attestation, eligibility and the claim pipeline.
//!
//! [`FaucetService`] composes the components and exposes the boundary
//! operations:
//! - [`AttestationIssuer`] turns a post URL and a wallet into a token
//! - [`EligibilityResolver`] decides whether a wallet's cooldown has passed
//! - [`ClaimOrchestrator`] runs reserve → eligibility → dispatch → confirm → record
//! - [`HistoryView`] merges local claim records with ledger transfers

pub mod cache;
pub mod claim;
pub mod config;
pub mod eligibility;
pub mod endpoints;
pub mod error;
pub mod history;
pub mod issuance;
pub mod logging;
pub mod metrics;
pub mod service;
pub mod shutdown;
pub mod tracing_spans;
pub mod wallet_locks;

pub use cache::{TtlCache, CACHE_TTL_MS};
pub use claim::{ClaimOrchestrator, ClaimReceipt, ClaimSettings, ClaimStage};
pub use config::{FaucetConfig, TransportPolicy, UnverifiedPolicy};
pub use eligibility::{
    Eligibility, EligibilityResolver, CLAIM_COOLDOWN_MS, LEDGER_UNAVAILABLE_WARNING,
};
pub use endpoints::LedgerEndpoints;
pub use error::{RejectReason, ServiceError};
pub use history::{merge_records, ClaimHistory, HistoryView};
pub use issuance::{AttestationIssuer, IssuedAttestation};
pub use logging::{init_logging, LogFormat};
pub use metrics::FaucetMetrics;
pub use service::{FaucetService, FaucetStatus, ServiceDeps, Stores};
pub use shutdown::ShutdownController;
pub use wallet_locks::WalletLocks;
