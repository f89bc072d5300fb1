//! Shared wiring for the service integration tests: a service over null
//! infrastructure with a controllable clock.

#![allow(dead_code)]

use std::sync::Arc;

use faucet_attestation::AttestationCodec;
use faucet_crypto::FundingKeypair;
use faucet_ledger::LedgerRpc;
use faucet_nullables::{NullClock, NullLedger, NullPostMetadata};
use faucet_service::{FaucetConfig, FaucetService, ServiceDeps, Stores};
use faucet_types::{PostId, Timestamp, WalletAddress};

pub const T0: Timestamp = Timestamp::from_millis(1_750_000_000_000);
pub const CLAIM: u64 = 500_000_000;
pub const SECRET: &str = "integration-secret";
pub const POST_URL: &str = "https://x.com/alice/status/1790000000000000001";
pub const OTHER_POST_URL: &str = "https://twitter.com/bob/status/1790000000000000002";

pub struct Harness {
    pub service: Arc<FaucetService>,
    pub ledger: Arc<NullLedger>,
    pub clock: Arc<NullClock>,
    pub metadata: Arc<NullPostMetadata>,
    pub stores: Stores,
    pub funder: FundingKeypair,
}

pub fn wallet(seed: u8) -> WalletAddress {
    FundingKeypair::from_seed(&[seed; 32]).address()
}

pub fn funder() -> FundingKeypair {
    FundingKeypair::from_seed(&[200; 32])
}

pub fn post_id(url: &str) -> PostId {
    faucet_attestation::parse_post_url(url).unwrap()
}

pub fn codec() -> AttestationCodec {
    AttestationCodec::new(SECRET)
}

pub fn test_config() -> FaucetConfig {
    FaucetConfig {
        ledger_endpoints: vec!["null://primary".into()],
        funding_secret: Some(funder().to_base58_secret().to_string()),
        attestation_secret: SECRET.into(),
        confirmation_backoff_ms: 0,
        admin_token: Some("let-me-in".into()),
        explorer_base_url: Some("https://explorer.test".into()),
        ..FaucetConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(adjust: impl FnOnce(&mut FaucetConfig)) -> Harness {
    let mut config = test_config();
    adjust(&mut config);
    let clock = Arc::new(NullClock::new(T0));
    let ledger = Arc::new(NullLedger::new("primary").with_clock(clock.clone()));
    build(config, clock, vec![ledger])
}

/// A service over several ledgers, primary first.
pub fn build(
    config: FaucetConfig,
    clock: Arc<NullClock>,
    ledgers: Vec<Arc<NullLedger>>,
) -> Harness {
    let funder = funder();
    let primary = ledgers[0].clone();
    primary.set_balance(&funder.address(), 100 * CLAIM);
    let metadata = Arc::new(NullPostMetadata::new());
    let stores = Stores::in_memory();
    let deps = ServiceDeps {
        endpoints: ledgers
            .into_iter()
            .map(|l| l as Arc<dyn LedgerRpc>)
            .collect(),
        metadata: metadata.clone(),
        clock: clock.clone(),
        stores: stores.clone(),
    };
    let service = FaucetService::new(config, deps).unwrap();
    Harness {
        service: Arc::new(service),
        ledger: primary,
        clock,
        metadata,
        stores,
        funder,
    }
}

impl Harness {
    /// Issue an attestation for `wallet` on `post_url` and return its token.
    pub async fn attest(&self, post_url: &str, wallet: &WalletAddress) -> String {
        self.service
            .issue_attestation(post_url, wallet.as_str())
            .await
            .unwrap()
            .token
    }
}
