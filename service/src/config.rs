//! Faucet configuration with TOML file support.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::ServiceError;

/// What eligibility reports when no ledger endpoint answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportPolicy {
    /// Report eligible, with a warning.
    #[default]
    FailOpen,
    /// Refuse with a transport error.
    FailClosed,
}

/// What a claim does with a transfer no verification method could find.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnverifiedPolicy {
    #[default]
    AcceptProvisionally,
    Reject,
}

/// Configuration for a faucet instance.
///
/// Loaded from a TOML file via [`FaucetConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public URL of the API, for links and CORS.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Ledger JSON-RPC endpoints, primary first.
    #[serde(default = "default_ledger_endpoints")]
    pub ledger_endpoints: Vec<String>,

    /// Base58 64-byte funding keypair.
    #[serde(default)]
    pub funding_secret: Option<String>,

    /// Lamports sent per claim.
    #[serde(default = "default_claim_amount")]
    pub claim_amount: u64,

    /// HMAC key for attestation tokens. Empty disables issuance and claims.
    #[serde(default)]
    pub attestation_secret: String,

    #[serde(default = "default_attestation_max_age_secs")]
    pub attestation_max_age_secs: u64,

    /// Issue unsigned opaque tokens instead of signed ones.
    #[serde(default)]
    pub issue_legacy_tokens: bool,

    #[serde(default)]
    pub eligibility_transport_policy: TransportPolicy,

    #[serde(default)]
    pub unverified_confirmation_policy: UnverifiedPolicy,

    /// Attempts per confirmation method.
    #[serde(default = "default_confirmation_attempts")]
    pub confirmation_attempts: usize,

    #[serde(default = "default_confirmation_backoff_ms")]
    pub confirmation_backoff_ms: u64,

    #[serde(default = "default_oembed_url")]
    pub oembed_url: String,

    /// Block explorer base; receipts link to `{explorer_base_url}/tx/{signature}`.
    #[serde(default)]
    pub explorer_base_url: Option<String>,

    /// Bearer token for `/admin` routes. Admin routes are disabled without one.
    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_ledger_endpoints() -> Vec<String> {
    vec![
        "https://rpc.gorbagana.wtf".to_string(),
        "https://api.testnet.solana.com".to_string(),
    ]
}

fn default_claim_amount() -> u64 {
    500_000_000
}

fn default_attestation_max_age_secs() -> u64 {
    24 * 60 * 60
}

fn default_confirmation_attempts() -> usize {
    faucet_ledger::confirmation::DEFAULT_ATTEMPTS
}

fn default_confirmation_backoff_ms() -> u64 {
    faucet_ledger::confirmation::DEFAULT_BACKOFF.as_millis() as u64
}

fn default_oembed_url() -> String {
    faucet_attestation::freshness::DEFAULT_OEMBED_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `{base}/tx/{signature}`, or `None` for a blank base.
pub fn explorer_link(base: Option<&str>, signature: &str) -> Option<String> {
    base.map(str::trim)
        .filter(|base| !base.is_empty())
        .map(|base| format!("{}/tx/{signature}", base.trim_end_matches('/')))
}

// ── Impl ───────────────────────────────────────────────────────────────

impl FaucetConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Configuration(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Configuration(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Configuration(e.to_string()))
    }

    /// Reject settings the service cannot start with. Missing secrets are
    /// not errors here; they are reported per request.
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| ServiceError::Configuration(format!("bind_addr: {e}")))?;
        if self.ledger_endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(ServiceError::Configuration(
                "at least one ledger endpoint is required".into(),
            ));
        }
        if self.claim_amount == 0 {
            return Err(ServiceError::Configuration(
                "claim_amount must be positive".into(),
            ));
        }
        if self.attestation_max_age_secs == 0 {
            return Err(ServiceError::Configuration(
                "attestation_max_age_secs must be positive".into(),
            ));
        }
        let max_attempts = faucet_ledger::confirmation::DEFAULT_ATTEMPTS;
        if !(1..=max_attempts).contains(&self.confirmation_attempts) {
            return Err(ServiceError::Configuration(format!(
                "confirmation_attempts must be between 1 and {max_attempts}"
            )));
        }
        Ok(())
    }

    /// Explorer link for a transaction, when an explorer is configured.
    pub fn explorer_url(&self, signature: &str) -> Option<String> {
        explorer_link(self.explorer_base_url.as_deref(), signature)
    }
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            ledger_endpoints: default_ledger_endpoints(),
            funding_secret: None,
            claim_amount: default_claim_amount(),
            attestation_secret: String::new(),
            attestation_max_age_secs: default_attestation_max_age_secs(),
            issue_legacy_tokens: false,
            eligibility_transport_policy: TransportPolicy::default(),
            unverified_confirmation_policy: UnverifiedPolicy::default(),
            confirmation_attempts: default_confirmation_attempts(),
            confirmation_backoff_ms: default_confirmation_backoff_ms(),
            oembed_url: default_oembed_url(),
            explorer_base_url: None,
            admin_token: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}

impl std::fmt::Debug for FaucetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |set: bool| if set { "<redacted>" } else { "<unset>" };
        f.debug_struct("FaucetConfig")
            .field("bind_addr", &self.bind_addr)
            .field("public_base_url", &self.public_base_url)
            .field("ledger_endpoints", &self.ledger_endpoints)
            .field("funding_secret", &redact(self.funding_secret.is_some()))
            .field("claim_amount", &self.claim_amount)
            .field(
                "attestation_secret",
                &redact(!self.attestation_secret.is_empty()),
            )
            .field("attestation_max_age_secs", &self.attestation_max_age_secs)
            .field("issue_legacy_tokens", &self.issue_legacy_tokens)
            .field(
                "eligibility_transport_policy",
                &self.eligibility_transport_policy,
            )
            .field(
                "unverified_confirmation_policy",
                &self.unverified_confirmation_policy,
            )
            .field("confirmation_attempts", &self.confirmation_attempts)
            .field("confirmation_backoff_ms", &self.confirmation_backoff_ms)
            .field("oembed_url", &self.oembed_url)
            .field("explorer_base_url", &self.explorer_base_url)
            .field("admin_token", &redact(self.admin_token.is_some()))
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .field("enable_metrics", &self.enable_metrics)
            .finish()
    }
}
