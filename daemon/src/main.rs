//! Faucet daemon: entry point for running the claim service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use faucet_crypto::FundingKeypair;
use faucet_service::{
    init_logging, FaucetConfig, FaucetService, LogFormat, ShutdownController, TransportPolicy,
    UnverifiedPolicy,
};

/// Secrets are read from the environment or the config file, never from flags.
const FUNDING_SECRET_ENV: &str = "FAUCET_FUNDING_SECRET";
const ATTESTATION_SECRET_ENV: &str = "FAUCET_ATTESTATION_SECRET";
const ADMIN_TOKEN_ENV: &str = "FAUCET_ADMIN_TOKEN";

#[derive(Parser)]
#[command(name = "faucet-daemon", about = "Social-attestation token faucet")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// env vars and CLI flags override them.
    #[arg(long, env = "FAUCET_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "FAUCET_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Ledger JSON-RPC endpoints, primary first (comma-separated).
    #[arg(long, env = "FAUCET_LEDGER_ENDPOINTS", value_delimiter = ',')]
    ledger_endpoints: Vec<String>,

    /// Lamports sent per claim.
    #[arg(long, env = "FAUCET_CLAIM_AMOUNT")]
    claim_amount: Option<u64>,

    /// Eligibility when every ledger endpoint fails: "fail_open" or "fail_closed".
    #[arg(long, env = "FAUCET_TRANSPORT_POLICY")]
    transport_policy: Option<String>,

    /// Transfers no method could confirm: "accept_provisionally" or "reject".
    #[arg(long, env = "FAUCET_UNVERIFIED_POLICY")]
    unverified_policy: Option<String>,

    /// Issue opaque legacy tokens instead of signed ones.
    #[arg(long, env = "FAUCET_LEGACY_TOKENS")]
    legacy_tokens: bool,

    /// Block explorer base URL for receipt links.
    #[arg(long, env = "FAUCET_EXPLORER_URL")]
    explorer_url: Option<String>,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "FAUCET_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "FAUCET_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FAUCET_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the faucet HTTP server.
    Run,
    /// Print the effective configuration (secrets redacted) and exit.
    ShowConfig,
    /// Generate a funding keypair and print its address and secret.
    Keygen,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Keygen => {
            let keypair = FundingKeypair::generate().context("failed to generate keypair")?;
            println!("address: {}", keypair.address());
            println!("secret:  {}", keypair.to_base58_secret().as_str());
        }
        Command::ShowConfig => {
            let config = load_config(&cli)?;
            println!("{config:#?}");
        }
        Command::Run => {
            let config = load_config(&cli)?;
            run(config, &cli).await?;
        }
    }

    Ok(())
}

async fn run(config: FaucetConfig, cli: &Cli) -> anyhow::Result<()> {
    init_logging(config.log_format, &config.log_level).context("failed to initialise logging")?;
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }
    config.validate().context("invalid configuration")?;
    tracing::info!(
        bind = %config.bind_addr,
        primary = config.ledger_endpoints.first().map(String::as_str).unwrap_or("-"),
        claim_amount = config.claim_amount,
        "starting faucet"
    );

    let service =
        Arc::new(FaucetService::from_config(config).context("failed to build faucet service")?);
    let shutdown = ShutdownController::new();
    let server = faucet_api::serve(service, &shutdown);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("http server failed")?,
        _ = shutdown.wait_for_signal() => {
            tracing::info!("shutdown signal received, draining requests");
            server.await.context("http server failed while draining")?;
        }
    }
    tracing::info!("faucet daemon exited cleanly");
    Ok(())
}

/// Defaults, then the config file, then env secrets, then flags and env vars.
fn load_config(cli: &Cli) -> anyhow::Result<FaucetConfig> {
    let mut config = match &cli.config {
        Some(path) => FaucetConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => FaucetConfig::default(),
    };

    if let Some(secret) = env_secret(FUNDING_SECRET_ENV) {
        config.funding_secret = Some(secret);
    }
    if let Some(secret) = env_secret(ATTESTATION_SECRET_ENV) {
        config.attestation_secret = secret;
    }
    if let Some(token) = env_secret(ADMIN_TOKEN_ENV) {
        config.admin_token = Some(token);
    }

    if let Some(addr) = &cli.bind_addr {
        config.bind_addr = addr.clone();
    }
    if !cli.ledger_endpoints.is_empty() {
        config.ledger_endpoints = cli.ledger_endpoints.clone();
    }
    if let Some(amount) = cli.claim_amount {
        config.claim_amount = amount;
    }
    if let Some(policy) = &cli.transport_policy {
        config.eligibility_transport_policy = match policy.as_str() {
            "fail_open" => TransportPolicy::FailOpen,
            "fail_closed" => TransportPolicy::FailClosed,
            other => anyhow::bail!("unknown transport policy {other:?}"),
        };
    }
    if let Some(policy) = &cli.unverified_policy {
        config.unverified_confirmation_policy = match policy.as_str() {
            "accept_provisionally" => UnverifiedPolicy::AcceptProvisionally,
            "reject" => UnverifiedPolicy::Reject,
            other => anyhow::bail!("unknown unverified policy {other:?}"),
        };
    }
    config.issue_legacy_tokens |= cli.legacy_tokens;
    if let Some(url) = &cli.explorer_url {
        config.explorer_base_url = Some(url.clone());
    }
    config.enable_metrics |= cli.metrics;
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_addr = \"127.0.0.1:4000\"\nclaim_amount = 7\nlog_level = \"debug\""
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "faucet-daemon",
            "--config",
            path.as_str(),
            "--claim-amount",
            "9",
            "--transport-policy",
            "fail_closed",
            "--ledger-endpoints",
            "http://a,http://b",
            "run",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:4000");
        assert_eq!(config.claim_amount, 9);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.eligibility_transport_policy, TransportPolicy::FailClosed);
        assert_eq!(config.ledger_endpoints, vec!["http://a", "http://b"]);
    }

    #[test]
    fn unknown_policy_is_an_error() {
        let cli =
            Cli::try_parse_from(["faucet-daemon", "--unverified-policy", "maybe", "show-config"])
                .unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "faucet-daemon",
            "--config",
            "/definitely/not/here.toml",
            "run",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
