//! `x402-paywall` command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Print the resolved classes of a theme preset
//! x402-paywall theme terminal
//!
//! # Query a USDC balance
//! x402-paywall balance 7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU --network solana-devnet
//!
//! # Run one payment with a presigned proof
//! PAYWALL_CONFIG=paywall.toml x402-paywall pay --proof-file proof.json
//!
//! # Configure logging level
//! RUST_LOG=debug x402-paywall pay
//! ```
//!
//! # Environment Variables
//!
//! - `PAYWALL_CONFIG`: Path to TOML configuration file (default: `paywall.toml`)
//! - `PAYWALL_API_ENDPOINT` / `PAYWALL_RPC_URL`: Endpoint overrides
//! - `RUST_LOG`: Log level filter (default: `info`)

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;
use x402_paywall::balance::{BalanceQuery, display_balance};
use x402_paywall::theme::{self, ThemePreset};
use x402_paywall::wallet::ExplicitWallet;
use x402_paywall::{Network, Paywall, Rendered};
use x402_paywall_http::constants::DEFAULT_FACILITATOR_URL;
use x402_paywall_http::{HttpPaymentClient, RpcBalanceQuery};
use x402_paywall_cli::{CliConfig, ConfigLoadError, PresignedWallet};

#[derive(Debug, Parser)]
#[command(name = "x402-paywall", version, about = "Themable x402 paywall for Solana micropayments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resolved class configuration of a theme preset as JSON.
    Theme {
        /// Preset tag (unknown tags resolve to the default theme).
        preset: ThemePreset,

        /// Only print whether the preset is a dark theme.
        #[arg(long)]
        dark_check: bool,
    },

    /// Query the USDC balance of an address.
    Balance {
        /// Base58 wallet address.
        address: String,

        /// Network to query.
        #[arg(long, default_value = "solana-devnet")]
        network: Network,

        /// RPC endpoint (defaults to the network's public endpoint).
        #[arg(long, env = "PAYWALL_RPC_URL")]
        rpc_url: Option<Url>,
    },

    /// Run one payment against the configured endpoint.
    Pay {
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON file holding the presigned payment payload.
        #[arg(long)]
        proof_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("x402-paywall failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Theme { preset, dark_check } => theme_command(preset, dark_check),
        Command::Balance {
            address,
            network,
            rpc_url,
        } => balance_command(&address, network, rpc_url.as_ref()).await,
        Command::Pay { config, proof_file } => pay_command(config, proof_file).await,
    }
}

fn theme_command(preset: ThemePreset, dark_check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout().lock();
    if dark_check {
        writeln!(out, "{}", preset.is_dark())?;
        return Ok(());
    }
    let resolved = serde_json::json!({
        "preset": preset,
        "dark": preset.is_dark(),
        "ambientClass": preset.ambient_class(),
        "classes": theme::resolve(preset),
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&resolved)?)?;
    Ok(())
}

async fn balance_command(
    address: &str,
    network: Network,
    rpc_url: Option<&Url>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = RpcBalanceQuery::new()
        .usdc_balance(address, network, rpc_url)
        .await;
    writeln!(std::io::stdout().lock(), "{} USDC", display_balance(result))?;
    Ok(())
}

async fn pay_command(
    config: Option<PathBuf>,
    proof_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::load(config.as_deref())?;
    if config.paywall.facilitator_url.is_none() {
        config.paywall.facilitator_url = Some(DEFAULT_FACILITATOR_URL.parse()?);
    }
    tracing::info!(
        amount = %config.paywall.amount,
        network = %config.paywall.network,
        theme = %config.paywall.theme,
        facilitator = ?config.paywall.facilitator_url.as_ref().map(Url::as_str),
        "Loaded configuration"
    );

    let address = config
        .wallet
        .address
        .clone()
        .ok_or(ConfigLoadError::Missing("wallet.address"))?;
    let proof_path = proof_file
        .or_else(|| config.wallet.proof_file.clone())
        .ok_or(ConfigLoadError::Missing("wallet.proof_file"))?;
    let wallet = PresignedWallet::from_file(address, &proof_path)?;

    let paywall = config
        .paywall
        .builder()
        .wallet(ExplicitWallet::new(wallet))
        .client(HttpPaymentClient::new())
        .balance_query(RpcBalanceQuery::new())
        .on_wallet_connect(|address| tracing::info!(%address, "Wallet connected"))
        .on_payment_start(|| tracing::info!("Payment started"))
        .on_payment_success(|id, _| tracing::info!(settlement = %id, "Payment settled"))
        .on_payment_error(|e| tracing::warn!(error = %e, "Payment failed"))
        .build()?;

    paywall.refresh_wallet().await;
    if let Rendered::Gate(gate) = paywall.render() {
        tracing::info!(
            title = gate.title,
            button = %gate.button.label,
            balance = %paywall.balance(),
            "Showing paywall"
        );
    }

    paywall.handle_payment().await;

    match paywall.render() {
        Rendered::Content(content) => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "settlement: {}", content.settlement_id)?;
            if let Some(body) = content.response_content {
                writeln!(out, "{body}")?;
            }
            Ok(())
        }
        Rendered::Gate(gate) => Err(gate
            .error
            .unwrap_or_else(|| "payment did not complete".to_owned())
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["x402-paywall", "theme", "seeker-2", "--dark-check"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Theme { preset: ThemePreset::Seeker2, dark_check: true }
        ));

        let cli = Cli::try_parse_from(["x402-paywall", "balance", "Payer111", "--network", "solana"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Balance { network: Network::Solana, .. }
        ));

        let cli = Cli::try_parse_from(["x402-paywall", "pay", "--proof-file", "proof.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Pay { config: None, proof_file: Some(_) }
        ));
    }

    #[test]
    fn test_unknown_theme_is_accepted() {
        let cli = Cli::try_parse_from(["x402-paywall", "theme", "neon"]).unwrap();
        assert!(matches!(cli.command, Command::Theme { preset: ThemePreset::Custom, .. }));
    }
}
