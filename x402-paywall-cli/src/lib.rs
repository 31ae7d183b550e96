//! Command-line driver for the x402 paywall.
//!
//! Builds a [`Paywall`](x402_paywall::Paywall) from a TOML file and a
//! presigned wallet, inspects themes, and queries USDC balances.
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment variable expansion
//! - [`error`]: Configuration loading errors
//! - [`wallet`]: [`PresignedWallet`](wallet::PresignedWallet)

pub mod config;
pub mod error;
pub mod wallet;

pub use config::CliConfig;
pub use error::ConfigLoadError;
pub use wallet::PresignedWallet;
