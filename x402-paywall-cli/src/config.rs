//! CLI configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! [paywall]
//! amount = "0.01"
//! description = "Premium article"
//! network = "solana-devnet"
//! theme = "terminal"
//! api_endpoint = "https://x402.payai.network/api/solana-devnet/paid-content"
//!
//! [wallet]
//! address = "$PAYER_ADDRESS"
//! proof_file = "proof.json"
//! ```
//!
//! # Environment Variables
//!
//! - `PAYWALL_CONFIG`: Path to configuration file (default: `paywall.toml`)
//! - `PAYWALL_API_ENDPOINT`: Override the paid-content endpoint
//! - `PAYWALL_RPC_URL`: Override the Solana RPC endpoint
//! - Any variable referenced by `$VAR` in the config file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;
use x402_paywall::config::PaywallSettings;

use crate::error::ConfigLoadError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "paywall.toml";

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Paywall settings passed to the builder.
    pub paywall: PaywallSettings,

    /// Presigned wallet used by `pay`.
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Presigned wallet settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Payer address reported to the paywall.
    #[serde(default)]
    pub address: Option<String>,

    /// JSON file holding the signed payment payload.
    #[serde(default)]
    pub proof_file: Option<PathBuf>,
}

impl CliConfig {
    /// Loads configuration from `path`, or from `PAYWALL_CONFIG`, falling
    /// back to `paywall.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if the file cannot be read or parsed, or
    /// an environment override is not a valid URL.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let path = path.map_or_else(
            || {
                std::env::var("PAYWALL_CONFIG")
                    .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
            },
            Path::to_path_buf,
        );
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lookup = |name: &str| std::env::var(name).ok();
        let mut config = Self::parse_with(&content, lookup)?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Parses TOML `content`, expanding variables through `lookup`.
    fn parse_with(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigLoadError> {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Applies `PAYWALL_API_ENDPOINT` / `PAYWALL_RPC_URL` overrides.
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigLoadError> {
        if let Some(url) = override_url("PAYWALL_API_ENDPOINT", &lookup)? {
            self.paywall.api_endpoint = Some(url);
        }
        if let Some(url) = override_url("PAYWALL_RPC_URL", &lookup)? {
            self.paywall.rpc_url = Some(url);
        }
        Ok(())
    }
}

fn override_url(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<Url>, ConfigLoadError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse().map_err(|source| ConfigLoadError::InvalidUrl { var, source }))
        .transpose()
}

/// Expands `$VAR` and `${VAR}` patterns in a string through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        let value = if name.is_empty() { None } else { lookup(&name) };
        match value {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;
    use x402_paywall::networks::Network;
    use x402_paywall::theme::ThemePreset;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = env(&[("PAYER", "7xKX"), ("HOST", "merchant.example")]);
        assert_eq!(expand_env_vars("a=$PAYER;", &lookup), "a=7xKX;");
        assert_eq!(expand_env_vars("https://${HOST}/paid", &lookup), "https://merchant.example/paid");
        assert_eq!(expand_env_vars("$MISSING and ${ALSO}", &lookup), "$MISSING and ${ALSO}");
        assert_eq!(expand_env_vars("cost: $ 5", &lookup), "cost: $ 5");
    }

    #[test]
    fn test_parse_config_with_variables() {
        let toml = r#"
            [paywall]
            amount = "0.25"
            description = "Premium article"
            network = "solana"
            theme = "terminal"
            max_payment_amount = 1

            [paywall.class_names]
            button = "rounded-none"

            [wallet]
            address = "$PAYER"
            proof_file = "proof.json"
        "#;
        let config = CliConfig::parse_with(toml, env(&[("PAYER", "Payer111")])).unwrap();

        assert_eq!(config.paywall.amount, Decimal::new(25, 2));
        assert_eq!(config.paywall.network, Network::Solana);
        assert_eq!(config.paywall.theme, ThemePreset::Terminal);
        assert_eq!(config.paywall.max_payment_amount, Some(Decimal::ONE));
        assert_eq!(config.paywall.class_names.button.as_deref(), Some("rounded-none"));
        assert_eq!(config.wallet.address.as_deref(), Some("Payer111"));
        assert_eq!(config.wallet.proof_file, Some(PathBuf::from("proof.json")));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CliConfig::parse_with(
            "[paywall]\namount = 0.01\napi_endpoint = \"https://file.example/paid\"\n",
            |_| None,
        )
        .unwrap();
        config
            .apply_overrides(env(&[
                ("PAYWALL_API_ENDPOINT", "https://env.example/paid"),
                ("PAYWALL_RPC_URL", ""),
            ]))
            .unwrap();

        assert_eq!(
            config.paywall.api_endpoint.unwrap().as_str(),
            "https://env.example/paid"
        );
        assert!(config.paywall.rpc_url.is_none());
    }

    #[test]
    fn test_invalid_override_url() {
        let mut config = CliConfig::parse_with("[paywall]\namount = 1\n", |_| None).unwrap();
        let err = config
            .apply_overrides(env(&[("PAYWALL_RPC_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidUrl { var: "PAYWALL_RPC_URL", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = CliConfig::load_from(Path::new("/nonexistent/paywall.toml")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }
}
