//! Solana networks supported by the paywall.
//!
//! Each [`Network`] knows its x402 V1 name, its CAIP-2 identifier, a public
//! RPC endpoint, and the USDC mint used for pricing and balance display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Decimal places of the USDC SPL token on every supported network.
pub const USDC_DECIMALS: u32 = 6;

/// Static description of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// x402 V1 network name (e.g. `"solana-devnet"`).
    pub name: &'static str,
    /// CAIP-2 namespace.
    pub namespace: &'static str,
    /// CAIP-2 reference (genesis hash prefix).
    pub reference: &'static str,
    /// Default public JSON-RPC endpoint.
    pub rpc_url: &'static str,
    /// USDC mint address.
    pub usdc_mint: &'static str,
    /// Short label for display.
    pub label: &'static str,
}

static SOLANA: NetworkInfo = NetworkInfo {
    name: "solana",
    namespace: "solana",
    reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
    rpc_url: "https://api.mainnet-beta.solana.com",
    usdc_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    label: "Mainnet",
};

static SOLANA_DEVNET: NetworkInfo = NetworkInfo {
    name: "solana-devnet",
    namespace: "solana",
    reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
    rpc_url: "https://api.devnet.solana.com",
    usdc_mint: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
    label: "Devnet",
};

/// The network a paywall charges on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Solana mainnet.
    #[serde(rename = "solana")]
    Solana,
    /// Solana devnet, the default.
    #[default]
    #[serde(rename = "solana-devnet")]
    SolanaDevnet,
}

impl Network {
    /// All supported networks.
    pub const ALL: [Self; 2] = [Self::Solana, Self::SolanaDevnet];

    /// Returns the static metadata for this network.
    #[must_use]
    pub const fn info(self) -> &'static NetworkInfo {
        match self {
            Self::Solana => &SOLANA,
            Self::SolanaDevnet => &SOLANA_DEVNET,
        }
    }

    /// x402 V1 network name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.info().name
    }

    /// CAIP-2 chain identifier, e.g. `solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1`.
    #[must_use]
    pub fn caip2(self) -> String {
        let info = self.info();
        format!("{}:{}", info.namespace, info.reference)
    }

    /// Default public RPC endpoint.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        self.info().rpc_url
    }

    /// USDC mint address on this network.
    #[must_use]
    pub const fn usdc_mint(self) -> &'static str {
        self.info().usdc_mint
    }

    /// `"Mainnet"` or `"Devnet"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.info().label
    }

    /// Returns `true` for the test network.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::SolanaDevnet)
    }

    /// Returns `true` if `network` names this network, either by its V1 name
    /// or by its CAIP-2 identifier.
    #[must_use]
    pub fn matches(self, network: &str) -> bool {
        let info = self.info();
        if network == info.name {
            return true;
        }
        network
            .split_once(':')
            .is_some_and(|(ns, reference)| ns == info.namespace && reference == info.reference)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown network name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.matches(s))
            .ok_or_else(|| UnknownNetwork(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_devnet() {
        assert_eq!(Network::default(), Network::SolanaDevnet);
        assert!(Network::default().is_test());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Network::Solana).unwrap(),
            "\"solana\""
        );
        let parsed: Network = serde_json::from_str("\"solana-devnet\"").unwrap();
        assert_eq!(parsed, Network::SolanaDevnet);
    }

    #[test]
    fn test_matches_caip2() {
        assert!(Network::Solana.matches("solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"));
        assert!(!Network::Solana.matches("solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1"));
        assert!(Network::SolanaDevnet.matches("solana-devnet"));
        assert!(!Network::SolanaDevnet.matches("base-sepolia"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("solana".parse::<Network>().unwrap(), Network::Solana);
        assert_eq!(
            Network::SolanaDevnet.caip2().parse::<Network>().unwrap(),
            Network::SolanaDevnet
        );
        assert!("eip155:8453".parse::<Network>().is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Network::Solana.label(), "Mainnet");
        assert_eq!(Network::SolanaDevnet.label(), "Devnet");
    }
}
