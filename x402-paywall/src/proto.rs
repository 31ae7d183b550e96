//! Wire types for the payment-required challenge.
//!
//! A remote service that wants to be paid answers with HTTP 402 and a
//! [`PaymentChallenge`] listing the [`PaymentRequirements`] it accepts. Both
//! protocol versions are accepted: V1 names the amount `maxAmountRequired`
//! and carries the resource inline, V2 uses `amount` and CAIP-2 networks.
//!
//! All types serialize to JSON using camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::networks::Network;

/// Payment terms offered by the seller for one scheme/network pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme identifier (e.g. `"exact"`).
    pub scheme: String,

    /// Network, either a V1 name or a CAIP-2 identifier.
    pub network: String,

    /// Amount in the token's smallest unit.
    #[serde(alias = "maxAmountRequired")]
    pub amount: String,

    /// Recipient address.
    pub pay_to: String,

    /// Token mint / contract address.
    pub asset: String,

    /// Maximum time in seconds the signed payment stays valid.
    #[serde(default)]
    pub max_timeout_seconds: u64,

    /// V1 only: resource URL being paid for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// V1 only: human-readable description of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Scheme-specific extra data (e.g. the facilitator fee payer on Solana).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl PaymentRequirements {
    /// Returns `true` if these requirements target `network`.
    #[must_use]
    pub fn is_for(&self, network: Network) -> bool {
        network.matches(&self.network)
    }
}

/// Resource description attached to V2 challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// Resource URL.
    pub url: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Body (V1) or decoded `PAYMENT-REQUIRED` header (V2) of a 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    /// Protocol version, `1` or `2`.
    pub x402_version: u32,

    /// Optional error message from the seller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// V2 resource information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,

    /// Accepted payment options, in the seller's order of preference.
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentChallenge {
    /// Picks the first accepted option on `network`.
    #[must_use]
    pub fn select(&self, network: Network) -> Option<&PaymentRequirements> {
        self.accepts.iter().find(|r| r.is_for(network))
    }
}
