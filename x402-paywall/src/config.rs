//! Serializable paywall settings.
//!
//! [`PaywallSettings`] mirrors the builder surface of
//! [`Paywall`](crate::paywall::Paywall) for the parts that can live in a
//! configuration file. Wallet, client and callbacks are runtime objects and
//! are attached to the builder returned by [`PaywallSettings::builder`].
//!
//! ```rust
//! use x402_paywall::config::PaywallSettings;
//!
//! let settings: PaywallSettings = serde_json::from_str(r#"{
//!     "amount": "2.50",
//!     "description": "Premium article",
//!     "network": "solana-devnet",
//!     "theme": "terminal"
//! }"#).unwrap();
//! assert_eq!(settings.amount.to_string(), "2.50");
//! ```

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::networks::Network;
use crate::paywall::{Paywall, PaywallBuilder};
use crate::theme::ThemePreset;
use crate::view::{ClassOverrides, StyleOverrides};

const fn default_true() -> bool {
    true
}

/// File-friendly paywall configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaywallSettings {
    /// Price in USDC, as a string (`"2.50"`) or a number.
    pub amount: Decimal,

    /// What is being paid for.
    #[serde(default)]
    pub description: String,

    /// Network to pay on.
    #[serde(default)]
    pub network: Network,

    /// RPC endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,

    /// Paid-content endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<Url>,

    /// Facilitator endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator_url: Option<Url>,

    /// Upper bound on any attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payment_amount: Option<Decimal>,

    /// Round-trip timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Visual preset.
    #[serde(default)]
    pub theme: ThemePreset,

    /// Show the wallet's balance.
    #[serde(default = "default_true")]
    pub show_balance: bool,

    /// Show network information.
    #[serde(default = "default_true")]
    pub show_network_info: bool,

    /// Show the payment-details panel.
    #[serde(default = "default_true")]
    pub show_payment_details: bool,

    /// Extra classes per slot.
    #[serde(default)]
    pub class_names: ClassOverrides,

    /// Extra inline styles per slot.
    #[serde(default)]
    pub custom_styles: StyleOverrides,
}

impl PaywallSettings {
    /// A builder preloaded with these settings.
    #[must_use]
    pub fn builder(&self) -> PaywallBuilder {
        self.apply(Paywall::builder())
    }

    /// Applies these settings on top of `builder`.
    #[must_use]
    pub fn apply(&self, builder: PaywallBuilder) -> PaywallBuilder {
        let mut builder = builder
            .amount(self.amount)
            .description(self.description.clone())
            .network(self.network)
            .theme(self.theme)
            .show_balance(self.show_balance)
            .show_network_info(self.show_network_info)
            .show_payment_details(self.show_payment_details)
            .class_overrides(self.class_names.clone())
            .style_overrides(self.custom_styles.clone());

        if let Some(url) = &self.rpc_url {
            builder = builder.rpc_endpoint(url.clone());
        }
        if let Some(url) = &self.api_endpoint {
            builder = builder.api_endpoint(url.clone());
        }
        if let Some(url) = &self.facilitator_url {
            builder = builder.facilitator_endpoint(url.clone());
        }
        if let Some(max) = self.max_payment_amount {
            builder = builder.max_payment_amount(max);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
    }
}
