//! Wallet backed by a payment payload signed ahead of time.
//!
//! The CLI never holds keys. [`PresignedWallet`] reports a fixed address and
//! answers every challenge with a payload produced elsewhere (for example a
//! partially signed Solana transfer exported by a hardware wallet), read from
//! a JSON file.

use std::path::Path;

use x402_paywall::proto::PaymentRequirements;
use x402_paywall::wallet::{WalletAdapter, WalletError};

use crate::error::ConfigLoadError;

/// Wallet returning a fixed, presigned payment payload.
#[derive(Debug, Clone)]
pub struct PresignedWallet {
    address: String,
    payload: serde_json::Value,
}

impl PresignedWallet {
    /// Creates a wallet for `address` answering with `payload`.
    #[must_use]
    pub fn new(address: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            address: address.into(),
            payload,
        }
    }

    /// Reads the payload from the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if the file cannot be read or is not JSON.
    pub fn from_file(address: impl Into<String>, path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let payload = serde_json::from_slice(&raw).map_err(|source| ConfigLoadError::Proof {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(address, payload))
    }
}

#[async_trait::async_trait]
impl WalletAdapter for PresignedWallet {
    fn address(&self) -> Option<String> {
        Some(self.address.clone())
    }

    async fn sign_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<serde_json::Value, WalletError> {
        if self.payload.is_null() {
            return Err(WalletError::Signing("presigned payload is empty".into()));
        }
        #[cfg(feature = "telemetry")]
        tracing::info!(
            network = %requirements.network,
            amount = %requirements.amount,
            pay_to = %requirements.pay_to,
            "Answering challenge with presigned payload"
        );
        #[cfg(not(feature = "telemetry"))]
        let _ = requirements;
        Ok(self.payload.clone())
    }
}
