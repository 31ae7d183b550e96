//! Wallet seam.
//!
//! The paywall never builds or signs transactions itself. A [`WalletAdapter`]
//! exposes the payer's address and a signing capability; a [`WalletProvider`]
//! decides where that adapter comes from:
//!
//! - [`ExplicitWallet`] wraps an adapter handed in by the caller.
//! - [`ContextWallet`] resolves the adapter from an ambient [`WalletContext`]
//!   (a wallet-adapter connection managed by the host application).
//!
//! The choice is made once when the paywall is built; the flow only ever talks
//! to `dyn WalletProvider`.

use std::fmt;
use std::sync::Arc;

use crate::proto::PaymentRequirements;

/// Errors raised by a wallet while producing a payment proof.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user or the signer refused to sign.
    #[error("wallet signing failed: {0}")]
    Signing(String),

    /// The wallet cannot pay the offered scheme on the offered network.
    #[error("wallet does not support scheme '{scheme}' on network '{network}'")]
    Unsupported {
        /// Requested scheme.
        scheme: String,
        /// Requested network.
        network: String,
    },
}

/// A connected wallet able to sign x402 payments.
#[async_trait::async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Public key of the wallet, if the adapter exposes one.
    fn public_key(&self) -> Option<String> {
        None
    }

    /// Plain address field, used when no public key is exposed.
    fn address(&self) -> Option<String> {
        None
    }

    /// Produces the scheme-specific signed payload satisfying `requirements`.
    ///
    /// For the Solana `exact` scheme this is `{"transaction": "<base64>"}`
    /// holding a partially signed transfer transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if the wallet cannot or will not sign.
    async fn sign_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<serde_json::Value, WalletError>;
}

/// Resolves the payer address of `wallet`: public key first, then the plain
/// address field. Empty strings count as absent.
#[must_use]
pub fn resolve_address(wallet: &dyn WalletAdapter) -> Option<String> {
    wallet
        .public_key()
        .filter(|k| !k.is_empty())
        .or_else(|| wallet.address().filter(|a| !a.is_empty()))
}

/// Source of the wallet used by a paywall.
pub trait WalletProvider: Send + Sync {
    /// The currently connected wallet, if any.
    fn wallet(&self) -> Option<Arc<dyn WalletAdapter>>;

    /// Disconnects through the ambient wallet connection.
    ///
    /// Returns `false` when the provider has no such capability.
    fn disconnect(&self) -> bool {
        false
    }

    /// Address of the currently connected wallet, if resolvable.
    fn address(&self) -> Option<String> {
        self.wallet().and_then(|w| resolve_address(w.as_ref()))
    }
}

/// A wallet supplied directly by the caller.
#[derive(Clone)]
pub struct ExplicitWallet(Arc<dyn WalletAdapter>);

impl ExplicitWallet {
    /// Wraps `wallet`.
    pub fn new(wallet: impl WalletAdapter + 'static) -> Self {
        Self(Arc::new(wallet))
    }

    /// Wraps an already shared wallet.
    #[must_use]
    pub fn from_arc(wallet: Arc<dyn WalletAdapter>) -> Self {
        Self(wallet)
    }
}

impl fmt::Debug for ExplicitWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExplicitWallet")
            .field(&resolve_address(self.0.as_ref()))
            .finish()
    }
}

impl WalletProvider for ExplicitWallet {
    fn wallet(&self) -> Option<Arc<dyn WalletAdapter>> {
        Some(Arc::clone(&self.0))
    }
}

/// Ambient wallet connection owned by the host application.
pub trait WalletContext: Send + Sync {
    /// The wallet currently connected in the host, if any.
    fn connected_wallet(&self) -> Option<Arc<dyn WalletAdapter>>;

    /// Disconnects the host's wallet connection.
    fn disconnect(&self);
}

/// A wallet resolved from a [`WalletContext`] each time it is needed.
#[derive(Clone)]
pub struct ContextWallet(Arc<dyn WalletContext>);

impl ContextWallet {
    /// Resolves wallets through `context`.
    pub fn new(context: impl WalletContext + 'static) -> Self {
        Self(Arc::new(context))
    }

    /// Resolves wallets through an already shared context.
    #[must_use]
    pub fn from_arc(context: Arc<dyn WalletContext>) -> Self {
        Self(context)
    }
}

impl fmt::Debug for ContextWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextWallet").field(&self.address()).finish()
    }
}

impl WalletProvider for ContextWallet {
    fn wallet(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.0.connected_wallet()
    }

    fn disconnect(&self) -> bool {
        self.0.disconnect();
        true
    }
}
