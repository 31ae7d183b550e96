//! USDC balance lookup.
//!
//! The paywall shows the connected wallet's USDC balance next to the price.
//! Lookups go through the [`BalanceQuery`] seam; `x402-paywall-http` ships a
//! JSON-RPC implementation. A failed lookup never surfaces as an error to the
//! user: [`display_balance`] turns it into [`ZERO_BALANCE`].

use rust_decimal::Decimal;
use url::Url;

use crate::networks::{Network, USDC_DECIMALS};

/// Balance shown when the lookup fails.
pub const ZERO_BALANCE: &str = "0.00";

/// Errors raised by a [`BalanceQuery`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// The address is not a valid account address.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// The RPC node could not be reached or returned an error.
    #[error("balance RPC failed: {0}")]
    Rpc(String),

    /// The RPC response did not have the expected shape.
    #[error("malformed balance response: {0}")]
    Malformed(String),
}

/// Resolves token balances.
#[async_trait::async_trait]
pub trait BalanceQuery: Send + Sync {
    /// USDC balance of `address` on `network`, in whole tokens.
    ///
    /// `rpc_endpoint` overrides the network's default RPC URL.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError`] when the balance cannot be determined.
    async fn usdc_balance(
        &self,
        address: &str,
        network: Network,
        rpc_endpoint: Option<&Url>,
    ) -> Result<Decimal, BalanceError>;
}

/// Converts raw token units (6 decimals) into whole USDC.
#[must_use]
pub fn from_base_units(raw: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(raw), USDC_DECIMALS)
}

/// Converts whole USDC into raw token units, truncating sub-unit precision.
///
/// Returns `None` for negative amounts or amounts too large for `u64`.
#[must_use]
pub fn to_base_units(amount: Decimal) -> Option<u64> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = amount.checked_mul(Decimal::from(10u64.pow(USDC_DECIMALS)))?;
    u64::try_from(scaled.trunc()).ok()
}

/// Formats a lookup result for display with two decimals.
///
/// Any failure yields [`ZERO_BALANCE`].
#[must_use]
pub fn display_balance(result: Result<Decimal, BalanceError>) -> String {
    match result {
        Ok(balance) => format!("{:.2}", balance.round_dp(2)),
        Err(_err) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %_err, "Balance lookup failed, showing zero");
            ZERO_BALANCE.to_owned()
        }
    }
}
