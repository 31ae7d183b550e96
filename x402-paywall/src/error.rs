//! Error types for the paywall payment flow.
//!
//! Every failure of [`PaymentFlow::pay`](crate::flow::PaymentFlow::pay) ends up
//! as a [`PaymentError`] stored in the flow state. Validation errors are
//! detected before any network activity; transport errors come from the
//! [`PaymentClient`](crate::client::PaymentClient) round-trip.

use std::fmt;

use rust_decimal::Decimal;

/// A failed payment attempt, as surfaced through the flow state.
///
/// The type is `Clone` so that it can travel inside
/// [`FlowSnapshot`](crate::flow::FlowSnapshot) values handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    /// The requested amount is above the configured maximum.
    #[error("Payment amount {amount} exceeds maximum allowed {max}")]
    LimitExceeded {
        /// Amount requested by the caller.
        amount: Decimal,
        /// Configured upper bound.
        max: Decimal,
    },

    /// The wallet exposes neither a public key nor an address.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// The remote service answered with a non-success status.
    #[error("Payment request failed: {status_text}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Reason phrase (or the numeric code when the server sent none).
        status_text: String,
    },

    /// Network, DNS or timeout failure bubbled up from the payment client.
    #[error("Payment transport failed: {0}")]
    TransportFailure(String),

    /// Anything else, wrapped with its message.
    #[error("{0}")]
    Unknown(String),
}

/// Discriminant of [`PaymentError`], convenient for matching in callbacks and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentErrorKind {
    /// See [`PaymentError::LimitExceeded`].
    LimitExceeded,
    /// See [`PaymentError::WalletNotConnected`].
    WalletNotConnected,
    /// See [`PaymentError::RequestFailed`].
    RequestFailed,
    /// See [`PaymentError::TransportFailure`].
    TransportFailure,
    /// See [`PaymentError::Unknown`].
    Unknown,
}

impl PaymentError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> PaymentErrorKind {
        match self {
            Self::LimitExceeded { .. } => PaymentErrorKind::LimitExceeded,
            Self::WalletNotConnected => PaymentErrorKind::WalletNotConnected,
            Self::RequestFailed { .. } => PaymentErrorKind::RequestFailed,
            Self::TransportFailure(_) => PaymentErrorKind::TransportFailure,
            Self::Unknown(_) => PaymentErrorKind::Unknown,
        }
    }

    /// Returns `true` for errors raised before any network activity.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. } | Self::WalletNotConnected)
    }
}

impl fmt::Display for PaymentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LimitExceeded => "LimitExceeded",
            Self::WalletNotConnected => "WalletNotConnected",
            Self::RequestFailed => "RequestFailed",
            Self::TransportFailure => "TransportFailure",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Invalid paywall or payment configuration, rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Payment amounts must be strictly positive.
    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// A maximum amount, when set, must be strictly positive.
    #[error("maximum payment amount must be positive, got {0}")]
    NonPositiveMaximum(Decimal),

    /// A required builder field was not provided.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_exceeded_message() {
        let err = PaymentError::LimitExceeded {
            amount: Decimal::new(250, 2),
            max: Decimal::new(100, 2),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount 2.50 exceeds maximum allowed 1.00"
        );
        assert_eq!(err.kind(), PaymentErrorKind::LimitExceeded);
        assert!(err.is_validation());
    }

    #[test]
    fn test_request_failed_carries_status_text() {
        let err = PaymentError::RequestFailed {
            status: 500,
            status_text: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "Payment request failed: Internal Server Error");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            PaymentError::WalletNotConnected.kind().to_string(),
            "WalletNotConnected"
        );
    }
}
