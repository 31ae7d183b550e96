//! Error types for the HTTP transport layer.

use x402_paywall::wallet::WalletError;

/// Errors raised while answering a payment challenge.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Base64 decoding failed.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The 402 response carried neither a challenge header nor a challenge body.
    #[error("402 response without a payment challenge")]
    MissingChallenge,

    /// None of the accepted options targets the configured network.
    #[error("no accepted payment option for network '{0}'")]
    NoMatchingRequirements(String),

    /// The wallet could not produce a payment proof.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The encoded proof is not a valid header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    /// The 402 response body could not be read.
    #[cfg(feature = "client")]
    #[error("failed to read 402 response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The request body is a stream and cannot be replayed with a proof.
    #[error("request cannot be retried with a payment")]
    RequestNotCloneable,
}
