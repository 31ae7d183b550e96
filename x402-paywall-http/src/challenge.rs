//! Extraction of the payment challenge from a 402 response.
//!
//! V2 servers put the challenge in the `PAYMENT-REQUIRED` header; V1 servers
//! send it as the JSON body. The header wins when both are present and valid.

use x402_paywall::networks::Network;
use x402_paywall::proto::{PaymentChallenge, PaymentRequirements};

use crate::error::HttpError;
use crate::headers::decode_payment_required;

/// Parses the challenge from the `PAYMENT-REQUIRED` header value, falling
/// back to a V1 JSON body.
///
/// # Errors
///
/// Returns [`HttpError::MissingChallenge`] if neither source holds a challenge.
pub fn parse_challenge(header: Option<&str>, body: &[u8]) -> Result<PaymentChallenge, HttpError> {
    if let Some(challenge) = header.and_then(|h| decode_payment_required(h).ok()) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(version = challenge.x402_version, "Parsed payment challenge from header");
        return Ok(challenge);
    }

    match serde_json::from_slice::<PaymentChallenge>(body) {
        Ok(challenge) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(version = challenge.x402_version, "Parsed payment challenge from body");
            Ok(challenge)
        }
        Err(_) => Err(HttpError::MissingChallenge),
    }
}

/// Picks the first accepted option on `network`.
///
/// # Errors
///
/// Returns [`HttpError::NoMatchingRequirements`] if none matches.
pub fn select_requirements(
    challenge: &PaymentChallenge,
    network: Network,
) -> Result<&PaymentRequirements, HttpError> {
    challenge
        .select(network)
        .ok_or_else(|| HttpError::NoMatchingRequirements(network.to_string()))
}
