//! HTTP header encoding and decoding for x402 protocol messages.
//!
//! Every x402 header carries Base64-encoded JSON: the `PAYMENT-REQUIRED`
//! challenge, the `PAYMENT-SIGNATURE` / legacy `X-PAYMENT` proof, and the
//! `PAYMENT-RESPONSE` settlement receipt.

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use x402_paywall::proto::{PaymentChallenge, PaymentRequirements, ResourceInfo};
pub use x402_paywall::receipt::SettlementReceipt;

use crate::constants::{PAYMENT_SIGNATURE_HEADER, X_PAYMENT_HEADER, X402_VERSION_V2};
use crate::error::HttpError;

/// V2 proof: echoes the accepted requirements next to the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofV2 {
    /// Protocol version, always `2`.
    pub x402_version: u32,
    /// Resource from the challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    /// The requirements being satisfied.
    pub accepted: PaymentRequirements,
    /// Scheme-specific signed payload.
    pub payload: serde_json::Value,
}

/// V1 proof: names scheme and network next to the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofV1 {
    /// Protocol version, always `1`.
    pub x402_version: u32,
    /// Payment scheme.
    pub scheme: String,
    /// Network name.
    pub network: String,
    /// Scheme-specific signed payload.
    pub payload: serde_json::Value,
}

/// A signed payment, shaped for the challenge's protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProof {
    /// Sent in `X-PAYMENT`.
    V1(PaymentProofV1),
    /// Sent in `PAYMENT-SIGNATURE`.
    V2(PaymentProofV2),
}

impl PaymentProof {
    /// Wraps `payload` for the version of `challenge`.
    #[must_use]
    pub fn for_challenge(
        challenge: &PaymentChallenge,
        accepted: &PaymentRequirements,
        payload: serde_json::Value,
    ) -> Self {
        if challenge.x402_version >= X402_VERSION_V2 {
            Self::V2(PaymentProofV2 {
                x402_version: challenge.x402_version,
                resource: challenge.resource.clone(),
                accepted: accepted.clone(),
                payload,
            })
        } else {
            Self::V1(PaymentProofV1 {
                x402_version: challenge.x402_version,
                scheme: accepted.scheme.clone(),
                network: accepted.network.clone(),
                payload,
            })
        }
    }

    /// Header the proof travels in.
    #[must_use]
    pub const fn header_name(&self) -> &'static str {
        match self {
            Self::V1(_) => X_PAYMENT_HEADER,
            Self::V2(_) => PAYMENT_SIGNATURE_HEADER,
        }
    }

    /// Encodes the proof as a header value.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Serialize`] if JSON serialization fails.
    pub fn encode(&self) -> Result<String, HttpError> {
        match self {
            Self::V1(proof) => encode_json_header(proof),
            Self::V2(proof) => encode_json_header(proof),
        }
    }
}

/// Serializes `value` as JSON and Base64-encodes it.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_json_header<T: Serialize + ?Sized>(value: &T) -> Result<String, HttpError> {
    let json = serde_json::to_vec(value)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Base64-decodes `header_value` and parses the JSON inside.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_json_header<T: DeserializeOwned>(header_value: &str) -> Result<T, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decodes a `PAYMENT-REQUIRED` header value.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment_required(header_value: &str) -> Result<PaymentChallenge, HttpError> {
    decode_json_header(header_value)
}

/// Encodes a challenge for the `PAYMENT-REQUIRED` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_required(challenge: &PaymentChallenge) -> Result<String, HttpError> {
    encode_json_header(challenge)
}

/// Decodes a `PAYMENT-RESPONSE` header value.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment_response(header_value: &str) -> Result<SettlementReceipt, HttpError> {
    decode_json_header(header_value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn requirements() -> PaymentRequirements {
        serde_json::from_value(json!({
            "scheme": "exact",
            "network": "solana-devnet",
            "maxAmountRequired": "10000",
            "payTo": "Merchant1111",
            "asset": "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            "maxTimeoutSeconds": 60
        }))
        .unwrap()
    }

    #[test]
    fn test_v1_proof_uses_x_payment() {
        let challenge = PaymentChallenge {
            x402_version: 1,
            error: None,
            resource: None,
            accepts: vec![requirements()],
        };
        let proof = PaymentProof::for_challenge(
            &challenge,
            &challenge.accepts[0],
            json!({ "transaction": "AQID" }),
        );
        assert_eq!(proof.header_name(), "X-PAYMENT");

        let decoded: serde_json::Value = decode_json_header(&proof.encode().unwrap()).unwrap();
        assert_eq!(
            decoded,
            json!({
                "x402Version": 1,
                "scheme": "exact",
                "network": "solana-devnet",
                "payload": { "transaction": "AQID" }
            })
        );
    }

    #[test]
    fn test_v2_proof_echoes_accepted() {
        let challenge = PaymentChallenge {
            x402_version: 2,
            error: None,
            resource: Some(ResourceInfo {
                url: "https://merchant.example/paid".into(),
                description: None,
                mime_type: None,
            }),
            accepts: vec![requirements()],
        };
        let proof = PaymentProof::for_challenge(&challenge, &challenge.accepts[0], json!({}));
        assert_eq!(proof.header_name(), "PAYMENT-SIGNATURE");

        let PaymentProof::V2(v2) = proof else {
            panic!("expected a V2 proof");
        };
        assert_eq!(v2.accepted.amount, "10000");
        assert_eq!(v2.resource.unwrap().url, "https://merchant.example/paid");
    }

    #[test]
    fn test_payment_required_header_codec() {
        let challenge = PaymentChallenge {
            x402_version: 2,
            error: Some("payment required".into()),
            resource: None,
            accepts: vec![requirements()],
        };
        let header = encode_payment_required(&challenge).unwrap();
        assert_eq!(decode_payment_required(&header).unwrap(), challenge);
        assert!(matches!(
            decode_payment_required("@@@"),
            Err(HttpError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_settlement_receipt() {
        let header = encode_json_header(&json!({
            "success": true,
            "transaction": "5VERv8",
            "network": "solana-devnet",
            "payer": "Payer1111"
        }))
        .unwrap();
        let receipt = decode_payment_response(&header).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.settlement_id(), Some("5VERv8"));
        assert_eq!(receipt.payer.as_deref(), Some("Payer1111"));
        assert_eq!(receipt.error_reason, None);
    }
}
