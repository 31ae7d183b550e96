//! Settlement identifier extraction.
//!
//! After a paid request succeeds, the server may attach a settlement receipt:
//! a Base64-encoded JSON object in the `PAYMENT-RESPONSE` header (legacy
//! servers use `X-PAYMENT-RESPONSE`). The identifier is read from its
//! `transaction` field, or `signature` for servers that report the raw
//! Solana signature.
//!
//! The identifier is a convenience for display and callbacks, so extraction is
//! a two-step optional pipeline: [`decode_settlement_id`] tries the header and
//! [`placeholder_settlement_id`] fills in when it yields nothing.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::client::PaymentResponse;

/// Header carrying the settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "PAYMENT-RESPONSE";

/// Legacy (V1) header carrying the settlement receipt.
pub const X_PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Prefix of locally generated identifiers.
pub const PLACEHOLDER_PREFIX: &str = "tx_";

/// Settlement receipt carried in `PAYMENT-RESPONSE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// Whether settlement succeeded.
    #[serde(default)]
    pub success: bool,
    /// Transaction signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Raw Solana signature, sent by servers that omit `transaction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Network the payment settled on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Payer address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Failure reason when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl SettlementReceipt {
    /// The settlement identifier: `transaction`, else `signature`, ignoring
    /// empty strings.
    #[must_use]
    pub fn settlement_id(&self) -> Option<&str> {
        self.transaction
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.signature.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Decodes a receipt header value into a settlement identifier.
///
/// Returns `None` if the value is not Base64, not a JSON object, or carries
/// neither a non-empty `transaction` nor a non-empty `signature`.
#[must_use]
pub fn decode_settlement_id(header_value: &str) -> Option<String> {
    let bytes = BASE64_STANDARD.decode(header_value.trim()).ok()?;
    let receipt: SettlementReceipt = serde_json::from_slice(&bytes).ok()?;
    receipt.settlement_id().map(str::to_owned)
}

/// Builds the fallback identifier `tx_<millis>` for a given Unix time in milliseconds.
#[must_use]
pub fn placeholder_settlement_id(unix_millis: u128) -> String {
    format!("{PLACEHOLDER_PREFIX}{unix_millis}")
}

/// Current Unix time in milliseconds. A clock before the epoch reads as zero.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Reads the settlement identifier from `response`, falling back to a placeholder.
#[must_use]
pub fn settlement_id(response: &PaymentResponse) -> String {
    let decoded = [PAYMENT_RESPONSE_HEADER, X_PAYMENT_RESPONSE_HEADER]
        .into_iter()
        .filter_map(|name| response.header(name))
        .find_map(decode_settlement_id);

    decoded.unwrap_or_else(|| {
        #[cfg(feature = "telemetry")]
        tracing::debug!("No usable settlement receipt, generating placeholder id");
        placeholder_settlement_id(now_millis())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(json: &str) -> String {
        BASE64_STANDARD.encode(json)
    }

    #[test]
    fn test_decode_signature_field() {
        let header = encode(r#"{"signature":"abc123"}"#);
        assert_eq!(decode_settlement_id(&header).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_transaction_preferred_over_signature() {
        let header = encode(
            r#"{"success":true,"transaction":"5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb","signature":"other","network":"solana-devnet"}"#,
        );
        assert_eq!(
            decode_settlement_id(&header).as_deref(),
            Some("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb")
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_settlement_id("not base64!"), None);
        assert_eq!(decode_settlement_id(&encode("not json")), None);
        assert_eq!(decode_settlement_id(&encode(r#"{"transaction":""}"#)), None);
        assert_eq!(decode_settlement_id(&encode(r#"{"payer":"x"}"#)), None);
    }

    #[test]
    fn test_receipt_fields() {
        let receipt: SettlementReceipt = serde_json::from_str(
            r#"{"success":false,"signature":"sig","payer":"Payer111","errorReason":"insufficient_funds"}"#,
        )
        .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.settlement_id(), Some("sig"));
        assert_eq!(receipt.error_reason.as_deref(), Some("insufficient_funds"));
        assert_eq!(SettlementReceipt::default().settlement_id(), None);
    }

    #[test]
    fn test_placeholder_format() {
        assert_eq!(placeholder_settlement_id(1_700_000_000_000), "tx_1700000000000");
    }

    #[test]
    fn test_settlement_id_falls_back_to_legacy_then_placeholder() {
        let legacy = PaymentResponse::new(200)
            .with_header("X-PAYMENT-RESPONSE", encode(r#"{"transaction":"legacy"}"#));
        assert_eq!(settlement_id(&legacy), "legacy");

        let broken = PaymentResponse::new(200).with_header("PAYMENT-RESPONSE", "%%%");
        let id = settlement_id(&broken);
        assert!(id.starts_with(PLACEHOLDER_PREFIX));
        assert!(id[PLACEHOLDER_PREFIX.len()..].chars().all(|c| c.is_ascii_digit()));
    }
}
