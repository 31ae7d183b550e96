//! HTTP-specific constants for the x402 protocol.

/// HTTP header for V2 payment proofs (client → server).
pub const PAYMENT_SIGNATURE_HEADER: &str = "PAYMENT-SIGNATURE";

/// HTTP header for 402 payment challenges (server → client).
pub const PAYMENT_REQUIRED_HEADER: &str = "PAYMENT-REQUIRED";

/// HTTP header for settlement receipts (server → client).
pub const PAYMENT_RESPONSE_HEADER: &str = x402_paywall::receipt::PAYMENT_RESPONSE_HEADER;

/// V1 legacy header for payment proofs (client → server).
pub const X_PAYMENT_HEADER: &str = "X-PAYMENT";

/// V1 legacy header for settlement receipts.
pub const X_PAYMENT_RESPONSE_HEADER: &str = x402_paywall::receipt::X_PAYMENT_RESPONSE_HEADER;

/// First protocol version that carries the challenge in a header.
pub const X402_VERSION_V2: u32 = 2;

/// Default facilitator service URL.
pub const DEFAULT_FACILITATOR_URL: &str = "https://facilitator.payai.network";
