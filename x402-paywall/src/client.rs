//! Payment client seam.
//!
//! A [`PaymentClient`] performs one logical request against a priced resource.
//! Implementations are expected to run the whole challenge/response cycle
//! transparently: send the request, receive a 402 challenge, have the wallet
//! sign a payment proof, and retry with the proof attached. The flow controller
//! only sees the final [`PaymentResponse`].
//!
//! `x402-paywall-http` provides the reqwest-based implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::PaymentError;
use crate::networks::Network;
use crate::wallet::{WalletAdapter, resolve_address};

/// HTTP method of a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Configuration forwarded from the paywall to the payment client.
#[derive(Clone)]
pub struct ClientContext {
    /// Wallet that signs the payment proof.
    pub wallet: Arc<dyn WalletAdapter>,
    /// Network to pay on.
    pub network: Network,
    /// RPC endpoint override for transaction building.
    pub rpc_endpoint: Option<Url>,
    /// Facilitator endpoint passed through to the client.
    pub facilitator_endpoint: Option<Url>,
    /// Optional deployment-level timeout for the whole round-trip.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("wallet", &resolve_address(self.wallet.as_ref()))
            .field("network", &self.network)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("facilitator_endpoint", &self.facilitator_endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A request against a priced resource.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Target URL.
    pub url: Url,
    /// HTTP method.
    pub method: HttpMethod,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: serde_json::Value,
    /// Wallet and network configuration.
    pub context: ClientContext,
}

/// Final response of a payment request, after any payment retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResponse {
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl PaymentResponse {
    /// Creates an empty response with the given status code.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: status.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Sets the reason phrase.
    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Appends a header. Names are matched case-insensitively on lookup.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// First header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Declared `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns `true` if the declared content type is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors raised by a [`PaymentClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Network, DNS, TLS or timeout failure.
    #[error("{0}")]
    Transport(String),

    /// The challenge could not be answered (bad challenge, no matching
    /// requirements, wallet refused to sign).
    #[error("payment could not be created: {0}")]
    Payment(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl From<ClientError> for PaymentError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(msg) => Self::TransportFailure(msg),
            other @ (ClientError::Payment(_) | ClientError::Other(_)) => {
                Self::Unknown(other.to_string())
            }
        }
    }
}

/// Performs payment-aware requests.
#[async_trait::async_trait]
pub trait PaymentClient: Send + Sync {
    /// Sends `request`, transparently paying if the resource demands it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no final response could be obtained.
    /// Non-success responses are returned as `Ok`.
    async fn request(&self, request: PaymentRequest) -> Result<PaymentResponse, ClientError>;
}

#[async_trait::async_trait]
impl<T: PaymentClient + ?Sized> PaymentClient for Arc<T> {
    async fn request(&self, request: PaymentRequest) -> Result<PaymentResponse, ClientError> {
        (**self).request(request).await
    }
}
