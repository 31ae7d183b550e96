//! Reqwest-backed [`PaymentClient`].
//!
//! [`HttpPaymentClient`] sends each [`PaymentRequest`] through a
//! `reqwest-middleware` stack carrying [`PaymentMiddleware`], with the
//! request's [`ClientContext`](x402_paywall::client::ClientContext) attached
//! as an extension so the middleware can sign with the right wallet.

use http::Method;
use reqwest::Client;
use reqwest_middleware as rqm;
use x402_paywall::client::{ClientError, HttpMethod, PaymentClient, PaymentRequest, PaymentResponse};

use crate::middleware::PaymentMiddleware;

/// Payment-aware HTTP client.
#[derive(Debug, Clone)]
pub struct HttpPaymentClient {
    client: rqm::ClientWithMiddleware,
}

impl Default for HttpPaymentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPaymentClient {
    /// Creates a client around a default [`reqwest::Client`].
    #[must_use]
    pub fn new() -> Self {
        Self::from_client(Client::new())
    }

    /// Creates a client around `client`, adding the payment middleware.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self {
            client: rqm::ClientBuilder::new(client)
                .with(PaymentMiddleware::new())
                .build(),
        }
    }
}

const fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

fn map_error(err: rqm::Error) -> ClientError {
    match err {
        rqm::Error::Reqwest(e) => ClientError::Transport(e.to_string()),
        rqm::Error::Middleware(e) => ClientError::Payment(format!("{e:#}")),
    }
}

#[async_trait::async_trait]
impl PaymentClient for HttpPaymentClient {
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "x402.paywall.http_request", skip_all, fields(url = %request.url), err)
    )]
    async fn request(&self, request: PaymentRequest) -> Result<PaymentResponse, ClientError> {
        let mut builder = self
            .client
            .request(to_method(request.method), request.url.clone())
            .with_extension(request.context.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method == HttpMethod::Post {
            let body = serde_json::to_vec(&request.body)
                .map_err(|e| ClientError::Other(e.to_string()))?;
            builder = builder.body(body);
        }
        if let Some(timeout) = request.context.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status();
        let mut out = PaymentResponse::new(status.as_u16())
            .with_status_text(status.canonical_reason().unwrap_or_else(|| status.as_str()));
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                out = out.with_header(name.as_str(), value);
            }
        }

        #[cfg(feature = "telemetry")]
        if let Some(receipt) = out
            .header(crate::constants::PAYMENT_RESPONSE_HEADER)
            .and_then(|h| crate::headers::decode_payment_response(h).ok())
        {
            tracing::debug!(
                success = receipt.success,
                transaction = ?receipt.transaction,
                payer = ?receipt.payer,
                "Received settlement receipt"
            );
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(out.with_body(body.to_vec()))
    }
}
