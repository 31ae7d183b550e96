//! Reqwest middleware answering `402 Payment Required` challenges.
//!
//! [`PaymentMiddleware`] reads the payer's wallet and network from the
//! request extensions ([`ClientContext`], attached with
//! `RequestBuilder::with_extension`). When the response is a 402 it parses
//! the challenge, lets the wallet sign the first option on the configured
//! network, and retries the request once with the proof header. Requests
//! without a context, and non-402 responses, pass through untouched.

use http::{Extensions, HeaderName, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};
use x402_paywall::client::ClientContext;

use crate::challenge::{parse_challenge, select_requirements};
use crate::constants::PAYMENT_REQUIRED_HEADER;
use crate::error::HttpError;
use crate::headers::PaymentProof;

/// Middleware that pays for 402 responses and retries once.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentMiddleware;

impl PaymentMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the `(header, value)` pair answering the challenge in `res`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the body cannot be read, the challenge is
    /// missing, no option matches the context's network, or the wallet
    /// refuses to sign.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.paywall.make_payment_header", skip_all, err)
    )]
    pub async fn make_payment_header(
        &self,
        res: Response,
        context: &ClientContext,
    ) -> Result<(HeaderName, HeaderValue), HttpError> {
        let header = res
            .headers()
            .get(PAYMENT_REQUIRED_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = res.bytes().await.map_err(HttpError::Body)?;

        let challenge = parse_challenge(header.as_deref(), &body)?;
        let selected = select_requirements(&challenge, context.network)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %selected.scheme,
            network = %selected.network,
            amount = %selected.amount,
            "Selected payment requirements"
        );

        let payload = context.wallet.sign_payment(selected).await?;
        let proof = PaymentProof::for_challenge(&challenge, selected, payload);

        let name = HeaderName::from_bytes(proof.header_name().as_bytes())
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
        let value = HeaderValue::from_str(&proof.encode()?)
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
        Ok((name, value))
    }
}

/// Maps a failure to answer a challenge into a middleware error.
///
/// Transport failures while reading the 402 body stay transport failures.
fn into_middleware_error(err: HttpError) -> rqm::Error {
    match err {
        HttpError::Body(e) => rqm::Error::Reqwest(e),
        other => rqm::Error::Middleware(other.into()),
    }
}

/// Runs the next middleware or HTTP client with optional telemetry instrumentation.
#[cfg_attr(feature = "telemetry", instrument(name = "x402.paywall.next", skip_all))]
async fn run_next(
    next: rqm::Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> rqm::Result<Response> {
    next.run(req, extensions).await
}

#[async_trait::async_trait]
impl rqm::Middleware for PaymentMiddleware {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.paywall.handle", skip_all, err)
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let context = extensions.get::<ClientContext>().cloned();
        let retry_req = req.try_clone();
        let res = run_next(next.clone(), req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }
        let Some(context) = context else {
            #[cfg(feature = "telemetry")]
            debug!("402 without payment context, returning response");
            return Ok(res);
        };

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "Received 402 Payment Required, processing payment");

        let (name, value) = self
            .make_payment_header(res, &context)
            .await
            .map_err(into_middleware_error)?;

        let mut retry = retry_req
            .ok_or_else(|| rqm::Error::Middleware(HttpError::RequestNotCloneable.into()))?;
        retry.headers_mut().insert(name, value);

        #[cfg(feature = "telemetry")]
        trace!(url = %retry.url(), "Retrying request with payment header");

        run_next(next, retry, extensions).await
    }
}
