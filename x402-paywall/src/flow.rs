//! Payment flow controller.
//!
//! [`PaymentFlow`] sequences one payment attempt: input validation, the
//! payment-aware round-trip through a [`PaymentClient`], response decoding,
//! and settlement identifier extraction. Its state is published as a
//! [`FlowSnapshot`] on a [`tokio::sync::watch`] channel so that any number of
//! observers (the [`Paywall`](crate::paywall::Paywall), a UI, a test) can follow
//! transitions without being able to write them.
//!
//! ```text
//! idle ──pay()──▶ pending ──ok──▶ success
//!                    │
//!                    └──fail──▶ error
//! success | error ──reset()──▶ idle
//! ```
//!
//! # Overlapping attempts
//!
//! Calling [`PaymentFlow::pay`] while an attempt is pending starts a new
//! attempt, and the latest call wins: each `pay` and [`PaymentFlow::reset`]
//! takes a fresh attempt number, and an attempt only publishes its final
//! state if no newer attempt (or reset) has started since. A superseded
//! attempt still returns its own result to its caller.
//!
//! The watch channel only holds the latest state, so an observer that looks
//! late can miss a success that was already replaced. Every attempt, superseded
//! or not, is therefore also sent as a [`FinishedAttempt`] on a broadcast
//! channel ([`PaymentFlow::subscribe_finished`]).

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use url::Url;

use crate::client::{ClientContext, HttpMethod, PaymentClient, PaymentRequest, PaymentResponse};
use crate::error::PaymentError;
use crate::networks::Network;
use crate::receipt;
use crate::wallet::{WalletProvider, resolve_address};

/// Paid-content endpoint used when no API endpoint is configured.
///
/// This is a public devnet test merchant; production deployments must set
/// their own endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://x402.payai.network/api/solana-devnet/paid-content";

static DEFAULT_API_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_API_ENDPOINT).expect("default API endpoint is a valid URL"));

/// Finished attempts buffered per subscriber before the oldest are dropped.
pub const FINISHED_CHANNEL_CAPACITY: usize = 64;

/// Status of the payment flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No attempt in progress.
    #[default]
    Idle,
    /// An attempt is in flight.
    Pending,
    /// The last attempt succeeded.
    Success,
    /// The last attempt failed.
    Error,
}

/// Parsed body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Body declared as JSON.
    Json(serde_json::Value),
    /// Any other body, as text.
    Text(String),
}

/// Point-in-time view of the flow state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSnapshot {
    /// Current status.
    pub status: PaymentStatus,
    /// Settlement identifier, only set in [`PaymentStatus::Success`].
    pub settlement_id: Option<String>,
    /// Failure, only set in [`PaymentStatus::Error`].
    pub error: Option<PaymentError>,
    /// Raw response content, only set in [`PaymentStatus::Success`].
    pub response_content: Option<String>,
    /// Parsed response body, only set in [`PaymentStatus::Success`].
    pub payload: Option<ResponsePayload>,
    /// Number of the attempt (or reset) that produced this snapshot.
    pub attempt: u64,
}

impl FlowSnapshot {
    fn idle(attempt: u64) -> Self {
        Self {
            attempt,
            ..Self::default()
        }
    }

    fn pending(attempt: u64) -> Self {
        Self {
            status: PaymentStatus::Pending,
            attempt,
            ..Self::default()
        }
    }

    fn succeeded(attempt: u64, outcome: PaymentOutcome) -> Self {
        Self {
            status: PaymentStatus::Success,
            settlement_id: Some(outcome.settlement_id),
            error: None,
            response_content: Some(outcome.response_content),
            payload: Some(outcome.payload),
            attempt,
        }
    }

    fn failed(attempt: u64, error: PaymentError) -> Self {
        Self {
            status: PaymentStatus::Error,
            error: Some(error),
            attempt,
            ..Self::default()
        }
    }

    /// Returns `true` while an attempt is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// Terminal result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The payment settled.
    Settled {
        /// Settlement identifier.
        settlement_id: String,
        /// Raw response content.
        response_content: String,
    },
    /// The attempt failed.
    Failed(PaymentError),
}

/// An attempt that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedAttempt {
    /// Number of the attempt.
    pub attempt: u64,
    /// How it ended.
    pub outcome: AttemptOutcome,
}

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PaymentOutcome {
    settlement_id: String,
    response_content: String,
    payload: ResponsePayload,
}

/// Configuration of a [`PaymentFlow`], fixed for its lifetime.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Where the paying wallet comes from.
    pub wallet: Arc<dyn WalletProvider>,
    /// Network to pay on.
    pub network: Network,
    /// RPC endpoint override, forwarded to the client.
    pub rpc_endpoint: Option<Url>,
    /// Paid-content endpoint; [`DEFAULT_API_ENDPOINT`] when unset.
    pub api_endpoint: Option<Url>,
    /// Facilitator endpoint, forwarded to the client.
    pub facilitator_endpoint: Option<Url>,
    /// Upper bound on any single payment.
    pub max_amount: Option<Decimal>,
    /// Round-trip timeout, forwarded to the client.
    pub timeout: Option<Duration>,
}

impl PaymentConfig {
    /// Creates a devnet configuration paying with `wallet`.
    pub fn new(wallet: impl WalletProvider + 'static) -> Self {
        Self::from_provider(Arc::new(wallet))
    }

    /// Creates a devnet configuration from a shared wallet provider.
    #[must_use]
    pub fn from_provider(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            network: Network::default(),
            rpc_endpoint: None,
            api_endpoint: None,
            facilitator_endpoint: None,
            max_amount: None,
            timeout: None,
        }
    }

    /// Sets the network.
    #[must_use]
    pub const fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Sets the paid-content endpoint.
    #[must_use]
    pub fn with_api_endpoint(mut self, url: Url) -> Self {
        self.api_endpoint = Some(url);
        self
    }

    /// Sets the RPC endpoint override.
    #[must_use]
    pub fn with_rpc_endpoint(mut self, url: Url) -> Self {
        self.rpc_endpoint = Some(url);
        self
    }

    /// Sets the facilitator endpoint.
    #[must_use]
    pub fn with_facilitator_endpoint(mut self, url: Url) -> Self {
        self.facilitator_endpoint = Some(url);
        self
    }

    /// Sets the maximum payment amount.
    #[must_use]
    pub const fn with_max_amount(mut self, max: Decimal) -> Self {
        self.max_amount = Some(max);
        self
    }

    /// Sets the round-trip timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The endpoint payments are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        self.api_endpoint.as_ref().unwrap_or(&DEFAULT_API_URL)
    }
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("wallet", &self.wallet.address())
            .field("network", &self.network)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("api_endpoint", &self.api_endpoint)
            .field("facilitator_endpoint", &self.facilitator_endpoint)
            .field("max_amount", &self.max_amount)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// JSON body sent to the paid-content endpoint.
#[derive(Serialize)]
struct PaymentBody<'a> {
    message: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

/// Owns the state of payment attempts for one paywall.
pub struct PaymentFlow {
    config: PaymentConfig,
    client: Arc<dyn PaymentClient>,
    state: watch::Sender<FlowSnapshot>,
    finished: broadcast::Sender<FinishedAttempt>,
}

impl fmt::Debug for PaymentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentFlow")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl PaymentFlow {
    /// Creates an idle flow.
    pub fn new(config: PaymentConfig, client: impl PaymentClient + 'static) -> Self {
        Self::with_client(config, Arc::new(client))
    }

    /// Creates an idle flow around a shared client.
    #[must_use]
    pub fn with_client(config: PaymentConfig, client: Arc<dyn PaymentClient>) -> Self {
        let (state, _) = watch::channel(FlowSnapshot::default());
        let (finished, _) = broadcast::channel(FINISHED_CHANNEL_CAPACITY);
        Self {
            config,
            client,
            state,
            finished,
        }
    }

    /// The flow's configuration.
    #[must_use]
    pub const fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Runs one payment attempt.
    ///
    /// Returns the settlement identifier on success and `None` on any failure;
    /// the failure itself is available through [`Self::error`]. This method
    /// never fails past its own boundary.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "x402.paywall.pay", skip(self), fields(network = %self.config.network))
    )]
    pub async fn pay(&self, amount: Decimal, description: &str) -> Option<String> {
        let mut attempt = 0;
        self.state.send_modify(|s| {
            attempt = s.attempt + 1;
            *s = FlowSnapshot::pending(attempt);
        });

        match self.execute(amount, description).await {
            Ok(outcome) => {
                let id = outcome.settlement_id.clone();
                #[cfg(feature = "telemetry")]
                tracing::info!(attempt, settlement_id = %id, "Payment succeeded");
                self.announce(attempt, AttemptOutcome::Settled {
                    settlement_id: id.clone(),
                    response_content: outcome.response_content.clone(),
                });
                self.finish(attempt, FlowSnapshot::succeeded(attempt, outcome));
                Some(id)
            }
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(attempt, kind = %err.kind(), error = %err, "Payment failed");
                self.announce(attempt, AttemptOutcome::Failed(err.clone()));
                self.finish(attempt, FlowSnapshot::failed(attempt, err));
                None
            }
        }
    }

    /// Returns the flow to idle, clearing error, settlement and content.
    pub fn reset(&self) {
        self.state.send_modify(|s| *s = FlowSnapshot::idle(s.attempt + 1));
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> FlowSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FlowSnapshot> {
        self.state.subscribe()
    }

    /// Subscribes to finished attempts, including superseded ones.
    ///
    /// Only attempts finishing after the call are received.
    #[must_use]
    pub fn subscribe_finished(&self) -> broadcast::Receiver<FinishedAttempt> {
        self.finished.subscribe()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> PaymentStatus {
        self.state.borrow().status
    }

    /// Returns `true` while an attempt is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Failure of the last attempt.
    #[must_use]
    pub fn error(&self) -> Option<PaymentError> {
        self.state.borrow().error.clone()
    }

    /// Settlement identifier of the last attempt.
    #[must_use]
    pub fn settlement_id(&self) -> Option<String> {
        self.state.borrow().settlement_id.clone()
    }

    /// Response content of the last attempt.
    #[must_use]
    pub fn response_content(&self) -> Option<String> {
        self.state.borrow().response_content.clone()
    }

    fn announce(&self, attempt: u64, outcome: AttemptOutcome) {
        // No receivers is not an error.
        let _ = self.finished.send(FinishedAttempt { attempt, outcome });
    }

    /// Publishes a final state unless a newer attempt has started.
    fn finish(&self, attempt: u64, snapshot: FlowSnapshot) {
        self.state.send_if_modified(|s| {
            if s.attempt == attempt {
                *s = snapshot;
                true
            } else {
                #[cfg(feature = "telemetry")]
                tracing::debug!(attempt, latest = s.attempt, "Attempt superseded, state left untouched");
                false
            }
        });
    }

    fn validate(&self, amount: Decimal) -> Result<(), PaymentError> {
        match self.config.max_amount {
            Some(max) if amount > max => Err(PaymentError::LimitExceeded { amount, max }),
            _ => Ok(()),
        }
    }

    async fn execute(
        &self,
        amount: Decimal,
        description: &str,
    ) -> Result<PaymentOutcome, PaymentError> {
        self.validate(amount)?;

        let wallet = self
            .config
            .wallet
            .wallet()
            .filter(|w| resolve_address(w.as_ref()).is_some())
            .ok_or(PaymentError::WalletNotConnected)?;

        let body = serde_json::to_value(PaymentBody {
            message: description,
            amount,
        })
        .map_err(|e| PaymentError::Unknown(e.to_string()))?;

        let request = PaymentRequest {
            url: self.config.endpoint().clone(),
            method: HttpMethod::Post,
            headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
            body,
            context: ClientContext {
                wallet,
                network: self.config.network,
                rpc_endpoint: self.config.rpc_endpoint.clone(),
                facilitator_endpoint: self.config.facilitator_endpoint.clone(),
                timeout: self.config.timeout,
            },
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(url = %request.url, %amount, "Sending payment request");

        let response = self.client.request(request).await?;
        if !response.is_success() {
            return Err(PaymentError::RequestFailed {
                status: response.status(),
                status_text: response.status_text().to_owned(),
            });
        }

        let (payload, response_content) = read_body(&response)?;
        let settlement_id = receipt::settlement_id(&response);

        Ok(PaymentOutcome {
            settlement_id,
            response_content,
            payload,
        })
    }
}

/// Parses the body according to its declared content type.
fn read_body(response: &PaymentResponse) -> Result<(ResponsePayload, String), PaymentError> {
    if response.is_json() {
        let value: serde_json::Value = serde_json::from_slice(response.body())
            .map_err(|e| PaymentError::Unknown(format!("invalid JSON response: {e}")))?;
        let content = value.to_string();
        Ok((ResponsePayload::Json(value), content))
    } else {
        let text = response.text();
        Ok((ResponsePayload::Text(text.clone()), text))
    }
}
