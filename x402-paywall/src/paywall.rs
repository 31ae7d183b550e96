//! Paywall orchestrator.
//!
//! A [`Paywall`] owns one [`PaymentFlow`] and turns its state into what the
//! host application sees: a locked gate ([`Rendered::Gate`]) until a payment
//! succeeds, the protected content ([`Rendered::Content`]) afterwards, and
//! lifecycle callbacks along the way.
//!
//! The host drives it explicitly:
//!
//! - [`Paywall::refresh_wallet`] whenever the wallet connection may have changed,
//! - [`Paywall::handle_payment`] when the user presses the pay button,
//! - [`Paywall::render`] to obtain what to display,
//! - [`Paywall::disconnect`] when the user presses disconnect.
//!
//! Once unlocked, a paywall stays unlocked for its whole lifetime, even if a
//! later attempt fails or the flow is reset.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::broadcast::{self, error::TryRecvError};
use url::Url;

use crate::balance::{BalanceQuery, ZERO_BALANCE, display_balance};
use crate::client::PaymentClient;
use crate::error::{ConfigError, PaymentError};
use crate::flow::{AttemptOutcome, FinishedAttempt, PaymentConfig, PaymentFlow, PaymentStatus};
use crate::networks::Network;
use crate::theme::ThemePreset;
use crate::view::{ClassOverrides, DisplayOptions, GateInput, GateView, StyleOverrides};
use crate::wallet::WalletProvider;

/// Called right before a payment attempt starts.
pub type PaymentStartHandler = Box<dyn Fn() + Send + Sync>;

/// Called with the settlement identifier and response content of a successful attempt.
pub type PaymentSuccessHandler = Box<dyn Fn(&str, Option<&str>) + Send + Sync>;

/// Called with the failure of an attempt.
pub type PaymentErrorHandler = Box<dyn Fn(&PaymentError) + Send + Sync>;

/// Called with the address of a newly connected wallet.
pub type WalletConnectHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Called when the user asks to disconnect.
pub type DisconnectHandler = Box<dyn Fn() + Send + Sync>;

/// Host capability that applies the preset to UI rendered outside the paywall,
/// such as a wallet-selection modal.
///
/// Implementations typically put [`ThemePreset::ambient_class`] on the host
/// document. Called once when the paywall is built and on every
/// [`Paywall::set_theme`].
pub trait AmbientTheme: Send + Sync {
    /// Applies `preset` to the hosting environment.
    fn apply(&self, preset: ThemePreset);
}

/// Validated price and description of the protected content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentParameters {
    amount: Decimal,
    description: String,
    max_amount: Option<Decimal>,
}

impl PaymentParameters {
    /// Creates parameters for a strictly positive `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveAmount`] if `amount <= 0`.
    pub fn new(amount: Decimal, description: impl Into<String>) -> Result<Self, ConfigError> {
        if amount <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveAmount(amount));
        }
        Ok(Self {
            amount,
            description: description.into(),
            max_amount: None,
        })
    }

    /// Caps every attempt at `max`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveMaximum`] if `max <= 0`.
    pub fn with_max_amount(mut self, max: Decimal) -> Result<Self, ConfigError> {
        if max <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveMaximum(max));
        }
        self.max_amount = Some(max);
        Ok(self)
    }

    /// Price in USDC.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// What is being paid for.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Upper bound on any attempt.
    #[must_use]
    pub const fn max_amount(&self) -> Option<Decimal> {
        self.max_amount
    }
}

/// Content revealed by a successful payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedContent {
    /// Settlement identifier of the payment that unlocked the paywall.
    pub settlement_id: String,
    /// Response content returned by the paid endpoint.
    pub response_content: Option<String>,
}

/// What the host should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The protected content.
    Content(UnlockedContent),
    /// The payment gate.
    Gate(Box<GateView>),
}

impl Rendered {
    /// Returns `true` for [`Rendered::Content`].
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self, Self::Content(_))
    }
}

#[derive(Default)]
struct Callbacks {
    on_payment_start: Option<PaymentStartHandler>,
    on_payment_success: Option<PaymentSuccessHandler>,
    on_payment_error: Option<PaymentErrorHandler>,
    on_wallet_connect: Option<WalletConnectHandler>,
    on_disconnect: Option<DisconnectHandler>,
}

#[derive(Debug)]
struct GateState {
    theme: ThemePreset,
    unlocked: Option<UnlockedContent>,
    last_address: Option<String>,
    balance: String,
}

/// A themable gate in front of paid content.
pub struct Paywall {
    flow: PaymentFlow,
    params: PaymentParameters,
    options: DisplayOptions,
    class_overrides: ClassOverrides,
    style_overrides: StyleOverrides,
    callbacks: Callbacks,
    balance_query: Option<Arc<dyn BalanceQuery>>,
    ambient_theme: Option<Arc<dyn AmbientTheme>>,
    finished: Mutex<broadcast::Receiver<FinishedAttempt>>,
    state: Mutex<GateState>,
}

impl fmt::Debug for Paywall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paywall")
            .field("flow", &self.flow)
            .field("params", &self.params)
            .field("options", &self.options)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Paywall {
    /// Starts building a paywall.
    #[must_use]
    pub fn builder() -> PaywallBuilder {
        PaywallBuilder::default()
    }

    /// The underlying payment flow.
    #[must_use]
    pub const fn flow(&self) -> &PaymentFlow {
        &self.flow
    }

    /// Price and description.
    #[must_use]
    pub const fn parameters(&self) -> &PaymentParameters {
        &self.params
    }

    /// Active theme preset.
    #[must_use]
    pub fn theme(&self) -> ThemePreset {
        lock(&self.state).theme
    }

    /// Balance shown for the connected wallet, two decimals.
    #[must_use]
    pub fn balance(&self) -> String {
        lock(&self.state).balance.clone()
    }

    /// Returns `true` once a payment has succeeded.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        lock(&self.state).unlocked.is_some()
    }

    /// Switches the preset and re-applies the ambient theme.
    pub fn set_theme(&self, preset: ThemePreset) {
        lock(&self.state).theme = preset;
        if let Some(ambient) = &self.ambient_theme {
            ambient.apply(preset);
        }
    }

    /// Observes the wallet provider.
    ///
    /// When the connected address differs from the last one seen, fires
    /// `on_wallet_connect` and refreshes the balance, once per address. The
    /// balance is fetched whether or not it is displayed. A failed balance
    /// lookup shows [`ZERO_BALANCE`]. Returns the current address.
    #[cfg_attr(feature = "telemetry", tracing::instrument(name = "x402.paywall.refresh_wallet", skip(self)))]
    pub async fn refresh_wallet(&self) -> Option<String> {
        let address = self.flow.config().wallet.address();
        {
            let mut state = lock(&self.state);
            if state.last_address == address {
                return address;
            }
            state.last_address.clone_from(&address);
            state.balance = ZERO_BALANCE.to_owned();
        }

        let Some(current) = address else {
            #[cfg(feature = "telemetry")]
            tracing::debug!("Wallet disconnected");
            return None;
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(address = %current, "Wallet connected");
        if let Some(handler) = &self.callbacks.on_wallet_connect {
            handler(&current);
        }

        if let Some(query) = &self.balance_query {
            let config = self.flow.config();
            let balance = display_balance(
                query
                    .usdc_balance(&current, config.network, config.rpc_endpoint.as_ref())
                    .await,
            );
            let mut state = lock(&self.state);
            if state.last_address.as_deref() == Some(current.as_str()) {
                state.balance = balance;
            }
        }

        Some(current)
    }

    /// Runs one payment attempt for the configured price.
    ///
    /// Fires `on_payment_start`, then reports the outcome through
    /// [`Self::sync`]. Calling it again after a failure is a retry.
    pub async fn handle_payment(&self) -> Option<String> {
        if let Some(handler) = &self.callbacks.on_payment_start {
            handler();
        }
        let settlement_id = self
            .flow
            .pay(self.params.amount(), self.params.description())
            .await;
        self.sync();
        settlement_id
    }

    /// Reports every attempt that finished since the last call.
    ///
    /// Attempts are reported in the order they finished, superseded ones
    /// included, so a success is never lost to a newer attempt. A success
    /// unlocks the paywall and fires `on_payment_success`; a failure fires
    /// `on_payment_error`. Each attempt is reported at most once.
    pub fn sync(&self) {
        loop {
            let next = lock(&self.finished).try_recv();
            match next {
                Ok(finished) => self.report(finished),
                Err(TryRecvError::Lagged(_)) => {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!("Finished attempts dropped before being reported");
                    self.unlock_from_snapshot();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn report(&self, finished: FinishedAttempt) {
        match finished.outcome {
            AttemptOutcome::Settled {
                settlement_id,
                response_content,
            } => {
                {
                    let mut state = lock(&self.state);
                    if state.unlocked.is_none() {
                        state.unlocked = Some(UnlockedContent {
                            settlement_id: settlement_id.clone(),
                            response_content: Some(response_content.clone()),
                        });
                    }
                }
                if let Some(handler) = &self.callbacks.on_payment_success {
                    handler(&settlement_id, Some(&response_content));
                }
            }
            AttemptOutcome::Failed(err) => {
                if let Some(handler) = &self.callbacks.on_payment_error {
                    handler(&err);
                }
            }
        }
    }

    /// Unlocks from the latest state after reports were dropped.
    fn unlock_from_snapshot(&self) {
        let snapshot = self.flow.snapshot();
        if snapshot.status != PaymentStatus::Success {
            return;
        }
        let mut state = lock(&self.state);
        if state.unlocked.is_none()
            && let Some(settlement_id) = snapshot.settlement_id
        {
            state.unlocked = Some(UnlockedContent {
                settlement_id,
                response_content: snapshot.response_content,
            });
        }
    }

    /// What to display right now.
    ///
    /// Consumes pending flow updates first, so callbacks may fire from here.
    #[must_use]
    pub fn render(&self) -> Rendered {
        self.sync();
        let snapshot = self.flow.snapshot();
        let address = self.flow.config().wallet.address();

        let state = lock(&self.state);
        if let Some(content) = &state.unlocked {
            return Rendered::Content(content.clone());
        }

        let view = GateView::build(&GateInput {
            preset: state.theme,
            classes: &self.class_overrides,
            styles: &self.style_overrides,
            options: self.options,
            amount: self.params.amount(),
            description: self.params.description(),
            network: self.flow.config().network,
            address: address.as_deref(),
            balance: &state.balance,
            snapshot: &snapshot,
        });
        Rendered::Gate(Box::new(view))
    }

    /// Disconnects the wallet.
    ///
    /// Uses the caller's `on_disconnect` handler when given, otherwise the
    /// provider's ambient disconnect, otherwise does nothing.
    pub fn disconnect(&self) {
        if let Some(handler) = &self.callbacks.on_disconnect {
            handler();
        } else if !self.flow.config().wallet.disconnect() {
            #[cfg(feature = "telemetry")]
            tracing::debug!("Wallet provider has no disconnect capability");
        }
    }
}

/// Builder for [`Paywall`].
#[derive(Default)]
pub struct PaywallBuilder {
    amount: Option<Decimal>,
    description: String,
    wallet: Option<Arc<dyn WalletProvider>>,
    client: Option<Arc<dyn PaymentClient>>,
    network: Network,
    rpc_endpoint: Option<Url>,
    api_endpoint: Option<Url>,
    facilitator_endpoint: Option<Url>,
    timeout: Option<Duration>,
    max_payment_amount: Option<Decimal>,
    theme: ThemePreset,
    options: DisplayOptions,
    class_overrides: ClassOverrides,
    style_overrides: StyleOverrides,
    callbacks: Callbacks,
    balance_query: Option<Arc<dyn BalanceQuery>>,
    ambient_theme: Option<Arc<dyn AmbientTheme>>,
}

impl fmt::Debug for PaywallBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaywallBuilder")
            .field("amount", &self.amount)
            .field("description", &self.description)
            .field("network", &self.network)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl PaywallBuilder {
    /// Price in USDC. Required.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// What is being paid for.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Wallet source. Required.
    #[must_use]
    pub fn wallet(self, wallet: impl WalletProvider + 'static) -> Self {
        self.wallet_provider(Arc::new(wallet))
    }

    /// Shared wallet source.
    #[must_use]
    pub fn wallet_provider(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Payment client. Required.
    #[must_use]
    pub fn client(mut self, client: impl PaymentClient + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Network to pay on. Defaults to devnet.
    #[must_use]
    pub const fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// RPC endpoint override.
    #[must_use]
    pub fn rpc_endpoint(mut self, url: Url) -> Self {
        self.rpc_endpoint = Some(url);
        self
    }

    /// Paid-content endpoint.
    #[must_use]
    pub fn api_endpoint(mut self, url: Url) -> Self {
        self.api_endpoint = Some(url);
        self
    }

    /// Facilitator endpoint.
    #[must_use]
    pub fn facilitator_endpoint(mut self, url: Url) -> Self {
        self.facilitator_endpoint = Some(url);
        self
    }

    /// Round-trip timeout forwarded to the client.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Upper bound on any attempt.
    #[must_use]
    pub const fn max_payment_amount(mut self, max: Decimal) -> Self {
        self.max_payment_amount = Some(max);
        self
    }

    /// Visual preset.
    #[must_use]
    pub const fn theme(mut self, theme: ThemePreset) -> Self {
        self.theme = theme;
        self
    }

    /// Show the wallet's balance. Defaults to `true`.
    #[must_use]
    pub const fn show_balance(mut self, show: bool) -> Self {
        self.options.show_balance = show;
        self
    }

    /// Show network information. Defaults to `true`.
    #[must_use]
    pub const fn show_network_info(mut self, show: bool) -> Self {
        self.options.show_network_info = show;
        self
    }

    /// Show the payment-details panel. Defaults to `true`.
    #[must_use]
    pub const fn show_payment_details(mut self, show: bool) -> Self {
        self.options.show_payment_details = show;
        self
    }

    /// Extra classes per slot.
    #[must_use]
    pub fn class_overrides(mut self, overrides: ClassOverrides) -> Self {
        self.class_overrides = overrides;
        self
    }

    /// Extra inline styles per slot.
    #[must_use]
    pub fn style_overrides(mut self, overrides: StyleOverrides) -> Self {
        self.style_overrides = overrides;
        self
    }

    /// Balance lookup for the wallet section.
    #[must_use]
    pub fn balance_query(mut self, query: impl BalanceQuery + 'static) -> Self {
        self.balance_query = Some(Arc::new(query));
        self
    }

    /// Ambient theme capability of the host.
    #[must_use]
    pub fn ambient_theme(mut self, ambient: impl AmbientTheme + 'static) -> Self {
        self.ambient_theme = Some(Arc::new(ambient));
        self
    }

    /// See [`PaymentStartHandler`].
    #[must_use]
    pub fn on_payment_start(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_payment_start = Some(Box::new(handler));
        self
    }

    /// See [`PaymentSuccessHandler`].
    #[must_use]
    pub fn on_payment_success(
        mut self,
        handler: impl Fn(&str, Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_payment_success = Some(Box::new(handler));
        self
    }

    /// See [`PaymentErrorHandler`].
    #[must_use]
    pub fn on_payment_error(
        mut self,
        handler: impl Fn(&PaymentError) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_payment_error = Some(Box::new(handler));
        self
    }

    /// See [`WalletConnectHandler`].
    #[must_use]
    pub fn on_wallet_connect(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callbacks.on_wallet_connect = Some(Box::new(handler));
        self
    }

    /// See [`DisconnectHandler`].
    #[must_use]
    pub fn on_disconnect(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_disconnect = Some(Box::new(handler));
        self
    }

    /// Validates the configuration and builds the paywall.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the amount, wallet or client is missing, or
    /// if the amount or maximum is not strictly positive.
    pub fn build(self) -> Result<Paywall, ConfigError> {
        let amount = self.amount.ok_or(ConfigError::MissingField("amount"))?;
        let mut params = PaymentParameters::new(amount, self.description)?;
        if let Some(max) = self.max_payment_amount {
            params = params.with_max_amount(max)?;
        }
        let wallet = self.wallet.ok_or(ConfigError::MissingField("wallet"))?;
        let client = self.client.ok_or(ConfigError::MissingField("client"))?;

        let config = PaymentConfig {
            wallet,
            network: self.network,
            rpc_endpoint: self.rpc_endpoint,
            api_endpoint: self.api_endpoint,
            facilitator_endpoint: self.facilitator_endpoint,
            max_amount: params.max_amount(),
            timeout: self.timeout,
        };
        let flow = PaymentFlow::with_client(config, client);
        let finished = Mutex::new(flow.subscribe_finished());

        if let Some(ambient) = &self.ambient_theme {
            ambient.apply(self.theme);
        }

        Ok(Paywall {
            flow,
            params,
            options: self.options,
            class_overrides: self.class_overrides,
            style_overrides: self.style_overrides,
            callbacks: self.callbacks,
            balance_query: self.balance_query,
            ambient_theme: self.ambient_theme,
            finished,
            state: Mutex::new(GateState {
                theme: self.theme,
                unlocked: None,
                last_address: None,
                balance: ZERO_BALANCE.to_owned(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::balance::BalanceError;
    use crate::client::{ClientError, PaymentRequest, PaymentResponse};
    use crate::error::PaymentErrorKind;
    use crate::proto::PaymentRequirements;
    use crate::wallet::{WalletAdapter, WalletError};

    struct KeyWallet(String);

    #[async_trait::async_trait]
    impl WalletAdapter for KeyWallet {
        fn public_key(&self) -> Option<String> {
            Some(self.0.clone())
        }

        async fn sign_payment(
            &self,
            _requirements: &PaymentRequirements,
        ) -> Result<serde_json::Value, WalletError> {
            Ok(serde_json::json!({ "transaction": "AQID" }))
        }
    }

    #[derive(Default)]
    struct HostWallet {
        address: Mutex<Option<String>>,
        disconnects: AtomicUsize,
    }

    impl HostWallet {
        fn connected(address: &str) -> Arc<Self> {
            let host = Self::default();
            *host.address.lock().unwrap() = Some(address.to_owned());
            Arc::new(host)
        }

        fn set(&self, address: Option<&str>) {
            *self.address.lock().unwrap() = address.map(str::to_owned);
        }
    }

    impl WalletProvider for HostWallet {
        fn wallet(&self) -> Option<Arc<dyn WalletAdapter>> {
            self.address
                .lock()
                .unwrap()
                .clone()
                .map(|a| Arc::new(KeyWallet(a)) as Arc<dyn WalletAdapter>)
        }

        fn disconnect(&self) -> bool {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    /// Answers with queued responses, then with the last one forever.
    struct ScriptedClient {
        calls: AtomicUsize,
        script: Mutex<VecDeque<Result<PaymentResponse, ClientError>>>,
    }

    impl ScriptedClient {
        fn new(script: impl IntoIterator<Item = Result<PaymentResponse, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into_iter().collect()),
            })
        }
    }

    #[async_trait::async_trait]
    impl PaymentClient for ScriptedClient {
        async fn request(&self, _request: PaymentRequest) -> Result<PaymentResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    struct FixedBalance {
        calls: Arc<AtomicUsize>,
        result: Result<Decimal, BalanceError>,
    }

    #[async_trait::async_trait]
    impl BalanceQuery for FixedBalance {
        async fn usdc_balance(
            &self,
            _address: &str,
            _network: Network,
            _rpc_endpoint: Option<&Url>,
        ) -> Result<Decimal, BalanceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAmbient(Arc<Mutex<Vec<ThemePreset>>>);

    impl AmbientTheme for RecordingAmbient {
        fn apply(&self, preset: ThemePreset) {
            self.0.lock().unwrap().push(preset);
        }
    }

    fn ok_json(body: &str) -> Result<PaymentResponse, ClientError> {
        Ok(PaymentResponse::new(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_owned()))
    }

    fn server_error() -> Result<PaymentResponse, ClientError> {
        Ok(PaymentResponse::new(500).with_status_text("Internal Server Error"))
    }

    fn builder(host: &Arc<HostWallet>, client: &Arc<ScriptedClient>) -> PaywallBuilder {
        Paywall::builder()
            .amount(Decimal::new(250, 2))
            .description("Premium article")
            .wallet_provider(Arc::clone(host) as Arc<dyn WalletProvider>)
            .client(Arc::clone(client))
    }

    #[test]
    fn test_builder_validation() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([server_error()]);

        let err = Paywall::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingField("amount"));

        let err = builder(&host, &client).amount(Decimal::ZERO).build().unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveAmount(Decimal::ZERO));

        let err = builder(&host, &client)
            .max_payment_amount(Decimal::new(-1, 0))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveMaximum(Decimal::new(-1, 0)));

        let err = Paywall::builder()
            .amount(Decimal::ONE)
            .wallet_provider(Arc::clone(&host) as Arc<dyn WalletProvider>)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingField("client"));
    }

    #[tokio::test]
    async fn test_success_unlocks_and_reports_once() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json(r#"{"article":"full text"}"#)]);
        let successes = Arc::new(Mutex::new(Vec::new()));
        let starts = Arc::new(AtomicUsize::new(0));

        let paywall = {
            let successes = Arc::clone(&successes);
            let starts = Arc::clone(&starts);
            builder(&host, &client)
                .on_payment_start(move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                })
                .on_payment_success(move |id, content| {
                    successes
                        .lock()
                        .unwrap()
                        .push((id.to_owned(), content.map(str::to_owned)));
                })
                .build()
                .unwrap()
        };

        assert!(!paywall.render().is_unlocked());
        let id = paywall.handle_payment().await.unwrap();
        paywall.sync();
        paywall.sync();

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        let recorded = successes.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, id);
        assert_eq!(recorded[0].1.as_deref(), Some(r#"{"article":"full text"}"#));

        match paywall.render() {
            Rendered::Content(content) => assert_eq!(content.settlement_id, id),
            Rendered::Gate(_) => panic!("expected unlocked content"),
        }
    }

    #[tokio::test]
    async fn test_unlock_is_monotonic() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}"), server_error()]);
        let errors = Arc::new(AtomicUsize::new(0));

        let paywall = {
            let errors = Arc::clone(&errors);
            builder(&host, &client)
                .on_payment_error(move |_| {
                    errors.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap()
        };

        assert!(paywall.handle_payment().await.is_some());
        assert!(paywall.is_unlocked());

        assert_eq!(paywall.handle_payment().await, None);
        assert_eq!(paywall.flow().status(), PaymentStatus::Error);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(paywall.is_unlocked());

        paywall.flow().reset();
        assert!(paywall.render().is_unlocked());
    }

    #[tokio::test]
    async fn test_success_overtaken_by_newer_failure_still_unlocks() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([
            ok_json(r#"{"article":"full text"}"#),
            Err(ClientError::Transport("connection reset".into())),
        ]);
        let successes = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let paywall = {
            let successes = Arc::clone(&successes);
            let errors = Arc::clone(&errors);
            builder(&host, &client)
                .on_payment_success(move |id, _| successes.lock().unwrap().push(id.to_owned()))
                .on_payment_error(move |err| errors.lock().unwrap().push(err.kind()))
                .build()
                .unwrap()
        };

        let id = paywall.flow().pay(Decimal::ONE, "x").await.unwrap();
        assert_eq!(paywall.handle_payment().await, None);
        assert_eq!(paywall.flow().status(), PaymentStatus::Error);

        assert!(paywall.is_unlocked());
        assert_eq!(*successes.lock().unwrap(), [id.clone()]);
        assert_eq!(*errors.lock().unwrap(), [PaymentErrorKind::TransportFailure]);
        match paywall.render() {
            Rendered::Content(content) => {
                assert_eq!(content.settlement_id, id);
                assert_eq!(
                    content.response_content.as_deref(),
                    Some(r#"{"article":"full text"}"#)
                );
            }
            Rendered::Gate(_) => panic!("expected unlocked content"),
        }
        assert_eq!(successes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([server_error(), ok_json("{}")]);
        let errors = Arc::new(Mutex::new(Vec::new()));

        let paywall = {
            let errors = Arc::clone(&errors);
            builder(&host, &client)
                .on_payment_error(move |err| errors.lock().unwrap().push(err.kind()))
                .build()
                .unwrap()
        };

        assert_eq!(paywall.handle_payment().await, None);
        match paywall.render() {
            Rendered::Gate(view) => {
                assert_eq!(
                    view.error.as_deref(),
                    Some("Payment request failed: Internal Server Error")
                );
                assert_eq!(view.button.label, "Pay $2.50 USDC");
            }
            Rendered::Content(_) => panic!("expected gate"),
        }

        assert!(paywall.handle_payment().await.is_some());
        assert!(paywall.render().is_unlocked());
        assert_eq!(*errors.lock().unwrap(), [PaymentErrorKind::RequestFailed]);
    }

    #[tokio::test]
    async fn test_limit_exceeded_skips_client() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let paywall = builder(&host, &client)
            .max_payment_amount(Decimal::ONE)
            .build()
            .unwrap();

        assert_eq!(paywall.handle_payment().await, None);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            paywall.flow().error().map(|e| e.kind()),
            Some(PaymentErrorKind::LimitExceeded)
        );
        assert!(!paywall.is_unlocked());
    }

    #[tokio::test]
    async fn test_wallet_connect_fires_once_per_address() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let connected = Arc::new(Mutex::new(Vec::new()));
        let balance_calls = Arc::new(AtomicUsize::new(0));

        let paywall = {
            let connected = Arc::clone(&connected);
            builder(&host, &client)
                .on_wallet_connect(move |address| connected.lock().unwrap().push(address.to_owned()))
                .balance_query(FixedBalance {
                    calls: Arc::clone(&balance_calls),
                    result: Ok(Decimal::new(5_210, 3)),
                })
                .build()
                .unwrap()
        };

        assert_eq!(paywall.balance(), "0.00");
        paywall.refresh_wallet().await;
        paywall.refresh_wallet().await;
        assert_eq!(*connected.lock().unwrap(), ["Payer1111"]);
        assert_eq!(balance_calls.load(Ordering::SeqCst), 1);
        assert_eq!(paywall.balance(), "5.21");

        host.set(Some("Payer2222"));
        assert_eq!(paywall.refresh_wallet().await.as_deref(), Some("Payer2222"));
        assert_eq!(*connected.lock().unwrap(), ["Payer1111", "Payer2222"]);
        assert_eq!(balance_calls.load(Ordering::SeqCst), 2);

        host.set(None);
        assert_eq!(paywall.refresh_wallet().await, None);
        assert_eq!(paywall.balance(), "0.00");
    }

    #[tokio::test]
    async fn test_hidden_balance_is_still_refreshed() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let balance_calls = Arc::new(AtomicUsize::new(0));
        let paywall = builder(&host, &client)
            .show_balance(false)
            .balance_query(FixedBalance {
                calls: Arc::clone(&balance_calls),
                result: Ok(Decimal::new(1_000, 3)),
            })
            .build()
            .unwrap();

        paywall.refresh_wallet().await;
        paywall.refresh_wallet().await;
        assert_eq!(balance_calls.load(Ordering::SeqCst), 1);
        assert_eq!(paywall.balance(), "1.00");

        host.set(Some("Payer2222"));
        paywall.refresh_wallet().await;
        assert_eq!(balance_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_balance_failure_shows_zero() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let paywall = builder(&host, &client)
            .balance_query(FixedBalance {
                calls: Arc::new(AtomicUsize::new(0)),
                result: Err(BalanceError::Rpc("connection refused".into())),
            })
            .build()
            .unwrap();

        paywall.refresh_wallet().await;
        assert_eq!(paywall.balance(), "0.00");
    }

    #[test]
    fn test_disconnect_prefers_caller_handler() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let handled = Arc::new(AtomicUsize::new(0));

        let with_handler = {
            let handled = Arc::clone(&handled);
            builder(&host, &client)
                .on_disconnect(move || {
                    handled.fetch_add(1, Ordering::SeqCst);
                })
                .build()
                .unwrap()
        };
        with_handler.disconnect();
        assert_eq!(handled.load(Ordering::SeqCst), 1);
        assert_eq!(host.disconnects.load(Ordering::SeqCst), 0);

        let without_handler = builder(&host, &client).build().unwrap();
        without_handler.disconnect();
        assert_eq!(host.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ambient_theme_applied_on_build_and_switch() {
        let host = HostWallet::connected("Payer1111");
        let client = ScriptedClient::new([ok_json("{}")]);
        let ambient = RecordingAmbient::default();

        let paywall = builder(&host, &client)
            .theme(ThemePreset::Seeker)
            .ambient_theme(ambient.clone())
            .build()
            .unwrap();
        paywall.set_theme(ThemePreset::Terminal);

        assert_eq!(
            *ambient.0.lock().unwrap(),
            [ThemePreset::Seeker, ThemePreset::Terminal]
        );
        match paywall.render() {
            Rendered::Gate(view) => assert_eq!(view.preset, ThemePreset::Terminal),
            Rendered::Content(_) => panic!("expected gate"),
        }
    }
}
