#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Themable paywall for x402 micropayments on Solana.
//!
//! This crate gates content behind a USDC micropayment negotiated with the
//! x402 protocol. It holds the transport-independent parts: the payment flow
//! state machine, theme resolution, the paywall orchestrator and the seams
//! (wallet, payment client, balance lookup) that hosts plug into. The
//! reqwest-based payment client lives in `x402-paywall-http`.
//!
//! # Overview
//!
//! A [`Paywall`](paywall::Paywall) owns a [`PaymentFlow`](flow::PaymentFlow).
//! When the user pays, the flow sends one request through a
//! [`PaymentClient`](client::PaymentClient), which answers the server's
//! `402 Payment Required` challenge with a payment signed by the user's
//! [`WalletAdapter`](wallet::WalletAdapter). A successful response unlocks the
//! paywall and exposes the settlement identifier and response content.
//!
//! # Modules
//!
//! - [`balance`] - USDC balance lookup seam and display formatting
//! - [`client`] - Payment client seam, requests and responses
//! - [`config`] - Serializable paywall settings
//! - [`error`] - Payment and configuration errors
//! - [`flow`] - Payment flow controller and observable state
//! - [`networks`] - Supported Solana networks and their USDC mints
//! - [`paywall`] - Paywall orchestrator, builder and callbacks
//! - [`proto`] - x402 challenge wire types
//! - [`receipt`] - Settlement identifier extraction
//! - [`theme`] - Theme presets and resolved visual configuration
//! - [`view`] - Presentation-neutral view model of the gate
//! - [`wallet`] - Wallet adapter and provider seams
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod balance;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod networks;
pub mod paywall;
pub mod proto;
pub mod receipt;
pub mod theme;
pub mod view;
pub mod wallet;

pub use error::{ConfigError, PaymentError};
pub use flow::{AttemptOutcome, FinishedAttempt, FlowSnapshot, PaymentFlow, PaymentStatus};
pub use networks::Network;
pub use paywall::{Paywall, PaywallBuilder, Rendered};
pub use theme::ThemePreset;
