#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for the x402 paywall.
//!
//! Provides header encoding/decoding, challenge parsing, and (feature-gated)
//! the reqwest payment client and Solana RPC balance lookup that plug into
//! the seams of `x402-paywall`.
//!
//! # Modules
//!
//! - [`constants`]: HTTP header names, status codes, default URLs
//! - [`headers`]: Base64 encoding/decoding for x402 HTTP headers
//! - [`challenge`]: Payment challenge extraction and requirement selection
//! - [`error`]: HTTP transport error types
//! - [`middleware`]: 402 → sign → retry middleware (feature: `client`)
//! - [`client`]: [`HttpPaymentClient`](client::HttpPaymentClient) (feature: `client`)
//! - [`balance`]: [`RpcBalanceQuery`](balance::RpcBalanceQuery) (feature: `client`)

pub mod challenge;
pub mod constants;
pub mod error;
pub mod headers;

#[cfg(feature = "client")]
pub mod balance;
#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod middleware;

#[cfg(feature = "client")]
pub use balance::RpcBalanceQuery;
#[cfg(feature = "client")]
pub use client::HttpPaymentClient;
