//! USDC balance lookup over Solana JSON-RPC.
//!
//! [`RpcBalanceQuery`] calls `getTokenAccountsByOwner` with the network's
//! USDC mint as filter and sums the raw amounts of every returned account.
//! A wallet without a token account has a zero balance.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;
use x402_paywall::balance::{BalanceError, BalanceQuery, from_base_units};
use x402_paywall::networks::Network;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Returns `true` if `address` looks like a base58 Solana public key.
fn is_plausible_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokenAccounts {
    value: Vec<KeyedAccount>,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct Account {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    parsed: ParsedAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    amount: String,
}

/// [`BalanceQuery`] backed by a Solana JSON-RPC node.
#[derive(Debug, Clone, Default)]
pub struct RpcBalanceQuery {
    client: Client,
    timeout: Option<Duration>,
}

impl RpcBalanceQuery {
    /// Creates a query with a default [`reqwest::Client`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query around `client`.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Sets a timeout for every RPC call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends one JSON-RPC call and unwraps its `result`.
    ///
    /// `context` names the call in errors (e.g. `"getTokenAccountsByOwner"`).
    async fn call<R: DeserializeOwned>(
        &self,
        url: &Url,
        context: &'static str,
        params: serde_json::Value,
    ) -> Result<R, BalanceError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": context,
            "params": params,
        });
        let mut req = self.client.post(url.clone()).json(&payload);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let response = req
            .send()
            .await
            .map_err(|e| BalanceError::Rpc(format!("{context}: {e}")))?;
        if !response.status().is_success() {
            return Err(BalanceError::Rpc(format!(
                "{context}: unexpected HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcEnvelope<R> = response
            .json()
            .await
            .map_err(|e| BalanceError::Malformed(format!("{context}: {e}")))?;
        match (envelope.result, envelope.error) {
            (_, Some(err)) => Err(BalanceError::Rpc(format!(
                "{context}: {} (code {})",
                err.message, err.code
            ))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(BalanceError::Malformed(format!(
                "{context}: response has neither result nor error"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl BalanceQuery for RpcBalanceQuery {
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "x402.paywall.usdc_balance", skip(self, rpc_endpoint), err)
    )]
    async fn usdc_balance(
        &self,
        address: &str,
        network: Network,
        rpc_endpoint: Option<&Url>,
    ) -> Result<Decimal, BalanceError> {
        if !is_plausible_address(address) {
            return Err(BalanceError::InvalidAddress(address.to_owned()));
        }
        let url = match rpc_endpoint {
            Some(url) => url.clone(),
            None => Url::parse(network.default_rpc_url())
                .map_err(|e| BalanceError::Rpc(e.to_string()))?,
        };

        let accounts: TokenAccounts = self
            .call(
                &url,
                "getTokenAccountsByOwner",
                json!([
                    address,
                    { "mint": network.usdc_mint() },
                    { "encoding": "jsonParsed", "commitment": "confirmed" }
                ]),
            )
            .await?;

        let mut total: u64 = 0;
        for keyed in &accounts.value {
            let raw = &keyed.account.data.parsed.info.token_amount.amount;
            let amount: u64 = raw
                .parse()
                .map_err(|_| BalanceError::Malformed(format!("token amount '{raw}'")))?;
            total = total
                .checked_add(amount)
                .ok_or_else(|| BalanceError::Malformed("token amount overflow".into()))?;
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(accounts = accounts.value.len(), raw = total, "Fetched USDC balance");

        Ok(from_base_units(total))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const OWNER: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn token_account(amount: &str) -> serde_json::Value {
        json!({
            "pubkey": "AccountPubkey",
            "account": {
                "data": {
                    "program": "spl-token",
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
                            "owner": OWNER,
                            "tokenAmount": { "amount": amount, "decimals": 6, "uiAmountString": "0" }
                        }
                    }
                },
                "lamports": 2039280
            }
        })
    }

    async fn rpc_server(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "getTokenAccountsByOwner",
                "params": [OWNER, { "mint": "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_sums_token_accounts() {
        let server = rpc_server(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1 },
                "value": [token_account("5000000"), token_account("210000")]
            }
        }))
        .await;

        let url: Url = server.uri().parse().unwrap();
        let balance = RpcBalanceQuery::new()
            .usdc_balance(OWNER, Network::SolanaDevnet, Some(&url))
            .await
            .unwrap();
        assert_eq!(balance, Decimal::new(521, 2));
    }

    #[tokio::test]
    async fn test_no_token_account_is_zero() {
        let server = rpc_server(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": [] }
        }))
        .await;

        let url: Url = server.uri().parse().unwrap();
        let balance = RpcBalanceQuery::new()
            .usdc_balance(OWNER, Network::SolanaDevnet, Some(&url))
            .await
            .unwrap();
        assert_eq!(balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = rpc_server(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param: could not find mint" }
        }))
        .await;

        let url: Url = server.uri().parse().unwrap();
        let err = RpcBalanceQuery::new()
            .usdc_balance(OWNER, Network::SolanaDevnet, Some(&url))
            .await
            .unwrap_err();
        assert!(matches!(err, BalanceError::Rpc(msg) if msg.contains("-32602")));
    }

    #[tokio::test]
    async fn test_invalid_address_skips_rpc() {
        let err = RpcBalanceQuery::new()
            .usdc_balance("0xNotSolana", Network::Solana, None)
            .await
            .unwrap_err();
        assert_eq!(err, BalanceError::InvalidAddress("0xNotSolana".into()));
    }

    #[test]
    fn test_address_plausibility() {
        assert!(is_plausible_address(OWNER));
        assert!(!is_plausible_address("short"));
        assert!(!is_plausible_address("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
    }
}
