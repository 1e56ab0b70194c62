//! DODO route-service client. Route selection happens on DODO's side; this module only asks for
//! a route and turns it into batch calls.

use std::{str::FromStr, time::Duration};

use ethers::types::{Address, Bytes, U256};
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    consts::DODO_ROUTE_API_URL,
    erc20,
    intent::Call,
    prelude::*,
    req::{self, HttpClient},
    Error,
};

/// Parameters of a route query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub from_token_address: Address,
    pub from_token_decimals: u8,
    pub to_token_address: Address,
    pub to_token_decimals: u8,
    pub from_amount: U256,
    /// Passed through as DODO expects it.
    pub slippage: f64,
    pub user_addr: Address,
    pub chain_id: u64,
    /// RPC the route service should quote against.
    pub rpc: String,
}

impl RouteRequest {
    fn query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("fromTokenAddress", format!("{:?}", self.from_token_address)),
            ("fromTokenDecimals", self.from_token_decimals.to_string()),
            ("toTokenAddress", format!("{:?}", self.to_token_address)),
            ("toTokenDecimals", self.to_token_decimals.to_string()),
            ("fromAmount", self.from_amount.to_string()),
            ("slippage", self.slippage.to_string()),
            ("userAddr", format!("{:?}", self.user_addr)),
            ("chainId", self.chain_id.to_string()),
            ("rpc", self.rpc.clone()),
            ("apikey", api_key.to_string()),
        ]
    }
}

#[derive(Deserialize, Debug)]
struct RouteEnvelope {
    status: i64,
    #[serde(default)]
    data: serde_json::Value,
}

/// A route returned by DODO: the router call to execute and where to send the approval.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DodoRoute {
    pub to: Address,
    pub data: Bytes,
    #[serde(default, with = "crate::ser::decimal_u256")]
    pub value: U256,
    #[serde(default)]
    pub target_approve_addr: Option<String>,
}

impl DodoRoute {
    /// The approval target, or the router itself when DODO gives none.
    pub fn spender(&self) -> Address {
        self.target_approve_addr
            .as_deref()
            .and_then(|addr| Address::from_str(addr).ok())
            .filter(|addr| !addr.is_zero())
            .unwrap_or(self.to)
    }

    /// `[approve(spender, amount), swap]` for an ERC-20 input of `amount` `from_token`.
    pub fn swap_calls(&self, from_token: Address, amount: U256) -> Result<Vec<Call>> {
        if self.to.is_zero() {
            return Err(Error::RouteService("route has no router address".to_string()));
        }
        if !self.value.is_zero() {
            return Err(Error::RouteService(format!(
                "unexpected non-zero value for ERC20 swap: {}",
                self.value
            )));
        }
        Ok(vec![
            erc20::approve_call(from_token, self.spender(), amount),
            Call::new(self.to, self.value, self.data.clone()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct DodoRouteClient {
    http_client: HttpClient,
    api_key: String,
}

impl DodoRouteClient {
    pub fn new(client: Option<Client>, api_key: impl Into<String>) -> Self {
        Self::with_url(client, DODO_ROUTE_API_URL, api_key, None)
    }

    pub fn with_url(
        client: Option<Client>,
        url: &str,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(client.unwrap_or_default(), url, timeout),
            api_key: api_key.into(),
        }
    }

    pub async fn get_route(&self, request: &RouteRequest) -> Result<DodoRoute> {
        info!(
            "querying DODO route {:?} -> {:?} for {} on chain {}",
            request.from_token_address,
            request.to_token_address,
            request.from_amount,
            request.chain_id
        );
        let http_request = self
            .http_client
            .client
            .get(self.http_client.base_url.as_str())
            .query(&request.query(&self.api_key));
        let body = req::execute(http_request, self.http_client.timeout)
            .await
            .map_err(Error::RouteRequest)?;
        debug!("DODO route response: {body}");
        parse_route(&body)
    }
}

fn parse_route(body: &str) -> Result<DodoRoute> {
    let envelope: RouteEnvelope = req::parse_json(body).map_err(Error::RouteRequest)?;
    if envelope.status != 200 {
        return Err(Error::RouteService(format!(
            "status {}: {body}",
            envelope.status
        )));
    }
    serde_json::from_value(envelope.data)
        .map_err(|e| Error::RouteService(format!("malformed route: {e}, body: {body}")))
}
