//! Request-for-quote trades prepared by the relayer.

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::intent::Call;

/// Body of `POST /rfqt`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RfqtRequest {
    pub user: Address,
    /// Input asset: symbol, address or provider-defined key.
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "crate::ser::decimal_u256")]
    pub amount_in: U256,
    #[serde(with = "crate::ser::decimal_u256")]
    pub amount_out: U256,
    /// Unix timestamp, seconds.
    pub expiry: u64,
    pub quote_id: Bytes,
}

/// The trade to execute, in call form.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RfqtResponse {
    pub to: Address,
    #[serde(with = "crate::ser::decimal_u256")]
    pub value: U256,
    pub data: Bytes,
}

impl From<RfqtResponse> for Call {
    fn from(response: RfqtResponse) -> Self {
        Call::new(response.to, response.value, response.data)
    }
}
