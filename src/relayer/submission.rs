use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{delegation::Authorization, intent::ChainAuthorization};

/// The signed digest together with every batch it covers.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntentAuthorization {
    pub signature: Bytes,
    pub chain_batches: Vec<ChainAuthorization>,
}

/// Body of `POST /transaction/submit`.
///
/// Consistency between `authorization` and `intent_authorization.chain_batches` (one delegation
/// per chain, digest over exactly these batches) is the caller's responsibility.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntentSubmission {
    pub token_address: Address,
    #[serde(with = "crate::ser::decimal_u256")]
    pub token_amount: U256,
    /// The delegating account.
    pub address: Address,
    pub authorization: Vec<Authorization>,
    pub intent_authorization: IntentAuthorization,
}

impl IntentSubmission {
    pub fn new(
        user: Address,
        token_address: Address,
        token_amount: U256,
        authorization: Vec<Authorization>,
        signature: Bytes,
        chain_batches: Vec<ChainAuthorization>,
    ) -> Self {
        Self {
            token_address,
            token_amount,
            address: user,
            authorization,
            intent_authorization: IntentAuthorization {
                signature,
                chain_batches,
            },
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSubmitResponse {
    #[serde(default)]
    pub(crate) hash: Option<String>,
    #[serde(default)]
    pub(crate) intent_id: Option<String>,
}

/// What the relayer reports after accepting an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// Transaction hash, when the relayer already broadcast one.
    pub hash: Option<String>,
    pub intent_id: String,
}

impl SubmitResponse {
    /// The relayer identifies intents by their digest signature when it does not assign an id.
    pub(crate) fn from_raw(raw: RawSubmitResponse, signature: &Bytes) -> Self {
        Self {
            hash: raw.hash.filter(|h| !h.is_empty()),
            intent_id: raw
                .intent_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("0x{}", hex::encode(signature))),
        }
    }
}
