use std::time::Duration;

use ethers::types::Address;

use crate::{prelude::*, Error};

/// Per-chain settings: where to read chain state and which contract accounts delegate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub delegate_contract: Address,
}

impl ChainConfig {
    pub fn new(chain_id: u64, rpc_url: impl Into<String>, delegate_contract: Address) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.into(),
            delegate_contract,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiceFlowConfig {
    /// Relayer base url, without a trailing slash.
    pub tx_api_url: String,
    pub chains: Vec<ChainConfig>,
    /// Upper bound on every relayer request (submission, status checks, RFQT). `None` waits as
    /// long as the transport does.
    pub request_timeout: Option<Duration>,
}

impl SpiceFlowConfig {
    pub fn new(tx_api_url: impl Into<String>) -> Self {
        Self {
            tx_api_url: tx_api_url.into().trim_end_matches('/').to_string(),
            chains: Vec::new(),
            request_timeout: None,
        }
    }

    pub fn with_chain(mut self, chain: ChainConfig) -> Self {
        self.chains.retain(|c| c.chain_id != chain.chain_id);
        self.chains.push(chain);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .ok_or_else(|| Error::Config(format!("chain {chain_id} is not configured")))
    }

    pub fn delegate_for_chain(&self, chain_id: u64) -> Result<Address> {
        self.chain(chain_id).map(|c| c.delegate_contract)
    }
}
