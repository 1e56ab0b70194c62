use std::collections::HashMap;

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, BlockNumber, U256},
};
use log::debug;

use crate::{config::SpiceFlowConfig, prelude::*, Error};

/// Read access to the chains an intent touches.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// The account's pending nonce on `chain_id`. Fails with [`Error::NonceLookup`].
    async fn account_nonce(&self, address: Address, chain_id: u64) -> Result<u64>;

    /// A recent block height on `chain_id`, used as a batch freshness bound. Fails with
    /// [`Error::BlockLookup`].
    async fn recent_block(&self, chain_id: u64) -> Result<U256>;
}

/// [`ChainReader`] over one JSON-RPC endpoint per configured chain.
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    providers: HashMap<u64, Provider<Http>>,
}

impl RpcChainReader {
    pub fn from_config(config: &SpiceFlowConfig) -> Result<Self> {
        let mut providers = HashMap::new();
        for chain in &config.chains {
            let provider = Provider::<Http>::try_from(chain.rpc_url.as_str()).map_err(|e| {
                Error::Config(format!("invalid rpc url {} for chain {}: {e}", chain.rpc_url, chain.chain_id))
            })?;
            providers.insert(chain.chain_id, provider);
        }
        Ok(Self { providers })
    }

    pub fn provider(&self, chain_id: u64) -> Option<&Provider<Http>> {
        self.providers.get(&chain_id)
    }

    /// Checks that the endpoint configured for `chain_id` really serves that chain.
    pub async fn verify_chain_id(&self, chain_id: u64) -> Result<()> {
        let provider = self
            .provider(chain_id)
            .ok_or_else(|| Error::Config(format!("no rpc endpoint configured for chain {chain_id}")))?;
        let reported = provider
            .get_chainid()
            .await
            .map_err(|e| Error::ChainQuery(e.to_string()))?;
        if reported != U256::from(chain_id) {
            return Err(Error::ChainQuery(format!(
                "wrong chain: expected {chain_id}, rpc reports {reported}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn account_nonce(&self, address: Address, chain_id: u64) -> Result<u64> {
        let provider = self.provider(chain_id).ok_or_else(|| {
            Error::NonceLookup(format!("no rpc endpoint configured for chain {chain_id}"))
        })?;
        let nonce = provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| Error::NonceLookup(e.to_string()))?;
        debug!("pending nonce of {address:?} on chain {chain_id}: {nonce}");
        if nonce > U256::from(u64::MAX) {
            return Err(Error::NonceLookup(format!("nonce {nonce} does not fit in 64 bits")));
        }
        Ok(nonce.as_u64())
    }

    async fn recent_block(&self, chain_id: u64) -> Result<U256> {
        let provider = self.provider(chain_id).ok_or_else(|| {
            Error::BlockLookup(format!("no rpc endpoint configured for chain {chain_id}"))
        })?;
        let block = provider
            .get_block_number()
            .await
            .map_err(|e| Error::BlockLookup(e.to_string()))?;
        Ok(U256::from(block.as_u64()))
    }
}

/// [`ChainReader`] answering from values the caller already holds, for pre-allocated nonces or
/// offline batch construction. Unknown chains fail the same way an RPC lookup would.
#[derive(Debug, Clone, Default)]
pub struct StaticChainReader {
    nonces: HashMap<u64, u64>,
    blocks: HashMap<u64, U256>,
}

impl StaticChainReader {
    pub fn with_nonce(mut self, chain_id: u64, nonce: u64) -> Self {
        self.nonces.insert(chain_id, nonce);
        self
    }

    pub fn with_recent_block(mut self, chain_id: u64, block: impl Into<U256>) -> Self {
        self.blocks.insert(chain_id, block.into());
        self
    }
}

#[async_trait]
impl ChainReader for StaticChainReader {
    async fn account_nonce(&self, _address: Address, chain_id: u64) -> Result<u64> {
        self.nonces
            .get(&chain_id)
            .copied()
            .ok_or_else(|| Error::NonceLookup(format!("no nonce known for chain {chain_id}")))
    }

    async fn recent_block(&self, chain_id: u64) -> Result<U256> {
        self.blocks
            .get(&chain_id)
            .copied()
            .ok_or_else(|| Error::BlockLookup(format!("no recent block known for chain {chain_id}")))
    }
}
