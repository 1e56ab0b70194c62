use std::{future::Future, sync::Arc};

use ethers::types::{Address, Bytes, H256, U256};
use futures_util::future::try_join_all;
use log::{debug, info};
use reqwest::Client;

use crate::{
    config::SpiceFlowConfig,
    delegation::{self, Authorization, DelegationRequest},
    intent::{hash_chain_batch, intent_digest_of, Call, ChainAuthorization, ChainBatch},
    prelude::*,
    provider::ChainReader,
    relayer::{
        IntentStepStatusResponse, IntentSubmission, PollOptions, RelayerClient, SubmitResponse,
    },
    signature::IntentSigner,
};

/// Calls for one chain. A missing `recent_block` is read from the chain when the batch is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub chain_id: u64,
    pub calls: Vec<Call>,
    pub recent_block: Option<U256>,
}

impl BatchRequest {
    pub fn new(chain_id: u64, calls: Vec<Call>) -> Self {
        Self {
            chain_id,
            calls,
            recent_block: None,
        }
    }

    pub fn with_recent_block(mut self, recent_block: impl Into<U256>) -> Self {
        self.recent_block = Some(recent_block.into());
        self
    }
}

/// Hashed batches in presentation order and the digest over them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedIntent {
    pub chain_batches: Vec<ChainAuthorization>,
    pub digest: H256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitIntentRequest {
    pub authorization: Vec<Authorization>,
    pub chain_batches: Vec<ChainAuthorization>,
    pub token_address: Address,
    pub token_amount: U256,
    /// Digest signature. Computed from `chain_batches` and signed here when absent.
    pub signature: Option<Bytes>,
}

/// Builds, signs and submits intents for one account.
#[derive(Debug)]
pub struct SpiceFlowClient<S, C> {
    pub config: SpiceFlowConfig,
    pub relayer: RelayerClient,
    pub signer: Arc<S>,
    pub chain_reader: Arc<C>,
}

impl<S, C> SpiceFlowClient<S, C>
where
    S: IntentSigner,
    C: ChainReader,
{
    pub fn new(
        client: Option<Client>,
        config: SpiceFlowConfig,
        signer: Arc<S>,
        chain_reader: Arc<C>,
    ) -> Self {
        let relayer = RelayerClient::from_config(client, &config);
        SpiceFlowClient {
            config,
            relayer,
            signer,
            chain_reader,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn delegate_for_chain(&self, chain_id: u64) -> Result<Address> {
        self.config.delegate_for_chain(chain_id)
    }

    /// A delegation to the configured delegate contract of every chain in `chain_ids`, with
    /// nonces looked up.
    pub fn delegation_requests(&self, chain_ids: &[u64]) -> Result<Vec<DelegationRequest>> {
        chain_ids
            .iter()
            .map(|chain_id| {
                self.delegate_for_chain(*chain_id)
                    .map(|delegate| DelegationRequest::new(*chain_id, delegate))
            })
            .collect()
    }

    pub async fn sign_delegations(
        &self,
        delegations: &[DelegationRequest],
    ) -> Result<Vec<Authorization>> {
        delegation::sign_delegations(self.signer.as_ref(), self.chain_reader.as_ref(), delegations)
            .await
    }

    /// Hashes every batch and composes the digest, keeping request order.
    pub async fn build_chain_batches(&self, requests: Vec<BatchRequest>) -> Result<PreparedIntent> {
        let batches = try_join_all(requests.into_iter().map(|request| async move {
            let recent_block = match request.recent_block {
                Some(block) => block,
                None => self.chain_reader.recent_block(request.chain_id).await?,
            };
            Ok::<_, crate::Error>(ChainBatch::new(request.chain_id, request.calls, recent_block))
        }))
        .await?;

        let chain_batches: Vec<ChainAuthorization> =
            batches.into_iter().map(hash_chain_batch).collect();
        let digest = intent_digest_of(&chain_batches)?;
        info!(
            "intent over {} chain(s) has digest {digest:?}",
            chain_batches.len()
        );
        Ok(PreparedIntent {
            chain_batches,
            digest,
        })
    }

    pub async fn sign_intent(&self, digest: H256) -> Result<Bytes> {
        self.signer.sign_digest(digest).await
    }

    pub async fn submit_intent(&self, request: SubmitIntentRequest) -> Result<SubmitResponse> {
        let signature = match request.signature {
            Some(signature) => signature,
            None => {
                let digest = intent_digest_of(&request.chain_batches)?;
                debug!("no signature supplied, signing digest {digest:?}");
                self.sign_intent(digest).await?
            }
        };
        let submission = IntentSubmission::new(
            self.address(),
            request.token_address,
            request.token_amount,
            request.authorization,
            signature,
            request.chain_batches,
        );
        self.relayer.submit(&submission).await
    }

    /// Polls the relayer until the step is terminal, `options.timeout` elapses or `cancel`
    /// completes.
    pub async fn wait_for_step<F>(
        &self,
        intent_id: &str,
        options: PollOptions,
        cancel: F,
    ) -> Result<IntentStepStatusResponse>
    where
        F: Future<Output = ()>,
    {
        self.relayer
            .poller(intent_id)
            .with_options(options)
            .wait(cancel)
            .await
    }
}
