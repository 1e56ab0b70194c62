mod client;
mod config;
mod consts;
mod delegation;
mod dodo;
pub mod erc20;
mod errors;
mod intent;
pub mod prelude;
mod provider;
mod relayer;
mod req;
mod rfqt;
mod ser;
mod signature;

pub use client::{BatchRequest, PreparedIntent, SpiceFlowClient, SubmitIntentRequest};
pub use config::{ChainConfig, SpiceFlowConfig};
pub use consts::{
    DEFAULT_POLL_INTERVAL, DEFAULT_STEP_ID, DODO_ROUTE_API_URL, EIP7702_AUTH_MAGIC,
    PHAROS_TESTNET_CHAIN_ID,
};
pub use delegation::{
    authorization_signing_hash, build_authorization, sign_delegations, Authorization,
    DelegationRequest,
};
pub use dodo::{DodoRoute, DodoRouteClient, RouteRequest};
pub use errors::{Error, HttpFailure};
pub use intent::{
    hash_chain_batch, hash_chain_batches, intent_digest, intent_digest_of, Call,
    ChainAuthorization, ChainBatch,
};
pub use provider::{ChainReader, RpcChainReader, StaticChainReader};
pub use relayer::{
    IntentAuthorization, IntentStepStatusResponse, IntentSubmission, PollOptions, RelayerClient,
    StatusPoller, StepStatus, StepStatusData, SubmitResponse,
};
pub use req::HttpClient;
pub use rfqt::{RfqtRequest, RfqtResponse};
pub use ser::parse_u256;
pub use signature::{DelegationSignature, IntentSigner};
