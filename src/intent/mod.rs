mod call;
mod chain_auth;
mod digest;

pub use call::{Call, ChainBatch};
pub use chain_auth::{hash_chain_batch, hash_chain_batches, ChainAuthorization};
pub use digest::{intent_digest, intent_digest_of};
