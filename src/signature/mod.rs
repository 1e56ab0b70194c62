mod wallet;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256};

use crate::prelude::Result;

/// The `(r, s, yParity)` triple produced when an account signs an EIP-7702 delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationSignature {
    pub r: H256,
    pub s: H256,
    pub y_parity: u8,
}

/// The key holder behind an intent.
///
/// Implemented for [`ethers::signers::LocalWallet`]; hardware wallets or remote signers plug in
/// by implementing it themselves. Failures surface as [`crate::Error::Signing`].
#[async_trait]
pub trait IntentSigner: Send + Sync {
    /// The account that delegates and signs the intent.
    fn address(&self) -> Address;

    /// Signs `(chain_id, delegate, nonce)` under the EIP-7702 authorization scheme.
    async fn sign_delegation(
        &self,
        delegate: Address,
        chain_id: u64,
        nonce: u64,
    ) -> Result<DelegationSignature>;

    /// Signs the intent digest as an EIP-191 personal message over its 32 raw bytes and
    /// returns the 65-byte `r || s || v` signature.
    async fn sign_digest(&self, digest: H256) -> Result<Bytes>;
}
