//! EIP-7702 delegation authorizations.
//!
//! Each authorization lets the relayer install `address` as the code of the signer's account on
//! one chain, valid for exactly one account nonce.

use std::collections::HashMap;

use ethers::{
    types::{Address, Signature, H256, U256},
    utils::keccak256,
};
use futures_util::future::try_join_all;
use log::{debug, info};
use rlp::RlpStream;
use serde::{Deserialize, Serialize};

use crate::{
    consts::EIP7702_AUTH_MAGIC,
    prelude::*,
    provider::ChainReader,
    signature::{DelegationSignature, IntentSigner},
    Error,
};

/// A signed EIP-7702 authorization tuple.
///
/// `chainId` and `nonce` go out as decimal strings like every other integer in the submission;
/// numbers are accepted when reading one back.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Delegate contract the account's code will point to.
    pub address: Address,
    #[serde(with = "crate::ser::decimal_u64")]
    pub chain_id: u64,
    #[serde(with = "crate::ser::decimal_u64")]
    pub nonce: u64,
    pub r: H256,
    pub s: H256,
    pub y_parity: u8,
}

impl Authorization {
    pub fn new(
        address: Address,
        chain_id: u64,
        nonce: u64,
        signature: DelegationSignature,
    ) -> Result<Self> {
        if signature.y_parity > 1 {
            return Err(Error::Encoding(format!(
                "y parity must be 0 or 1, got {}",
                signature.y_parity
            )));
        }
        Ok(Self {
            address,
            chain_id,
            nonce,
            r: signature.r,
            s: signature.s,
            y_parity: signature.y_parity,
        })
    }

    /// Hash the authority signed to produce this authorization.
    pub fn signing_hash(&self) -> H256 {
        authorization_signing_hash(self.chain_id, self.address, self.nonce)
    }

    /// Recovers the account that signed this authorization.
    pub fn recover_authority(&self) -> Result<Address> {
        let signature = Signature {
            r: U256::from_big_endian(self.r.as_bytes()),
            s: U256::from_big_endian(self.s.as_bytes()),
            v: 27 + u64::from(self.y_parity),
        };
        signature
            .recover(self.signing_hash())
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

/// `keccak256(0x05 || rlp([chain_id, address, nonce]))`, the EIP-7702 authorization message.
pub fn authorization_signing_hash(chain_id: u64, address: Address, nonce: u64) -> H256 {
    let mut stream = RlpStream::new_list(3);
    stream.append(&chain_id);
    stream.append(&address.as_bytes().to_vec());
    stream.append(&nonce);
    let payload = stream.out();

    let mut preimage = Vec::with_capacity(1 + payload.len());
    preimage.push(EIP7702_AUTH_MAGIC);
    preimage.extend_from_slice(&payload);
    H256(keccak256(preimage))
}

/// Signs a single delegation of `signer` to `delegate` on `chain_id` at `nonce`.
pub async fn build_authorization<S: IntentSigner + ?Sized>(
    signer: &S,
    chain_id: u64,
    delegate: Address,
    nonce: u64,
) -> Result<Authorization> {
    let signature = signer.sign_delegation(delegate, chain_id, nonce).await?;
    if signature.y_parity > 1 {
        return Err(Error::Signing(format!(
            "signer returned y parity {}",
            signature.y_parity
        )));
    }
    Authorization::new(delegate, chain_id, nonce, signature)
}

/// One delegation to sign. Without an explicit `nonce` the account's pending nonce is looked
/// up on `chain_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationRequest {
    pub chain_id: u64,
    pub contract_address: Address,
    pub nonce: Option<u64>,
}

impl DelegationRequest {
    pub fn new(chain_id: u64, contract_address: Address) -> Self {
        Self {
            chain_id,
            contract_address,
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

/// Signs every request, returning authorizations in request order.
///
/// Requests without a nonce share one lookup per chain and get consecutive nonces
/// (`n`, `n + 1`, ...) in request order, so they never collide when applied in the same block.
/// Mixing explicit and looked-up nonces on one chain is left to the caller to keep consistent.
/// Lookups and signatures for different chains run concurrently.
pub async fn sign_delegations<S, R>(
    signer: &S,
    chain_reader: &R,
    requests: &[DelegationRequest],
) -> Result<Vec<Authorization>>
where
    S: IntentSigner + ?Sized,
    R: ChainReader + ?Sized,
{
    let user = signer.address();

    let mut lookup_chains: Vec<u64> = Vec::new();
    for request in requests {
        if request.nonce.is_none() && !lookup_chains.contains(&request.chain_id) {
            lookup_chains.push(request.chain_id);
        }
    }
    let base_nonces = try_join_all(
        lookup_chains
            .iter()
            .map(|chain_id| chain_reader.account_nonce(user, *chain_id)),
    )
    .await?;
    let mut next_nonce: HashMap<u64, u64> = lookup_chains.into_iter().zip(base_nonces).collect();

    let mut assigned = Vec::with_capacity(requests.len());
    for request in requests {
        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => {
                let slot = next_nonce.get_mut(&request.chain_id).ok_or_else(|| {
                    Error::NonceLookup(format!("no nonce loaded for chain {}", request.chain_id))
                })?;
                let nonce = *slot;
                *slot = slot.checked_add(1).ok_or_else(|| {
                    Error::NonceLookup(format!(
                        "nonce space exhausted on chain {} after {nonce}",
                        request.chain_id
                    ))
                })?;
                nonce
            }
        };
        debug!(
            "delegation to {:?} on chain {} uses nonce {nonce}",
            request.contract_address, request.chain_id
        );
        assigned.push((*request, nonce));
    }

    let authorizations = try_join_all(assigned.iter().map(|(request, nonce)| {
        build_authorization(signer, request.chain_id, request.contract_address, *nonce)
    }))
    .await?;
    info!("signed {} delegation(s) for {user:?}", authorizations.len());
    Ok(authorizations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticChainReader;
    use ethers::signers::LocalWallet;
    use std::str::FromStr;

    // Key was randomly generated for testing and shouldn't be used with any real funds
    const TEST_KEY: &str = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";

    fn wallet() -> LocalWallet {
        LocalWallet::from_str(TEST_KEY).unwrap()
    }

    fn delegate() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    #[test]
    fn test_signing_hash_is_pinned() {
        assert_eq!(
            authorization_signing_hash(688688, delegate(), 7),
            "0x6d45ecc79da8632fb18ed5a3de4b55ffeacccef0f0af2b877903c52952caacad"
                .parse::<H256>()
                .unwrap()
        );
    }

    #[test]
    fn test_invalid_parity_is_rejected() {
        let signature = DelegationSignature {
            r: H256::repeat_byte(1),
            s: H256::repeat_byte(2),
            y_parity: 27,
        };
        assert!(matches!(
            Authorization::new(delegate(), 1, 0, signature),
            Err(Error::Encoding(_))
        ));
    }

    #[tokio::test]
    async fn test_build_authorization_recovers_to_signer() {
        let wallet = wallet();
        let auth = build_authorization(&wallet, 688688, delegate(), 3)
            .await
            .unwrap();
        assert_eq!(auth.address, delegate());
        assert_eq!(auth.chain_id, 688688);
        assert_eq!(auth.nonce, 3);
        assert_eq!(auth.recover_authority().unwrap(), wallet.address());
    }

    #[tokio::test]
    async fn test_authorizations_for_different_chains_are_independent() {
        let wallet = wallet();
        let reader = StaticChainReader::default();
        let requests = [
            DelegationRequest::new(688688, delegate()).with_nonce(5),
            DelegationRequest::new(1, delegate()).with_nonce(5),
        ];
        let auths = sign_delegations(&wallet, &reader, &requests).await.unwrap();
        assert_eq!(auths.len(), 2);
        assert_eq!(auths[0].chain_id, 688688);
        assert_eq!(auths[1].chain_id, 1);
        assert_ne!(auths[0].r, auths[1].r);
        assert_ne!(auths[0].s, auths[1].s);
        assert_ne!(auths[0].signing_hash(), auths[1].signing_hash());
        for auth in &auths {
            assert_eq!(auth.recover_authority().unwrap(), wallet.address());
        }
    }

    #[tokio::test]
    async fn test_looked_up_nonces_are_allocated_sequentially_per_chain() {
        let wallet = wallet();
        let reader = StaticChainReader::default()
            .with_nonce(688688, 10)
            .with_nonce(1, 4);
        let requests = [
            DelegationRequest::new(688688, delegate()),
            DelegationRequest::new(1, delegate()),
            DelegationRequest::new(688688, delegate()),
            DelegationRequest::new(1, delegate()).with_nonce(99),
        ];
        let auths = sign_delegations(&wallet, &reader, &requests).await.unwrap();
        let nonces: Vec<(u64, u64)> = auths.iter().map(|a| (a.chain_id, a.nonce)).collect();
        assert_eq!(nonces, vec![(688688, 10), (1, 4), (688688, 11), (1, 99)]);
    }

    #[tokio::test]
    async fn test_exhausted_nonce_is_a_lookup_error() {
        let wallet = wallet();
        let reader = StaticChainReader::default().with_nonce(1, u64::MAX);
        let requests = [
            DelegationRequest::new(1, delegate()),
            DelegationRequest::new(1, delegate()),
        ];
        let err = sign_delegations(&wallet, &reader, &requests)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NonceLookup(_)));

        let auths = sign_delegations(&wallet, &reader, &requests[..1])
            .await
            .unwrap();
        assert_eq!(auths[0].nonce, u64::MAX);
    }

    struct BadParitySigner(LocalWallet);

    #[async_trait::async_trait]
    impl IntentSigner for BadParitySigner {
        fn address(&self) -> Address {
            IntentSigner::address(&self.0)
        }

        async fn sign_delegation(
            &self,
            delegate: Address,
            chain_id: u64,
            nonce: u64,
        ) -> Result<DelegationSignature> {
            let mut signature = self.0.sign_delegation(delegate, chain_id, nonce).await?;
            signature.y_parity = 27;
            Ok(signature)
        }

        async fn sign_digest(&self, digest: H256) -> Result<ethers::types::Bytes> {
            self.0.sign_digest(digest).await
        }
    }

    #[tokio::test]
    async fn test_bad_signer_parity_is_a_signing_error() {
        let signer = BadParitySigner(wallet());
        let err = build_authorization(&signer, 688688, delegate(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[tokio::test]
    async fn test_nonce_lookup_failure_is_propagated() {
        let wallet = wallet();
        let reader = StaticChainReader::default();
        let requests = [DelegationRequest::new(42, delegate())];
        let err = sign_delegations(&wallet, &reader, &requests)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NonceLookup(_)));
    }

    #[test]
    fn test_wire_format() {
        let auth = Authorization {
            address: delegate(),
            chain_id: 688688,
            nonce: 12,
            r: H256::repeat_byte(0xab),
            s: H256::repeat_byte(0xcd),
            y_parity: 1,
        };
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["address"], "0x1111111111111111111111111111111111111111");
        assert_eq!(json["chainId"], "688688");
        assert_eq!(json["nonce"], "12");
        assert_eq!(json["r"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(json["yParity"], 1);
        assert!(json.get("v").is_none());
    }
}
