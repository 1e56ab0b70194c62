use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, H256, U256},
};
use log::debug;

use crate::{
    delegation::authorization_signing_hash,
    prelude::*,
    signature::{DelegationSignature, IntentSigner},
    Error,
};

fn u256_to_h256(value: U256) -> H256 {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    H256(buf)
}

#[async_trait]
impl IntentSigner for LocalWallet {
    fn address(&self) -> Address {
        Signer::address(self)
    }

    async fn sign_delegation(
        &self,
        delegate: Address,
        chain_id: u64,
        nonce: u64,
    ) -> Result<DelegationSignature> {
        let hash = authorization_signing_hash(chain_id, delegate, nonce);
        debug!("signing delegation to {delegate:?} on chain {chain_id} at nonce {nonce}: {hash:?}");
        let signature = self
            .sign_hash(hash)
            .map_err(|e| Error::Signing(e.to_string()))?;

        // sign_hash reports the recovery id as 27 + parity.
        let y_parity = match signature.v {
            27 => 0,
            28 => 1,
            v => return Err(Error::Signing(format!("unexpected recovery id {v}"))),
        };

        Ok(DelegationSignature {
            r: u256_to_h256(signature.r),
            s: u256_to_h256(signature.s),
            y_parity,
        })
    }

    async fn sign_digest(&self, digest: H256) -> Result<Bytes> {
        let signature = self
            .sign_message(digest.as_bytes())
            .await
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(Bytes::from(signature.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Signature;
    use std::str::FromStr;

    // Key was randomly generated for testing and shouldn't be used with any real funds
    const TEST_KEY: &str = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";

    fn wallet() -> LocalWallet {
        LocalWallet::from_str(TEST_KEY).unwrap()
    }

    #[tokio::test]
    async fn test_delegation_signature_recovers_to_signer() {
        let wallet = wallet();
        let delegate: Address = "0x1111111111111111111111111111111111111111".parse().unwrap();
        let sig = wallet.sign_delegation(delegate, 688688, 7).await.unwrap();
        assert!(sig.y_parity <= 1);

        let signature = Signature {
            r: U256::from_big_endian(sig.r.as_bytes()),
            s: U256::from_big_endian(sig.s.as_bytes()),
            v: 27 + sig.y_parity as u64,
        };
        let recovered = signature
            .recover(authorization_signing_hash(688688, delegate, 7))
            .unwrap();
        assert_eq!(recovered, IntentSigner::address(&wallet));
    }

    #[tokio::test]
    async fn test_digest_signature_is_personal_message() {
        let wallet = wallet();
        let digest: H256 = "0x7ae139fbb71b5d1f4be26fbe51960c5b916ce063c23a3b183a650c2c1b1b1c48"
            .parse()
            .unwrap();
        let bytes = wallet.sign_digest(digest).await.unwrap();
        assert_eq!(bytes.len(), 65);

        let signature = Signature::try_from(bytes.as_ref()).unwrap();
        assert!(signature.v == 27 || signature.v == 28);
        signature
            .verify(digest.as_bytes(), IntentSigner::address(&wallet))
            .unwrap();
    }
}
