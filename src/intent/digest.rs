use ethers::{
    abi::{self, Token},
    types::H256,
    utils::keccak256,
};

use crate::{intent::ChainAuthorization, prelude::*, Error};

/// Folds the per-chain authorization hashes into the digest the user signs for the whole
/// intent: keccak256 of the ABI encoding of a single `bytes32[]` parameter.
///
/// Order matters and must be the order the chains are presented to the relayer. An empty list
/// is rejected, since a verifier could otherwise accept an intent that touches no chain.
pub fn intent_digest(hashes: &[H256]) -> Result<H256> {
    if hashes.is_empty() {
        return Err(Error::Encoding(
            "cannot compose an intent digest without chain authorizations".to_string(),
        ));
    }
    let hashes = hashes
        .iter()
        .map(|hash| Token::FixedBytes(hash.as_bytes().to_vec()))
        .collect();
    Ok(H256(keccak256(abi::encode(&[Token::Array(hashes)]))))
}

/// [`intent_digest`] over the hashes of already built authorizations.
pub fn intent_digest_of(chain_authorizations: &[ChainAuthorization]) -> Result<H256> {
    let hashes: Vec<H256> = chain_authorizations.iter().map(|auth| auth.hash()).collect();
    intent_digest(&hashes)
}
