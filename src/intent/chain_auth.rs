use ethers::{
    abi::{self, Token},
    types::{H256, U256},
    utils::keccak256,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::intent::{Call, ChainBatch};

/// A [`ChainBatch`] together with its authorization hash.
///
/// The calls travel with the hash: the relayer needs them to execute the batch, the hash alone
/// only lets it check integrity.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainAuthorization {
    hash: H256,
    #[serde(with = "crate::ser::decimal_u64")]
    chain_id: u64,
    calls: Vec<Call>,
    #[serde(with = "crate::ser::decimal_u256")]
    recent_block: U256,
}

impl ChainAuthorization {
    pub fn hash(&self) -> H256 {
        self.hash
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn recent_block(&self) -> U256 {
        self.recent_block
    }

    /// The batch this authorization was derived from.
    pub fn to_batch(&self) -> ChainBatch {
        ChainBatch {
            chain_id: self.chain_id,
            calls: self.calls.clone(),
            recent_block: self.recent_block,
        }
    }

    /// Recomputes the hash from the carried fields and compares it with the stored one. Useful
    /// for authorizations that came back over the wire.
    pub fn verify(&self) -> bool {
        chain_batch_hash(self.chain_id, &self.calls, self.recent_block) == self.hash
    }
}

/// Hashes one batch into its [`ChainAuthorization`].
///
/// The preimage is the ABI encoding of the parameter list
/// `(uint256 chainId, (address to, uint256 value, bytes data)[] calls, uint256 recentBlock)`,
/// which is what the delegate contract recomputes on chain.
pub fn hash_chain_batch(batch: ChainBatch) -> ChainAuthorization {
    let hash = chain_batch_hash(batch.chain_id, &batch.calls, batch.recent_block);
    debug!(
        "chain {} batch of {} call(s) at block {} hashed to {:?}",
        batch.chain_id,
        batch.calls.len(),
        batch.recent_block,
        hash
    );
    ChainAuthorization {
        hash,
        chain_id: batch.chain_id,
        calls: batch.calls,
        recent_block: batch.recent_block,
    }
}

/// Hashes every batch, preserving order.
pub fn hash_chain_batches(batches: impl IntoIterator<Item = ChainBatch>) -> Vec<ChainAuthorization> {
    batches.into_iter().map(hash_chain_batch).collect()
}

pub(crate) fn encode_chain_batch(chain_id: u64, calls: &[Call], recent_block: U256) -> Vec<u8> {
    let calls = calls
        .iter()
        .map(|call| {
            Token::Tuple(vec![
                Token::Address(call.to),
                Token::Uint(call.value),
                Token::Bytes(call.data.to_vec()),
            ])
        })
        .collect();
    abi::encode(&[
        Token::Uint(U256::from(chain_id)),
        Token::Array(calls),
        Token::Uint(recent_block),
    ])
}

fn chain_batch_hash(chain_id: u64, calls: &[Call], recent_block: U256) -> H256 {
    H256(keccak256(encode_chain_batch(chain_id, calls, recent_block)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    fn one() -> Address {
        "0x0000000000000000000000000000000000000001".parse().unwrap()
    }

    fn sample_batch() -> ChainBatch {
        ChainBatch::new(688688, vec![Call::new(one(), U256::zero(), vec![])], 1u64)
    }

    fn two_call_batch() -> ChainBatch {
        ChainBatch::new(
            688688,
            vec![
                Call::new(one(), U256::zero(), vec![0x01, 0x02, 0x03]),
                Call::new(
                    "0x00000000000000000000000000000000000000ff".parse().unwrap(),
                    U256::from(5u64),
                    vec![0xaa; 40],
                ),
            ],
            23_437_163u64,
        )
    }

    // Head words, array length, tuple offset, then the tuple (to, value, data offset, data
    // length) laid out by hand.
    const SAMPLE_ENCODING: &str = concat!(
        "00000000000000000000000000000000000000000000000000000000000a8230",
        "0000000000000000000000000000000000000000000000000000000000000060",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000020",
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000000000000000000000000000000000000000000000000000000000000060",
        "0000000000000000000000000000000000000000000000000000000000000000",
    );

    const SAMPLE_HASH: &str = "0x7a451f93fea14bdbffba5438f7666bd5d9d2a998218db946530bdfc2c2fb7cbb";

    #[test]
    fn test_sample_batch_encoding_matches_hand_layout() {
        let batch = sample_batch();
        let encoded = encode_chain_batch(batch.chain_id, &batch.calls, batch.recent_block);
        assert_eq!(hex::encode(encoded), SAMPLE_ENCODING);
    }

    #[test]
    fn test_sample_batch_hash_is_pinned() {
        let auth = hash_chain_batch(sample_batch());
        assert_eq!(auth.hash(), SAMPLE_HASH.parse::<H256>().unwrap());
        assert_eq!(
            auth.hash(),
            H256(keccak256(hex::decode(SAMPLE_ENCODING).unwrap()))
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_chain_batch(two_call_batch());
        let b = hash_chain_batch(two_call_batch());
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_keeps_original_fields() {
        let auth = hash_chain_batch(two_call_batch());
        assert_eq!(auth.chain_id(), 688688);
        assert_eq!(auth.recent_block(), U256::from(23_437_163u64));
        assert_eq!(auth.calls().len(), 2);
        assert_eq!(auth.to_batch(), two_call_batch());
        assert!(auth.verify());
    }

    #[test]
    fn test_hash_is_sensitive_to_every_field() {
        let base = hash_chain_batch(two_call_batch()).hash();

        let mut batch = two_call_batch();
        batch.chain_id = 1;
        assert_ne!(hash_chain_batch(batch).hash(), base);

        let mut batch = two_call_batch();
        batch.recent_block = U256::from(23_437_164u64);
        assert_ne!(hash_chain_batch(batch).hash(), base);

        let mut batch = two_call_batch();
        batch.calls[0].to = "0x0000000000000000000000000000000000000002".parse().unwrap();
        assert_ne!(hash_chain_batch(batch).hash(), base);

        let mut batch = two_call_batch();
        batch.calls[1].value = U256::from(6u64);
        assert_ne!(hash_chain_batch(batch).hash(), base);

        let mut batch = two_call_batch();
        let mut data = batch.calls[1].data.to_vec();
        data[39] ^= 0x01;
        batch.calls[1].data = data.into();
        assert_ne!(hash_chain_batch(batch).hash(), base);

        let mut batch = two_call_batch();
        batch.calls.swap(0, 1);
        assert_ne!(hash_chain_batch(batch).hash(), base);
    }

    #[test]
    fn test_batch_without_calls_hashes_differently() {
        let no_calls = hash_chain_batch(ChainBatch::new(688688, vec![], 1u64)).hash();
        assert_ne!(no_calls, hash_chain_batch(sample_batch()).hash());
    }

    #[test]
    fn test_hash_chain_batches_preserves_order() {
        let auths = hash_chain_batches(vec![two_call_batch(), sample_batch()]);
        assert_eq!(auths.len(), 2);
        assert_eq!(auths[0].hash(), hash_chain_batch(two_call_batch()).hash());
        assert_eq!(auths[1].hash(), SAMPLE_HASH.parse::<H256>().unwrap());
    }

    #[test]
    fn test_tampered_authorization_fails_verification() {
        let auth = hash_chain_batch(two_call_batch());
        let mut json = serde_json::to_value(&auth).unwrap();
        json["recentBlock"] = serde_json::Value::String("1".to_string());
        let tampered: ChainAuthorization = serde_json::from_value(json).unwrap();
        assert!(!tampered.verify());
    }

    #[test]
    fn test_wire_format_uses_decimal_strings() {
        let json = serde_json::to_value(hash_chain_batch(sample_batch())).unwrap();
        assert_eq!(json["hash"], SAMPLE_HASH);
        assert_eq!(json["chainId"], "688688");
        assert_eq!(json["recentBlock"], "1");
        assert_eq!(json["calls"][0]["value"], "0");
        assert_eq!(json["calls"][0]["data"], "0x");
    }
}
