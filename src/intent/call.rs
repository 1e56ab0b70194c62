use std::str::FromStr;

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{prelude::*, ser, Error};

/// A single contract invocation inside a [`ChainBatch`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    #[serde(with = "crate::ser::decimal_u256")]
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value,
            data: data.into(),
        }
    }

    /// Builds a call from its textual form: a hex address, a decimal or `0x` hex value, and
    /// `0x`-prefixed calldata (`"0x"` or `""` for none).
    pub fn parse(to: &str, value: &str, data: &str) -> Result<Self> {
        Ok(Self {
            to: parse_address(to)?,
            value: ser::parse_u256(value)?,
            data: parse_bytes(data)?,
        })
    }
}

/// All calls to execute on one chain within one intent.
///
/// `recent_block` is a freshness bound picked by the caller, usually the chain head at build
/// time. It is not checked here; staleness is enforced by the relayer and the delegate contract.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainBatch {
    #[serde(with = "crate::ser::decimal_u64")]
    pub chain_id: u64,
    pub calls: Vec<Call>,
    #[serde(with = "crate::ser::decimal_u256")]
    pub recent_block: U256,
}

impl ChainBatch {
    pub fn new(chain_id: u64, calls: Vec<Call>, recent_block: impl Into<U256>) -> Self {
        Self {
            chain_id,
            calls,
            recent_block: recent_block.into(),
        }
    }
}

pub(crate) fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim()).map_err(|e| Error::Encoding(format!("invalid address {s}: {e}")))
}

pub(crate) fn parse_bytes(s: &str) -> Result<Bytes> {
    let s = s.trim();
    let hex_digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(hex_digits)
        .map(Bytes::from)
        .map_err(|e| Error::Encoding(format!("invalid calldata {s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        let call = Call::parse(
            "0x72df0bcd7276f2dfbac900d1ce63c272c4bccced",
            "0",
            "0x095ea7b3",
        )
        .unwrap();
        assert_eq!(
            call.to,
            "0x72df0bcd7276f2dfbac900d1ce63c272c4bccced"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(call.value, U256::zero());
        assert_eq!(call.data.to_vec(), vec![0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn test_parse_call_empty_data() {
        let call = Call::parse("0x0000000000000000000000000000000000000001", "0", "0x").unwrap();
        assert!(call.data.is_empty());
        let call = Call::parse("0x0000000000000000000000000000000000000001", "0", "").unwrap();
        assert!(call.data.is_empty());
    }

    #[test]
    fn test_parse_call_rejects_malformed_fields() {
        let to = "0x0000000000000000000000000000000000000001";
        assert!(matches!(
            Call::parse("0x1234", "0", "0x"),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            Call::parse(
                to,
                "115792089237316195423570985008687907853269984665640564039457584007913129639936",
                "0x"
            ),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(Call::parse(to, "0", "0xabc"), Err(Error::Encoding(_))));
        assert!(matches!(Call::parse(to, "0", "0xzz"), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_call_wire_format() {
        let call = Call::new(
            "0x0000000000000000000000000000000000000001".parse().unwrap(),
            U256::exp10(18),
            vec![0xde, 0xad],
        );
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["to"], "0x0000000000000000000000000000000000000001");
        assert_eq!(json["value"], "1000000000000000000");
        assert_eq!(json["data"], "0xdead");

        let back: Call = serde_json::from_value(json).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn test_chain_batch_wire_format() {
        let batch = ChainBatch::new(688688, vec![], 23_437_163u64);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["chainId"], "688688");
        assert_eq!(json["recentBlock"], "23437163");
        assert!(json["calls"].as_array().unwrap().is_empty());
    }
}
