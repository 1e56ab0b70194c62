//! Serde helpers for wide integers on the wire.
//!
//! Integers are kept as [`U256`]/`u64` in memory and only become decimal strings in JSON, so
//! values above 2^53 survive JavaScript relayers untouched.

use ethers::types::U256;

use crate::{prelude::*, Error};

/// Parses a decimal (or `0x`-prefixed hexadecimal) string into a [`U256`], rejecting values wider
/// than 256 bits.
pub fn parse_u256(s: &str) -> Result<U256> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::Encoding("empty integer string".to_string()));
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex_digits) => {
            if hex_digits.is_empty() || hex_digits.len() > 64 {
                return Err(Error::Encoding(format!("{s} does not fit in 256 bits")));
            }
            U256::from_str_radix(hex_digits, 16)
                .map_err(|e| Error::Encoding(format!("invalid hex integer {s}: {e:?}")))
        }
        None => U256::from_dec_str(s)
            .map_err(|e| Error::Encoding(format!("invalid decimal integer {s}: {e:?}"))),
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

/// `U256` as a decimal string.
pub mod decimal_u256 {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => super::parse_u256(&s).map_err(serde::de::Error::custom),
            StringOrNumber::Number(n) => Ok(U256::from(n)),
        }
    }
}

/// `u64` as a decimal string.
pub mod decimal_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::StringOrNumber;

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}
