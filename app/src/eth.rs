//! EVM primitives and the slice of ABI encoding the badge contract needs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ABI decoding / hex parsing errors.
#[derive(Debug, Error, PartialEq)]
pub enum AbiError {
    #[error("Invalid hex: {0}")]
    Hex(String),

    #[error("Expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("Value does not fit in 128 bits")]
    Overflow,
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a `0x`-prefixed (or bare) hex string.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, AbiError> {
    hex::decode(strip_0x(s.trim())).map_err(|e| AbiError::Hex(e.to_string()))
}

/// Encode bytes as a `0x`-prefixed hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn fixed<const N: usize>(s: &str) -> Result<[u8; N], AbiError> {
    let bytes = decode_hex(s)?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| AbiError::Length { expected: N, got })
}

/// 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl FromStr for Address {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fixed(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Address {
    /// Short display form, e.g. `0xBc5C49...730c25`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..8], &full[full.len() - 6..])
    }
}

/// 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl FromStr for TxHash {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fixed(s).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

macro_rules! hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_serde!(Address);
hex_serde!(TxHash);

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Four-byte function or error selector for a canonical signature
/// such as `balanceOf(address)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Left-pad an address into a 32-byte ABI word.
pub fn encode_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address.0);
    word
}

fn first_word(data: &[u8]) -> Result<&[u8], AbiError> {
    data.get(..32).ok_or(AbiError::Length {
        expected: 32,
        got: data.len(),
    })
}

/// Decode a `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    Ok(first_word(data)?.iter().any(|b| *b != 0))
}

/// Decode a `uint256` return value. Values above `u128::MAX` are rejected;
/// token balances never come close.
pub fn decode_uint(data: &[u8]) -> Result<u128, AbiError> {
    let word = first_word(data)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Custom errors declared by the badge contract.
pub const CONTRACT_ERRORS: [&str; 3] = ["AlreadyClaimed", "ClaimClosed", "Soulbound"];

/// Map revert data to the name of a known custom error, if it matches one.
pub fn decode_revert(data: &[u8]) -> Option<&'static str> {
    let head = data.get(..4)?;
    CONTRACT_ERRORS
        .into_iter()
        .find(|name| selector(&format!("{}()", name)) == head)
}
