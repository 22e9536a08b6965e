//! # Base58check Addresses
//!
//! Lamina attributes senders and receivers by the base-layer addresses that
//! fund and receive its transactions. An address is a version byte plus a
//! 20-byte script hash, encoded as base58check (double-SHA-256 checksum,
//! same construction the base layer uses).
//!
//! ## Ordering is over the encoded string — on purpose
//!
//! [`Address`] implements `Ord` by comparing the **encoded base58 string**,
//! byte for byte. This is not the same order as comparing the underlying
//! 20-byte hashes: the version byte and the base58 alphabet both reshuffle
//! the sort. Sender selection ties are broken by this string order on the
//! deployed network, so every map keyed by `Address` in this crate inherits
//! exactly that order. Do not "fix" this to compare hashes.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of the hash payload inside an address.
pub const HASH160_LENGTH: usize = 20;

/// Length of a raw decoded address: version byte + hash + 4-byte checksum.
const DECODED_LENGTH: usize = 1 + HASH160_LENGTH + 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing an address string.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string is not valid base58.
    #[error("base58 decode error: {0}")]
    Base58(String),

    /// The decoded payload has the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// The trailing checksum does not match the double-SHA-256 of the body.
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A base58check-encoded base-layer address.
///
/// Stores the version byte and hash alongside the encoded string so that
/// both representations are available without re-encoding on every access.
/// Equality and hashing use the encoded string; since the encoding is
/// canonical, this is equivalent to comparing `(version, hash)`.
#[derive(Debug, Clone)]
pub struct Address {
    version: u8,
    hash: [u8; HASH160_LENGTH],
    encoded: String,
}

impl Address {
    /// Builds an address from a version byte and a 20-byte hash.
    pub fn from_hash160(version: u8, hash: [u8; HASH160_LENGTH]) -> Self {
        let mut body = Vec::with_capacity(DECODED_LENGTH);
        body.push(version);
        body.extend_from_slice(&hash);
        let checksum = double_sha256(&body);
        body.extend_from_slice(&checksum[..4]);
        let encoded = bs58::encode(body).into_string();
        Self {
            version,
            hash,
            encoded,
        }
    }

    /// Parses and checksum-validates a base58check string.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;

        if raw.len() != DECODED_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: DECODED_LENGTH,
                got: raw.len(),
            });
        }

        let (body, checksum) = raw.split_at(1 + HASH160_LENGTH);
        if checksum != &double_sha256(body)[..4] {
            return Err(AddressError::ChecksumMismatch);
        }

        let mut hash = [0u8; HASH160_LENGTH];
        hash.copy_from_slice(&body[1..]);

        Ok(Self {
            version: body[0],
            hash,
            encoded: s.to_string(),
        })
    }

    /// The version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The raw 20-byte hash payload.
    pub fn hash160(&self) -> &[u8; HASH160_LENGTH] {
        &self.hash
    }

    /// The encoded base58check string.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Address {}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        // Byte order of the encoded string, NOT of the underlying hash.
        self.encoded.as_bytes().cmp(other.encoded.as_bytes())
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Double SHA-256, the base layer's checksum construction.
fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_parse_roundtrip() {
        let addr = Address::from_hash160(0x6f, [0xab; HASH160_LENGTH]);
        let recovered = Address::parse(addr.as_str()).unwrap();
        assert_eq!(addr, recovered);
        assert_eq!(recovered.version(), 0x6f);
        assert_eq!(recovered.hash160(), &[0xab; HASH160_LENGTH]);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let addr = Address::from_hash160(0x30, [7; HASH160_LENGTH]);
        let mut s = addr.as_str().to_string();
        // Flip the last character to invalidate the checksum.
        let last = s.pop().unwrap();
        s.push(if last == '1' { '2' } else { '1' });
        assert!(Address::parse(&s).is_err());
    }

    #[test]
    fn wrong_length_rejected() {
        let short = bs58::encode([1u8, 2, 3]).into_string();
        assert!(matches!(
            Address::parse(&short),
            Err(AddressError::InvalidLength { got: 3, .. })
        ));
    }

    #[test]
    fn garbage_rejected() {
        // '0', 'O', 'I' and 'l' are outside the base58 alphabet.
        assert!(matches!(
            Address::parse("0OIl"),
            Err(AddressError::Base58(_))
        ));
    }

    #[test]
    fn ordering_follows_encoded_string_not_hash() {
        // A high version byte pushes the encoded string towards '2'; the
        // all-0xff hash would sort last under hash order but the string
        // sorts first, which is the order consensus actually depends on.
        let by_string_first = Address::from_hash160(0xc4, [0xff; HASH160_LENGTH]);
        let by_hash_first = Address::from_hash160(0x6f, [0x00; HASH160_LENGTH]);

        assert!(by_string_first.hash160() > by_hash_first.hash160());
        assert!(by_string_first < by_hash_first);
        assert!(by_string_first.as_str() < by_hash_first.as_str());
    }

    #[test]
    fn distinct_versions_distinct_addresses() {
        let a = Address::from_hash160(0x30, [9; HASH160_LENGTH]);
        let b = Address::from_hash160(0x32, [9; HASH160_LENGTH]);
        assert_ne!(a, b);
    }

    #[test]
    fn serde_roundtrip() {
        let addr = Address::from_hash160(0x6f, [0x42; HASH160_LENGTH]);
        let json = serde_json::to_string(&addr).unwrap();
        let recovered: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn serde_rejects_invalid_address() {
        let result: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(result.is_err());
    }
}
