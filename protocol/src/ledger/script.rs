//! Classified output scripts.
//!
//! Script classification is a capability of the base layer, consumed here as
//! a given: each output arrives as an [`OutputScript`] that already names its
//! shape and carries the data the overlay protocol can use (a destination
//! address, multisig data slots, or a null-data blob).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

// ---------------------------------------------------------------------------
// ScriptKind
// ---------------------------------------------------------------------------

/// The script shapes the base layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// Pay-to-pubkey-hash.
    PubKeyHash,
    /// Pay-to-script-hash.
    ScriptHash,
    /// Bare (non-wrapped) multisig.
    BareMultisig,
    /// Provably unspendable data carrier (OP_RETURN).
    NullData,
    /// Pay-to-pubkey.
    PubKey,
    /// Anything the base layer does not recognize as standard.
    NonStandard,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PubKeyHash => "pay-to-pubkey-hash",
            Self::ScriptHash => "pay-to-script-hash",
            Self::BareMultisig => "bare-multisig",
            Self::NullData => "null-data",
            Self::PubKey => "pay-to-pubkey",
            Self::NonStandard => "non-standard",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// OutputScript
// ---------------------------------------------------------------------------

/// A classified output script with its protocol-relevant content.
///
/// For address-bearing shapes the destination is the already-resolved
/// [`Address`] (for pay-to-pubkey, the address derived from the key's hash).
/// Bare multisig carries its data slots — the non-signing key positions that
/// the multisig encoding class hides payload packets in. Null-data carries
/// its raw blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputScript {
    PubKeyHash {
        address: Address,
    },
    ScriptHash {
        address: Address,
    },
    PubKey {
        address: Address,
    },
    BareMultisig {
        #[serde(with = "hex_slots")]
        slots: Vec<Vec<u8>>,
    },
    NullData {
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
    },
    NonStandard,
}

impl OutputScript {
    /// The script shape of this output.
    pub fn kind(&self) -> ScriptKind {
        match self {
            Self::PubKeyHash { .. } => ScriptKind::PubKeyHash,
            Self::ScriptHash { .. } => ScriptKind::ScriptHash,
            Self::PubKey { .. } => ScriptKind::PubKey,
            Self::BareMultisig { .. } => ScriptKind::BareMultisig,
            Self::NullData { .. } => ScriptKind::NullData,
            Self::NonStandard => ScriptKind::NonStandard,
        }
    }

    /// The destination address, for shapes that have one.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::PubKeyHash { address } | Self::ScriptHash { address } | Self::PubKey { address } => {
                Some(address)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Hex serde helpers
// ---------------------------------------------------------------------------

/// Serde adapter: `Vec<u8>` as a hex string.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: `Vec<Vec<u8>>` as a list of hex strings.
pub(crate) mod hex_slots {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(slots: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(slots.len()))?;
        for slot in slots {
            seq.serialize_element(&hex::encode(slot))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| hex::decode(&s).map_err(serde::de::Error::custom))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_hash160(0x6f, [byte; 20])
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            OutputScript::PubKeyHash { address: addr(1) }.kind(),
            ScriptKind::PubKeyHash
        );
        assert_eq!(
            OutputScript::NullData { data: vec![] }.kind(),
            ScriptKind::NullData
        );
        assert_eq!(OutputScript::NonStandard.kind(), ScriptKind::NonStandard);
    }

    #[test]
    fn address_only_for_address_bearing_shapes() {
        assert!(OutputScript::PubKeyHash { address: addr(1) }.address().is_some());
        assert!(OutputScript::ScriptHash { address: addr(2) }.address().is_some());
        assert!(OutputScript::PubKey { address: addr(3) }.address().is_some());
        assert!(OutputScript::BareMultisig { slots: vec![] }.address().is_none());
        assert!(OutputScript::NullData { data: vec![1] }.address().is_none());
        assert!(OutputScript::NonStandard.address().is_none());
    }

    #[test]
    fn null_data_serde_uses_hex() {
        let script = OutputScript::NullData {
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(json["data"], "deadbeef");
        let recovered: OutputScript = serde_json::from_value(json).unwrap();
        assert_eq!(script, recovered);
    }

    #[test]
    fn multisig_serde_roundtrip() {
        let script = OutputScript::BareMultisig {
            slots: vec![vec![1, 2, 3], vec![4, 5]],
        };
        let json = serde_json::to_string(&script).unwrap();
        let recovered: OutputScript = serde_json::from_str(&json).unwrap();
        assert_eq!(script, recovered);
    }

    #[test]
    fn script_kind_display() {
        assert_eq!(ScriptKind::PubKeyHash.to_string(), "pay-to-pubkey-hash");
        assert_eq!(ScriptKind::BareMultisig.to_string(), "bare-multisig");
        assert_eq!(ScriptKind::NonStandard.to_string(), "non-standard");
    }
}
