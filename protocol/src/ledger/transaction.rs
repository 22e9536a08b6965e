//! The frozen per-transaction view handed over by the base layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::script::OutputScript;

// ---------------------------------------------------------------------------
// Hash256
// ---------------------------------------------------------------------------

/// A 32-byte hash (transaction id, block hash, consensus state hash).
///
/// Displayed and serialized as lowercase hex, matching how the base layer's
/// tooling prints hashes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256([u8; 32]);

/// Error parsing a [`Hash256`] from hex.
#[derive(Debug, Error)]
#[error("invalid 32-byte hash: {0}")]
pub struct HashParseError(String);

impl Hash256 {
    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let raw = hex::decode(s).map_err(|e| HashParseError(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| HashParseError(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(bytes))
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl FromStr for Hash256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Transaction view
// ---------------------------------------------------------------------------

/// One transaction input, resolved to its funding output.
///
/// The base layer guarantees resolution: an input whose funding output is
/// unknown never reaches the overlay engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Value of the funding output, in base-layer atomic units.
    pub value: u64,
    /// Classified script of the funding output.
    pub script: OutputScript,
}

/// One transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Output value in base-layer atomic units.
    pub value: u64,
    /// Classified output script.
    pub script: OutputScript,
}

/// A complete, self-contained view of one base-layer transaction.
///
/// Input and output order is the transaction's wire order. Receiver selection
/// depends on output order; nothing depends on input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    /// Transaction id.
    pub txid: Hash256,
    /// Inputs in wire order, each resolved to its funding output.
    pub inputs: Vec<TxInput>,
    /// Outputs in wire order.
    pub outputs: Vec<TxOutput>,
}

impl TransactionView {
    /// Sum of all input values. Saturates rather than wrapping; the base
    /// layer's supply cap keeps real sums far below the saturation point.
    pub fn total_input_value(&self) -> u64 {
        self.inputs
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.value))
    }

    /// Sum of all output values.
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
