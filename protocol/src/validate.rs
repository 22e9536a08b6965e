//! # Transaction Validation
//!
//! The top-level entry point the host node calls once per transaction: a
//! straight-line pipeline from the frozen transaction view to either a
//! [`DecodedTransaction`] or a [`Rejection`]. No step retries and no step
//! consults anything but its inputs and the registry snapshot, so the same
//! transaction at the same height produces the same answer on every node —
//! the property the whole network hangs on.
//!
//! The pipeline, in order:
//!
//! 1. Detect the encoding class and collect the payload packets.
//! 2. Resolve the sender (directly for a single input, by contribution
//!    otherwise).
//! 3. Assemble the payload (class B de-obfuscates with the sender) and parse
//!    its header.
//! 4. Check the (type, version) pair against the restriction table at this
//!    height.
//! 5. Select the receiver: first qualifying output in transaction order.
//! 6. Compute the fee, defensively checked non-negative.
//!
//! Rejections are local: one bad transaction never poisons its block.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::consensus::ConsensusRegistry;
use crate::decode::payload::{self, EncodingClass};
use crate::decode::sender::{self, SenderError};
use crate::decode::DecodeError;
use crate::ledger::{Hash256, ScriptKind, TransactionView};

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Why a transaction is not a (valid) protocol transaction.
///
/// `NoPayload` is a negative classification rather than a fault — most
/// base-layer transactions are simply not protocol transactions. Everything
/// else is a hard, final rejection of this one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No payload found; not a protocol transaction.
    #[error("transaction carries no protocol payload")]
    NoPayload,

    /// More than one payload packet. Ambiguity is never resolved silently.
    #[error("more than one payload packet present")]
    AmbiguousPayload,

    /// A payload exists but its structure is broken.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    /// Sender resolution produced no eligible candidate.
    #[error("no attributable sender")]
    NoSender,

    /// The (type, version) pair is unknown, not yet enabled, or illegal for
    /// the payload's property at this height.
    #[error("transaction type {tx_type} version {tx_version} not allowed at height {height}")]
    DisallowedType {
        tx_type: u16,
        tx_version: u16,
        height: u32,
    },

    /// A participating script shape is not enabled at this height.
    #[error("script type {kind} not allowed at height {height}")]
    DisallowedScriptType { kind: ScriptKind, height: u32 },

    /// Outputs exceed inputs. Impossible for a valid base-layer transaction,
    /// checked anyway: a negative fee must never reach the ledger.
    #[error("outputs ({outputs}) exceed inputs ({inputs})")]
    FeeUnderflow { inputs: u64, outputs: u64 },
}

impl From<DecodeError> for Rejection {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::NoPayload => Self::NoPayload,
            DecodeError::AmbiguousPayload => Self::AmbiguousPayload,
            DecodeError::Malformed { reason } => Self::MalformedPayload { reason },
            DecodeError::DisallowedScriptType { kind, height } => {
                Self::DisallowedScriptType { kind, height }
            }
        }
    }
}

impl From<SenderError> for Rejection {
    fn from(err: SenderError) -> Self {
        match err {
            SenderError::DisallowedInput { kind, height } => {
                Self::DisallowedScriptType { kind, height }
            }
            SenderError::NoCandidates => Self::NoSender,
        }
    }
}

// ---------------------------------------------------------------------------
// DecodedTransaction
// ---------------------------------------------------------------------------

/// The fully attributed result of decoding one protocol transaction.
///
/// Produced once, immutable afterwards; ownership transfers to the caller
/// (the state-update and reporting layers live outside this crate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTransaction {
    /// Source transaction id.
    pub txid: Hash256,
    /// Height of the containing block.
    pub block_height: u32,
    /// How the payload was embedded.
    pub encoding_class: EncodingClass,
    /// Attributed sender.
    pub sender: Address,
    /// Attributed receiver, for classes and layouts that carry one.
    pub receiver: Option<Address>,
    /// Base-layer fee paid: inputs minus outputs.
    pub fee: u64,
    /// Payload format version.
    pub tx_version: u16,
    /// Operation discriminant.
    pub tx_type: u16,
    /// Property id the operation acts on; 0 is the base asset.
    pub property: u32,
    /// Raw payload bytes, padding included.
    #[serde(with = "crate::ledger::script::hex_bytes")]
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Decodes and validates one transaction at `height`.
pub fn validate_transaction(
    registry: &ConsensusRegistry,
    tx: &TransactionView,
    height: u32,
) -> Result<DecodedTransaction, Rejection> {
    let result = run_pipeline(registry, tx, height);
    match &result {
        Ok(decoded) => debug!(
            txid = %tx.txid,
            class = %decoded.encoding_class,
            tx_type = decoded.tx_type,
            fee = decoded.fee,
            "transaction accepted"
        ),
        Err(rejection) => debug!(txid = %tx.txid, %rejection, "transaction rejected"),
    }
    result
}

fn run_pipeline(
    registry: &ConsensusRegistry,
    tx: &TransactionView,
    height: u32,
) -> Result<DecodedTransaction, Rejection> {
    // 1. Locate the payload and its encoding class.
    let detected = payload::detect(registry, tx, height)?;
    let encoding_class = detected.class;

    // 2. Attribute the sender. Class B needs it before the payload bytes
    //    can even be read.
    let sender = sender::resolve_sender(registry, tx, height)?;

    // 3. Assemble the payload and parse the fixed header.
    let payload_bytes = payload::assemble(detected, &sender);
    let header = payload::parse_header(&payload_bytes)?;

    // 4. The (type, version) pair must be live at this height and legal for
    //    the property, before any type-specific interpretation happens.
    if !registry.is_transaction_type_allowed(height, header.property, header.tx_type, header.tx_version)
    {
        return Err(Rejection::DisallowedType {
            tx_type: header.tx_type,
            tx_version: header.tx_version,
            height,
        });
    }

    // 5. Receiver: the first qualifying output in transaction order. This is
    //    the one place output order matters.
    let receiver = select_receiver(registry, tx, height, &sender);

    // 6. Fee. Outputs exceeding inputs cannot happen in a valid base-layer
    //    transaction; reject rather than wrap if it somehow does.
    let inputs = tx.total_input_value();
    let outputs = tx.total_output_value();
    let fee = inputs
        .checked_sub(outputs)
        .ok_or(Rejection::FeeUnderflow { inputs, outputs })?;

    Ok(DecodedTransaction {
        txid: tx.txid,
        block_height: height,
        encoding_class,
        sender,
        receiver,
        fee,
        tx_version: header.tx_version,
        tx_type: header.tx_type,
        property: header.property,
        payload: payload_bytes,
    })
}

/// Picks the receiver: scanning outputs in transaction order, the first
/// address-bearing output that is not a payload marker, not the
/// infrastructure address, not the sender's own change, and whose script
/// shape is allowed at `height`. `None` when nothing qualifies.
fn select_receiver(
    registry: &ConsensusRegistry,
    tx: &TransactionView,
    height: u32,
    sender: &Address,
) -> Option<Address> {
    let infrastructure = &registry.params().infrastructure_address;

    for output in &tx.outputs {
        let address = match output.script.address() {
            Some(address) => address,
            None => continue,
        };
        if payload::is_marker_address(address)
            || address == infrastructure
            || address == sender
            || !registry.is_allowed_output_type(output.script.kind(), height)
        {
            continue;
        }
        return Some(address.clone());
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
