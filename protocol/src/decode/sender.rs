//! # Sender Resolution
//!
//! Attributing a transaction to a sender is the half of decoding that the
//! whole ledger state hangs off: get it wrong on one node and that node's
//! balances diverge forever.
//!
//! A transaction funded by a single input has an obvious sender. With
//! multiple inputs the sender is chosen **by contribution**: each input's
//! value accrues to its funding address, and the address with the strictly
//! largest total wins. Ties are broken by the lexicographically smallest
//! *encoded address string* — not the smallest underlying hash. The string
//! comparison is what the deployed network has always done, and
//! [`Address`]'s `Ord` implements it, so the `BTreeMap` accumulation below
//! reproduces the tie-break by construction: map iteration is ascending in
//! string order and only a strictly larger total displaces the running
//! winner.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::address::Address;
use crate::consensus::ConsensusRegistry;
use crate::ledger::{ScriptKind, TransactionView, TxInput};

/// Sender resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SenderError {
    /// An input's script shape is outside the allowed set at this height.
    /// One bad input invalidates the whole computation, not just itself.
    #[error("input script type {kind} not allowed at height {height}")]
    DisallowedInput { kind: ScriptKind, height: u32 },

    /// No input yielded an attributable address.
    #[error("no eligible contributing input")]
    NoCandidates,
}

/// Resolves the attributed sender of a transaction at `height`.
///
/// Single-input transactions resolve directly to that input's address;
/// everything else goes through [`sender_by_contribution`]. Either way,
/// every input's script shape is vetted first.
pub fn resolve_sender(
    registry: &ConsensusRegistry,
    tx: &TransactionView,
    height: u32,
) -> Result<Address, SenderError> {
    for input in &tx.inputs {
        let kind = input.script.kind();
        if !registry.is_allowed_input_type(kind, height) {
            return Err(SenderError::DisallowedInput { kind, height });
        }
    }

    match tx.inputs.as_slice() {
        [only] => only
            .script
            .address()
            .cloned()
            .ok_or(SenderError::NoCandidates),
        inputs => sender_by_contribution(inputs),
    }
}

/// The contribution algorithm: accumulate input values per funding address,
/// pick the strictly largest total, break ties by encoded-string order.
///
/// The result is invariant under any permutation of `inputs` — accumulation
/// is a plain sum and the winner scan runs over the sorted map, never over
/// the input list.
pub fn sender_by_contribution(inputs: &[TxInput]) -> Result<Address, SenderError> {
    let mut totals: BTreeMap<Address, u64> = BTreeMap::new();

    for input in inputs {
        // Inputs without an extractable address (bare multisig) are legal
        // but contribute nothing.
        if let Some(address) = input.script.address() {
            let total = totals.entry(address.clone()).or_insert(0);
            *total = total.saturating_add(input.value);
        }
    }

    let mut winner: Option<(&Address, u64)> = None;
    for (address, &total) in &totals {
        let displaces = match winner {
            None => true,
            Some((_, best)) => total > best,
        };
        if displaces {
            winner = Some((address, total));
        }
    }

    winner
        .map(|(address, _)| address.clone())
        .ok_or(SenderError::NoCandidates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
