//! # Checkpoint Verification
//!
//! Checkpoints are tripwires against silent divergence: hardcoded
//! (height, hash) facts the node's own derived history must agree with.
//! A block checkpoint failing means the node is on the wrong chain or has
//! computed the wrong state from the right chain; either way, continuing to
//! process blocks would compound the corruption.

use super::params::ConsensusParams;
use crate::ledger::Hash256;

/// Lookup capability over the node's processed transaction history.
///
/// The host owns transaction storage; verification only needs membership.
pub trait TransactionIndex {
    /// Whether `txid` exists in processed history.
    fn contains(&self, txid: &Hash256) -> bool;
}

impl<F: Fn(&Hash256) -> bool> TransactionIndex for F {
    fn contains(&self, txid: &Hash256) -> bool {
        self(txid)
    }
}

/// Verifies an observed block hash against the checkpoint table.
///
/// Vacuously true when no checkpoint is registered at `height`. A `false`
/// return is a fork or state-corruption signal and must be treated as fatal
/// to the node, not to the block.
pub fn verify_block_checkpoint(params: &ConsensusParams, height: u32, block_hash: &Hash256) -> bool {
    params
        .checkpoints()
        .iter()
        .filter(|cp| cp.height == height)
        .all(|cp| cp.block_hash == *block_hash)
}

/// Verifies that every transaction checkpoint due by `height` is present in
/// the node's processed history. A `false` return signals that transactions
/// were skipped or lost — the same fatal category as a block mismatch.
pub fn verify_transaction_existence(
    params: &ConsensusParams,
    height: u32,
    index: &impl TransactionIndex,
) -> bool {
    params
        .transaction_checkpoints()
        .iter()
        .filter(|tc| tc.height <= height)
        .all(|tc| index.contains(&tc.txid))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::params::ConsensusParams;

    #[test]
    fn no_checkpoint_at_height_passes() {
        let params = ConsensusParams::mainnet();
        let hash = Hash256::from_bytes([0xab; 32]);
        assert!(verify_block_checkpoint(&params, 5, &hash));
    }

    #[test]
    fn matching_checkpoint_passes() {
        let params = ConsensusParams::mainnet();
        let cp = params.checkpoints()[0];
        assert!(verify_block_checkpoint(&params, cp.height, &cp.block_hash));
    }

    #[test]
    fn mismatching_checkpoint_fails() {
        let params = ConsensusParams::mainnet();
        let cp = params.checkpoints()[0];
        let wrong = Hash256::from_bytes([0x55; 32]);
        assert_ne!(cp.block_hash, wrong);
        assert!(!verify_block_checkpoint(&params, cp.height, &wrong));
    }

    #[test]
    fn empty_table_always_passes() {
        let params = ConsensusParams::regtest();
        let hash = Hash256::from_bytes([1; 32]);
        assert!(verify_block_checkpoint(&params, 0, &hash));
        assert!(verify_transaction_existence(&params, u32::MAX, &|_: &Hash256| false));
    }

    #[test]
    fn transaction_existence_checks_only_due_checkpoints() {
        let params = ConsensusParams::mainnet();
        let first = params.transaction_checkpoints()[0];

        // Before any checkpoint is due, an empty history is fine.
        assert!(verify_transaction_existence(
            &params,
            first.height - 1,
            &|_: &Hash256| false
        ));

        // Once due, the transaction must exist.
        assert!(!verify_transaction_existence(
            &params,
            first.height,
            &|_: &Hash256| false
        ));
        assert!(verify_transaction_existence(
            &params,
            first.height,
            &move |txid: &Hash256| *txid == first.txid
        ));
    }

    #[test]
    fn all_due_checkpoints_must_exist() {
        let params = ConsensusParams::mainnet();
        let table = params.transaction_checkpoints();
        let first = table[0];
        let last = table[table.len() - 1];

        // Knowing only the first transaction fails once the last is due.
        assert!(!verify_transaction_existence(
            &params,
            last.height,
            &move |txid: &Hash256| *txid == first.txid
        ));
        assert!(verify_transaction_existence(&params, last.height, &|_: &Hash256| true));
    }
}
