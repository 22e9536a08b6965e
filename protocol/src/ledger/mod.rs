//! # Base-Layer Ledger View
//!
//! Lamina never interprets base-layer scripts itself — the host node hands
//! over transactions with every output already classified by script shape
//! and every input resolved to the value and script of its funding output.
//! The types here are that handover format: a frozen, self-contained view
//! of one transaction, sufficient for every decision the engine makes.

pub(crate) mod script;
mod transaction;

pub use script::{OutputScript, ScriptKind};
pub use transaction::{Hash256, TransactionView, TxInput, TxOutput};
