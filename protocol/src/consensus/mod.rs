//! # Consensus Rules
//!
//! The per-network rulebook: constant parameters and restriction tables
//! ([`params`]), block-height-gated feature switches ([`features`]),
//! divergence tripwires ([`checkpoints`]), and the registry that owns the
//! active selection and all of its mutable state ([`registry`]).

pub mod checkpoints;
pub mod features;
pub mod params;
pub mod registry;

pub use checkpoints::TransactionIndex;
pub use features::{Feature, FeatureError, FeatureEvent, FeatureJournal};
pub use params::{
    ConsensusCheckpoint, ConsensusParams, Network, TransactionCheckpoint, TransactionRestriction,
};
pub use registry::{ConsensusError, ConsensusRegistry};
