//! # The Consensus Registry
//!
//! One value owns everything mutable in the decision engine: the active
//! network selection, the (possibly test-overridden) parameters, and the
//! feature journal. There is no ambient global — the host constructs a
//! [`ConsensusRegistry`] and threads it through validation.
//!
//! Mutation requires `&mut self`, so the single-writer discipline of the
//! block-connection thread is enforced by the borrow checker rather than by
//! convention: readers validating transactions in parallel share `&self` and
//! observe one consistent snapshot.

use thiserror::Error;
use tracing::{debug, info};

use super::checkpoints::{self, TransactionIndex};
use super::features::{FeatureError, FeatureJournal};
use super::params::{ConsensusParams, Network, PROPERTY_BASE_ASSET};
use crate::ledger::{Hash256, ScriptKind};

/// Fatal consensus-state failures. Unlike per-transaction rejections, these
/// mean the node itself has diverged and must stop connecting blocks.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The observed block hash disagrees with a hardcoded checkpoint.
    #[error("checkpoint mismatch at height {height}: observed block hash {observed}")]
    CheckpointMismatch { height: u32, observed: Hash256 },

    /// A transaction checkpoint due by this height is absent from history.
    #[error("transaction checkpoint missing at height {height}")]
    MissingCheckpointTransaction { height: u32 },
}

/// Process-wide consensus context: active network, parameters, features.
#[derive(Debug, Clone)]
pub struct ConsensusRegistry {
    params: ConsensusParams,
    defaults: ConsensusParams,
    features: FeatureJournal,
}

impl ConsensusRegistry {
    /// A registry for the given network, with pristine parameters and an
    /// empty feature journal.
    pub fn new(network: Network) -> Self {
        let defaults = ConsensusParams::for_network(network);
        Self {
            params: defaults.clone(),
            defaults,
            features: FeatureJournal::new(),
        }
    }

    /// The active network.
    pub fn network(&self) -> Network {
        self.params.network
    }

    /// The active parameters.
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Mutable access to the active parameters.
    ///
    /// Test-only escape hatch for overriding individual thresholds; callers
    /// must restore the pristine values with [`reset_params`](Self::reset_params)
    /// before anyone else reads the registry.
    pub fn params_mut(&mut self) -> &mut ConsensusParams {
        &mut self.params
    }

    /// Restores the pristine parameters for the active network, discarding
    /// any test overrides.
    pub fn reset_params(&mut self) {
        self.params = self.defaults.clone();
    }

    /// Switches the registry to another network, discarding overrides and
    /// the feature journal. Must never race with validation; the `&mut`
    /// receiver makes that structural.
    pub fn switch_network(&mut self, network: Network) {
        info!(from = %self.params.network, to = %network, "switching network");
        self.defaults = ConsensusParams::for_network(network);
        self.params = self.defaults.clone();
        self.features = FeatureJournal::new();
    }

    /// The feature journal (read-only).
    pub fn features(&self) -> &FeatureJournal {
        &self.features
    }

    // -----------------------------------------------------------------------
    // Feature activation
    // -----------------------------------------------------------------------

    /// Schedules a feature activation observed at `observed_at`.
    pub fn activate_feature(
        &mut self,
        feature_id: u16,
        activation_block: u32,
        min_client_version: u32,
        observed_at: u32,
    ) -> Result<(), FeatureError> {
        self.features.activate(
            &self.params,
            feature_id,
            activation_block,
            min_client_version,
            observed_at,
        )
    }

    /// Deactivates a feature immediately; authorization is the caller's
    /// responsibility and is assumed already validated.
    pub fn deactivate_feature(&mut self, feature_id: u16, observed_at: u32) -> bool {
        self.features.deactivate(feature_id, observed_at)
    }

    /// Whether a feature is live at `height`, via either its hardcoded
    /// release height or a journaled activation.
    pub fn is_feature_activated(&self, feature_id: u16, height: u32) -> bool {
        use super::features::Feature;

        let hardcoded = match Feature::from_id(feature_id) {
            Some(Feature::CrossAssetDistribution) => self.params.cross_asset_distribution_block,
            Some(Feature::FreezeNotice) => self.params.freeze_notice_block,
            Some(Feature::OpenTrading) => self.params.open_trading_block,
            None => super::params::NEVER,
        };

        height >= hardcoded || self.features.is_activated(feature_id, height)
    }

    // -----------------------------------------------------------------------
    // Height-gated legality
    // -----------------------------------------------------------------------

    /// Whether a (type, version) pair is supported, enabled at `height`, and
    /// legal for `property` (property 0 is the base asset and is only legal
    /// for rows that allow the wildcard).
    pub fn is_transaction_type_allowed(
        &self,
        height: u32,
        property: u32,
        tx_type: u16,
        tx_version: u16,
    ) -> bool {
        for row in self.params.restrictions() {
            if row.tx_type != tx_type || row.tx_version != tx_version {
                continue;
            }
            if property == PROPERTY_BASE_ASSET && !row.allow_wildcard {
                return false;
            }
            return height >= row.activation_block;
        }
        false
    }

    /// Whether `kind` is legal as a protocol-carrying input at `height`.
    pub fn is_allowed_input_type(&self, kind: ScriptKind, height: u32) -> bool {
        match kind {
            ScriptKind::PubKeyHash | ScriptKind::PubKey => height >= self.params.pubkeyhash_block,
            ScriptKind::ScriptHash => height >= self.params.scripthash_block,
            ScriptKind::BareMultisig => height >= self.params.multisig_block,
            ScriptKind::NullData | ScriptKind::NonStandard => false,
        }
    }

    /// Whether `kind` is legal as a protocol-participating output at `height`.
    pub fn is_allowed_output_type(&self, kind: ScriptKind, height: u32) -> bool {
        match kind {
            ScriptKind::PubKeyHash | ScriptKind::PubKey => height >= self.params.pubkeyhash_block,
            ScriptKind::ScriptHash => height >= self.params.scripthash_block,
            ScriptKind::BareMultisig => height >= self.params.multisig_block,
            ScriptKind::NullData => height >= self.params.nulldata_block,
            ScriptKind::NonStandard => false,
        }
    }

    // -----------------------------------------------------------------------
    // Block driver
    // -----------------------------------------------------------------------

    /// Connects a block: verifies the checkpoint table before any of the
    /// block's transactions may take effect. A mismatch is fatal — the
    /// caller must stop processing rather than continue on wrong state.
    pub fn connect_block(&mut self, height: u32, block_hash: &Hash256) -> Result<(), ConsensusError> {
        if !checkpoints::verify_block_checkpoint(&self.params, height, block_hash) {
            return Err(ConsensusError::CheckpointMismatch {
                height,
                observed: *block_hash,
            });
        }
        debug!(height, %block_hash, "block connected");
        Ok(())
    }

    /// Disconnects a block during a reorg, rewinding every feature event it
    /// carried in LIFO order.
    pub fn disconnect_block(&mut self, height: u32) {
        self.features.rewind(height);
        debug!(height, "block disconnected");
    }

    /// Verifies transaction checkpoints due by `height` against the host's
    /// processed-transaction index.
    pub fn verify_transaction_existence(
        &self,
        height: u32,
        index: &impl TransactionIndex,
    ) -> Result<(), ConsensusError> {
        if !checkpoints::verify_transaction_existence(&self.params, height, index) {
            return Err(ConsensusError::MissingCheckpointTransaction { height });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
