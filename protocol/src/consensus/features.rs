//! # Feature Activation
//!
//! Protocol behavior changes are switched on by governance transactions that
//! schedule an activation height, bounded by a notice window so that a switch
//! can neither be replayed at an arbitrary height nor sprung on the network
//! without warning. Deactivation is immediate: by the time a deactivation is
//! handed to this engine its authorization has already been validated, and
//! already-validated history is never rewritten.
//!
//! Activations and deactivations are kept as an append-only journal in
//! observation order, so a reorg can rewind them in exact LIFO order.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::params::ConsensusParams;
use crate::version::CLIENT_VERSION;

// ---------------------------------------------------------------------------
// Feature identifiers
// ---------------------------------------------------------------------------

/// The closed set of known switchable features.
///
/// Ids are wire-stable small integers carried in governance payloads; gaps in
/// the numbering belong to features that never shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Feature {
    /// Distributions paid out in a different property than the one whose
    /// holders are enumerated (v1 distributions).
    CrossAssetDistribution,
    /// Waiting period between enabling freezing on a managed property and
    /// the first freeze taking effect.
    FreezeNotice,
    /// Trading of every property on the built-in exchange.
    OpenTrading,
}

impl Feature {
    /// The wire id of this feature.
    pub const fn id(self) -> u16 {
        match self {
            Self::CrossAssetDistribution => 10,
            Self::FreezeNotice => 14,
            Self::OpenTrading => 15,
        }
    }

    /// Looks up a known feature by wire id.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            10 => Some(Self::CrossAssetDistribution),
            14 => Some(Self::FreezeNotice),
            15 => Some(Self::OpenTrading),
            _ => None,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CrossAssetDistribution => "cross-asset distributions",
            Self::FreezeNotice => "freeze notice period",
            Self::OpenTrading => "open exchange trading",
        }
    }
}

/// Display name for any wire id, known or not. Governance transactions may
/// reference features this client has never heard of; they still need to be
/// journaled and logged.
pub fn feature_name(id: u16) -> String {
    match Feature::from_id(id) {
        Some(feature) => feature.name().to_string(),
        None => format!("unknown feature ({id})"),
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// One journaled governance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeatureEvent {
    /// A scheduled activation: pending until `activation_block`, live from
    /// it onward.
    Activated {
        feature_id: u16,
        activation_block: u32,
        min_client_version: u32,
        observed_at: u32,
    },
    /// An immediate deactivation, effective at the block that carried it.
    Deactivated { feature_id: u16, observed_at: u32 },
}

impl FeatureEvent {
    /// The block the event was observed in; rewinds key off this.
    pub fn observed_at(&self) -> u32 {
        match self {
            Self::Activated { observed_at, .. } | Self::Deactivated { observed_at, .. } => {
                *observed_at
            }
        }
    }
}

/// Errors from feature governance requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    /// The requested activation height falls outside the notice window. The
    /// request is discarded; the carrying transaction is otherwise intact.
    #[error(
        "activation of feature {feature_id} at block {activation_block} is outside \
         the allowed window [{earliest}, {latest}]"
    )]
    ActivationOutOfWindow {
        feature_id: u16,
        activation_block: u32,
        earliest: u32,
        latest: u32,
    },
}

/// The append-only journal of feature governance events.
///
/// All reads are pure scans over the journal; there is no derived cache to
/// fall out of sync during rewinds.
#[derive(Debug, Clone, Default)]
pub struct FeatureJournal {
    events: Vec<FeatureEvent>,
}

impl FeatureJournal {
    /// An empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scheduled activation.
    ///
    /// `activation_block` must satisfy
    /// `observed_at + min_activation_blocks <= activation_block <= observed_at + max_activation_blocks`;
    /// out-of-window requests are rejected and nothing is recorded.
    pub fn activate(
        &mut self,
        params: &ConsensusParams,
        feature_id: u16,
        activation_block: u32,
        min_client_version: u32,
        observed_at: u32,
    ) -> Result<(), FeatureError> {
        let earliest = observed_at.saturating_add(params.min_activation_blocks);
        let latest = observed_at.saturating_add(params.max_activation_blocks);

        if activation_block < earliest || activation_block > latest {
            return Err(FeatureError::ActivationOutOfWindow {
                feature_id,
                activation_block,
                earliest,
                latest,
            });
        }

        if min_client_version > CLIENT_VERSION {
            warn!(
                feature = %feature_name(feature_id),
                min_client_version,
                client_version = CLIENT_VERSION,
                "scheduled feature activation requires a newer client"
            );
        }

        info!(
            feature = %feature_name(feature_id),
            activation_block,
            observed_at,
            "feature activation scheduled"
        );

        self.events.push(FeatureEvent::Activated {
            feature_id,
            activation_block,
            min_client_version,
            observed_at,
        });
        Ok(())
    }

    /// Records an immediate deactivation, effective at `observed_at`.
    ///
    /// Returns `false` (recording nothing) when the feature has no live or
    /// pending activation to cancel.
    pub fn deactivate(&mut self, feature_id: u16, observed_at: u32) -> bool {
        // A deactivation may only cancel something: either a live feature or
        // a pending activation that has not been cancelled yet.
        if !self.is_activated(feature_id, observed_at) && !self.has_pending(feature_id, observed_at)
        {
            return false;
        }

        info!(feature = %feature_name(feature_id), observed_at, "feature deactivated");
        self.events.push(FeatureEvent::Deactivated {
            feature_id,
            observed_at,
        });
        true
    }

    /// Whether `feature_id` is live for transactions at `height`: a prior
    /// activation with `activation_block <= height` exists and no later
    /// deactivation observed at or before `height` supersedes it. A
    /// re-scheduled activation replaces the earlier record.
    pub fn is_activated(&self, feature_id: u16, height: u32) -> bool {
        let mut live = false;
        for ev in &self.events {
            match ev {
                FeatureEvent::Activated {
                    feature_id: id,
                    activation_block,
                    ..
                } if *id == feature_id => {
                    live = *activation_block <= height;
                }
                FeatureEvent::Deactivated {
                    feature_id: id,
                    observed_at,
                } if *id == feature_id && *observed_at <= height => {
                    live = false;
                }
                _ => {}
            }
        }
        live
    }

    /// Whether a pending (scheduled but not yet live) activation exists for
    /// `feature_id` as of `height`.
    pub fn has_pending(&self, feature_id: u16, height: u32) -> bool {
        let mut pending = false;
        for ev in &self.events {
            match ev {
                FeatureEvent::Activated {
                    feature_id: id,
                    activation_block,
                    ..
                } if *id == feature_id => {
                    pending = *activation_block > height;
                }
                FeatureEvent::Deactivated {
                    feature_id: id,
                    observed_at,
                } if *id == feature_id && *observed_at <= height => {
                    pending = false;
                }
                _ => {}
            }
        }
        pending
    }

    /// Removes every event observed at `height` or later, newest first.
    /// Called while disconnecting blocks; because the journal is in
    /// observation order, truncation is exactly LIFO.
    pub fn rewind(&mut self, height: u32) {
        while matches!(self.events.last(), Some(ev) if ev.observed_at() >= height) {
            if let Some(ev) = self.events.pop() {
                info!(?ev, "feature event rewound");
            }
        }
    }

    /// The journaled events, oldest first.
    pub fn events(&self) -> &[FeatureEvent] {
        &self.events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
