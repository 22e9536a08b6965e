//! # Alert Source Authorization
//!
//! Network alerts are broadcast as ordinary protocol transactions, which
//! means anyone can send one; what makes an alert *count* is where it came
//! from. By default only the per-network trusted address is honored. An
//! operator can override that with an explicit allow-list (including the
//! wildcard `"any"`, useful on test networks) and can always carve sources
//! out with a deny-list — deny is checked strictly first, so it wins even
//! against the wildcard.
//!
//! Authorization is block-independent: the same lists give the same answer
//! at every height.

use crate::consensus::ConsensusParams;

/// Allow-list sentinel accepting every source.
pub const ALERT_SOURCE_ANY: &str = "any";

/// Evaluates whether a source address may publish alerts.
#[derive(Debug, Clone)]
pub struct AlertAuthorizer {
    trusted: String,
    allowed: Vec<String>,
    denied: Vec<String>,
}

impl AlertAuthorizer {
    /// An authorizer with the network's hardcoded trusted source and no
    /// operator overrides.
    pub fn new(params: &ConsensusParams) -> Self {
        Self {
            trusted: params.trusted_alert_address.as_str().to_string(),
            allowed: Vec::new(),
            denied: Vec::new(),
        }
    }

    /// Adds an allowed source (or the [`ALERT_SOURCE_ANY`] wildcard).
    /// Configuring any allow-list entry replaces the trusted-address
    /// default entirely.
    pub fn allow_source(&mut self, source: impl Into<String>) {
        self.allowed.push(source.into());
    }

    /// Adds a denied source. Deny entries win over everything.
    pub fn ignore_source(&mut self, source: impl Into<String>) {
        self.denied.push(source.into());
    }

    /// Policy, evaluated in order:
    ///
    /// 1. a denied source is unauthorized, regardless of anything else;
    /// 2. with an allow-list configured, authorized iff the list contains
    ///    the wildcard or the exact source;
    /// 3. otherwise, authorized iff the source is the trusted address.
    pub fn is_authorized(&self, source: &str) -> bool {
        if self.denied.iter().any(|denied| denied == source) {
            return false;
        }
        if !self.allowed.is_empty() {
            return self
                .allowed
                .iter()
                .any(|allowed| allowed == ALERT_SOURCE_ANY || allowed == source);
        }
        source == self.trusted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
