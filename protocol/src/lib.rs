// Copyright (c) 2026 Lamina Labs. MIT License.
// See LICENSE for details.

//! # Lamina Protocol — Core Decision Engine
//!
//! Lamina is an overlay token protocol: its transactions ride inside the
//! outputs of ordinary base-layer transactions, hidden well enough that the
//! base layer relays them and visible enough that every Lamina node finds
//! them. This crate is the part every node must agree on — the logic that
//! decides, for each base-layer transaction, whether it is a Lamina
//! transaction, who sent and received it, what it encodes, and whether the
//! network's rules permit it at that block height.
//!
//! Agreement here is not a nice-to-have. A node that decodes one transaction
//! differently from its peers silently forks its entire ledger state, so
//! everything in this crate is written to be bit-for-bit reproducible: no
//! clocks, no hash-map iteration feeding decisions, no floats, no I/O.
//!
//! ## Architecture
//!
//! - **address** — Base58check addresses, including the string-ordering
//!   quirk consensus depends on.
//! - **ledger** — The frozen view of a base-layer transaction, with script
//!   classification consumed from the host.
//! - **consensus** — Per-network parameters, feature activation, checkpoint
//!   tripwires, and the registry that owns all of it.
//! - **decode** — Payload extraction by encoding class, and sender
//!   attribution by contribution.
//! - **validate** — The per-transaction pipeline tying it all together.
//! - **alerts** — Who may publish network alerts.
//! - **version** — Client version constants.
//!
//! ## Design Philosophy
//!
//! 1. Determinism beats elegance; elegance beats cleverness.
//! 2. Historical behavior is load-bearing. Several oddities here (the
//!    string-based tie-break, the padded class A payloads) are preserved
//!    because the deployed network already depends on them.
//! 3. Per-transaction failures stay per-transaction. Only checkpoint
//!    mismatches stop the node.

pub mod address;
pub mod alerts;
pub mod consensus;
pub mod decode;
pub mod ledger;
pub mod validate;
pub mod version;
