//! # Per-Network Consensus Parameters
//!
//! Every height threshold, restriction row, and checkpoint that defines the
//! Lamina network lives here as plain data — one concrete parameter struct
//! per network, selected by [`Network`]. Changing any value is a software
//! release, not a configuration knob: two nodes with different tables are
//! two different networks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::ledger::Hash256;

/// Sentinel height for "not scheduled": a threshold no block will ever reach
/// without a release that rewrites it (or a feature activation that
/// overrides it).
pub const NEVER: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Transaction type and version constants
// ---------------------------------------------------------------------------

/// Simple send: move an amount of one property to one receiver.
pub const TX_SIMPLE_SEND: u16 = 0;
/// Distribution: pro-rata send to all holders of a property.
pub const TX_DISTRIBUTION: u16 = 3;
/// Send all: transfer every owned property in one transaction.
pub const TX_SEND_ALL: u16 = 4;
/// Publish a trade offer on the built-in exchange.
pub const TX_TRADE_OFFER: u16 = 20;
/// Accept a published trade offer.
pub const TX_ACCEPT_OFFER: u16 = 22;
/// Create a property with fixed supply.
pub const TX_ISSUE_FIXED: u16 = 50;
/// Create a property via crowdsale.
pub const TX_ISSUE_CROWDSALE: u16 = 51;
/// Close an open crowdsale early.
pub const TX_CLOSE_CROWDSALE: u16 = 53;
/// Create a managed property (issuer mints and burns).
pub const TX_ISSUE_MANAGED: u16 = 54;
/// Grant units of a managed property.
pub const TX_GRANT: u16 = 55;
/// Revoke units of a managed property.
pub const TX_REVOKE: u16 = 56;
/// Transfer issuer control of a property.
pub const TX_CHANGE_ISSUER: u16 = 70;
/// Enable address freezing for a managed property.
pub const TX_ENABLE_FREEZING: u16 = 71;
/// Disable address freezing for a managed property.
pub const TX_DISABLE_FREEZING: u16 = 72;
/// Freeze a holder address of a managed property.
pub const TX_FREEZE: u16 = 185;
/// Unfreeze a holder address of a managed property.
pub const TX_UNFREEZE: u16 = 186;
/// Arbitrary application data, no ledger effect.
pub const TX_ANY_DATA: u16 = 200;
/// Governance: deactivate a live protocol feature.
pub const TX_DEACTIVATION: u16 = 65533;
/// Governance: schedule a protocol feature activation.
pub const TX_ACTIVATION: u16 = 65534;
/// Network-wide alert notification.
pub const TX_ALERT: u16 = 65535;

/// First packet format generation.
pub const TX_VERSION_0: u16 = 0;
/// Second packet format generation.
pub const TX_VERSION_1: u16 = 1;
/// The packet version used by the governance and alert types; chosen outside
/// the normal generation sequence so those payloads are never confused with
/// ordinary sends.
pub const TX_VERSION_65535: u16 = 65535;

/// The property id of the base asset (the ledger's own coin).
pub const PROPERTY_BASE_ASSET: u32 = 0;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The networks Lamina runs on. Selects exactly one parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    Main,
    /// Public test network.
    Test,
    /// Local regression-test network.
    Reg,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Reg => "reg",
        };
        f.write_str(name)
    }
}

/// Error for unrecognized network names.
#[derive(Debug, thiserror::Error)]
#[error("unknown network '{0}' (expected main, test, or reg)")]
pub struct UnknownNetwork(String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Self::Main),
            "test" | "testnet" => Ok(Self::Test),
            "reg" | "regtest" => Ok(Self::Reg),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Table row types
// ---------------------------------------------------------------------------

/// One row of the transaction restriction table: a (type, version) pair ever
/// introduced, whether the base asset is a legal property for it, and the
/// height it switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionRestriction {
    pub tx_type: u16,
    pub tx_version: u16,
    /// Whether property id 0 (the base asset) is legal for this row.
    pub allow_wildcard: bool,
    /// Height at which the row becomes active.
    pub activation_block: u32,
}

/// A hardcoded known-good snapshot: at `height`, the block hash and the
/// cumulative consensus-state hash the node must have derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsensusCheckpoint {
    pub height: u32,
    pub block_hash: Hash256,
    pub consensus_hash: Hash256,
}

/// A transaction that must exist in the node's processed history once the
/// chain passes `height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionCheckpoint {
    pub height: u32,
    pub txid: Hash256,
}

// ---------------------------------------------------------------------------
// ConsensusParams
// ---------------------------------------------------------------------------

/// The complete parameter set of one network.
///
/// Constructed once per network and treated as immutable; the only sanctioned
/// mutation path is the test-only override in
/// [`ConsensusRegistry::params_mut`](super::registry::ConsensusRegistry::params_mut).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsensusParams {
    /// Which network this parameter set belongs to.
    pub network: Network,

    /// First block the overlay protocol exists at; nothing before it is
    /// ever parsed.
    pub genesis_block: u32,

    /// Minimum notice (in blocks) between a feature activation transaction
    /// and the height it activates at.
    pub min_activation_blocks: u32,
    /// Maximum notice (in blocks) for a feature activation.
    pub max_activation_blocks: u32,

    /// Waiting period after enabling freezing before addresses may actually
    /// be frozen, once the freeze-notice feature is live.
    pub freeze_wait_blocks: u32,

    /// Height from which pay-to-pubkey-hash participates in the protocol.
    pub pubkeyhash_block: u32,
    /// Height from which pay-to-script-hash participates.
    pub scripthash_block: u32,
    /// Height from which the bare-multisig encoding class is recognized.
    pub multisig_block: u32,
    /// Height from which the null-data encoding class is recognized.
    pub nulldata_block: u32,

    /// Height enabling alert transactions.
    pub alert_block: u32,
    /// Height enabling simple sends.
    pub send_block: u32,
    /// Height enabling the built-in exchange (offer/accept).
    pub dex_block: u32,
    /// Height enabling fixed and crowdsale issuance.
    pub issuance_block: u32,
    /// Height enabling managed issuance (grant/revoke/issuer change and the
    /// freezing lifecycle).
    pub managed_issuance_block: u32,
    /// Height enabling holder distributions.
    pub distribution_block: u32,
    /// Height enabling send-all.
    pub send_all_block: u32,
    /// Height enabling cross-asset distributions (v1), unless the matching
    /// feature activates it earlier.
    pub cross_asset_distribution_block: u32,
    /// Height enabling arbitrary data payloads.
    pub any_data_block: u32,
    /// Height enabling the freeze-notice waiting period, unless activated
    /// as a feature.
    pub freeze_notice_block: u32,
    /// Height enabling open trading of every property on the exchange,
    /// unless activated as a feature.
    pub open_trading_block: u32,

    /// Version byte of pay-to-pubkey-hash addresses on this network.
    pub p2pkh_version: u8,
    /// Version byte of pay-to-script-hash addresses on this network.
    pub p2sh_version: u8,

    /// The burn-in collection address. Outputs to it mark a transaction as
    /// protocol-carrying for the older encoding classes; it is never a
    /// sender or receiver.
    pub infrastructure_address: Address,
    /// The single source trusted for alerts when no allow-list is configured.
    pub trusted_alert_address: Address,
}

impl ConsensusParams {
    /// Parameters for the given network. Pure lookup, no shared state.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::mainnet(),
            Network::Test => Self::testnet(),
            Network::Reg => Self::regtest(),
        }
    }

    /// Production parameters.
    pub fn mainnet() -> Self {
        Self {
            network: Network::Main,
            genesis_block: 612_000,
            min_activation_blocks: 2_048,
            max_activation_blocks: 12_288,
            freeze_wait_blocks: 4_096,
            pubkeyhash_block: 0,
            scripthash_block: 615_500,
            multisig_block: 613_000,
            nulldata_block: 700_500,
            alert_block: 612_000,
            send_block: 612_100,
            dex_block: 633_500,
            issuance_block: 648_000,
            managed_issuance_block: 672_000,
            distribution_block: 661_500,
            send_all_block: 705_000,
            cross_asset_distribution_block: NEVER,
            any_data_block: 752_000,
            freeze_notice_block: NEVER,
            open_trading_block: NEVER,
            p2pkh_version: 0x30,
            p2sh_version: 0x32,
            infrastructure_address: addr(0x30, "1f2a45c9b04ad3c7722fd8d0ab4f2a2f85cf29dd"),
            trusted_alert_address: addr(0x30, "8e15a4b1077cd6a0dc1c8c5f3b9026e33cd0be10"),
        }
    }

    /// Public test network parameters. Everything switches on early so new
    /// behavior can be exercised before it is scheduled on mainnet.
    pub fn testnet() -> Self {
        Self {
            network: Network::Test,
            genesis_block: 263_000,
            min_activation_blocks: 0,
            max_activation_blocks: 999_999,
            freeze_wait_blocks: 0,
            pubkeyhash_block: 0,
            scripthash_block: 263_000,
            multisig_block: 263_000,
            nulldata_block: 263_200,
            alert_block: 263_000,
            send_block: 263_000,
            dex_block: 263_000,
            issuance_block: 263_000,
            managed_issuance_block: 263_000,
            distribution_block: 263_000,
            send_all_block: 263_200,
            cross_asset_distribution_block: 263_400,
            any_data_block: 263_600,
            freeze_notice_block: 263_800,
            open_trading_block: 263_800,
            p2pkh_version: 0x6f,
            p2sh_version: 0xc4,
            infrastructure_address: addr(0x6f, "41fd1a2b66c1e9b0c8dd4c2e37a2ab7eafb05c11"),
            trusted_alert_address: addr(0x6f, "c6d02eb35e7a4d1b81d7e8c0e49bf5a8ed2a6f42"),
        }
    }

    /// Regression-test parameters: everything on from the start, with a
    /// short activation window so notice-period logic stays testable.
    pub fn regtest() -> Self {
        Self {
            network: Network::Reg,
            genesis_block: 101,
            min_activation_blocks: 5,
            max_activation_blocks: 10,
            freeze_wait_blocks: 10,
            pubkeyhash_block: 0,
            scripthash_block: 0,
            multisig_block: 0,
            nulldata_block: 0,
            alert_block: 0,
            send_block: 0,
            dex_block: 0,
            issuance_block: 0,
            managed_issuance_block: 0,
            distribution_block: 0,
            send_all_block: 0,
            cross_asset_distribution_block: 0,
            any_data_block: 0,
            freeze_notice_block: 0,
            open_trading_block: 0,
            p2pkh_version: 0x6f,
            p2sh_version: 0xc4,
            infrastructure_address: addr(0x6f, "3ba8e9c0a5f1d2b37c4e66a0d9f52c1b08ad74e5"),
            trusted_alert_address: addr(0x6f, "9c01de4b2f6a8c53b7d90e12a45f6c8d0b3e7a19"),
        }
    }

    /// The transaction restriction table: every (type, version) pair ever
    /// introduced, with its wildcard rule and activation height.
    pub fn restrictions(&self) -> Vec<TransactionRestriction> {
        let row = |tx_type, tx_version, allow_wildcard, activation_block| TransactionRestriction {
            tx_type,
            tx_version,
            allow_wildcard,
            activation_block,
        };
        vec![
            row(TX_SIMPLE_SEND, TX_VERSION_0, false, self.send_block),
            row(TX_DISTRIBUTION, TX_VERSION_0, false, self.distribution_block),
            row(
                TX_DISTRIBUTION,
                TX_VERSION_1,
                false,
                self.cross_asset_distribution_block,
            ),
            row(TX_SEND_ALL, TX_VERSION_0, false, self.send_all_block),
            row(TX_TRADE_OFFER, TX_VERSION_0, false, self.dex_block),
            row(TX_TRADE_OFFER, TX_VERSION_1, false, self.dex_block),
            // Accepting an offer pays in the base asset, so property 0 is
            // legal here and nowhere else on the exchange.
            row(TX_ACCEPT_OFFER, TX_VERSION_0, true, self.dex_block),
            row(TX_ISSUE_FIXED, TX_VERSION_0, false, self.issuance_block),
            row(TX_ISSUE_CROWDSALE, TX_VERSION_0, false, self.issuance_block),
            row(TX_CLOSE_CROWDSALE, TX_VERSION_0, false, self.issuance_block),
            row(
                TX_ISSUE_MANAGED,
                TX_VERSION_0,
                false,
                self.managed_issuance_block,
            ),
            row(TX_GRANT, TX_VERSION_0, false, self.managed_issuance_block),
            row(TX_REVOKE, TX_VERSION_0, false, self.managed_issuance_block),
            row(
                TX_CHANGE_ISSUER,
                TX_VERSION_0,
                false,
                self.managed_issuance_block,
            ),
            row(
                TX_ENABLE_FREEZING,
                TX_VERSION_0,
                false,
                self.managed_issuance_block,
            ),
            row(
                TX_DISABLE_FREEZING,
                TX_VERSION_0,
                false,
                self.managed_issuance_block,
            ),
            row(TX_FREEZE, TX_VERSION_0, false, self.managed_issuance_block),
            row(TX_UNFREEZE, TX_VERSION_0, false, self.managed_issuance_block),
            row(TX_ANY_DATA, TX_VERSION_0, true, self.any_data_block),
            row(TX_DEACTIVATION, TX_VERSION_65535, true, self.alert_block),
            row(TX_ACTIVATION, TX_VERSION_65535, true, self.alert_block),
            row(TX_ALERT, TX_VERSION_65535, true, self.alert_block),
        ]
    }

    /// Consensus checkpoints. Only mainnet pins any; the test networks are
    /// reset too often for snapshots to stay meaningful.
    pub fn checkpoints(&self) -> Vec<ConsensusCheckpoint> {
        if self.network != Network::Main {
            return Vec::new();
        }
        let cp = |height, block_hash, consensus_hash| ConsensusCheckpoint {
            height,
            block_hash: h256(block_hash),
            consensus_hash: h256(consensus_hash),
        };
        vec![
            cp(
                620_000,
                "00000000000000b715b3cb5e0e5b51c6a2886b6f0ec10e56d1b602c3fdf07d7c",
                "5b12d9de29a43b0a8f6f1e0a4f7e9a1d6b2c8d3f41ce5a907b6d4e2f8a1c3b5d",
            ),
            cp(
                660_000,
                "000000000000003c9f0a7e2d6b41c85f7a3e1d9028c6b5f4e3d2a1908b7c6d5e",
                "e4a1b2c3d4e5f60718293a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d",
            ),
            cp(
                700_000,
                "0000000000000089d1e2f3a4b5c6d7e80f1a2b3c4d5e6f708192a3b4c5d6e7f8",
                "17c8d9e0f1a2b3c4d5e6f7a8b90c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c",
            ),
        ]
    }

    /// Transaction checkpoints: transactions that must exist in processed
    /// history once the chain passes their height. Mainnet only.
    pub fn transaction_checkpoints(&self) -> Vec<TransactionCheckpoint> {
        if self.network != Network::Main {
            return Vec::new();
        }
        let tc = |height, txid| TransactionCheckpoint {
            height,
            txid: h256(txid),
        };
        vec![
            tc(
                612_114,
                "9e2f4c6a8b0d1e3f5a7c9b2d4f6e8a0c1b3d5f7e9a2c4b6d8f0e1a3c5b7d9f2e",
            ),
            tc(
                648_230,
                "2d4f6e8a0c1b3d5f7e9a2c4b6d8f0e1a3c5b7d9f2e4a6c8b0d1e3f5a7c9b2d4f",
            ),
        ]
    }
}

/// Builds a hardcoded address from its version byte and hash160 hex.
fn addr(version: u8, hash_hex: &str) -> Address {
    let raw = hex::decode(hash_hex).expect("hardcoded address hash is valid hex");
    let hash: [u8; 20] = raw
        .try_into()
        .expect("hardcoded address hash is 20 bytes");
    Address::from_hash160(version, hash)
}

/// Parses a hardcoded 32-byte hash literal.
fn h256(hex_str: &str) -> Hash256 {
    Hash256::from_hex(hex_str).expect("hardcoded checkpoint hash is valid")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn networks_have_distinct_infrastructure_addresses() {
        let main = ConsensusParams::mainnet();
        let test = ConsensusParams::testnet();
        let reg = ConsensusParams::regtest();
        assert_ne!(main.infrastructure_address, test.infrastructure_address);
        assert_ne!(test.infrastructure_address, reg.infrastructure_address);
        assert_ne!(main.trusted_alert_address, main.infrastructure_address);
    }

    #[test]
    fn for_network_selects_matching_params() {
        assert_eq!(ConsensusParams::for_network(Network::Main).network, Network::Main);
        assert_eq!(ConsensusParams::for_network(Network::Test).network, Network::Test);
        assert_eq!(ConsensusParams::for_network(Network::Reg).network, Network::Reg);
    }

    #[test]
    fn restriction_table_covers_every_introduced_type() {
        let rows = ConsensusParams::mainnet().restrictions();
        for tx_type in [
            TX_SIMPLE_SEND,
            TX_DISTRIBUTION,
            TX_SEND_ALL,
            TX_TRADE_OFFER,
            TX_ACCEPT_OFFER,
            TX_ISSUE_FIXED,
            TX_ISSUE_CROWDSALE,
            TX_CLOSE_CROWDSALE,
            TX_ISSUE_MANAGED,
            TX_GRANT,
            TX_REVOKE,
            TX_CHANGE_ISSUER,
            TX_ENABLE_FREEZING,
            TX_DISABLE_FREEZING,
            TX_FREEZE,
            TX_UNFREEZE,
            TX_ANY_DATA,
            TX_DEACTIVATION,
            TX_ACTIVATION,
            TX_ALERT,
        ] {
            assert!(
                rows.iter().any(|r| r.tx_type == tx_type),
                "no restriction row for type {tx_type}"
            );
        }
    }

    #[test]
    fn wildcard_only_where_the_base_asset_is_legal() {
        let rows = ConsensusParams::mainnet().restrictions();
        let wildcard: Vec<u16> = rows
            .iter()
            .filter(|r| r.allow_wildcard)
            .map(|r| r.tx_type)
            .collect();
        assert_eq!(
            wildcard,
            vec![TX_ACCEPT_OFFER, TX_ANY_DATA, TX_DEACTIVATION, TX_ACTIVATION, TX_ALERT]
        );
    }

    #[test]
    fn checkpoints_mainnet_only() {
        assert!(!ConsensusParams::mainnet().checkpoints().is_empty());
        assert!(ConsensusParams::testnet().checkpoints().is_empty());
        assert!(ConsensusParams::regtest().checkpoints().is_empty());
        assert!(ConsensusParams::testnet().transaction_checkpoints().is_empty());
    }

    #[test]
    fn checkpoint_heights_strictly_increase() {
        let cps = ConsensusParams::mainnet().checkpoints();
        for pair in cps.windows(2) {
            assert!(pair[0].height < pair[1].height);
        }
    }

    #[test]
    fn mainnet_feature_heights_after_genesis() {
        let p = ConsensusParams::mainnet();
        for height in [
            p.send_block,
            p.dex_block,
            p.issuance_block,
            p.managed_issuance_block,
            p.distribution_block,
            p.send_all_block,
            p.any_data_block,
        ] {
            assert!(height >= p.genesis_block);
        }
    }

    #[test]
    fn activation_window_is_ordered() {
        for params in [
            ConsensusParams::mainnet(),
            ConsensusParams::testnet(),
            ConsensusParams::regtest(),
        ] {
            assert!(params.min_activation_blocks <= params.max_activation_blocks);
        }
    }

    #[test]
    fn network_name_parsing() {
        assert_eq!("main".parse::<Network>().unwrap(), Network::Main);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Main);
        assert_eq!("regtest".parse::<Network>().unwrap(), Network::Reg);
        assert!("betanet".parse::<Network>().is_err());
    }
}
