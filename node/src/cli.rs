//! # CLI Interface
//!
//! Defines the command-line argument structure for `lamina-node` using
//! `clap` derive. Supports four subcommands: `inspect`, `params`,
//! `alert-check`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lamina protocol inspection harness.
///
/// Runs base-layer transaction views through the Lamina decision engine and
/// reports what each one decodes to — the same verdicts a full node would
/// reach, without needing a chain attached.
#[derive(Parser, Debug)]
#[command(
    name = "lamina-node",
    about = "Lamina protocol inspection harness",
    version,
    propagate_version = true
)]
pub struct LaminaCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "LAMINA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `lamina-node` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode transaction views from a JSON file (or stdin) and report the
    /// verdict for each.
    Inspect(InspectArgs),
    /// Print the active consensus parameters as JSON.
    Params(ParamsArgs),
    /// Check whether a source address may publish alerts.
    AlertCheck(AlertCheckArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path to a JSON array of transaction views. Reads stdin when omitted.
    pub file: Option<PathBuf>,

    /// Network whose rules to evaluate under: main, test, or reg.
    #[arg(long, short = 'n', env = "LAMINA_NETWORK", default_value = "main")]
    pub network: String,

    /// Block height to evaluate the transactions at.
    #[arg(long, short = 'H')]
    pub height: u32,
}

/// Arguments for the `params` subcommand.
#[derive(Parser, Debug)]
pub struct ParamsArgs {
    /// Network to print parameters for: main, test, or reg.
    #[arg(long, short = 'n', env = "LAMINA_NETWORK", default_value = "main")]
    pub network: String,
}

/// Arguments for the `alert-check` subcommand.
#[derive(Parser, Debug)]
pub struct AlertCheckArgs {
    /// The source address to check.
    pub source: String,

    /// Network whose trusted source applies.
    #[arg(long, short = 'n', env = "LAMINA_NETWORK", default_value = "main")]
    pub network: String,

    /// Additional allowed sources (replaces the trusted default; the
    /// literal "any" accepts every source).
    #[arg(long = "allow-source")]
    pub allow: Vec<String>,

    /// Sources to deny regardless of the allow list.
    #[arg(long = "ignore-source")]
    pub ignore: Vec<String>,
}
