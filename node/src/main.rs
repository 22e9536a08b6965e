// Copyright (c) 2026 Lamina Labs. MIT License.
// See LICENSE for details.

//! # Lamina Inspection Harness
//!
//! Entry point for the `lamina-node` binary. Parses CLI arguments,
//! initializes logging, and drives the protocol decision engine over JSON
//! transaction views.
//!
//! The binary supports four subcommands:
//!
//! - `inspect`     — decode transaction views and report verdicts
//! - `params`      — dump the active consensus parameters
//! - `alert-check` — evaluate alert source authorization
//! - `version`     — print build version information

mod cli;
mod logging;

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use lamina_protocol::alerts::AlertAuthorizer;
use lamina_protocol::consensus::{ConsensusParams, ConsensusRegistry, Network};
use lamina_protocol::ledger::{Hash256, TransactionView};
use lamina_protocol::validate::{validate_transaction, DecodedTransaction};
use lamina_protocol::version::client_version_string;

use cli::{AlertCheckArgs, Commands, InspectArgs, LaminaCli, ParamsArgs};
use logging::LogFormat;

/// Per-transaction verdict emitted by `inspect`.
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
enum Verdict {
    Accepted {
        #[serde(flatten)]
        decoded: DecodedTransaction,
    },
    Rejected {
        txid: Hash256,
        reason: String,
    },
}

fn main() -> Result<()> {
    let args = LaminaCli::parse();
    logging::init_logging("info", LogFormat::from_str_lossy(&args.log_format));

    match args.command {
        Commands::Inspect(inspect) => run_inspect(inspect),
        Commands::Params(params) => run_params(params),
        Commands::AlertCheck(check) => run_alert_check(check),
        Commands::Version => {
            println!("lamina-node {}", client_version_string());
            Ok(())
        }
    }
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let network: Network = args.network.parse()?;
    let raw = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading transaction views from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading transaction views from stdin")?;
            buf
        }
    };

    let views: Vec<TransactionView> =
        serde_json::from_str(&raw).context("parsing transaction views")?;
    info!(network = %network, height = args.height, count = views.len(), "inspecting transactions");

    // Shared the way a real node shares it: the write side belongs to the
    // sequential block-connection path, which an offline inspection never
    // exercises — every verdict below reads one consistent snapshot.
    let registry = RwLock::new(ConsensusRegistry::new(network));

    let verdicts: Vec<Verdict> = {
        let registry = registry.read();
        views
            .iter()
            .map(|view| match validate_transaction(&registry, view, args.height) {
                Ok(decoded) => Verdict::Accepted { decoded },
                Err(rejection) => Verdict::Rejected {
                    txid: view.txid,
                    reason: rejection.to_string(),
                },
            })
            .collect()
    };

    println!("{}", serde_json::to_string_pretty(&verdicts)?);
    Ok(())
}

fn run_params(args: ParamsArgs) -> Result<()> {
    let network: Network = args.network.parse()?;
    let params = ConsensusParams::for_network(network);
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn run_alert_check(args: AlertCheckArgs) -> Result<()> {
    let network: Network = args.network.parse()?;
    let params = ConsensusParams::for_network(network);

    let mut authorizer = AlertAuthorizer::new(&params);
    for source in &args.allow {
        authorizer.allow_source(source.as_str());
    }
    for source in &args.ignore {
        authorizer.ignore_source(source.as_str());
    }

    let authorized = authorizer.is_authorized(&args.source);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "network": network.to_string(),
            "source": args.source,
            "authorized": authorized,
        }))?
    );
    Ok(())
}
