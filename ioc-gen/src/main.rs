/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use ioc_gen::config::IocConfig;
use ioc_gen::ioc::IocBuilder;
use ioc_gen::record::RecordType;

// ── CLI argument definition ───────────────────────────────────────────────────

/// StreamDevice IOC record generator.
///
/// Example:
///   ioc-gen --config demos/teststream.yaml --simulation > teststream.db
#[derive(Debug, Parser)]
#[command(
    name = "ioc-gen",
    about = "StreamDevice IOC record generator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML IOC description.
    #[arg(short = 'c', long = "config", required_unless_present = "list_record_types")]
    config: Option<PathBuf>,

    /// Point the asyn port at the simulated device instead of the real one.
    #[arg(short = 's', long = "simulation", default_value_t = false)]
    simulation: bool,

    /// Print the supported record types and exit.
    #[arg(long = "list-record-types", default_value_t = false)]
    list_record_types: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging on stderr; stdout carries the database.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_record_types {
        for t in RecordType::ALL {
            println!("{}\t{}", t.key(), t.link_field());
        }
        return;
    }

    info!(
        config     = ?cli.config,
        simulation = cli.simulation,
        "Configuration"
    );

    // ── Load IOC description ──────────────────────────────────────────────────
    let Some(path) = cli.config else {
        error!("No IOC description provided");
        process::exit(1);
    };

    let config = match IocConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load IOC description: {:#}", e);
            process::exit(1);
        }
    };

    // ── Build and print ───────────────────────────────────────────────────────
    match IocBuilder::new(&config).simulation(cli.simulation).build() {
        Ok(ioc) => {
            info!(
                ioc          = %ioc.name(),
                records      = ioc.database().len(),
                port_address = %ioc.port_address(),
                "Generated record database"
            );
            print!("{}", ioc.render_database());
        }
        Err(e) => {
            error!("Failed to build IOC '{}': {}", config.name, e);
            process::exit(1);
        }
    }
}
