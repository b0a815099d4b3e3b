// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

//! # carootctl
//!
//! Command-line tool for managing the certificate authority material of a
//! Puppet installation. It resolves the effective settings from
//! `puppet.conf`, then imports externally produced CA material or
//! bootstraps a fresh CA at the resolved locations.

#![deny(
    nonstandard_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

mod commands;

use anyhow::{bail, Result};
use caroot::config::Config;
use clap::{Parser, Subcommand};
use log::{error, warn};
use std::path::PathBuf;
use std::process;

/// Manage certificate authority material for a Puppet installation
#[derive(Parser)]
#[command(
    name = "carootctl",
    version,
    about = "Manage certificate authority material for a Puppet installation",
    long_about = "carootctl resolves CA-relevant settings from puppet.conf \
                  (or built-in defaults) and uses them to decide where CA \
                  material lives on disk and what values generated \
                  certificates carry."
)]
struct Cli {
    /// Configuration file path [default: the conventional puppet.conf
    /// location]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Validate an existing CA bundle and stage it at the resolved paths
    Import {
        /// PEM file containing the CA certificate bundle
        #[arg(long, value_name = "FILE")]
        cert_bundle: PathBuf,

        /// PEM file containing the CA private key
        #[arg(long, value_name = "FILE")]
        private_key: PathBuf,

        /// PEM file containing the CRL chain
        #[arg(long, value_name = "FILE")]
        crl_chain: PathBuf,
    },
    /// Bootstrap a fresh CA at the resolved paths
    Setup,
    /// Print the resolved settings as JSON
    Print,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        process::exit(1);
    }
}

/// Loads the configuration and dispatches to the requested command.
///
/// Resolution errors are warnings for read-only commands; the commands
/// that write key material refuse to run with a non-empty error log, since
/// a misresolved path must never receive CA files.
fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    for err in &config.errors {
        warn!("{err}");
    }

    match &cli.command {
        Commands::Import {
            cert_bundle,
            private_key,
            crl_chain,
        } => {
            refuse_on_errors(&config)?;
            commands::import(&config, cert_bundle, private_key, crl_chain)
        }
        Commands::Setup => {
            refuse_on_errors(&config)?;
            commands::setup(&config)
        }
        Commands::Print => commands::print(&config),
    }
}

/// Fails when the settings resolution error log is non-empty.
fn refuse_on_errors(config: &Config) -> Result<()> {
    if config.errors.is_empty() {
        return Ok(());
    }
    bail!(
        "Refusing to write CA material: {} settings could not be resolved \
         (see warnings above)",
        config.errors.len()
    );
}

/// Initializes logging based on verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .target(pretty_env_logger::env_logger::Target::Stderr)
        .init();
}
