#![deny(unsafe_code)]

mod auth;
mod commands;
mod config;
mod exit_code;
mod output;
mod vault;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use safehold_core::StoreError;
use safehold_core::storage::SiteError;

use crate::auth::{PasswordOptions, get_password};
use crate::commands::{init, item, site, sync};
use crate::config::Config;
use crate::vault::{Vault, VaultError};

/// Secrets vault replicated across storage sites
#[derive(Parser)]
#[command(name = "safehold")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Create a site list and keep the vault in two files
    safehold init
    safehold site add-fs laptop ~/vault.bin
    safehold site add-fs usb /media/usb/vault.bin

    # Add an item (pipe the master password from a secret manager)
    echo \"$SECRET\" | safehold --password-stdin item add mail --field user=me --field password=hunter2

    # Reconcile every site's copy
    safehold sync
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: ~/.config/safehold/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Encrypted site list to use instead of the configured one
    #[arg(long, value_name = "FILE", env = "SAFEHOLD_SITES_FILE", global = true)]
    sites_file: Option<PathBuf>,

    /// Master password (insecure, prefer --password-stdin or SAFEHOLD_PASSWORD)
    #[arg(long, env = "SAFEHOLD_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Read the master password from stdin (single line)
    #[arg(long, conflicts_with = "password", global = true)]
    password_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

impl From<&Cli> for PasswordOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            password: cli.password.clone(),
            password_stdin: cli.password_stdin,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty site list
    Init(init::Args),

    /// Manage storage sites
    #[command(subcommand)]
    Site(site::Command),

    /// Read and add vault items
    #[command(subcommand)]
    Item(item::Command),

    /// Load every site's copy, reconcile, and write the result back
    Sync(sync::Args),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests also arrive here, on stdout.
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_code::USAGE_ERROR
            } else {
                exit_code::SUCCESS
            };
            return ExitCode::from(code);
        }
    };
    let quiet = cli.quiet;

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            if !quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    setup_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let sites_file = config.sites_file(cli.sites_file.as_deref())?;
    let password = PasswordOptions::from(&cli);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init(args) => init::execute(&config, &sites_file, &password, args),
        Commands::Site(command) => {
            let mut vault = Vault::open(&config, &sites_file, &get_password(&password)?)?;
            site::execute(&mut vault, command)
        }
        Commands::Item(command) => {
            let vault = Vault::open(&config, &sites_file, &get_password(&password)?)?;
            runtime()?.block_on(item::execute(&vault, command))
        }
        Commands::Sync(args) => {
            let vault = Vault::open(&config, &sites_file, &get_password(&password)?)?;
            runtime()?.block_on(sync::execute(&vault, args, quiet))
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(store_err) = cause.downcast_ref::<StoreError>()
            && matches!(
                store_err,
                StoreError::InvalidAuthentication | StoreError::NotAuthenticated
            )
        {
            return exit_code::AUTH_FAILED;
        }

        if let Some(vault_err) = cause.downcast_ref::<VaultError>() {
            return match vault_err {
                VaultError::NotInitialized(_)
                | VaultError::SiteNotFound(_)
                | VaultError::ItemNotFound(_) => exit_code::NOT_FOUND,
                VaultError::SitesFailed { .. }
                | VaultError::SitesUnreadable { .. }
                | VaultError::NoSites => exit_code::SITE_FAILED,
                VaultError::AlreadyInitialized(_) | VaultError::ItemExists(_) => exit_code::GENERAL_ERROR,
            };
        }

        if cause.downcast_ref::<SiteError>().is_some() {
            return exit_code::SITE_FAILED;
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::NotFound
        {
            return exit_code::NOT_FOUND;
        }
    }

    exit_code::GENERAL_ERROR
}
