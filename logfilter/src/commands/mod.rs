//! Command implementations and dispatch.

pub mod config;
pub mod filter;

use anyhow::{Context, Result};
use logfilter_core::{ConfigGateway, FileConfigGateway};

use crate::cli::{Cli, Commands, ConfigCommand};
use filter::FilterOptions;

fn open_gateway(cli: &Cli) -> Result<FileConfigGateway> {
    match &cli.store {
        Some(path) => Ok(FileConfigGateway::new(path)),
        None => FileConfigGateway::at_default_location()
            .context("Could not determine where the configuration is stored; pass --store"),
    }
}

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let gateway = open_gateway(&cli)?;
    let store = gateway.path().display().to_string();
    let quiet = cli.quiet;
    let boxed: Box<dyn ConfigGateway> = Box::new(gateway);

    match cli.command {
        Commands::Filter(cmd) => filter::run_filter(FilterOptions::from_command(cmd, quiet), boxed).await,
        Commands::Config(ConfigCommand::Show { json }) => config::run_show(boxed.as_ref(), &store, json),
        Commands::Config(ConfigCommand::Set { form }) => config::run_set(boxed, &form, quiet),
        Commands::Config(ConfigCommand::Defaults) => config::run_defaults(),
    }
}
