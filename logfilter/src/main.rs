// logfilter/src/main.rs
//! logfilter entry point.

use anyhow::Result;
use clap::Parser;

use logfilter::cli::Cli;
use logfilter::commands;
use logfilter::logger;
use logfilter::ui::output_format::error_msg;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));

    if let Err(e) = commands::run(cli).await {
        error_msg(format!("Error: {:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
