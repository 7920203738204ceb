mod cli;
pub(crate) mod config;
mod error;
pub(crate) mod git;
pub(crate) mod io_utils;
mod logging;
pub(crate) mod output;
pub(crate) mod serde_helpers;
pub(crate) mod time_utils;

pub(crate) use error::AppResult;

use clap::Parser;
use std::process::exit;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = cli::Cli::parse();
    logging::setup_logger(cli.verbosity.tracing_level_filter());

    match cli.run().await {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}
