#![allow(clippy::enum_variant_names)]

mod application;
mod cli;
mod config;
mod filesystem;
mod shell;
mod snapshot;

use clap::Parser as _;

use crate::application::{Application, ApplicationError, install_logging};
use crate::cli::Cli;

#[compio::main]
#[snafu::report]
async fn main() -> Result<(), ApplicationError> {
    let cli = Cli::parse();
    install_logging(cli.log_level)?;
    tracing::debug!(?cli, "Starting treeshell");

    Application::run(cli).await
}
