mod cli;
mod handlers;

use clap::Parser;
use miio_core::Client;

use crate::cli::{Cli, Command};
use crate::handlers::{handle_power, handle_raw, handle_status, handle_version, require_token};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    if let Command::Version = cli.command {
        handle_version();
        return;
    }

    let token = require_token(cli.token.as_deref());
    let client = Client::new(cli.config());

    match cli.command {
        Command::On { host } => handle_power(&client, &host, &token, true).await,
        Command::Off { host } => handle_power(&client, &host, &token, false).await,
        Command::Status { hosts } => handle_status(&client, &hosts, &token).await,
        Command::Raw {
            host,
            method,
            params,
        } => handle_raw(&client, &host, &token, &method, params.as_deref()).await,
        Command::Version => handle_version(),
    }
}
