//! Admin CLI for outlook-mcp - login/logout/status against the token
//! store and Azure AD, and token-store maintenance.
//!
//! Grounded on `lnxdrive-cli`'s `main.rs` shape (global `--json`/`--verbose`
//! flags, `tracing-subscriber` init from verbosity, dispatch to
//! per-subcommand `execute`). The teacher's `sync`/`explain`/`audit`/
//! `daemon`/`config`/`conflicts`/`completions`/`mount`/`hydrate`/`pin`/
//! `report` subcommands have no counterpart here: this service has no
//! local sync engine, FUSE mount, conflict resolver, or audit log to
//! drive from a CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod env_config;
mod output;

use commands::auth::AuthCommand;
use commands::tokens::TokensCommand;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "outlook-mcp-cli", version, about = "Admin CLI for the Outlook MCP service")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Token-store maintenance commands
    #[command(subcommand)]
    Tokens(TokensCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Human };

    match cli.command {
        Commands::Auth(cmd) => cmd.execute(format).await,
        Commands::Tokens(cmd) => cmd.execute(format).await,
    }
}
