//! CareLog CLI - Command-line interface for CareLog
//!
//! Provides commands for:
//! - Account lifecycle (signup, login, logout)
//! - Manual synchronization
//! - Viewing session and sync status

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    login::LoginCommand, logout::LogoutCommand, member::MemberCommand, signup::SignupCommand,
    status::StatusCommand, sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "carelog", version, about = "Family health records with cloud sync")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and establish a session
    Signup(SignupCommand),
    /// Log in to an existing account
    Login(LoginCommand),
    /// Log out and clear local state
    Logout(LogoutCommand),
    /// Synchronize with the remote record now
    Sync(SyncCommand),
    /// Manage household members
    Member(MemberCommand),
    /// Show session and sync status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
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

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Signup(cmd) => cmd.execute(format).await,
        Commands::Login(cmd) => cmd.execute(format).await,
        Commands::Logout(cmd) => cmd.execute(format).await,
        Commands::Sync(cmd) => cmd.execute(format).await,
        Commands::Member(cmd) => cmd.execute(format).await,
        Commands::Status(cmd) => cmd.execute(format).await,
    }
}
