//! Sentivox CLI - dashboard sign-in from the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, dashboard, forgot_password, login, logout, logs, reset_password, status};

/// Sentivox - sign in to the interview-analysis dashboard
#[derive(Parser)]
#[command(name = "svx", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the dashboard
    Login {
        /// Account email (prompted if omitted)
        #[arg(long, short)]
        email: Option<String>,
        /// Password (prompted if omitted; leave empty for the default credential)
        #[arg(long, short)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out
    Logout,

    /// Show the current session
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open the dashboard (requires a session)
    Dashboard,

    /// Request a password reset link
    ForgotPassword {
        /// Account email (prompted if omitted)
        email: Option<String>,
    },

    /// Set a new password from a reset link
    ResetPassword {
        /// The reset link from the email, or its query string
        link: String,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => login::run(email, password, json).await,
        Commands::Logout => logout::run().await,
        Commands::Status { json } => status::run(json).await,
        Commands::Dashboard => dashboard::run().await,
        Commands::ForgotPassword { email } => forgot_password::run(email).await,
        Commands::ResetPassword { link } => reset_password::run(&link).await,
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
