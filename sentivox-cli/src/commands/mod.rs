//! CLI command implementations

pub mod config;
pub mod dashboard;
pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod logs;
pub mod reset_password;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use sentivox_core::services::{EntryPoint, LogEvent};
use sentivox_core::SentivoxContext;

/// Get the sentivox directory from environment or default
pub fn get_app_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SENTIVOX_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sentivox")
    }
}

/// Get or create the sentivox context
pub fn get_context() -> Result<SentivoxContext> {
    let app_dir = get_app_dir();

    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create sentivox directory: {:?}", app_dir))?;

    SentivoxContext::new(&app_dir, EntryPoint::Cli)
        .context("Failed to initialize sentivox context")
}

/// Record which command ran (logging should never break the app)
pub fn log_command(ctx: &SentivoxContext, command: &str) {
    ctx.events
        .record(LogEvent::new("command_executed").with_command(command));
}
