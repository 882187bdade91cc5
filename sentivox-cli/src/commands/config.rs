//! Config command - view and change settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use sentivox_core::config::Config;

use super::get_app_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point the CLI at another Sentivox server
    SetApiUrl {
        /// Base URL, e.g. https://sentivox.example.com
        url: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let app_dir = get_app_dir();
    let mut config = Config::load(&app_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "apiUrl": config.api_url(),
                        "allowedEmailDomains": config.email_policy().allowed(),
                        "requestTimeoutSecs": config.request_timeout_secs,
                        "resetRedirectDelayMs": config.reset_redirect_delay_ms,
                        "directory": app_dir.to_string_lossy(),
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Sentivox Settings".bold());
            let mut table = output::create_table();
            table.add_row(vec!["API URL".to_string(), config.api_url()]);
            table.add_row(vec![
                "Allowed email domains".to_string(),
                config.email_policy().allowed().join(", "),
            ]);
            table.add_row(vec![
                "Request timeout".to_string(),
                format!("{} s", config.request_timeout_secs),
            ]);
            table.add_row(vec![
                "Reset redirect delay".to_string(),
                format!("{} ms", config.reset_redirect_delay_ms),
            ]);
            table.add_row(vec![
                "Directory".to_string(),
                app_dir.display().to_string(),
            ]);
            println!("{}", table);
        }
        ConfigCommands::SetApiUrl { url } => {
            let url = url.trim().trim_end_matches('/').to_string();
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid URL {}: {}", url, e))?;
            config.set_api_url(url.clone());
            config.save(&app_dir)?;
            output::success(&format!("API URL set to {}", url));
            if config.api_url() != url {
                output::warning("SENTIVOX_API_URL is set and overrides this setting.");
            }
        }
    }

    Ok(())
}
