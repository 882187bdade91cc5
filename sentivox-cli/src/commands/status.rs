//! Status command - show the current session

use anyhow::Result;
use colored::Colorize;
use sentivox_core::SessionState;

use super::{get_context, log_command};
use crate::output;

fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Loading => "loading".dimmed().to_string(),
        SessionState::Authenticated(identity) => {
            format!("{} as {}", "signed in".green(), identity.display_name())
        }
        SessionState::Unauthenticated => "signed out".yellow().to_string(),
    }
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "status");

    let outcome = ctx.session.bootstrap().await;
    let optimistic = ctx.session.current();

    let spinner = output::spinner("Checking session with server...");
    let reconciling = outcome.is_reconciling();
    outcome.settled().await;
    spinner.finish_and_clear();
    let state = ctx.session.current();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": state.status(),
                "cached": reconciling,
                "cachedStatus": optimistic.status(),
                "user": state.identity(),
                "apiUrl": ctx.config.api_url(),
            }))?
        );
        return Ok(());
    }

    println!("{}", "Sentivox Session".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Server".to_string(), ctx.config.api_url()]);
    if reconciling {
        table.add_row(vec!["Cached".to_string(), describe(&optimistic)]);
    }
    table.add_row(vec!["Session".to_string(), describe(&state)]);

    if let Some(identity) = state.identity() {
        table.add_row(vec!["Email".to_string(), identity.email.clone()]);
        if let Some(role) = identity.role {
            table.add_row(vec!["Role".to_string(), role.as_str().to_string()]);
        }
    }
    println!("{}", table);

    if let Some(identity) = state.identity() {
        if identity.is_default_password {
            println!();
            output::warning("This account still uses the default password.");
        }
    }

    Ok(())
}
