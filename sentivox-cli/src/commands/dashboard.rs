//! Dashboard command - the protected surface

use anyhow::Result;
use colored::Colorize;
use sentivox_core::services::GuardView;
use sentivox_core::{Identity, Route};

use super::{get_context, log_command};
use crate::output;

fn render(identity: &Identity) {
    println!("{}", "Sentivox Dashboard".bold());
    println!();
    println!("Welcome, {}", identity.display_name().cyan());
    if let Some(role) = identity.role {
        println!("Role: {}", role.as_str());
    }
    if identity.is_admin() {
        println!("{}", "Administration tools are available.".dimmed());
    }
}

pub async fn run() -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "dashboard");

    let mut guard = ctx.route_guard();
    let outcome = ctx.session.bootstrap().await;

    let spinner = output::spinner("Loading session...");
    guard.resolved().await;
    spinner.finish_and_clear();

    let mut shown = false;
    if let GuardView::Content(()) = guard.render(render) {
        shown = true;
    }

    // The server may still withdraw a cached session
    outcome.settled().await;
    if guard.has_changed() {
        match guard.render(render) {
            GuardView::Hidden if shown => {
                println!();
                output::warning("Your session has ended.");
            }
            GuardView::Content(()) => shown = true,
            _ => {}
        }
    }

    if ctx.navigator.current() == Some(Route::Login) {
        if !shown {
            output::warning("You are not signed in.");
        }
        output::info("Run `svx login` to sign in.");
    }
    Ok(())
}
