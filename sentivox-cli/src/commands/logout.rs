//! Logout command - end the session

use anyhow::Result;

use super::{get_context, log_command};
use crate::output;

pub async fn run() -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "logout");

    let notify = ctx.session.logout();
    output::success("Signed out.");

    // The process exits right after; give the server notification its chance
    let spinner = output::spinner("Notifying server...");
    let _ = notify.await;
    spinner.finish_and_clear();
    Ok(())
}
