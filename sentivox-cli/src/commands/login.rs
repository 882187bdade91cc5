//! Login command - sign in with email and password

use anyhow::Result;
use dialoguer::{Input, Password};
use sentivox_core::{Identity, OperationResult};

use super::{get_context, log_command};
use crate::output;

pub async fn run(email: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "login");

    let email = match email {
        Some(email) => email,
        None if json => anyhow::bail!("--email is required with --json"),
        None => Input::<String>::new()
            .with_prompt("Email")
            .allow_empty(true)
            .interact_text()?,
    };

    // An empty password selects the default-credential flow
    let password = match password {
        Some(password) => Some(password),
        None if json => None,
        None => Some(
            Password::new()
                .with_prompt("Password (leave empty for the default credential)")
                .allow_empty_password(true)
                .interact()?,
        ),
    };

    let spinner = output::spinner("Signing in...");
    let result = ctx.session.login(&email, password.as_deref()).await;
    spinner.finish_and_clear();

    if json {
        let result: OperationResult<Identity> = result.into();
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let identity = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    output::success(&format!("Signed in as {}", identity.display_name()));
    if identity.is_default_password {
        output::warning(
            "This account still uses the default password. \
             Run `svx forgot-password` to set your own.",
        );
    }
    Ok(())
}
