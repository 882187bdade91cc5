//! Forgot-password command - request a recovery link

use anyhow::Result;
use dialoguer::{Confirm, Input};

use super::{get_context, log_command};
use crate::output;

fn prompt_email() -> Result<String> {
    Ok(Input::<String>::new()
        .with_prompt("Email")
        .allow_empty(true)
        .interact_text()?)
}

pub async fn run(email: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "forgot_password");

    let mut flow = ctx.recovery_flow();
    let mut email = match email {
        Some(email) => email,
        None => prompt_email()?,
    };

    loop {
        let spinner = output::spinner("Sending reset link...");
        let result = flow.request(&email).await;
        spinner.finish_and_clear();

        match result {
            Ok(()) => break,
            Err(e) => {
                output::error(&e.user_message());
                let again = atty::is(atty::Stream::Stdin)
                    && Confirm::new()
                        .with_prompt("Try again?")
                        .default(true)
                        .interact()?;
                if !again {
                    anyhow::bail!("No reset link was sent");
                }
                if !e.is_retryable() {
                    email = prompt_email()?;
                }
            }
        }
    }

    if let Some(notice) = flow.dispatch_notice() {
        output::success("Check your email");
        println!("{}", notice);
    }
    println!();
    output::info("Open the link from the email with `svx reset-password <link>`.");
    Ok(())
}
