//! Reset-password command - set a new password from a recovery link

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Password};
use sentivox_core::domain::MIN_PASSWORD_LENGTH;
use sentivox_core::{PasswordForm, TokenVerification};

use super::{get_context, log_command};
use crate::output;

fn checklist_line(met: bool, text: &str) -> String {
    if met {
        format!("  {} {}", "✓".green(), text)
    } else {
        format!("  {} {}", "✗".red(), text.dimmed())
    }
}

fn prompt_form() -> Result<PasswordForm> {
    let password = Password::new()
        .with_prompt("New password")
        .allow_empty_password(true)
        .interact()?;
    let confirm = Password::new()
        .with_prompt("Confirm new password")
        .allow_empty_password(true)
        .interact()?;
    Ok(PasswordForm::new(password, confirm))
}

pub async fn run(link: &str) -> Result<()> {
    let ctx = get_context()?;
    log_command(&ctx, "reset_password");

    let mut reset = ctx.password_reset(link);

    let spinner = output::spinner("Verifying reset link...");
    let verification = reset.verify().await;
    spinner.finish_and_clear();

    if verification != TokenVerification::Valid {
        output::error("Invalid or expired link");
        println!("This password reset link is invalid or has expired.");
        reset.request_new_link();
        output::info("Run `svx forgot-password` to request a new link.");
        anyhow::bail!("Password was not reset");
    }

    loop {
        let form = prompt_form()?;
        let requirements = form.requirements();
        println!(
            "{}",
            checklist_line(
                requirements.long_enough,
                &format!("At least {} characters", MIN_PASSWORD_LENGTH)
            )
        );
        println!("{}", checklist_line(requirements.matches, "Passwords match"));

        if !reset.can_submit(&form) {
            if let Err(e) = form.check() {
                output::error(&e.to_string());
            }
            continue;
        }

        let spinner = output::spinner("Resetting password...");
        let result = reset.submit(&form).await;
        spinner.finish_and_clear();

        match result {
            Ok(accepted) => {
                output::success("Password reset successful");
                println!("Your password has been reset. Redirecting to login...");
                accepted.redirected().await;
                output::info("Run `svx login` to sign in with your new password.");
                return Ok(());
            }
            Err(e) => {
                output::error(&e.user_message());
                if !Confirm::new()
                    .with_prompt("Try again?")
                    .default(true)
                    .interact()?
                {
                    anyhow::bail!("Password was not reset");
                }
            }
        }
    }
}
