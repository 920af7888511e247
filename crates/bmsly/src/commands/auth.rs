//! Auth command handlers: login, logout, whoami.

use std::io::IsTerminal;

use secrecy::SecretString;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, ApiContext};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn login(ctx: &ApiContext, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Username: flag -> profile -> interactive prompt
    let username = match args.username.or_else(|| ctx.profile.username.clone()) {
        Some(name) => name,
        None => {
            if !std::io::stdin().is_terminal() {
                return Err(CliError::Validation {
                    field: "username".into(),
                    reason: "no username given; pass --username or set one on the profile".into(),
                });
            }
            dialoguer::Input::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(util::prompt_err)?
        }
    };

    // Password: env -> keyring -> config -> interactive prompt
    let password = match config::resolve_password(&ctx.profile, &ctx.profile_name) {
        Ok(secret) => secret,
        Err(bmsly_config::ConfigError::NoCredentials { profile }) => {
            if !std::io::stdin().is_terminal() {
                return Err(CliError::NoCredentials { profile });
            }
            let pw = rpassword::prompt_password("Password: ").map_err(util::prompt_err)?;
            if pw.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            SecretString::from(pw)
        }
        Err(err) => return Err(err.into()),
    };

    ctx.client
        .login(&username, &password)
        .await
        .map_err(|e| ctx.map_err(e))?;

    if let Some(ref app) = args.app {
        ctx.client.select_app(app);
    }

    if !global.quiet {
        use owo_colors::OwoColorize;
        if output::should_color(&global.color) {
            eprintln!(
                "{} Logged in as '{username}' (profile '{}')",
                "✓".green(),
                ctx.profile_name
            );
        } else {
            eprintln!("Logged in as '{username}' (profile '{}')", ctx.profile_name);
        }
    }
    Ok(())
}

pub async fn logout(ctx: &ApiContext, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm("End the session and clear stored tokens?", global.yes)? {
        return Ok(());
    }

    ctx.client.logout().await.map_err(|e| ctx.map_err(e))?;

    if !global.quiet {
        eprintln!("Session cleared for profile '{}'", ctx.profile_name);
    }
    Ok(())
}

pub async fn whoami(ctx: &ApiContext, global: &GlobalOpts) -> Result<(), CliError> {
    let profile = ctx.client.user_profile().await.map_err(|e| ctx.map_err(e))?;

    let out = output::render_single(
        &global.output,
        &profile,
        |p| {
            let mut lines = vec![format!("Username: {}", p.username)];
            if let Some(id) = p.id {
                lines.push(format!("Id:       {id}"));
            }
            if let Some(ref email) = p.email {
                lines.push(format!("Email:    {email}"));
            }
            lines.join("\n")
        },
        |p| p.username.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
