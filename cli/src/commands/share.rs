use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::time::Duration;

use freeshare_core::{AuthStep, DownloadAuthenticator, DownloadOutcome, SavedFile, ShareMetadata};

use super::helpers::{format_timestamp, open_app, prompt};
use super::Context;
use crate::output::{print_error, print_field, print_json, print_success};

/// How long to wait for guest cleanup before exiting
const CLEANUP_GRACE: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct GetArgs {
    /// Share link token
    pub link: String,
    /// Password for protected or encrypted files
    #[arg(long)]
    pub password: Option<String>,
    /// Two-factor code
    #[arg(long)]
    pub code: Option<String>,
    /// Fail instead of asking for missing credentials
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(Serialize)]
struct Downloaded<'a> {
    filename: &'a str,
    #[serde(flatten)]
    saved: &'a SavedFile,
}

pub async fn inspect(link: String, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let metadata = app.resolver().resolve(&link).await?;

    if ctx.json_output {
        return print_json(&metadata);
    }

    print_metadata(&metadata);
    Ok(())
}

pub async fn get(args: GetArgs, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let auth = app.open_share(&args.link).await?;

    if !ctx.json_output {
        print_metadata(auth.metadata());
    }

    if let Some(password) = args.password {
        auth.set_password(password);
    }
    if let Some(code) = args.code {
        auth.set_two_factor_code(code);
    }

    let (bytes, filename) = loop {
        match auth.attempt_download().await? {
            DownloadOutcome::Success { bytes, filename } => break (bytes, filename),
            DownloadOutcome::NeedsStep(step) => {
                if let Some(message) = auth.challenge().last_error() {
                    print_error(message);
                }
                if args.no_prompt {
                    anyhow::bail!("Missing credentials: {}", step_label(&auth, step));
                }
                ask(&auth, step)?;
            }
            DownloadOutcome::Fatal { message, .. } => anyhow::bail!(message),
        }
    };

    let saved = app.save_download(&filename, &bytes).await?;

    if ctx.json_output {
        print_json(&Downloaded {
            filename: &filename,
            saved: &saved,
        })?;
    } else {
        print_success(format!("Saved {}", saved.path.display()));
        print_field("SHA-256", &saved.sha256);
    }

    // Returning from main shuts the runtime down and would cancel it
    auth.finish_cleanup(CLEANUP_GRACE).await;

    Ok(())
}

pub fn url(link: String, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let url = app.share_url(link.trim());

    if ctx.json_output {
        print_json(&serde_json::json!({ "url": url }))
    } else {
        println!("{url}");
        Ok(())
    }
}

fn ask(auth: &DownloadAuthenticator, step: AuthStep) -> Result<()> {
    let label = step_label(auth, step);
    match step {
        AuthStep::AwaitingPassword => {
            auth.set_password(prompt(&label)?);
        }
        AuthStep::AwaitingTwoFactor => {
            auth.set_two_factor_code(prompt(&label)?);
        }
        AuthStep::Ready => {}
    }
    Ok(())
}

fn step_label(auth: &DownloadAuthenticator, step: AuthStep) -> String {
    let challenge = auth.challenge();
    let total = [challenge.requires_password(), challenge.requires_2fa()]
        .iter()
        .filter(|required| **required)
        .count();
    let what = match step {
        AuthStep::AwaitingPassword => "Password",
        AuthStep::AwaitingTwoFactor => "2FA code",
        AuthStep::Ready => "Ready",
    };

    if total > 1 {
        format!(
            "{} (step {} of {})",
            what,
            step.ordinal(challenge.requires_password()),
            total
        )
    } else {
        what.to_string()
    }
}

fn print_metadata(metadata: &ShareMetadata) {
    println!("{}", metadata.filename);
    if let Some(size) = metadata.display_size() {
        print_field("Size", size);
    }
    print_field("Expires", format_timestamp(metadata.expiration_date));

    let mut needs = Vec::new();
    if metadata.requires_password_step() {
        needs.push("password");
    }
    if metadata.requires_2fa {
        needs.push("2FA code");
    }
    if !needs.is_empty() {
        print_field("Requires", needs.join(" + "));
    }
    if metadata.is_guest_owned() {
        print_field("Note", "this file is deleted after it is downloaded");
    }
}
