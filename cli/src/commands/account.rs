use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::helpers::{open_app, prompt};
use super::Context;
use crate::output::{print_field, print_json, print_success};

#[derive(Args)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Password (asked for when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Serialize)]
struct SessionSummary<'a> {
    registered: bool,
    email: Option<&'a str>,
}

pub async fn login(creds: Credentials, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let password = match creds.password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    let session = app.login(&creds.email, &password).await?;
    report(ctx, "Signed in", session.email())
}

pub async fn register(creds: Credentials, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let password = match creds.password {
        Some(password) => password,
        None => prompt("Password")?,
    };

    let session = app.register(&creds.email, &password).await?;
    report(ctx, "Registered", session.email())
}

pub fn logout(ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    app.logout()?;

    if ctx.json_output {
        print_json(&SessionSummary {
            registered: false,
            email: None,
        })
    } else {
        print_success("Signed out");
        Ok(())
    }
}

pub fn whoami(ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let session = app.session();

    if ctx.json_output {
        return print_json(&SessionSummary {
            registered: session.is_registered(),
            email: session.email(),
        });
    }

    match session.email().filter(|_| session.is_registered()) {
        Some(email) => println!("{email}"),
        None => println!("guest"),
    }
    Ok(())
}

fn report(ctx: &Context, action: &str, email: Option<&str>) -> Result<()> {
    if ctx.json_output {
        print_json(&SessionSummary {
            registered: true,
            email,
        })
    } else {
        print_success(action);
        if let Some(email) = email {
            print_field("Email", email);
        }
        Ok(())
    }
}
