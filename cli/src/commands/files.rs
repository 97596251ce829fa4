use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use freeshare_core::UploadOptions;

use super::helpers::{format_timestamp, open_app};
use super::Context;
use crate::output::{print_field, print_json, print_success};

#[derive(Args)]
pub struct UploadArgs {
    /// Document to upload (.pdf, .doc, .docx, .xls, .xlsx)
    pub file: PathBuf,
    /// Encrypt the file server-side with this password
    #[arg(long)]
    pub password: Option<String>,
    /// Require a one-time code at download time
    #[arg(long = "require-2fa")]
    pub require_2fa: bool,
}

pub async fn upload(args: UploadArgs, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;

    let options = UploadOptions {
        encrypt: args.password.is_some(),
        password: args.password,
        requires_2fa: args.require_2fa,
    };
    let response = app.upload(&args.file, options).await?;

    if ctx.json_output {
        print_json(&response)?;
    } else {
        print_success(format!("Uploaded {}", args.file.display()));
        print_field("Link", app.share_url(&response.shared_link));
        print_field("Expires", format_timestamp(response.expiration_date));
        if !app.session().is_registered() {
            print_field("Note", "guest uploads are deleted after the first download");
        }
    }

    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    let files = app.my_files().await?;

    if ctx.json_output {
        return print_json(&files);
    }

    if files.is_empty() {
        println!("No files");
        return Ok(());
    }

    for file in &files {
        let mut flags = Vec::new();
        if file.encrypted {
            flags.push("encrypted");
        }
        if file.requires_password {
            flags.push("password");
        }
        if file.requires_2fa {
            flags.push("2fa");
        }

        println!("{}  {}", file.file_id, file.display_name());
        print_field("Link", app.share_url(&file.shared_link));
        print_field("Uploaded", format_timestamp(file.upload_date));
        print_field("Expires", format_timestamp(file.expiration_date));
        if !flags.is_empty() {
            print_field("Protection", flags.join(", "));
        }
    }

    Ok(())
}

pub async fn delete(file_id: String, ctx: &Context) -> Result<()> {
    let app = open_app(ctx)?;
    app.delete_file(&file_id).await?;

    if ctx.json_output {
        print_json(&serde_json::json!({ "deleted": file_id }))?;
    } else {
        print_success(format!("Deleted {file_id}"));
    }

    Ok(())
}
