// Common helper functions

use anyhow::{Context as AnyhowContext, Result};
use chrono::{DateTime, Utc};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use freeshare_core::{Config, FreeShare};

use super::Context;

/// Priority: flags > `FREESHARE_*` env (handled by clap for flags) > defaults
pub fn resolve_config(ctx: &Context) -> Config {
    let mut config = Config::from_env();

    if let Some(ref dir) = ctx.data_dir_override {
        config.database_path = PathBuf::from(dir).join("freeshare.db");
    }
    if let Some(ref server) = ctx.server_override {
        config.backend_url = server.clone();
    }

    config
}

pub fn open_app(ctx: &Context) -> Result<FreeShare> {
    let config = resolve_config(ctx);
    FreeShare::new(config).context("Failed to initialize FreeShare")
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Read one line from stdin after printing `label`
pub fn prompt(label: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        anyhow::bail!("No input for {}", label.to_lowercase());
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
