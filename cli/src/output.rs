// Output formatting helpers

use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

pub fn print_success(message: impl Display) {
    println!("✓ {message}");
}

pub fn print_error(message: impl Display) {
    eprintln!("✗ {message}");
}

pub fn print_field(label: &str, value: impl Display) {
    println!("  {label}: {value}");
}
