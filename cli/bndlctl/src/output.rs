//! Output formatting for CLI commands.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No bundles found.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", format_json(data, "[]")),
    }
}

/// Print a single item as pretty JSON; tables have no single-item form.
pub fn print_single<T: Serialize + ?Sized>(data: &T) {
    println!("{}", format_json(data, "{}"));
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| fallback.to_string())
}
