//! Output formatting utilities

use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Render a summary either as pre-formatted text lines or as pretty JSON
pub fn print_summary<T: Serialize>(data: &T, text: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Text => println!("{text}"),
    }
}
