//! Output formatting for the CLI.
//!
//! Human output goes to stdout, diagnostics to stderr. In JSON mode only
//! [`Output::json`] and errors print anything.

use std::time::Duration;

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    fn line(&self, symbol: StyledObject<&str>, msg: &str) {
        if !self.json {
            println!("{} {}", symbol, msg);
        }
    }

    fn diag(&self, symbol: StyledObject<&str>, msg: String) {
        if !self.json {
            eprintln!("{} {}", symbol, msg);
        }
    }

    pub fn info(&self, msg: &str) {
        self.line(style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.line(style("✓").green(), msg);
    }

    pub fn list_item(&self, item: &str) {
        self.line(style("•").dim(), item);
    }

    pub fn warn(&self, msg: &str) {
        self.diag(style("⚠").yellow(), msg.to_string());
    }

    /// Shown only with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.diag(style("→").dim(), style(msg).dim().to_string());
        }
    }

    /// Errors print in both modes; JSON mode emits `{"error": ...}`.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.json {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    pub fn raw(&self, text: &str) {
        if !self.json {
            println!("{}", text);
        }
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Progress bar over `len` renders; hidden in JSON mode.
    pub fn progress(&self, len: u64, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let bar_style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        ProgressBar::new(len)
            .with_style(bar_style)
            .with_message(msg.to_string())
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Status code colored by class.
pub fn status_badge(status: u16) -> String {
    let badge = style(status);
    match status {
        200..=299 => badge.green(),
        300..=399 => badge.cyan(),
        400..=499 => badge.yellow(),
        _ => badge.red(),
    }
    .to_string()
}

/// Format a duration as a human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_status_badge_keeps_code() {
        assert!(status_badge(404).contains("404"));
    }
}
