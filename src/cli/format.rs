//! Console formatting helpers shared by the commands

use chrono::{DateTime, Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::job::LogMessage;
use crate::Prices;

/// Shorten `name` to at most `width` characters, marking the cut with `...`
pub fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let kept: String = name.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Human-readable byte count using binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Milliseconds as `H:MM:SS`
pub fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Fraction in `[0, 1)` as a percentage
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Price schedule, or a dash when there is none
pub fn format_prices(prices: Option<&Prices>) -> String {
    prices.map_or_else(|| "-".to_string(), Prices::to_string)
}

/// One execution log line in local time
pub fn format_log_message(message: &LogMessage) -> String {
    format!("{}: {}", format_time(&message.date), message.message)
}

fn format_time(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Print log messages oldest first; the API returns them newest first
pub fn print_log_messages(messages: &[LogMessage]) {
    for message in messages.iter().rev() {
        println!("{}", format_log_message(message));
    }
}

/// Byte progress bar for a single file download
pub fn download_progress_bar(file_name: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(file_name.to_string());
    pb
}
