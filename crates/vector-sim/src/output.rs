// crates/vector-sim/src/output.rs
//
// Output formatting for simulator reports.
// Supports table and JSON output modes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Render base units as a decimal with `shown` fractional digits.
pub fn format_units(amount: u128, decimals: u32, shown: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    if shown == 0 {
        return whole.to_string();
    }
    let shown = shown.min(decimals);
    let frac = (amount % scale) / 10u128.pow(decimals - shown);
    format!("{}.{:0width$}", whole, frac, width = shown as usize)
}

/// Render simulated seconds as a calendar time from `start`.
pub fn format_time(start: i64, offset: u64) -> String {
    i64::try_from(offset)
        .ok()
        .and_then(|o| start.checked_add(o))
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("+{}s", offset))
}

/// Render a span of seconds as `2d 03h`.
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    if days > 0 {
        format!("{}d {:02}h", days, hours)
    } else {
        format!("{}h {:02}m", hours, (seconds % 3_600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_500_000_000, 9, 4), "1.5000");
        assert_eq!(format_units(666_666_666_666, 9, 2), "666.66");
        assert_eq!(format_units(42, 9, 0), "0");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0, 3_600), "1970-01-01 01:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(2 * 86_400 + 3 * 3_600), "2d 03h");
        assert_eq!(format_duration(5_400), "1h 30m");
    }
}
