//! Usage figures derived from panel stats
//!
//! Byte counts are shown in decimal gigabytes (1 GB = 1e9 bytes) rounded to
//! two places. A zero limit means unlimited.

use crate::panel::PanelStats;
use chrono::NaiveDate;

const BYTES_PER_GB: f64 = 1e9;

/// Everything the stats screen displays, already derived
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub username: Option<String>,
    pub status: Option<String>,
    pub used_gb: f64,
    /// `None` when the account has no traffic limit
    pub total_gb: Option<f64>,
    pub remaining_gb: f64,
    pub expiry: Expiry,
    pub last_connection: Option<String>,
    pub panel_identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Unknown,
    /// Parsed date with days left relative to today; negative once expired
    Date { date: NaiveDate, days_left: i64 },
    /// The date prefix could not be parsed; shown as-is
    Raw(String),
}

impl StatsSummary {
    pub fn from_stats(stats: &PanelStats, panel_identity: &str, today: NaiveDate) -> Self {
        let used = stats.used_bytes();
        let total = stats.limit_bytes();
        let remaining = if total > 0 { total.saturating_sub(used) } else { 0 };

        Self {
            username: stats.username.clone(),
            status: stats.status.clone(),
            used_gb: bytes_to_gb(used),
            total_gb: (total > 0).then(|| bytes_to_gb(total)),
            remaining_gb: bytes_to_gb(remaining),
            expiry: stats
                .expire_at
                .as_deref()
                .map_or(Expiry::Unknown, |raw| parse_expiry(raw, today)),
            last_connection: stats.online_at().map(format_timestamp),
            panel_identity: panel_identity.to_string(),
        }
    }
}

#[allow(clippy::cast_precision_loss)] // byte counts are far below 2^53
pub fn bytes_to_gb(bytes: u64) -> f64 {
    ((bytes as f64 / BYTES_PER_GB) * 100.0).round_ties_even() / 100.0
}

/// Render a rounded GB figure with at least one fractional digit: `2.5`,
/// `10.0`, `7.25`
pub fn format_gb(gb: f64) -> String {
    let fixed = format!("{gb:.2}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Only the date part (first 10 characters) of the ISO timestamp is used
fn parse_expiry(raw: &str, today: NaiveDate) -> Expiry {
    let date_part: String = raw.chars().take(10).collect();
    match NaiveDate::parse_from_str(&date_part, "%Y-%m-%d") {
        Ok(date) => Expiry::Date {
            date,
            days_left: (date - today).num_days(),
        },
        Err(_) => Expiry::Raw(date_part),
    }
}

/// `2024-05-01T10:20:30.000Z` -> `2024-05-01 10:20:30`
fn format_timestamp(raw: &str) -> String {
    raw.chars()
        .take(19)
        .map(|c| if c == 'T' { ' ' } else { c })
        .collect()
}
