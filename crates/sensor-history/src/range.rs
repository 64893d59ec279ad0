//! Range token resolution: `"24h"` -> lookback `-24h`, window `144m`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use sensor_common::HistoryError;

/// Number of aggregate points every historical query aims for.
pub const POINT_COUNT: u64 = 10;

/// Longest accepted range. Flux durations are signed 64-bit nanoseconds.
pub const MAX_HOURS: u64 = i64::MAX as u64 / 3_600_000_000_000;

/// Optional leading `-`, ASCII digits, optional `h` suffix.
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?([0-9]+)h?$").expect("static range pattern must compile"));

/// A validated relative range, expressed in whole hours.
///
/// Both backend literals are rebuilt from the parsed magnitude, so nothing
/// from the caller's token reaches the query text verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    hours: u64,
}

impl RangeWindow {
    /// Parse a range token such as `24h`, `-24h` or `24`.
    pub fn resolve(token: &str) -> Result<Self, HistoryError> {
        let token = token.trim();
        let caps = RANGE_RE.captures(token).ok_or_else(|| {
            HistoryError::Validation(format!(
                "range {token:?} must be a whole number of hours, e.g. \"24h\""
            ))
        })?;

        let hours: u64 = caps[1].parse().map_err(|_| {
            HistoryError::Validation(format!("range {token:?} is too large"))
        })?;
        if hours == 0 {
            return Err(HistoryError::Validation(format!(
                "range {token:?} must be greater than zero"
            )));
        }
        if hours > MAX_HOURS {
            return Err(HistoryError::Validation(format!(
                "range {token:?} is too large (max {MAX_HOURS}h)"
            )));
        }

        Ok(Self { hours })
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    /// How far back the query reaches.
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.hours * 3600)
    }

    /// Length of one aggregation window: `lookback / POINT_COUNT`.
    pub fn window(&self) -> Duration {
        self.lookback() / POINT_COUNT as u32
    }

    /// Lookback as a negative Flux duration, e.g. `-24h`.
    pub fn lookback_literal(&self) -> String {
        format!("-{}h", self.hours)
    }

    /// Window as a Flux duration in whole minutes, e.g. `144m`.
    pub fn window_literal(&self) -> String {
        format!("{}m", self.window().as_secs() / 60)
    }
}
