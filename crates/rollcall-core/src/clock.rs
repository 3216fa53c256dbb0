//! Wall-clock conversion and verification window classification.
//!
//! All judgments are made in a fixed-offset zone (UTC+9 by default). There is
//! no daylight-saving adjustment.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Default offset in hours from UTC (KST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Which of the two daily verification windows a signal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    /// Photo check-in, on time at or before 08:00.
    MorningCheck,
    /// Core-time check-in, on time within [13:00, 17:00).
    CoreTimeCheck,
}

/// Local wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Converts instants into the configured local zone and classifies them.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowClassifier {
    offset: FixedOffset,
}

impl TimeWindowClassifier {
    /// Classifier for a whole-hour offset. Out-of-range offsets fall back to UTC+9.
    pub fn new(utc_offset_hours: i32) -> Self {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .or_else(|| FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600))
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local time of day for a UTC instant.
    pub fn wall_clock(&self, instant: DateTime<Utc>) -> WallClock {
        let local = instant.with_timezone(&self.offset);
        WallClock {
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
        }
    }

    /// Local calendar date for a UTC instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// `YYYY-MM-DD` in the local zone.
    pub fn date_label(&self, instant: DateTime<Utc>) -> String {
        self.local_date(instant).format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM` in the local zone.
    pub fn month_label(&self, instant: DateTime<Utc>) -> String {
        self.local_date(instant).format("%Y-%m").to_string()
    }

    /// Whether a check-in at `instant` counts as on time for `kind`.
    pub fn is_on_time(&self, kind: VerificationKind, instant: DateTime<Utc>) -> bool {
        let t = self.wall_clock(instant);
        match kind {
            VerificationKind::MorningCheck => {
                t.hour < 8 || (t.hour == 8 && t.minute == 0 && t.second == 0)
            }
            VerificationKind::CoreTimeCheck => (13..17).contains(&t.hour),
        }
    }
}

impl Default for TimeWindowClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_HOURS)
    }
}
