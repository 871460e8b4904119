//! Common types used across the platform

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive date range used as a reporting window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// A timestamp is inside the window when its UTC calendar day is
    pub fn contains_timestamp(&self, timestamp: DateTime<Utc>) -> bool {
        self.contains(timestamp.date_naive())
    }

    /// Whether `other` lies completely inside this range
    pub fn encloses(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Split the range into consecutive, non-overlapping periods.
    ///
    /// The last period is clipped to `end`. Invalid ranges yield no periods.
    pub fn split(&self, granularity: PeriodGranularity) -> Vec<DateRange> {
        if !self.is_valid() {
            return Vec::new();
        }

        let mut periods = Vec::new();
        let mut cursor = self.start;
        loop {
            let boundary = match granularity {
                PeriodGranularity::Whole => self.end,
                PeriodGranularity::Daily => cursor,
                PeriodGranularity::Weekly => cursor.checked_add_days(Days::new(6)).unwrap_or(self.end),
                PeriodGranularity::Monthly => last_day_of_month(cursor),
            };
            let period_end = boundary.min(self.end);
            periods.push(DateRange::new(cursor, period_end));

            match period_end.succ_opt() {
                Some(next) if next <= self.end => cursor = next,
                _ => break,
            }
        }
        periods
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// How a shrinkage window is cut into periods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    #[default]
    Whole,
    Daily,
    Weekly,
    Monthly,
}

impl PeriodGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGranularity::Whole => "whole",
            PeriodGranularity::Daily => "daily",
            PeriodGranularity::Weekly => "weekly",
            PeriodGranularity::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "whole" => Some(PeriodGranularity::Whole),
            "daily" | "day" => Some(PeriodGranularity::Daily),
            "weekly" | "week" => Some(PeriodGranularity::Weekly),
            "monthly" | "month" => Some(PeriodGranularity::Monthly),
            _ => None,
        }
    }
}

/// Outcome of a report run
///
/// `NoData` means the scope had nothing to compute over, which is not the
/// same as a successful report with zero line items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    NoData,
}
