//! Reporting frequency and period calendar arithmetic
//!
//! Periods are derived from a frequency with fixed calendar rules:
//! daily covers the previous day, weekly the trailing 7 days, and
//! monthly/quarterly/annually the previous full calendar unit.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a report configuration executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl Frequency {
    /// Stable string form used in config files and audit events
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annually => "annually",
        }
    }

    /// The reporting period preceding `now`
    ///
    /// - daily: the previous day
    /// - weekly: the trailing 7 days ending yesterday
    /// - monthly: the previous calendar month
    /// - quarterly: the previous calendar quarter
    /// - annually: the previous calendar year
    pub fn previous_period(&self, now: DateTime<Utc>) -> ReportingPeriod {
        match self {
            Frequency::Daily => {
                let yesterday = now - Duration::days(1);
                ReportingPeriod::new(start_of_day(yesterday), end_of_day(yesterday))
            }
            Frequency::Weekly => {
                let yesterday = now - Duration::days(1);
                ReportingPeriod::new(
                    start_of_day(now - Duration::days(7)),
                    end_of_day(yesterday),
                )
            }
            Frequency::Monthly => {
                let last_month = shift_months(now, -1);
                let first = first_of_month(last_month);
                ReportingPeriod::new(
                    day_start(first),
                    day_end(last_day_of_month(first)),
                )
            }
            Frequency::Quarterly => {
                // First month of the current quarter, then step back one quarter
                let quarter_start_month = ((now.month() - 1) / 3) * 3 + 1;
                let this_quarter = now
                    .date_naive()
                    .with_month(quarter_start_month)
                    .and_then(|d| d.with_day(1))
                    .unwrap_or_else(|| now.date_naive());
                let prev_quarter = shift_months_naive(this_quarter, -3);
                let end = last_day_of_month(shift_months_naive(prev_quarter, 2));
                ReportingPeriod::new(day_start(prev_quarter), day_end(end))
            }
            Frequency::Annually => {
                let year = now.year() - 1;
                let start = NaiveDate::from_ymd_opt(year, 1, 1)
                    .unwrap_or_else(|| now.date_naive());
                let end = NaiveDate::from_ymd_opt(year, 12, 31)
                    .unwrap_or_else(|| now.date_naive());
                ReportingPeriod::new(day_start(start), day_end(end))
            }
        }
    }

    /// Default cron schedule for this frequency (6-field, with seconds)
    ///
    /// Report runs fire shortly after midnight so the previous period is
    /// fully closed when the pipeline executes.
    pub fn default_schedule(&self) -> &'static str {
        match self {
            Frequency::Daily => "0 5 0 * * *",
            Frequency::Weekly => "0 15 0 * * Mon",
            Frequency::Monthly => "0 30 0 1 * *",
            Frequency::Quarterly => "0 45 0 1 1,4,7,10 *",
            Frequency::Annually => "0 0 1 1 1 *",
        }
    }

    /// Days after period end until the report is due at the authority
    pub fn due_after_days(&self) -> i64 {
        match self {
            Frequency::Daily => 1,
            Frequency::Weekly => 3,
            Frequency::Monthly => 15,
            Frequency::Quarterly => 30,
            Frequency::Annually => 60,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reporting period with inclusive bounds on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// Start of the period (inclusive)
    pub start: DateTime<Utc>,
    /// End of the period (inclusive)
    pub end: DateTime<Utc>,
}

impl ReportingPeriod {
    /// Create a new period; callers are expected to pass ordered bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Check whether a timestamp falls inside the period
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Number of calendar days covered (both endpoints included)
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

// Calendar helpers

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    day_start(dt.date_naive())
}

fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    day_end(dt.date_naive())
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now)
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now)
}

fn first_of_month(dt: DateTime<Utc>) -> NaiveDate {
    dt.date_naive().with_day(1).unwrap_or_else(|| dt.date_naive())
}

/// Shift a datetime by whole months, clamping to the last day of the month
fn shift_months(dt: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    day_start(shift_months_naive(dt.date_naive(), months))
}

fn shift_months_naive(date: NaiveDate, months: i32) -> NaiveDate {
    let total_months = date.month() as i32 + months;
    let year_delta = if total_months <= 0 {
        (total_months - 12) / 12
    } else {
        (total_months - 1) / 12
    };

    let new_year = date.year() + year_delta;
    let new_month = ((total_months - 1).rem_euclid(12) + 1) as u32;

    // Land on the first of the target month, then clamp the day so
    // e.g. Mar 31 minus one month is Feb 29, not an invalid Feb 31
    let Some(first) = NaiveDate::from_ymd_opt(new_year, new_month, 1) else {
        return date;
    };
    let day = date.day().min(last_day_of_month(first).day());
    first.with_day(day).unwrap_or(first)
}

/// Last day of the month containing `date`
fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month
        .map(|d| d - Duration::days(1))
        .unwrap_or(date)
}

#[cfg(test)]
#[path = "period_test.rs"]
mod tests;
