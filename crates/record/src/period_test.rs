//! Tests for reporting period calendar arithmetic

use super::*;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn test_daily_is_previous_day() {
    let period = Frequency::Daily.previous_period(at("2024-05-15T10:30:00Z"));
    assert_eq!(period.start, at("2024-05-14T00:00:00Z"));
    assert_eq!(period.end, at("2024-05-14T23:59:59Z"));
    assert_eq!(period.days(), 1);
}

#[test]
fn test_weekly_is_trailing_seven_days() {
    let period = Frequency::Weekly.previous_period(at("2024-05-15T10:30:00Z"));
    assert_eq!(period.start, at("2024-05-08T00:00:00Z"));
    assert_eq!(period.end, at("2024-05-14T23:59:59Z"));
    assert_eq!(period.days(), 7);
}

#[test]
fn test_monthly_is_previous_calendar_month() {
    let period = Frequency::Monthly.previous_period(at("2024-05-15T10:30:00Z"));
    assert_eq!(period.start, at("2024-04-01T00:00:00Z"));
    assert_eq!(period.end, at("2024-04-30T23:59:59Z"));
}

#[test]
fn test_monthly_across_year_boundary() {
    let period = Frequency::Monthly.previous_period(at("2024-01-10T08:00:00Z"));
    assert_eq!(period.start, at("2023-12-01T00:00:00Z"));
    assert_eq!(period.end, at("2023-12-31T23:59:59Z"));
}

#[test]
fn test_quarterly_previous_calendar_quarter() {
    // Requested mid-Q2 2024: previous quarter is Q1
    let period = Frequency::Quarterly.previous_period(at("2024-05-15T00:00:00Z"));
    assert_eq!(period.start, at("2024-01-01T00:00:00Z"));
    assert_eq!(period.end, at("2024-03-31T23:59:59Z"));
}

#[test]
fn test_quarterly_in_q1_wraps_to_previous_year() {
    let period = Frequency::Quarterly.previous_period(at("2024-02-01T00:00:00Z"));
    assert_eq!(period.start, at("2023-10-01T00:00:00Z"));
    assert_eq!(period.end, at("2023-12-31T23:59:59Z"));
}

#[test]
fn test_annually_previous_calendar_year() {
    let period = Frequency::Annually.previous_period(at("2024-06-01T00:00:00Z"));
    assert_eq!(period.start, at("2023-01-01T00:00:00Z"));
    assert_eq!(period.end, at("2023-12-31T23:59:59Z"));
}

#[test]
fn test_contains_is_inclusive_on_both_ends() {
    let period = ReportingPeriod::new(at("2024-01-01T00:00:00Z"), at("2024-03-31T23:59:59Z"));
    assert!(period.contains(at("2024-01-01T00:00:00Z")));
    assert!(period.contains(at("2024-03-31T23:59:59Z")));
    assert!(period.contains(at("2024-02-15T12:00:00Z")));
    assert!(!period.contains(at("2023-12-31T23:59:59Z")));
    assert!(!period.contains(at("2024-04-01T00:00:00Z")));
}

#[test]
fn test_february_month_end_clamping() {
    // Previous month of March 31 is February; end must clamp to the 29th in 2024
    let period = Frequency::Monthly.previous_period(at("2024-03-31T12:00:00Z"));
    assert_eq!(period.start, at("2024-02-01T00:00:00Z"));
    assert_eq!(period.end, at("2024-02-29T23:59:59Z"));
}

#[test]
fn test_default_schedules_parse() {
    use std::str::FromStr;
    for freq in [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Annually,
    ] {
        assert!(
            cron::Schedule::from_str(freq.default_schedule()).is_ok(),
            "schedule for {} must parse",
            freq
        );
    }
}
