//! Date range resolution for dashboard filters
//!
//! Every resolver is a pure function over an explicit `now` so tests pin
//! the clock. The orchestrator supplies the local wall-clock time; no
//! timezone conversion is applied anywhere (custom bounds are parsed as
//! plain local dates).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use visapath_domain::constants::ALL_TIME_START_YEAR;
use visapath_domain::{DateRange, Result, VisaPathError};

/// Named dashboard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFilter {
    Today,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl DateFilter {
    /// Stable string tag, used in cache keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFilter {
    type Err = VisaPathError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "today" => Ok(Self::Today),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(VisaPathError::InvalidFilter(other.to_string())),
        }
    }
}

/// The windows one request resolves to.
///
/// `range` drives the chart and the leaderboard. `summary` equals `range`
/// except under the `today` filter, where the summary cards use the
/// today-only window while the chart keeps its rolling week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub filter: DateFilter,
    pub range: DateRange,
    pub summary: DateRange,
}

/// Resolve a filter and optional custom bounds against `now`.
///
/// # Errors
/// `InvalidRange` when the custom filter is missing a bound or a bound
/// does not parse as a `%Y-%m-%d` date.
pub fn resolve(
    filter: DateFilter,
    after: Option<&str>,
    before: Option<&str>,
    now: NaiveDateTime,
) -> Result<ResolvedRange> {
    let today = now.date();
    let range = match filter {
        // Rolling 7-day window ending today: seven daily chart points,
        // the same width the weekly filter produces.
        DateFilter::Today => {
            let opening = today - Duration::days(6);
            DateRange::new(start_of_day(opening), end_of_day(today))
        }
        DateFilter::Weekly => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            let sunday = monday + Duration::days(6);
            DateRange::new(start_of_day(monday), end_of_day(sunday))
        }
        // Strictly the current month, never spilling into neighbours.
        DateFilter::Monthly => month_range(today.year(), today.month())?,
        // 24-month rolling window: day 1 of this month two years ago
        // through the end of today.
        DateFilter::Yearly => {
            let opening = NaiveDate::from_ymd_opt(today.year() - 2, today.month(), 1)
                .ok_or_else(calendar_error)?;
            DateRange::new(start_of_day(opening), end_of_day(today))
        }
        DateFilter::Custom => {
            let after = parse_bound(after, "afterDate")?;
            let before = parse_bound(before, "beforeDate")?;
            let (lo, hi) = if after <= before { (after, before) } else { (before, after) };
            DateRange::new(start_of_day(lo), end_of_day(hi))
        }
    };

    let summary = if filter == DateFilter::Today { today_only(now) } else { range };
    Ok(ResolvedRange { filter, range, summary })
}

/// Midnight through 23:59:59.999 of the current day, used by the
/// summary cards under the `today` filter.
pub fn today_only(now: NaiveDateTime) -> DateRange {
    DateRange::new(start_of_day(now.date()), end_of_day(now.date()))
}

/// 2000-01-01 through the end of today: the reference window for the
/// outstanding-balance computation, so it always reflects every client.
pub fn all_time(now: NaiveDateTime) -> DateRange {
    let epoch =
        NaiveDate::from_ymd_opt(ALL_TIME_START_YEAR, 1, 1).unwrap_or_else(|| now.date());
    DateRange::new(start_of_day(epoch), end_of_day(now.date()))
}

/// First day 00:00:00 through last day 23:59:59.999 of one month.
pub(crate) fn month_range(year: i32, month: u32) -> Result<DateRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(calendar_error)?;
    let last = last_day_of_month(year, month).ok_or_else(calendar_error)?;
    Ok(DateRange::new(start_of_day(first), end_of_day(last)))
}

pub(crate) fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

pub(crate) fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|first| first.pred_opt())
}

fn parse_bound(value: Option<&str>, name: &str) -> Result<NaiveDate> {
    let raw = value.ok_or_else(|| {
        VisaPathError::InvalidRange(format!("{name} is required for the custom filter"))
    })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| VisaPathError::InvalidRange(format!("{name} is not a valid date: {raw}")))
}

fn calendar_error() -> VisaPathError {
    VisaPathError::Internal("calendar arithmetic out of range".to_string())
}
