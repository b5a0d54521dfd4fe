//! Performance delta calculation
//!
//! Compares a metric's current value against its filter-specific prior
//! period. Pure arithmetic; the caller re-invokes the relevant aggregator
//! over [`previous_range`] to obtain the prior value.

use chrono::{Datelike, Duration, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use visapath_domain::{ChangeType, DateRange, PerformanceDelta, Result, VisaPathError};

use super::date_range::{end_of_day, last_day_of_month, month_range, start_of_day, DateFilter};

/// The prior period a metric is compared against.
///
/// - `today` / `custom`: both bounds shifted back one day (`custom` has no
///   natural predecessor, one day is the fallback)
/// - `weekly`: back seven days
/// - `monthly`: the previous calendar month
/// - `yearly`: both bounds back one calendar year, month-end clamped
pub fn previous_range(filter: DateFilter, range: &DateRange) -> Result<DateRange> {
    match filter {
        DateFilter::Today | DateFilter::Custom => Ok(shift_days(range, 1)),
        DateFilter::Weekly => Ok(shift_days(range, 7)),
        DateFilter::Monthly => {
            let (month, year) = range.month_year();
            let (prev_year, prev_month) =
                if month == 1 { (year - 1, 12) } else { (year, month - 1) };
            month_range(prev_year, prev_month)
        }
        DateFilter::Yearly => {
            let start = shift_years(range.start, 1)?;
            let end = shift_years(range.end, 1)?;
            Ok(DateRange::new(start, end))
        }
    }
}

/// Percent change from `previous` to `current`.
///
/// Division by zero is never computed: a rise from zero is capped at 100%
/// and zero-to-zero is no change. The magnitude is always non-negative;
/// the direction lives in `change_type`.
pub fn delta(previous: Decimal, current: Decimal) -> PerformanceDelta {
    if previous.is_zero() {
        if current.is_zero() {
            return PerformanceDelta { change: Decimal::ZERO, change_type: ChangeType::NoChange };
        }
        return PerformanceDelta {
            change: Decimal::ONE_HUNDRED,
            change_type: ChangeType::Increase,
        };
    }

    let percent = (current - previous) / previous * Decimal::ONE_HUNDRED;
    let magnitude =
        percent.abs().round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let change_type = match current.cmp(&previous) {
        std::cmp::Ordering::Greater => ChangeType::Increase,
        std::cmp::Ordering::Less => ChangeType::Decrease,
        std::cmp::Ordering::Equal => ChangeType::NoChange,
    };
    PerformanceDelta { change: magnitude, change_type }
}

/// [`delta`] over plain counts.
pub fn delta_counts(previous: u64, current: u64) -> PerformanceDelta {
    delta(Decimal::from(previous), Decimal::from(current))
}

fn shift_days(range: &DateRange, days: i64) -> DateRange {
    DateRange::new(range.start - Duration::days(days), range.end - Duration::days(days))
}

fn shift_years(instant: NaiveDateTime, years: i32) -> Result<NaiveDateTime> {
    let date = instant.date();
    let year = date.year() - years;
    let shifted = chrono::NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .map(|day| day.and_time(instant.time()))
        .or_else(|| {
            // Feb 29 and friends clamp to the month's last day.
            last_day_of_month(year, date.month()).map(|day| {
                if instant.time() == chrono::NaiveTime::MIN {
                    start_of_day(day)
                } else {
                    end_of_day(day)
                }
            })
        });
    shifted.ok_or_else(|| VisaPathError::Internal("calendar arithmetic out of range".to_string()))
}
