//! Date range calculations.

use chrono::{Datelike, NaiveDate, Weekday};

/// Parse a date accepting `YYYY-MM-DD` and falling back to `MM/DD/YYYY`.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|e| format!("{}: '{}'", e, s))
}

/// Count days in the inclusive range whose weekday is Wednesday.
///
/// The count is order-independent: swapping start and end (or mixing the
/// two accepted formats) yields the same result.
pub fn count_wednesdays(start: &str, end: &str) -> String {
    match count_weekday(start, end, Weekday::Wed) {
        Ok(count) => count.to_string(),
        Err(e) => format!("Error parsing dates: {}. Please use YYYY-MM-DD format.", e),
    }
}

fn count_weekday(start: &str, end: &str, target: Weekday) -> Result<i64, String> {
    let mut start = parse_date(start)?;
    let mut end = parse_date(end)?;
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    let span = (end - start).num_days();
    let offset = (target.num_days_from_monday() as i64
        - start.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);

    if offset > span {
        Ok(0)
    } else {
        Ok(1 + (span - offset) / 7)
    }
}

/// Absolute difference between two dates in days.
pub fn date_diff(a: &str, b: &str) -> String {
    match (parse_date(a), parse_date(b)) {
        (Ok(a), Ok(b)) => (b - a).num_days().abs().to_string(),
        (Err(e), _) | (_, Err(e)) => {
            format!("Error calculating date difference: {}", e)
        }
    }
}
