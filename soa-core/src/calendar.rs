//! Civil-calendar helpers behind the 48-hour cooldown rule.
//!
//! These functions read the calendar fields of whatever zone the `DateTime`
//! carries. Convert to the intended calendar zone before calling them.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::time::resolve_local_lenient;

/// Length of the cooldown that follows the latest SOA.
pub const COOLDOWN_HOURS: i64 = 48;

/// Move a Saturday or Sunday onto the following Monday, then truncate to midnight.
///
/// Weekdays keep their date and are only truncated.
pub fn adjust_to_weekday<Z: TimeZone>(dt: &DateTime<Z>) -> DateTime<Z> {
    let date = dt.date_naive();
    let shifted = match date.weekday() {
        Weekday::Sun => date + Duration::days(1),
        Weekday::Sat => date + Duration::days(2),
        _ => date,
    };
    start_of_day(&dt.timezone(), shifted)
}

/// Add the cooldown to `dt` and land on a weekday midnight.
pub fn add_48_hours<Z: TimeZone>(dt: &DateTime<Z>) -> DateTime<Z> {
    adjust_to_weekday(&(dt.clone() + Duration::hours(COOLDOWN_HOURS)))
}

/// Latest instant in `dates`, or `None` when empty.
pub fn get_max_date(dates: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    dates.iter().max().copied()
}

/// Same civil month and year, each side read in its own zone.
pub fn is_same_month_year<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a.month() == b.month() && a.year() == b.year()
}

/// First valid instant of `date` in `tz`.
///
/// Ambiguous midnights take the earlier instant. Where DST skips midnight the
/// first civil time after the gap is used.
fn start_of_day<Z: TimeZone>(tz: &Z, date: NaiveDate) -> DateTime<Z> {
    resolve_local_lenient(&date.and_time(NaiveTime::MIN), tz)
}
