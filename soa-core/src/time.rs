//! Time utilities: timestamp parsing and timezone-aware rendering.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// Zone the cooldown boundary is rendered in.
pub const TARGET_TIMEZONE: Tz = chrono_tz::America::Denver;

/// `yyyy-MM-dd HH:mm:ss±HH:MM`
pub const ZONED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

const CIVIL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an IANA zone name like "America/Denver".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a timestamp as the simulator accepts them.
///
/// Strings carrying an offset (RFC 3339) are taken as absolute instants. Civil
/// strings without an offset (`2024-09-09 12:29:30.2960503`, `2024-09-09 12:29`)
/// are read in `calendar`, and a bare date means civil midnight in `calendar`.
pub fn parse_instant(input: &str, calendar: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(input, ZONED_FORMAT) {
        return Ok(dt.with_timezone(&Utc));
    }

    let ndt = parse_civil(input)
        .with_context(|| format!("invalid timestamp '{input}'"))?;
    local_to_utc(&ndt, calendar)
}

fn parse_civil(input: &str) -> Result<NaiveDateTime> {
    for fmt in CIVIL_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(ndt);
        }
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("unrecognised date/time format: {e}"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

/// Resolve a civil date-time in `tz`, rejecting ambiguous or skipped times.
pub fn local_to_utc(ndt: &NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    let local_dt = tz
        .from_local_datetime(ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {ndt} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Resolve a civil date-time in `tz` without failing.
///
/// A repeated time takes the earlier instant. A time skipped by DST moves to
/// the first quarter-hour after the gap.
pub fn resolve_local_lenient<Z: TimeZone>(ndt: &NaiveDateTime, tz: &Z) -> DateTime<Z> {
    (0..=12)
        .map(|quarter| *ndt + Duration::minutes(15 * quarter))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(ndt))
}

/// Render an instant as civil text in `tz`, e.g. `2024-09-11 00:00:00-06:00`.
pub fn to_timezone(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format(ZONED_FORMAT).to_string()
}

/// Drop a trailing `-HH:MM` offset. Positive offsets are left in place.
pub fn strip_utc_offset(rendered: &str) -> Result<&str> {
    let offset_re = Regex::new(r"-\d{2}:\d{2}$")?;
    Ok(match offset_re.find(rendered) {
        Some(m) => &rendered[..m.start()],
        None => rendered,
    })
}

/// Read back a string produced by [`to_timezone`] after [`strip_utc_offset`].
///
/// An offset-free string is reinterpreted in `calendar`, not in the zone it was
/// rendered in. Repeated or skipped local times resolve as in
/// [`resolve_local_lenient`].
pub fn reparse_stripped(stripped: &str, calendar: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(stripped, ZONED_FORMAT) {
        return Ok(dt.with_timezone(&Utc));
    }
    let ndt = NaiveDateTime::parse_from_str(stripped, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid rendered time '{stripped}'"))?;
    Ok(resolve_local_lenient(&ndt, &calendar).with_timezone(&Utc))
}
