//! Calendar arithmetic for the daily cycle: expiry boundaries and day keys.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};

/// Format of the calendar-day key used to group archives.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// The first `hour:00` boundary strictly after `now`, in `now`'s time zone.
///
/// Before today's boundary this is today's boundary; at or after it, tomorrow's.
/// On days where the boundary falls in a DST gap the next existing boundary is used.
pub fn next_expiry<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> DateTime<Utc> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..=2)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|day| boundary_on(&tz, day, hour))
        .find(|candidate| candidate > now)
        .map(|candidate| candidate.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc) + Duration::hours(24))
}

fn boundary_on<Tz: TimeZone>(tz: &Tz, day: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = day.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// Calendar-day key (`YYYY-MM-DD`) of `now` in its own time zone.
pub fn day_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(DAY_KEY_FORMAT).to_string()
}

/// Expiry instant for an archive created at `now_ms`.
pub fn archive_expiry(now_ms: i64, retention_days: i64) -> i64 {
    now_ms + Duration::days(retention_days).num_milliseconds()
}
