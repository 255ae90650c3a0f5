use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidInput(format!("Invalid timezone: {}", timezone)))
}

/// First instant of `date` in `tz`, in UTC.
///
/// Days that begin inside a DST gap start at the first valid local time.
pub fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}

/// Half-open `[start, end)` bounds of the local day containing `at`.
pub fn local_day_bounds(at: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = at.with_timezone(tz).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (local_midnight(today, tz), local_midnight(tomorrow, tz))
}

/// Format a timestamp as a short local date, e.g. `3/7/2025`.
pub fn format_local_date(datetime: DateTime<Utc>, tz: &Tz) -> String {
    datetime.with_timezone(tz).format("%-m/%-d/%Y").to_string()
}
