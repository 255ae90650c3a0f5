use crate::error::{AgentError, AgentResult};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use voxtask_core::timezone::local_midnight;

/// Parses a spoken or written date bound.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` (local midnight in `tz`) and
/// phrases such as "next friday" relative to `now`.
pub fn parse_date_bound(input: &str, now: DateTime<Utc>, tz: &Tz) -> AgentResult<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(local_midnight(date, tz));
    }
    parse_date_string(input, now.with_timezone(tz), Dialect::Us)
        .map(|local| local.with_timezone(&Utc))
        .map_err(|e| AgentError::Validation(format!("Failed to parse date '{}': {}", input, e)))
}
