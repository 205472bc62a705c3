//! Enrollment term derivation: start-date parsing, top-of-hour normalization,
//! calendar-month arithmetic and price computation.
//!
//! All instants are UTC. Inputs without an offset are interpreted as UTC.
//!
//! Month arithmetic clamps: when the start day does not exist in the target
//! month, the end date falls on that month's last day
//! (2024-01-31 + 1 month = 2024-02-29).

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;

use crate::domain::entities::Plan;

/// Values computed once, at creation time, from a start date and a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentTerms {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: Decimal,
}

impl EnrollmentTerms {
    /// Derives end date and total price for an already normalized start date.
    ///
    /// Returns `None` when the end date falls outside the representable range,
    /// the total price overflows, or the plan duration is not positive.
    pub fn derive(start_date: DateTime<Utc>, plan: &Plan) -> Option<Self> {
        let months = u32::try_from(plan.duration_months).ok().filter(|m| *m > 0)?;
        let end_date = add_months_clamped(start_date, months)?;
        let price = plan.total_price()?;

        Some(Self {
            start_date,
            end_date,
            price,
        })
    }
}

/// Parses a raw start date.
///
/// Accepts RFC 3339 timestamps (`2024-03-10T15:37:00Z`, `...-03:00`), offset-less
/// date-times (`2024-03-10T15:37:00`, with optional fractional seconds) and bare
/// dates (`2024-03-10`, midnight).
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Truncates minutes, seconds and sub-second components to zero.
pub fn truncate_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_minute(0))
        .unwrap_or(dt)
}

/// Adds calendar months, clamping the day to the target month's length.
pub fn add_months_clamped(dt: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    dt.checked_add_months(Months::new(months))
}
