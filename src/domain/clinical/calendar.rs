//! Deterministic calendar computation. Weekday resolution is never delegated
//! to the model.

use chrono::{Local, NaiveDate};

use crate::domain::DomainError;

/// Wire format for user-facing dates: `15-Feb-26`.
pub const DATE_FORMAT: &str = "%d-%b-%y";

/// Current date stamp injected into instructions, e.g. `15-Feb-26, Sunday`.
pub fn current_date_stamp() -> String {
    Local::now().format("%d-%b-%y, %A").to_string()
}

/// Strict parse of a dd-Mon-yy date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        DomainError::validation(format!(
            "Date '{}' is not in the expected dd-Mon-yy format",
            raw
        ))
    })
}

/// Weekday name for a dd-Mon-yy date.
pub fn weekday_for(raw: &str) -> Result<String, DomainError> {
    Ok(parse_date(raw)?.format("%A").to_string())
}
