//! IMAP date and date-time text forms.
//!
//! `INTERNALDATE` and APPEND use `date-time` (`"17-Jul-1996 02:44:25 -0700"`,
//! day optionally space-padded); SEARCH uses `date` (`1-Feb-1994`).

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::{Error, Result};

const DATE_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";
const DATE_FORMAT: &str = "%d-%b-%Y";

/// Parses an `INTERNALDATE` value.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not a valid IMAP `date-time`.
pub fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text.trim(), DATE_TIME_FORMAT).map_err(|e| Error::Parse {
        position: 0,
        message: format!("invalid date-time {text:?}: {e}"),
    })
}

/// Formats a timestamp as an IMAP `date-time`, keeping its offset.
#[must_use]
pub fn format_date_time(at: &DateTime<FixedOffset>) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

/// Formats a calendar day for SEARCH `SINCE`/`BEFORE`/`ON`.
#[must_use]
pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}
