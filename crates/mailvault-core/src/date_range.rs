//! Day-granular selection window shared by backup and restore.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::{Error, Result};

/// `since` is inclusive, `before` exclusive, both whole days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First day included.
    pub since: Option<NaiveDate>,
    /// First day excluded.
    pub before: Option<NaiveDate>,
}

impl DateRange {
    /// The unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            since: None,
            before: None,
        }
    }

    /// Builds a range from optional `YYYYMMDD` arguments.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDate`] for anything that is not a calendar date,
    /// [`Error::EmptyRange`] when `since` is not before `before`.
    pub fn from_args(since: Option<&str>, before: Option<&str>) -> Result<Self> {
        let range = Self {
            since: since.map(parse_day).transpose()?,
            before: before.map(parse_day).transpose()?,
        };
        match (range.since, range.before) {
            (Some(since), Some(before)) if range.is_empty() => {
                Err(Error::EmptyRange { since, before })
            }
            _ => Ok(range),
        }
    }

    /// True when the day of `at`, in its own offset, lies in the range.
    ///
    /// This matches how IMAP SEARCH compares internal dates.
    #[must_use]
    pub fn contains(&self, at: &DateTime<FixedOffset>) -> bool {
        let day = at.date_naive();
        self.since.is_none_or(|s| day >= s) && self.before.is_none_or(|b| day < b)
    }

    /// True when no day can satisfy the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.since, self.before), (Some(s), Some(b)) if s >= b)
    }
}

/// Parses `YYYYMMDD`.
///
/// # Errors
///
/// [`Error::InvalidDate`] unless the text is eight digits naming a real day.
pub fn parse_day(text: &str) -> Result<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDate(text.to_string()));
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").map_err(|_| Error::InvalidDate(text.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).unwrap()
    }

    #[test]
    fn parses_cli_dates() {
        assert_eq!(
            parse_day("20070621").unwrap(),
            NaiveDate::from_ymd_opt(2007, 6, 21).unwrap()
        );
        assert!(matches!(parse_day("2007-06-21"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_day("20070231"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_day("+2007062"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn since_inclusive_before_exclusive() {
        let range = DateRange::from_args(Some("20240101"), Some("20240201")).unwrap();
        assert!(range.contains(&at("2024-01-01T00:00:00+00:00")));
        assert!(range.contains(&at("2024-01-31T23:59:59+00:00")));
        assert!(!range.contains(&at("2024-02-01T00:00:00+00:00")));
        assert!(!range.contains(&at("2023-12-31T23:59:59+00:00")));
    }

    #[test]
    fn day_is_taken_in_the_message_offset() {
        let range = DateRange::from_args(Some("20240101"), None).unwrap();
        // 2023-12-31 in New York is already 2024-01-01 in UTC.
        assert!(!range.contains(&at("2023-12-31T22:00:00-05:00")));
    }

    #[test]
    fn empty_ranges_are_rejected() {
        assert!(!DateRange::all().is_empty());
        assert!(matches!(
            DateRange::from_args(Some("20240201"), Some("20240201")),
            Err(Error::EmptyRange { .. })
        ));
        assert!(matches!(
            DateRange::from_args(Some("20240301"), Some("20240201")),
            Err(Error::EmptyRange { .. })
        ));
        assert!(DateRange::from_args(Some("20240131"), Some("20240201")).is_ok());
    }
}
