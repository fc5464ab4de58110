//! Query-string helpers shared by the listings.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::platform::app_error::AppError;

/// Inclusive `created_at` window. Date-only bounds cover the whole UTC day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        Ok(Self {
            start: non_blank(start).map(|s| parse_bound(s, false)).transpose()?,
            end: non_blank(end).map(|s| parse_bound(s, true)).transpose()?,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, AppError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let invalid = || AppError::BadRequest(format!("Invalid date: {raw}"));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = if end_of_day {
        date.checked_add_days(Days::new(1)).ok_or_else(invalid)?
    } else {
        date
    }
    .and_hms_opt(0, 0, 0)
    .ok_or_else(invalid)?
    .and_utc();

    Ok(if end_of_day {
        midnight - chrono::Duration::microseconds(1)
    } else {
        midnight
    })
}

/// `%term%` for LIKE/ILIKE with the term's own wildcards escaped.
pub fn substring_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `"true"` enables a flag; anything else leaves it off.
pub fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim() == "true")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn date_only_end_covers_the_whole_day() {
        let range = DateRange::parse(Some("2025-03-01"), Some("2025-03-02")).unwrap();

        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(
            range.end,
            Some(
                Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()
                    - chrono::Duration::microseconds(1)
            )
        );
    }

    #[test]
    fn timestamps_are_used_as_given() {
        let range = DateRange::parse(None, Some("2025-03-01T12:00:00+03:00")).unwrap();

        assert_eq!(range.end, Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
        assert!(range.start.is_none());
    }

    #[test]
    fn blank_bounds_are_ignored_and_garbage_rejected() {
        assert_eq!(DateRange::parse(Some(" "), None).unwrap(), DateRange::default());
        assert!(matches!(
            DateRange::parse(Some("yesterday"), None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(substring_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(substring_pattern("SH12"), "%SH12%");
    }

    #[test]
    fn only_literal_true_sets_a_flag() {
        assert!(flag(Some("true")));
        assert!(!flag(Some("1")));
        assert!(!flag(Some("TRUE")));
        assert!(!flag(None));
    }
}
