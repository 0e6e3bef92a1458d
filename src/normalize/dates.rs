//! Date field interpretation
//!
//! The upstream site is not consistent about date encodings: the same logical
//! field arrives as an integer epoch, an ISO-8601 string, or locale text
//! depending on the endpoint. A date field therefore declares an ordered
//! interpreter list; the first interpreter that parses wins. When none parse,
//! the caller keeps the raw string in `extra` rather than failing the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One way of reading a date value
#[derive(Debug, Clone)]
pub enum DateFormat {
    /// Integer seconds since the Unix epoch
    EpochSeconds,
    /// Integer milliseconds since the Unix epoch
    EpochMillis,
    /// RFC 3339 / ISO-8601 (e.g. `2023-11-14T00:00:00Z`)
    Rfc3339,
    /// RFC 2822 (e.g. `Tue, 14 Nov 2023 00:00:00 +0000`)
    Rfc2822,
    /// chrono format string, interpreted as UTC; date-only patterns resolve
    /// to midnight
    Custom(String),
}

impl DateFormat {
    fn try_parse(&self, input: &str) -> Option<DateTime<Utc>> {
        let input = input.trim();
        match self {
            Self::EpochSeconds => {
                let secs: i64 = input.parse().ok()?;
                DateTime::from_timestamp(secs, 0)
            }
            Self::EpochMillis => {
                let millis: i64 = input.parse().ok()?;
                DateTime::from_timestamp_millis(millis)
            }
            Self::Rfc3339 => DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Rfc2822 => DateTime::parse_from_rfc2822(input)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Custom(format) => {
                if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
                    return Some(dt.and_utc());
                }
                NaiveDate::parse_from_str(input, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }
        }
    }
}

/// Try each interpreter in order; first success wins
pub fn parse_date(input: &str, formats: &[DateFormat]) -> Option<DateTime<Utc>> {
    formats.iter().find_map(|format| format.try_parse(input))
}

/// Default interpreter order used by date fields that do not declare one
pub fn default_formats() -> Vec<DateFormat> {
    vec![
        DateFormat::EpochSeconds,
        DateFormat::Rfc3339,
        DateFormat::Rfc2822,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_epoch_and_rfc3339_agree() {
        let formats = vec![DateFormat::EpochSeconds, DateFormat::Rfc3339];

        let from_epoch = parse_date("1699920000", &formats).unwrap();
        let from_iso = parse_date("2023-11-14T00:00:00Z", &formats).unwrap();
        assert_eq!(from_epoch, from_iso);
    }

    #[rstest]
    #[case("1699920000", true)]
    #[case("2023-11-14T00:00:00Z", true)]
    #[case("Tue, 14 Nov 2023 00:00:00 +0000", true)]
    #[case("not-a-date", false)]
    #[case("", false)]
    fn test_default_formats(#[case] input: &str, #[case] parses: bool) {
        assert_eq!(parse_date(input, &default_formats()).is_some(), parses);
    }

    #[test]
    fn test_interpreter_order_matters() {
        // With millis first, an integer is read as milliseconds
        let millis_first = vec![DateFormat::EpochMillis, DateFormat::EpochSeconds];
        let seconds_first = vec![DateFormat::EpochSeconds, DateFormat::EpochMillis];

        let a = parse_date("1699920000", &millis_first).unwrap();
        let b = parse_date("1699920000", &seconds_first).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_format() {
        let formats = vec![DateFormat::Custom("%d/%m/%Y".to_string())];
        let parsed = parse_date("14/11/2023", &formats).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2023-11-14T00:00:00+00:00");
    }

    #[test]
    fn test_no_interpreter_matches() {
        let formats = vec![DateFormat::Rfc3339];
        assert!(parse_date("14 Nov", &formats).is_none());
    }
}
