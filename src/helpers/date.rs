//! Date helper functions

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, TimeZone};

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// `2024-01-15T10:30:00+00:00` -> `15 Jan 2024`
pub fn date_to_string(value: &str) -> Option<String> {
    format_date_value(value, "%d %b %Y")
}

/// Reformat an RFC 3339 date string with a strftime pattern.
/// Returns `None` when either the value or the pattern is invalid.
pub fn format_date_value(value: &str, format: &str) -> Option<String> {
    let date = DateTime::parse_from_rfc3339(value.trim()).ok()?;
    format_date(&date, format)
}

/// Format a date, refusing patterns chrono cannot render
pub fn format_date(date: &DateTime<FixedOffset>, format: &str) -> Option<String> {
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return None;
    }
    Some(date.format_with_items(items.into_iter()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_date_xml() {
        assert_eq!(date_xml(&date()), "2024-01-15T10:30:00+01:00");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&date(), "%Y/%m/%d").as_deref(), Some("2024/01/15"));
        assert_eq!(format_date(&date(), "%B %-d, %Y").as_deref(), Some("January 15, 2024"));
        assert_eq!(format_date(&date(), "%Q"), None);
    }

    #[test]
    fn test_date_to_string() {
        assert_eq!(
            date_to_string("2024-01-15T10:30:00+01:00").as_deref(),
            Some("15 Jan 2024")
        );
        assert_eq!(date_to_string("yesterday"), None);
    }
}
