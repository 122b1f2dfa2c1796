use jiff::Timestamp;
use jiff::civil::{Date, DateTime};

/// Short display form of a backend publication time.
///
/// The backend sends naive ISO-8601 (`2024-03-01T09:30:00.123456`); offset
/// forms are shown in UTC. Anything unparseable is shown as received.
pub fn format_published(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.contains('T')
        && let Ok(date) = raw.parse::<Date>()
    {
        return date.to_string();
    }
    if let Ok(dt) = raw.parse::<DateTime>() {
        return dt.strftime("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return ts.strftime("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

/// Parse a date filter typed by the user. Blank input clears the filter.
pub fn parse_date_input(input: &str) -> Result<Option<Date>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<Date>()
        .map(Some)
        .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn formats_naive_and_utc_times() {
        assert_eq!(format_published("2024-03-01T09:30:00"), "2024-03-01 09:30");
        assert_eq!(
            format_published("2024-03-01T09:30:00.123456"),
            "2024-03-01 09:30"
        );
        assert_eq!(format_published("2024-03-01T09:30:00Z"), "2024-03-01 09:30");
        assert_eq!(format_published("2024-03-01"), "2024-03-01");
    }

    #[test]
    fn unparseable_is_kept() {
        assert_eq!(format_published("yesterday"), "yesterday");
    }

    #[test]
    fn date_input() {
        assert_eq!(parse_date_input("  "), Ok(None));
        assert_eq!(parse_date_input("2024-03-07"), Ok(Some(date(2024, 3, 7))));
        assert!(parse_date_input("2024-13-40").is_err());
        assert!(parse_date_input("3/7").is_err());
    }
}
