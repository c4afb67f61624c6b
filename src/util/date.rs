use chrono::{DateTime, NaiveDate, TimeZone, Utc};

// Accepted due-date inputs: "Jun 15 2026", "06/15/2026", "15/06/2026".
const INPUT_FORMATS: [&str; 3] = ["%b %d %Y", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse a user-typed due date. The service wants a timestamp, so the date
/// lands at noon UTC to stay on the right day across timezones.
pub fn parse_due(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
        .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(12, 0, 0).unwrap()))
}
