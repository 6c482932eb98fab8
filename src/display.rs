use chrono::{DateTime, Local, NaiveDate, Utc};

pub const INVALID_DATE: &str = "Invalid date";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date from either a plain date or a full timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(ts) = parse_timestamp(s) {
        return Some(ts.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `last_updated` for humans; these are machine-written so garbage is flagged.
pub fn format_timestamp(s: &str) -> String {
    match parse_timestamp(s) {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// Free-text dates ("ASAP", "Q3") are shown as written.
pub fn format_date(s: &str) -> String {
    match parse_date(s) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => s.to_string(),
    }
}

pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert_eq!(parse_date("2024-09-01"), Some(expected));
        assert_eq!(parse_date("01.09.2024"), Some(expected));
        assert_eq!(parse_date("September 1, 2024"), Some(expected));
        assert_eq!(parse_date("2024-09-01T08:00:00Z"), Some(expected));
        assert_eq!(parse_date("ASAP"), None);
    }

    #[test]
    fn unparseable_dates_fall_back() {
        assert_eq!(format_timestamp("yesterday"), INVALID_DATE);
        assert_eq!(format_date("ASAP"), "ASAP");
        assert_eq!(format_date("2024-09-01"), "2024-09-01");
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(85.0), "85");
        assert_eq!(format_score(72.5), "72.5");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Zürich Straße 12", 10), "Zürich ...");
    }
}
