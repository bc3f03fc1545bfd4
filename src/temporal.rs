// ⏰ Date/Time Interpreter
// Turns the marketplace's Swedish publication phrases into absolute timestamps
//
// Supported shapes (last token is always the time of day):
//   "Idag 14:32"        → reference date
//   "Igår 08:05"        → reference date - 1 day
//   "tisdag 09:15"      → most recent Tuesday on/before the reference date
//   "3 mars 11:40"      → 3 March of the reference year
//
// The reference date is always passed in explicitly. Nothing here reads the clock.

use crate::error::{ListingError, ListingResult};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Canonical string form of a timestamp (CSV cells and history entries)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIME_OF_DAY_FORMAT: &str = "%H:%M";

// ============================================================================
// VOCABULARY
// ============================================================================

/// Relative day words and how many days they lie before the reference date
const RELATIVE_DAYS: &[(&str, u64)] = &[("idag", 0), ("igår", 1)];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("måndag", Weekday::Mon),
    ("tisdag", Weekday::Tue),
    ("onsdag", Weekday::Wed),
    ("torsdag", Weekday::Thu),
    ("fredag", Weekday::Fri),
    ("lördag", Weekday::Sat),
    ("söndag", Weekday::Sun),
];

/// Month names as printed on the site, mapped to the `%b` code chrono understands.
/// "mars" and "maj" are full names that look like abbreviations, "okt" differs
/// from the English code.
const MONTHS: &[(&str, &str)] = &[
    ("jan", "jan"),
    ("januari", "jan"),
    ("feb", "feb"),
    ("februari", "feb"),
    ("mar", "mar"),
    ("mars", "mar"),
    ("apr", "apr"),
    ("april", "apr"),
    ("maj", "may"),
    ("jun", "jun"),
    ("juni", "jun"),
    ("jul", "jul"),
    ("juli", "jul"),
    ("aug", "aug"),
    ("augusti", "aug"),
    ("sep", "sep"),
    ("sept", "sep"),
    ("september", "sep"),
    ("okt", "oct"),
    ("oktober", "oct"),
    ("nov", "nov"),
    ("november", "nov"),
    ("dec", "dec"),
    ("december", "dec"),
];

// ============================================================================
// DATE ANCHOR
// ============================================================================

/// Date part of a publication phrase, before it is resolved against a reference date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateAnchor {
    /// N days before the reference date ("idag" = 0, "igår" = 1)
    DaysAgo(u64),

    /// Most recent occurrence of this weekday on or before the reference date
    Weekday(Weekday),

    /// Day of month plus three-letter month code, year taken from the reference date
    DayOfMonth { day: String, month_code: &'static str },
}

impl DateAnchor {
    /// Resolve the anchor to a calendar date
    pub fn resolve(&self, reference_date: NaiveDate) -> ListingResult<NaiveDate> {
        match self {
            DateAnchor::DaysAgo(days) => reference_date
                .checked_sub_days(Days::new(*days))
                .ok_or_else(|| {
                    ListingError::parse(
                        "publication date",
                        &reference_date.to_string(),
                        "date out of range",
                    )
                }),
            DateAnchor::Weekday(target) => {
                let mut delta = reference_date.weekday().num_days_from_monday() as i64
                    - target.num_days_from_monday() as i64;
                if delta < 0 {
                    delta += 7;
                }
                reference_date
                    .checked_sub_days(Days::new(delta as u64))
                    .ok_or_else(|| {
                        ListingError::parse(
                            "publication date",
                            &reference_date.to_string(),
                            "date out of range",
                        )
                    })
            }
            DateAnchor::DayOfMonth { day, month_code } => {
                // No rollback into the previous year: a December date read in
                // January lands in the reference year.
                let text = format!("{} {} {}", day, month_code, reference_date.year());
                NaiveDate::parse_from_str(&text, "%d %b %Y").map_err(|e| {
                    ListingError::parse("publication date", &text, e.to_string())
                })
            }
        }
    }
}

// ============================================================================
// INTERPRETER
// ============================================================================

fn normalize_token(token: &str) -> String {
    token
        .trim_end_matches(|c: char| c == '.' || c == ',')
        .to_lowercase()
}

fn month_code(token: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, code)| *code)
}

/// Find the date anchor among the leading tokens of a phrase
pub fn classify(date_tokens: &[&str]) -> Option<DateAnchor> {
    let normalized: Vec<String> = date_tokens.iter().map(|t| normalize_token(t)).collect();

    for (word, days) in RELATIVE_DAYS {
        if normalized.iter().any(|t| t == word) {
            return Some(DateAnchor::DaysAgo(*days));
        }
    }

    for (word, weekday) in WEEKDAYS {
        if normalized.iter().any(|t| t == word) {
            return Some(DateAnchor::Weekday(*weekday));
        }
    }

    // "<day> <month>": the day is the token right before the month name
    for (idx, token) in normalized.iter().enumerate().skip(1) {
        if let Some(code) = month_code(token) {
            return Some(DateAnchor::DayOfMonth {
                day: normalized[idx - 1].clone(),
                month_code: code,
            });
        }
    }

    None
}

/// Interpret a publication phrase relative to `reference_date`
pub fn interpret(raw_phrase: &str, reference_date: NaiveDate) -> ListingResult<NaiveDateTime> {
    let tokens: Vec<&str> = raw_phrase.split_whitespace().collect();

    let (time_token, date_tokens) = match tokens.split_last() {
        Some((last, rest)) if !rest.is_empty() => (*last, rest),
        _ => return Err(ListingError::UnrecognizedDatePhrase(raw_phrase.to_string())),
    };

    let anchor = classify(date_tokens)
        .ok_or_else(|| ListingError::UnrecognizedDatePhrase(raw_phrase.to_string()))?;

    let time = NaiveTime::parse_from_str(time_token, TIME_OF_DAY_FORMAT)
        .map_err(|e| ListingError::parse("publication time", time_token, e.to_string()))?;

    let date = anchor.resolve(reference_date)?;

    Ok(date.and_time(time))
}

/// Canonical `YYYY-MM-DD HH:MM:SS` rendering
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Inverse of [`format_timestamp`]
pub fn parse_timestamp(text: &str) -> ListingResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| ListingError::parse("publication_datetime", text, e.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    // 2024-06-13 is a Thursday
    const THURSDAY: (i32, u32, u32) = (2024, 6, 13);

    fn reference() -> NaiveDate {
        date(THURSDAY.0, THURSDAY.1, THURSDAY.2)
    }

    #[test]
    fn test_today() {
        let result = interpret("idag 14:32", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 13, 14, 32));
    }

    #[test]
    fn test_today_is_case_insensitive() {
        let result = interpret("Idag 14:32", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 13, 14, 32));
    }

    #[test]
    fn test_yesterday() {
        let result = interpret("Igår 23:59", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 12, 23, 59));
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let result = interpret("igår 07:00", date(2024, 3, 1)).unwrap();
        assert_eq!(result, at(2024, 2, 29, 7, 0));
    }

    #[test]
    fn test_weekday_earlier_in_week() {
        let result = interpret("tisdag 09:15", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 11, 9, 15));
    }

    #[test]
    fn test_weekday_same_day_is_reference_date() {
        let result = interpret("torsdag 10:00", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 13, 10, 0));
    }

    #[test]
    fn test_weekday_later_in_week_wraps_to_previous_week() {
        // Sunday after Thursday → Sunday before it
        let result = interpret("Söndag 18:45", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 9, 18, 45));

        let result = interpret("fredag 12:00", reference()).unwrap();
        assert_eq!(result, at(2024, 6, 7, 12, 0));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(
            interpret("3 mars 11:40", reference()).unwrap(),
            at(2024, 3, 3, 11, 40)
        );
        assert_eq!(
            interpret("21 maj 08:10", reference()).unwrap(),
            at(2024, 5, 21, 8, 10)
        );
        assert_eq!(
            interpret("1 juni 00:05", reference()).unwrap(),
            at(2024, 6, 1, 0, 5)
        );
        assert_eq!(
            interpret("30 juli 16:20", reference()).unwrap(),
            at(2024, 7, 30, 16, 20)
        );
        assert_eq!(
            interpret("9 okt. 13:00", reference()).unwrap(),
            at(2024, 10, 9, 13, 0)
        );
        assert_eq!(
            interpret("12 jan. 07:30", reference()).unwrap(),
            at(2024, 1, 12, 7, 30)
        );
    }

    #[test]
    fn test_capitalized_month_names() {
        assert_eq!(
            interpret("3 Mars 11:40", reference()).unwrap(),
            at(2024, 3, 3, 11, 40)
        );
        assert_eq!(
            interpret("12 Okt. 08:00", reference()).unwrap(),
            at(2024, 10, 12, 8, 0)
        );
    }

    #[test]
    fn test_relative_days_cross_into_previous_year() {
        // 2025-01-01 is a Wednesday
        let new_year = date(2025, 1, 1);

        assert_eq!(
            interpret("söndag 10:00", new_year).unwrap(),
            at(2024, 12, 29, 10, 0)
        );
        assert_eq!(
            interpret("igår 10:00", new_year).unwrap(),
            at(2024, 12, 31, 10, 0)
        );
    }

    #[test]
    fn test_month_date_keeps_reference_year() {
        // December phrase read in January stays in the reference year
        let result = interpret("28 dec. 20:00", date(2025, 1, 3)).unwrap();
        assert_eq!(result, at(2025, 12, 28, 20, 0));
    }

    #[test]
    fn test_impossible_day_is_parse_error() {
        let err = interpret("30 feb. 10:00", reference()).unwrap_err();
        assert!(matches!(err, ListingError::Parse { .. }));
    }

    #[test]
    fn test_unrecognized_phrase() {
        let err = interpret("förra veckan 10:00", reference()).unwrap_err();
        assert_eq!(
            err,
            ListingError::UnrecognizedDatePhrase("förra veckan 10:00".to_string())
        );
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_time_only_is_unrecognized() {
        let err = interpret("14:32", reference()).unwrap_err();
        assert!(matches!(err, ListingError::UnrecognizedDatePhrase(_)));

        let err = interpret("   ", reference()).unwrap_err();
        assert!(matches!(err, ListingError::UnrecognizedDatePhrase(_)));
    }

    #[test]
    fn test_bad_time_token() {
        let err = interpret("idag 25:99", reference()).unwrap_err();
        assert!(matches!(err, ListingError::Parse { .. }));
    }

    #[test]
    fn test_interpret_is_deterministic() {
        let first = interpret("onsdag 06:30", reference()).unwrap();
        let second = interpret("onsdag 06:30", reference()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_and_parse_timestamp() {
        let ts = at(2024, 6, 11, 9, 15);
        assert_eq!(format_timestamp(&ts), "2024-06-11 09:15:00");
        assert_eq!(parse_timestamp("2024-06-11 09:15:00").unwrap(), ts);
        assert!(parse_timestamp("11/06/2024").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&["Idag"]), Some(DateAnchor::DaysAgo(0)));
        assert_eq!(classify(&["lördag"]), Some(DateAnchor::Weekday(Weekday::Sat)));
        assert_eq!(
            classify(&["5", "sept."]),
            Some(DateAnchor::DayOfMonth {
                day: "5".to_string(),
                month_code: "sep"
            })
        );
        assert_eq!(classify(&["mars"]), None);
    }
}
