// 🏗️ Scalar Extractors
// Pull numbers and header fields out of the free text shown on a listing page

use crate::error::{ListingError, ListingResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
}

/// One Swedish mil is ten kilometres
pub const KM_PER_MIL: i64 = 10;

/// Location text used when the listing shows no physical location
pub const ONLINE_LOCATION: &str = "online";

// ============================================================================
// NUMBERS
// ============================================================================

/// Concatenate every digit run in `text` and read the result as one integer.
///
/// "123 kr" → 123, "1 234 567 kr" → 1234567, "120 kW (163 hk)" → 120163.
/// Returns `None` for absent input or text without digits.
pub fn extract_integer(text: Option<&str>) -> ListingResult<Option<i64>> {
    let text = match text {
        Some(t) => t,
        None => return Ok(None),
    };

    let digits: String = DIGIT_RUN.find_iter(text).map(|m| m.as_str()).collect();
    if digits.is_empty() {
        return Ok(None);
    }

    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|e| ListingError::parse("integer", text, e.to_string()))
}

/// Read the first whitespace-delimited token as a float ("5.6 l/100 km" → 5.6)
pub fn extract_float(text: Option<&str>) -> ListingResult<Option<f64>> {
    let text = match text {
        Some(t) => t,
        None => return Ok(None),
    };

    let token = text
        .split_whitespace()
        .next()
        .ok_or_else(|| ListingError::parse("float", text, "no value"))?;

    token
        .parse::<f64>()
        .map(Some)
        .map_err(|e| ListingError::parse("float", text, e.to_string()))
}

/// Mileage in km from the mil figure shown on the page.
///
/// Ranges like "15 000 - 18 000" keep the upper bound; spaces are thousands
/// separators. Mileage is required, so absent input is an error.
pub fn extract_mileage_km(text: Option<&str>) -> ListingResult<i64> {
    let text = text.ok_or_else(|| ListingError::parse("Miltal", "", "value is missing"))?;

    let compact = text.replace(' ', "");
    let upper = compact.rsplit('-').next().unwrap_or("");

    let mil = upper
        .parse::<i64>()
        .map_err(|e| ListingError::parse("Miltal", text, e.to_string()))?;

    mil.checked_mul(KM_PER_MIL)
        .ok_or_else(|| ListingError::parse("Miltal", text, "value out of range"))
}

// ============================================================================
// HEADER FIELDS
// ============================================================================

/// City part of the location line, which ends with a link to the map.
///
/// "Göteborg Karta" → "Göteborg". The online sentinel is kept as is.
pub fn extract_city(location: &str) -> String {
    if location == ONLINE_LOCATION {
        return location.to_string();
    }

    let parts: Vec<&str> = location.split_whitespace().collect();
    match parts.split_last() {
        Some((_, city)) if !city.is_empty() => city.join(" "),
        // A lone token has no map link to drop; keep it as the city
        _ => location.trim().to_string(),
    }
}

/// Manufacturer, model and note from the listing title.
///
/// "Volvo V70 2.4 Momentum" → ("Volvo", "V70", "2.4 Momentum")
pub fn split_title(title: &str) -> ListingResult<(String, String, String)> {
    let (manufacturer, rest) = split_first_word(title.trim());
    let (model, note) = split_first_word(rest);

    if manufacturer.is_empty() || model.is_empty() {
        return Err(ListingError::parse(
            "title",
            title,
            "expected at least manufacturer and model",
        ));
    }

    Ok((manufacturer.to_string(), model.to_string(), note.to_string()))
}

fn split_first_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

/// Key/value pairs from the "detailed" accordion.
///
/// Each entry is multi-line text: every line except the last forms the key
/// (concatenated without separator), the last line is the value.
pub fn detailed_fields_to_map(entries: &[String]) -> HashMap<String, String> {
    entries
        .iter()
        .filter_map(|entry| {
            let lines: Vec<&str> = entry.split('\n').collect();
            let (value, key_lines) = lines.split_last()?;
            Some((key_lines.concat(), value.to_string()))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
