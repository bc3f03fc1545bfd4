// ⚖️ Update Reconciler - Has a known listing been republished?
//
// A listing is republished when its observed publication time appears neither
// as the stored publication time nor anywhere in its publication history.
// On republication the previous time and price move to the front of their
// histories and the observed values become current.

use crate::error::ListingResult;
use crate::parser::extract_integer;
use crate::record::ListingRecord;
use crate::temporal::{format_timestamp, interpret};
use chrono::NaiveDate;

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationResult {
    /// Already seen with this publication time; stored record stays as is
    Unchanged,

    /// New publication time; carries the record to store
    Republished(ListingRecord),
}

impl ReconciliationResult {
    pub fn is_republished(&self) -> bool {
        matches!(self, ReconciliationResult::Republished(_))
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Republication check on canonical timestamp strings.
///
/// Containment is a substring test on both the current value and the joined
/// history, so a timestamp embedded in a longer entry counts as already seen.
pub fn is_republished(stored: &ListingRecord, observed_publication: &str) -> bool {
    !stored.publication_string().contains(observed_publication)
        && !stored.publication_history.contains(observed_publication)
}

/// Compare a fresh observation of a stored listing against the stored record
pub fn reconcile(
    stored: &ListingRecord,
    observed_publication_phrase: &str,
    observed_price_text: Option<&str>,
    reference_date: NaiveDate,
) -> ListingResult<ReconciliationResult> {
    let observed_publication = interpret(observed_publication_phrase, reference_date)?;
    let observed_string = format_timestamp(&observed_publication);

    if !is_republished(stored, &observed_string) {
        return Ok(ReconciliationResult::Unchanged);
    }

    let observed_price = extract_integer(observed_price_text)?;

    let mut updated = stored.clone();
    updated.publication_history.push(&stored.publication_string());
    updated.publication_datetime = observed_publication;
    updated.price_history.push(&stored.price_string());
    updated.price_sek = observed_price;

    tracing::info!(
        url = stored.url(),
        from = %stored.publication_string(),
        to = %observed_string,
        "listing republished"
    );
    if stored.price_sek != observed_price {
        tracing::info!(
            url = stored.url(),
            from = %stored.price_string(),
            to = %updated.price_string(),
            "listing price changed"
        );
    }

    Ok(ReconciliationResult::Republished(updated))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListingError;
    use crate::record::History;
    use chrono::NaiveDateTime;

    fn reference_date() -> NaiveDate {
        // Thursday
        NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()
    }

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn stored_record() -> ListingRecord {
        let mut record = ListingRecord::new("https://example.se/annons/1", ts("2024-06-10 08:00:00"));
        record.manufacturer = "Volvo".to_string();
        record.model = "V70".to_string();
        record.price_sek = Some(89900);
        record.mileage_km = Some(154000);
        record
    }

    fn republished(result: ReconciliationResult) -> ListingRecord {
        match result {
            ReconciliationResult::Republished(record) => record,
            ReconciliationResult::Unchanged => panic!("expected republished"),
        }
    }

    #[test]
    fn test_same_publication_is_unchanged() {
        let stored = stored_record();
        // Monday 2024-06-10
        let result = reconcile(&stored, "måndag 08:00", Some("79 900 kr"), reference_date()).unwrap();

        assert_eq!(result, ReconciliationResult::Unchanged);
        assert!(!result.is_republished());
    }

    #[test]
    fn test_republished_updates_current_values_and_history() {
        let stored = stored_record();
        let result = reconcile(&stored, "idag 14:32", Some("84 900 kr"), reference_date()).unwrap();
        let updated = republished(result);

        assert_eq!(updated.publication_datetime, ts("2024-06-13 14:32:00"));
        assert_eq!(updated.publication_history.as_str(), "2024-06-10 08:00:00");
        assert_eq!(updated.price_sek, Some(84900));
        assert_eq!(updated.price_history.as_str(), "89900");

        // Everything else untouched
        assert_eq!(updated.url(), stored.url());
        assert_eq!(updated.mileage_km, stored.mileage_km);
        assert_eq!(updated.model, stored.model);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let stored = stored_record();
        let updated = republished(
            reconcile(&stored, "idag 14:32", Some("84 900 kr"), reference_date()).unwrap(),
        );

        let again = reconcile(&updated, "idag 14:32", Some("84 900 kr"), reference_date()).unwrap();
        assert_eq!(again, ReconciliationResult::Unchanged);
    }

    #[test]
    fn test_history_accumulates_newest_superseded_first() {
        let stored = stored_record();
        let first = republished(
            reconcile(&stored, "tisdag 09:15", Some("85 000 kr"), reference_date()).unwrap(),
        );
        let second = republished(
            reconcile(&first, "idag 14:32", Some("82 000 kr"), reference_date()).unwrap(),
        );

        assert_eq!(second.publication_datetime, ts("2024-06-13 14:32:00"));
        assert_eq!(
            second.publication_history.entries(),
            vec!["2024-06-11 09:15:00", "2024-06-10 08:00:00"]
        );
        assert_eq!(second.price_history.entries(), vec!["85000", "89900"]);
        assert_eq!(second.price_sek, Some(82000));
    }

    #[test]
    fn test_timestamp_found_in_history_is_unchanged() {
        let mut stored = stored_record();
        stored.publication_history = History::from("2024-06-11 09:15:00, 2024-06-03 07:45:00");

        let result = reconcile(&stored, "tisdag 09:15", Some("1 kr"), reference_date()).unwrap();
        assert_eq!(result, ReconciliationResult::Unchanged);
    }

    #[test]
    fn test_is_republished_uses_substring_containment() {
        let mut stored = stored_record();
        stored.publication_history = History::from("x2024-06-11 09:15:00x");

        assert!(!is_republished(&stored, "2024-06-11 09:15:00"));
        assert!(is_republished(&stored, "2024-06-12 09:15:00"));
    }

    #[test]
    fn test_missing_price_on_republication() {
        let mut stored = stored_record();
        stored.price_sek = None;

        let updated = republished(
            reconcile(&stored, "idag 10:00", Some("95 000 kr"), reference_date()).unwrap(),
        );
        assert_eq!(updated.price_sek, Some(95000));
        assert_eq!(updated.price_history.as_str(), "None");

        let removed = republished(reconcile(&stored, "igår 10:00", None, reference_date()).unwrap());
        assert_eq!(removed.price_sek, None);
    }

    #[test]
    fn test_histories_stay_aligned_from_missing_price() {
        let mut stored = stored_record();
        stored.price_sek = None;

        let first = republished(
            reconcile(&stored, "tisdag 09:15", Some("95 000 kr"), reference_date()).unwrap(),
        );
        let second = republished(
            reconcile(&first, "idag 10:00", Some("90 000 kr"), reference_date()).unwrap(),
        );

        assert_eq!(
            second.publication_history.entries(),
            vec!["2024-06-11 09:15:00", "2024-06-10 08:00:00"]
        );
        assert_eq!(second.price_history.entries(), vec!["95000", "None"]);
        assert_eq!(
            second.publication_history.entries().len(),
            second.price_history.entries().len()
        );
        assert_eq!(second.price_sek, Some(90000));
    }

    #[test]
    fn test_unrecognized_phrase_is_error() {
        let stored = stored_record();
        let err = reconcile(&stored, "nyligen", Some("1 kr"), reference_date()).unwrap_err();
        assert!(matches!(err, ListingError::UnrecognizedDatePhrase(_)));
    }
}
