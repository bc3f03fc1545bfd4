// 🔁 Ingest Pipeline - observation → dataset
//
// For every observed listing:
//   - unknown URL  → build a record and insert it
//   - known URL    → reconcile against the stored record, update if republished
//   - parse error  → skip this listing, keep the rest of the batch going

use crate::builder::{ListingBuilder, RawListing};
use crate::dataset::Dataset;
use crate::db::{Event, EventType};
use crate::error::ListingResult;
use crate::reconciliation::{reconcile, ReconciliationResult};
use crate::source::{IdentityEnumerator, ListingSource};
use chrono::NaiveDate;
use serde_json::json;

/// Actor name written into the event log
pub const INGEST_ACTOR: &str = "ingest";

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// First sighting, record inserted
    Added,

    /// Known listing with a new publication time
    Republished {
        previous_publication: String,
        previous_price: String,
    },

    /// Known listing, nothing new
    Unchanged,

    /// Listing could not be turned into a record; dataset untouched
    Skipped { reason: String },
}

impl ProcessOutcome {
    /// Audit event for this outcome; unchanged listings are not logged
    pub fn to_event(&self, dataset: &Dataset, url: &str) -> Option<Event> {
        let (event_type, data) = match self {
            ProcessOutcome::Added => {
                let record = dataset.lookup(url)?;
                (
                    EventType::ListingAdded,
                    json!({
                        "manufacturer": record.manufacturer,
                        "model": record.model,
                        "price_sek": record.price_sek,
                        "publication_datetime": record.publication_string(),
                    }),
                )
            }
            ProcessOutcome::Republished {
                previous_publication,
                previous_price,
            } => {
                let record = dataset.lookup(url)?;
                (
                    EventType::ListingRepublished,
                    json!({
                        "publication_datetime": record.publication_string(),
                        "price_sek": record.price_sek,
                        "previous_publication": previous_publication,
                        "previous_price": previous_price,
                    }),
                )
            }
            ProcessOutcome::Unchanged => return None,
            ProcessOutcome::Skipped { reason } => {
                (EventType::ListingSkipped, json!({ "reason": reason }))
            }
        };

        Some(Event::new(event_type, url, data, INGEST_ACTOR))
    }
}

/// Counts and audit events of one ingest run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub observed: usize,
    pub added: usize,
    pub republished: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub events: Vec<Event>,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ProcessOutcome) {
        self.observed += 1;
        match outcome {
            ProcessOutcome::Added => self.added += 1,
            ProcessOutcome::Republished { .. } => self.republished += 1,
            ProcessOutcome::Unchanged => self.unchanged += 1,
            ProcessOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} listings observed: {} added, {} republished, {} unchanged, {} skipped",
            self.observed, self.added, self.republished, self.unchanged, self.skipped
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    builder: ListingBuilder,
    reference_date: NaiveDate,
}

impl Pipeline {
    /// `reference_date` is the day the observation was made ("idag")
    pub fn new(builder: ListingBuilder, reference_date: NaiveDate) -> Self {
        Pipeline {
            builder,
            reference_date,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Apply one observed listing to the dataset.
    ///
    /// Parse errors become `Skipped`; any other error is a caller bug and is returned.
    pub fn process(
        &self,
        dataset: &mut Dataset,
        url: &str,
        raw: &RawListing,
    ) -> ListingResult<ProcessOutcome> {
        match self.try_process(dataset, url, raw) {
            Err(e) if e.is_parse_error() => {
                tracing::warn!(url, error = %e, "skipping listing");
                Ok(ProcessOutcome::Skipped {
                    reason: e.to_string(),
                })
            }
            other => other,
        }
    }

    fn try_process(
        &self,
        dataset: &mut Dataset,
        url: &str,
        raw: &RawListing,
    ) -> ListingResult<ProcessOutcome> {
        let Some(stored) = dataset.lookup(url) else {
            let record = self.builder.build(raw, url, self.reference_date)?;
            tracing::info!(url, listing = %record.summary(), "listing added");
            dataset.insert(record)?;
            return Ok(ProcessOutcome::Added);
        };

        let previous_publication = stored.publication_string();
        let previous_price = stored.price_string();

        match reconcile(
            stored,
            &raw.publication_phrase,
            raw.price.as_deref(),
            self.reference_date,
        )? {
            ReconciliationResult::Unchanged => {
                tracing::debug!(url, "listing unchanged");
                Ok(ProcessOutcome::Unchanged)
            }
            ReconciliationResult::Republished(updated) => {
                dataset.update(url, |record| *record = updated)?;
                Ok(ProcessOutcome::Republished {
                    previous_publication,
                    previous_price,
                })
            }
        }
    }

    /// Run every listing the enumerator yields through `process`
    pub fn process_batch<E, S>(
        &self,
        dataset: &mut Dataset,
        enumerator: &E,
        source: &S,
    ) -> ListingResult<BatchSummary>
    where
        E: IdentityEnumerator,
        S: ListingSource,
    {
        let mut summary = BatchSummary::default();

        for url in enumerator.listing_identities() {
            let outcome = match source.fetch(&url) {
                Some(raw) => self.process(dataset, &url, &raw)?,
                None => {
                    tracing::warn!(url = %url, "listing could not be opened");
                    ProcessOutcome::Skipped {
                        reason: "listing could not be opened".to_string(),
                    }
                }
            };

            summary.record(&outcome);
            if let Some(event) = outcome.to_event(dataset, &url) {
                summary.events.push(event);
            }
        }

        tracing::info!(
            observed = summary.observed,
            added = summary.added,
            republished = summary.republished,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "batch processed"
        );
        Ok(summary)
    }
}

// ============================================================================
// TESTS
// ============================================================================
