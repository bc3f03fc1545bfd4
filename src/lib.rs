// Car Listing Tracker - Core Library
// Normalizes scraped used-car listings and keeps a deduplicated dataset up to date

pub mod error;
pub mod temporal;
pub mod parser;
pub mod translation;
pub mod record;
pub mod builder;
pub mod dataset;
pub mod reconciliation;
pub mod source;
pub mod pipeline;
pub mod db;
pub mod config;

// Re-export commonly used types
pub use error::{ListingError, ListingResult};
pub use temporal::{interpret, format_timestamp, parse_timestamp, DateAnchor, TIMESTAMP_FORMAT};
pub use parser::{
    extract_integer, extract_float, extract_mileage_km, extract_city, split_title,
    detailed_fields_to_map,
};
pub use translation::{
    FuelType, Transmission, TestProcedure, TranslationTable, Translator, Vocabulary,
};
pub use record::{ListingRecord, History, COLUMNS};
pub use builder::{ListingBuilder, RawListing, RawFields};
pub use dataset::Dataset;
pub use reconciliation::{reconcile, is_republished, ReconciliationResult};
pub use source::{
    IdentityEnumerator, ListingSource, ObservationFile, ResultPage,
    select_listing_identities, MAX_LISTINGS_PER_PAGE,
};
pub use pipeline::{Pipeline, ProcessOutcome, BatchSummary};
pub use db::{
    Event, EventType,
    setup_database, open_event_log, insert_event, insert_events,
    get_events_for_listing, count_events_by_type,
};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
