// 🚗 Listing Record - one row per unique listing
//
// Field names double as the CSV header (see dataset.rs). The identity (URL)
// is private: once a record exists its key can be read but never reassigned.

use crate::temporal::TIMESTAMP_FORMAT;
use crate::translation::{FuelType, TestProcedure, Transmission};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HISTORY
// ============================================================================

/// Comma-joined audit trail of superseded values, most recently superseded first.
///
/// Empty until the first update; serializes as a blank CSV cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(String);

impl History {
    pub const SEPARATOR: &'static str = ", ";

    pub fn new() -> Self {
        History(String::new())
    }

    /// Put a superseded value at the front of the trail
    pub fn push(&mut self, old_value: &str) {
        self.0 = if self.0.is_empty() {
            old_value.to_string()
        } else {
            format!("{}{}{}", old_value, Self::SEPARATOR, self.0)
        };
    }

    /// Substring containment against the joined trail.
    ///
    /// Matches the stored-data semantics of the dataset: a value that happens to
    /// be a substring of a longer entry also counts as contained.
    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    /// Entries, most recently superseded first
    pub fn entries(&self) -> Vec<&str> {
        if self.0.is_empty() {
            return Vec::new();
        }
        self.0.split(Self::SEPARATOR).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for History {
    fn from(s: &str) -> Self {
        History(s.trim().to_string())
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TIMESTAMP CELLS
// ============================================================================

/// `YYYY-MM-DD HH:MM:SS` in CSV cells
mod timestamp_cell {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// LISTING RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    // ========================================================================
    // PUBLICATION & PRICE (mutated by the update reconciler)
    // ========================================================================
    #[serde(with = "timestamp_cell")]
    pub publication_datetime: NaiveDateTime,

    #[serde(default)]
    pub publication_history: History,

    // ========================================================================
    // HEADER
    // ========================================================================
    pub location: String,
    pub provider: String,
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub note: String,

    pub price_sek: Option<i64>,

    #[serde(default)]
    pub price_history: History,

    // ========================================================================
    // VEHICLE DETAILS (all optional, absent source data stays None)
    // ========================================================================
    pub entry_year: Option<i64>,
    pub fuel: Option<FuelType>,
    pub mileage_km: Option<i64>,
    pub transmission: Option<Transmission>,
    pub type_of_drive: Option<String>,
    pub horse_power: Option<i64>,
    pub engine_size_ccm: Option<i64>,
    pub top_speed_km_h: Option<i64>,
    pub emission_class: Option<String>,

    #[serde(rename = "co2_emission_g/km")]
    pub co2_emission_g_km: Option<i64>,

    #[serde(rename = "test_prozedure")]
    pub test_procedure: Option<TestProcedure>,

    pub fuel_consumption_mixed_l_100km: Option<f64>,
    pub fuel_consumption_highway_l_100km: Option<f64>,
    pub electric_range_km: Option<i64>,
    pub number_of_seats: Option<i64>,
    pub car_type: Option<String>,
    pub length_mm: Option<i64>,
    pub width_mm: Option<i64>,
    pub height_mm: Option<i64>,
    pub load_capacity_kg: Option<i64>,
    pub empty_weight_kg: Option<i64>,
    pub total_weight_kg: Option<i64>,

    // ========================================================================
    // IDENTITY
    // ========================================================================
    url: String,
}

impl ListingRecord {
    /// Record with only identity and publication time set
    pub fn new(url: impl Into<String>, publication_datetime: NaiveDateTime) -> Self {
        ListingRecord {
            publication_datetime,
            publication_history: History::new(),
            location: String::new(),
            provider: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            note: String::new(),
            price_sek: None,
            price_history: History::new(),
            entry_year: None,
            fuel: None,
            mileage_km: None,
            transmission: None,
            type_of_drive: None,
            horse_power: None,
            engine_size_ccm: None,
            top_speed_km_h: None,
            emission_class: None,
            co2_emission_g_km: None,
            test_procedure: None,
            fuel_consumption_mixed_l_100km: None,
            fuel_consumption_highway_l_100km: None,
            electric_range_km: None,
            number_of_seats: None,
            car_type: None,
            length_mm: None,
            width_mm: None,
            height_mm: None,
            load_capacity_kg: None,
            empty_weight_kg: None,
            total_weight_kg: None,
            url: url.into(),
        }
    }

    /// Listing URL, the dataset key
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Publication time in its canonical string form
    pub fn publication_string(&self) -> String {
        self.publication_datetime.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Price as written into the price history; a listing without a price
    /// still gets an entry so both histories stay the same length
    pub fn price_string(&self) -> String {
        self.price_sek
            .map(|p| p.to_string())
            .unwrap_or_else(|| ABSENT_PRICE.to_string())
    }

    /// One-line description for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} {} ({}) {} kr, published {}, {}",
            self.manufacturer,
            self.model,
            self.entry_year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string()),
            self.price_sek.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string()),
            self.publication_string(),
            self.location
        )
    }
}

/// Price history entry for a listing that showed no price
pub const ABSENT_PRICE: &str = "None";

/// Column names of the persisted table, in order
pub const COLUMNS: [&str; 32] = [
    "publication_datetime",
    "publication_history",
    "location",
    "provider",
    "manufacturer",
    "model",
    "note",
    "price_sek",
    "price_history",
    "entry_year",
    "fuel",
    "mileage_km",
    "transmission",
    "type_of_drive",
    "horse_power",
    "engine_size_ccm",
    "top_speed_km_h",
    "emission_class",
    "co2_emission_g/km",
    "test_prozedure",
    "fuel_consumption_mixed_l_100km",
    "fuel_consumption_highway_l_100km",
    "electric_range_km",
    "number_of_seats",
    "car_type",
    "length_mm",
    "width_mm",
    "height_mm",
    "load_capacity_kg",
    "empty_weight_kg",
    "total_weight_kg",
    "url",
];

// ============================================================================
// TESTS
// ============================================================================
