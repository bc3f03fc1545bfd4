// 🏷️ Category Translator - Lookup tables as data
// Swedish category labels → canonical English tokens
//
// Two miss policies:
//   - open tables (drive type, car type): unknown labels pass through unchanged
//   - closed enums (fuel, transmission): unknown labels become None

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// CLOSED VOCABULARIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    Petrol,
    Hybrid,
    Electric,
}

impl FuelType {
    const LABELS: &'static [(&'static str, FuelType)] = &[
        ("Diesel", FuelType::Diesel),
        ("Bensin", FuelType::Petrol),
        ("Miljöbränsle/Hybrid", FuelType::Hybrid),
        ("El", FuelType::Electric),
    ];

    /// Translate a label from the listing page; unknown labels give None
    pub fn from_label(label: &str) -> Option<FuelType> {
        Self::LABELS
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, fuel)| *fuel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Diesel => "diesel",
            FuelType::Petrol => "petrol",
            FuelType::Hybrid => "hybrid",
            FuelType::Electric => "electric",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    pub fn from_label(label: &str) -> Option<Transmission> {
        match label {
            "Automat" => Some(Transmission::Automatic),
            "Manuell" => Some(Transmission::Manual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Automatic => "automatic",
            Transmission::Manual => "manual",
        }
    }
}

/// Which protocol the CO2 figure was measured under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestProcedure {
    Wltp,
    Nedc,
}

impl TestProcedure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestProcedure::Wltp => "WLTP",
            TestProcedure::Nedc => "NEDC",
        }
    }
}

// ============================================================================
// OPEN TABLES
// ============================================================================

/// Label → token table where unknown labels round-trip unchanged
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        TranslationTable {
            entries: pairs
                .iter()
                .map(|(label, token)| (label.to_string(), token.to_string()))
                .collect(),
        }
    }

    /// Add or replace one label
    pub fn insert(&mut self, label: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(label.into(), token.into());
    }

    pub fn translate(&self, label: &str) -> String {
        self.entries
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const DRIVE_LABELS: &[(&str, &str)] = &[
    ("Fyrhjulsdrift", "four-wheel drive"),
    ("Fyrhjulsdriven", "four-wheel drive"),
    ("Tvåhjulsdrift", "two-wheel drive"),
    ("Tvåhjulsdriven", "two-wheel drive"),
];

const CAR_TYPE_LABELS: &[(&str, &str)] = &[
    ("Kombi", "estate car"),
    ("Halvkombi", "hatchback"),
    ("Småbil", "small"),
    ("Cap", "convertible"),
    ("Familjebuss", "van"),
    ("Yrkesfordon", "commercial"),
];

/// Extra labels for the open tables, loaded from JSON:
///
/// ```json
/// { "type_of_drive": { "Bakhjulsdrift": "rear-wheel drive" },
///   "car_type": { "Sedan": "sedan" } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub type_of_drive: HashMap<String, String>,

    #[serde(default)]
    pub car_type: HashMap<String, String>,
}

impl Vocabulary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read vocabulary file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse vocabulary JSON")
    }
}

// ============================================================================
// TRANSLATOR
// ============================================================================

/// All category lookups used by the record builder
#[derive(Debug, Clone)]
pub struct Translator {
    drive: TranslationTable,
    car_type: TranslationTable,
}

impl Translator {
    /// Translator with the built-in tables
    pub fn new() -> Self {
        Translator {
            drive: TranslationTable::from_pairs(DRIVE_LABELS),
            car_type: TranslationTable::from_pairs(CAR_TYPE_LABELS),
        }
    }

    /// Built-in tables extended (or overridden) by `vocabulary`
    pub fn with_vocabulary(vocabulary: &Vocabulary) -> Self {
        let mut translator = Translator::new();
        for (label, token) in &vocabulary.type_of_drive {
            translator.drive.insert(label.as_str(), token.as_str());
        }
        for (label, token) in &vocabulary.car_type {
            translator.car_type.insert(label.as_str(), token.as_str());
        }
        translator
    }

    pub fn type_of_drive(&self, label: Option<&str>) -> Option<String> {
        label.map(|l| self.drive.translate(l))
    }

    pub fn car_type(&self, label: Option<&str>) -> Option<String> {
        label.map(|l| self.car_type.translate(l))
    }

    pub fn fuel(&self, label: Option<&str>) -> Option<FuelType> {
        label.and_then(FuelType::from_label)
    }

    pub fn transmission(&self, label: Option<&str>) -> Option<Transmission> {
        label.and_then(Transmission::from_label)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
