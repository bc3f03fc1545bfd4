// ⚙️ Configuration
// Settings for an ingest run, read from a JSON file; CLI flags override them.

use crate::builder::ListingBuilder;
use crate::translation::{Translator, Vocabulary};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASET_PATH: &str = "data/used_car_dataset.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV file holding the dataset
    pub dataset_path: PathBuf,

    /// Import the existing dataset file (if any) before ingesting and write
    /// back into it; when false a run starts from an empty dataset and the
    /// file is left untouched
    pub import_existing: bool,

    /// SQLite audit log; no events are written when unset
    pub event_log: Option<PathBuf>,

    /// Extra category labels (see `Vocabulary`)
    pub vocabulary: Option<PathBuf>,

    /// Day the observation was made; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            import_existing: true,
            event_log: None,
            vocabulary: None,
            reference_date: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Config from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Config::default()),
        }
    }

    pub fn reference_date_or_today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Where an ingest run writes its dataset, None when it must not write.
    ///
    /// A run that did not import the stored file only holds part of the
    /// listings, so saving it would drop every stored record.
    pub fn save_target(&self) -> Option<&Path> {
        self.import_existing.then_some(self.dataset_path.as_path())
    }

    /// Translator with the configured vocabulary applied
    pub fn translator(&self) -> Result<Translator> {
        match &self.vocabulary {
            Some(path) => Ok(Translator::with_vocabulary(&Vocabulary::from_file(path)?)),
            None => Ok(Translator::new()),
        }
    }

    pub fn listing_builder(&self) -> Result<ListingBuilder> {
        Ok(ListingBuilder::new(self.translator()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("car-listing-tracker-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.dataset_path, PathBuf::from("data/used_car_dataset.csv"));
        assert!(config.import_existing);
        assert!(config.event_log.is_none());
        assert!(config.vocabulary.is_none());
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let path = temp_file(
            "config.json",
            r#"{ "import_existing": false, "reference_date": "2024-06-13" }"#,
        );

        let config = Config::load(Some(path.as_path())).unwrap();

        assert!(!config.import_existing);
        assert_eq!(config.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(
            config.reference_date_or_today(),
            NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()
        );
    }

    #[test]
    fn test_dataset_written_only_when_imported() {
        let config = Config::default();
        assert_eq!(config.save_target(), Some(Path::new(DEFAULT_DATASET_PATH)));

        let fresh = Config {
            import_existing: false,
            ..Config::default()
        };
        assert_eq!(fresh.save_target(), None);
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(Config::from_file("/nonexistent/car-listing-tracker.json").is_err());
    }

    #[test]
    fn test_translator_uses_vocabulary_file() {
        let vocabulary = temp_file(
            "vocabulary.json",
            r#"{ "car_type": { "Sedan": "saloon" } }"#,
        );
        let config = Config {
            vocabulary: Some(vocabulary),
            ..Config::default()
        };

        let translator = config.translator().unwrap();
        assert_eq!(translator.car_type(Some("Sedan")).as_deref(), Some("saloon"));
        assert_eq!(
            translator.type_of_drive(Some("Fyrhjulsdrift")).as_deref(),
            Some("four-wheel drive")
        );
    }
}
