// 📚 Dataset - every known listing, keyed by URL
//
// Insertion order is kept (it is the row order of the CSV file). Identity is
// unique: a listing is inserted once and only updated afterwards.

use crate::error::{ListingError, ListingResult};
use crate::record::{ListingRecord, COLUMNS};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ListingRecord>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ListingRecord> {
        self.records.iter()
    }

    pub fn lookup(&self, url: &str) -> Option<&ListingRecord> {
        self.index.get(url).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Add a listing seen for the first time.
    ///
    /// Callers look the URL up first; inserting a known URL is an error and
    /// leaves the dataset untouched.
    pub fn insert(&mut self, record: ListingRecord) -> ListingResult<()> {
        if self.index.contains_key(record.url()) {
            return Err(ListingError::DuplicateIdentity(record.url().to_string()));
        }

        self.index.insert(record.url().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Apply `mutator` to the stored record for `url`.
    ///
    /// The change is applied to a copy and only stored if the identity is unchanged.
    pub fn update<F>(&mut self, url: &str, mutator: F) -> ListingResult<()>
    where
        F: FnOnce(&mut ListingRecord),
    {
        let idx = *self
            .index
            .get(url)
            .ok_or_else(|| ListingError::UnknownIdentity(url.to_string()))?;

        let mut candidate = self.records[idx].clone();
        mutator(&mut candidate);

        if candidate.url() != url {
            return Err(ListingError::IdentityChanged {
                from: url.to_string(),
                to: candidate.url().to_string(),
            });
        }

        self.records[idx] = candidate;
        Ok(())
    }

    // ========================================================================
    // CSV
    // ========================================================================

    /// Read records from CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut dataset = Dataset::new();

        for (line_num, result) in rdr.deserialize().enumerate() {
            let record: ListingRecord = result.with_context(|| {
                format!("Failed to deserialize listing on CSV line {}", line_num + 2)
            })?;
            dataset
                .insert(record)
                .with_context(|| format!("Repeated listing on CSV line {}", line_num + 2))?;
        }

        Ok(dataset)
    }

    /// Write all records as CSV; an empty dataset still gets its header row
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        if self.records.is_empty() {
            wtr.write_record(COLUMNS)?;
        }

        for record in &self.records {
            wtr.serialize(record)
                .with_context(|| format!("Failed to serialize listing {}", record.url()))?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
        let dataset = Self::from_reader(file)
            .with_context(|| format!("Failed to load dataset: {}", path.display()))?;

        tracing::info!(path = %path.display(), listings = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create dataset: {}", path.display()))?;
        self.to_writer(file)?;

        tracing::info!(path = %path.display(), listings = self.len(), "saved dataset");
        Ok(())
    }

    /// Import the file at `path` when it exists and `import_existing` is set,
    /// otherwise start from an empty dataset
    pub fn open_or_create(path: &Path, import_existing: bool) -> Result<Self> {
        if import_existing && path.exists() {
            Self::load_csv(path)
        } else {
            tracing::info!(path = %path.display(), "starting new dataset");
            Ok(Dataset::new())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
