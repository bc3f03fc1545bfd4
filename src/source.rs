// 🔎 Listing Sources - where observations come from
//
// Two seams toward the page scraper:
//   - IdentityEnumerator: result pages → ordered listing URLs
//   - ListingSource: listing URL → raw listing text
//
// ObservationFile implements both from a JSON capture of one scraping run.

use crate::builder::RawListing;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Hard cap of listings shown on one result page
pub const MAX_LISTINGS_PER_PAGE: usize = 40;

// ============================================================================
// TRAITS
// ============================================================================

pub trait IdentityEnumerator {
    /// Listing URLs in page order
    fn listing_identities(&self) -> Vec<String>;
}

pub trait ListingSource {
    /// Raw text of one opened listing, None when it could not be opened
    fn fetch(&self, url: &str) -> Option<RawListing>;
}

// ============================================================================
// RESULT PAGES
// ============================================================================

/// Links of one result page plus the number of provider labels shown on it.
///
/// Promoted banners add links without a provider label, and they come first,
/// so the real listings are the trailing `provider_count` links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub links: Vec<String>,
    pub provider_count: usize,
}

impl ResultPage {
    pub fn listing_identities(&self) -> &[String] {
        select_listing_identities(&self.links, self.provider_count)
    }
}

/// Keep the last `min(provider_count, MAX_LISTINGS_PER_PAGE)` links
pub fn select_listing_identities(links: &[String], provider_count: usize) -> &[String] {
    let keep = provider_count.min(MAX_LISTINGS_PER_PAGE).min(links.len());
    &links[links.len() - keep..]
}

// ============================================================================
// OBSERVATION FILE
// ============================================================================

/// One scraping run captured as JSON:
///
/// ```json
/// { "pages": [ { "links": ["https://..."], "provider_count": 1 } ],
///   "listings": { "https://...": { "title": "...", "publication_phrase": "..." } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationFile {
    #[serde(default)]
    pub pages: Vec<ResultPage>,

    #[serde(default)]
    pub listings: HashMap<String, RawListing>,
}

impl ObservationFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let observation: ObservationFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            pages = observation.pages.len(),
            listings = observation.listings.len(),
            "loaded observation file"
        );
        Ok(observation)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse observation JSON")
    }
}

impl IdentityEnumerator for ObservationFile {
    fn listing_identities(&self) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|page| page.listing_identities().iter().cloned())
            .collect()
    }
}

impl ListingSource for ObservationFile {
    fn fetch(&self, url: &str) -> Option<RawListing> {
        self.listings.get(url).cloned()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn links(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://example.se/annons/{}", i)).collect()
    }

    #[test]
    fn test_banner_links_are_dropped() {
        let all = links(5);
        let kept = select_listing_identities(&all, 3);
        assert_eq!(kept, &all[2..]);
    }

    #[test]
    fn test_page_is_capped() {
        let all = links(45);
        let kept = select_listing_identities(&all, 44);
        assert_eq!(kept.len(), MAX_LISTINGS_PER_PAGE);
        assert_eq!(kept[0], "https://example.se/annons/5");
    }

    #[test]
    fn test_more_providers_than_links() {
        let all = links(2);
        assert_eq!(select_listing_identities(&all, 7).len(), 2);
        assert!(select_listing_identities(&all, 0).is_empty());
    }

    #[test]
    fn test_observation_file_from_json() {
        let json = r#"{
            "pages": [
                { "links": ["https://example.se/banner", "https://example.se/annons/1"], "provider_count": 1 },
                { "links": ["https://example.se/annons/2"], "provider_count": 1 }
            ],
            "listings": {
                "https://example.se/annons/1": {
                    "title": "Volvo V70 D5",
                    "publication_phrase": "Idag 10:00",
                    "price": "89 900 kr",
                    "provider": "Privat",
                    "general": { "Miltal": "15 400" }
                }
            }
        }"#;

        let observation = ObservationFile::from_json(json).unwrap();

        assert_eq!(
            observation.listing_identities(),
            vec!["https://example.se/annons/1", "https://example.se/annons/2"]
        );

        let raw = observation.fetch("https://example.se/annons/1").unwrap();
        assert_eq!(raw.title, "Volvo V70 D5");
        assert_eq!(raw.location, None);
        assert!(raw.detailed.is_empty());
        assert!(observation.fetch("https://example.se/annons/2").is_none());
    }

    #[test]
    fn test_malformed_observation_is_error() {
        assert!(ObservationFile::from_json("{ \"pages\": 3 }").is_err());
    }
}
