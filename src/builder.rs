// 🧱 Record Builder
// Raw listing text (as extracted from the page) → canonical ListingRecord
//
// Every attribute is looked up by its Swedish field name in the combined
// general + detailed mapping and routed through an extractor or translator.
// Any failure aborts this one record with a parse error.

use crate::error::ListingResult;
use crate::parser::{
    detailed_fields_to_map, extract_city, extract_float, extract_integer, extract_mileage_km,
    split_title, ONLINE_LOCATION,
};
use crate::record::ListingRecord;
use crate::temporal::interpret;
use crate::translation::{TestProcedure, Translator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field names as they appear on the listing page
pub mod fields {
    pub const ENTRY_YEAR: &str = "Modellår";
    pub const FUEL: &str = "Bränsle";
    pub const MILEAGE: &str = "Miltal";
    pub const TRANSMISSION: &str = "Växellåda";
    pub const DRIVE: &str = "Drivning";
    pub const HORSE_POWER: &str = "Hästkrafter";
    pub const ENGINE_SIZE: &str = "Motorstorlek";
    pub const TOP_SPEED: &str = "Topphastighet";
    pub const EMISSION_CLASS: &str = "Utsläppsklass";
    pub const CO2_WLTP: &str = "CO²-utsläpp (WLTP)";
    pub const CO2_NEDC: &str = "CO²-utsläpp (NEDC)";
    pub const CONSUMPTION_MIXED: &str = "Bränsleförbrukning(vid blandad körning)";
    pub const CONSUMPTION_HIGHWAY: &str = "Bränsleförbrukning(vid landsväg)";
    pub const ELECTRIC_RANGE: &str = "Elräckvidd (NECD)";
    pub const SEATS: &str = "Antal säten";
    pub const CAR_TYPE: &str = "Biltyp";
    pub const LENGTH: &str = "Längd";
    pub const WIDTH: &str = "Bredd";
    pub const HEIGHT: &str = "Höjd";
    pub const LOAD_CAPACITY: &str = "Lastkapacitet";
    pub const EMPTY_WEIGHT: &str = "Tjänstevikt (EU)";
    pub const TOTAL_WEIGHT: &str = "Totalvikt";
    pub const MODEL: &str = "Modell";
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// Plain text of one opened listing, handed over by the page scraper.
///
/// Optional fields that were not shown on the page are `None`, never `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    /// Headline, "<manufacturer> <model> <note...>"
    pub title: String,

    /// e.g. "Idag 14:32"
    pub publication_phrase: String,

    /// e.g. "149 900 kr"
    #[serde(default)]
    pub price: Option<String>,

    pub provider: String,

    /// Location line ending with the map link; None for online sellers
    #[serde(default)]
    pub location: Option<String>,

    /// Icon row: label → value
    #[serde(default)]
    pub general: HashMap<String, String>,

    /// Accordion rows: multi-line "key lines...\nvalue"
    #[serde(default)]
    pub detailed: Vec<String>,
}

impl RawListing {
    /// General fields merged with the detailed block (detailed wins on clashes)
    pub fn fields(&self) -> RawFields {
        let mut map = self.general.clone();
        map.extend(detailed_fields_to_map(&self.detailed));
        RawFields(map)
    }

    pub fn location_or_online(&self) -> &str {
        self.location.as_deref().unwrap_or(ONLINE_LOCATION)
    }
}

/// Combined characteristic mapping, keyed by Swedish field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields(HashMap<String, String>);

impl RawFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RawFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        RawFields(iter.into_iter().collect())
    }
}

/// CO2 value and the protocol it came from. WLTP wins over NEDC.
pub fn select_emission<'a>(
    wltp: Option<&'a str>,
    nedc: Option<&'a str>,
) -> (Option<&'a str>, Option<TestProcedure>) {
    match (wltp, nedc) {
        (Some(value), _) => (Some(value), Some(TestProcedure::Wltp)),
        (None, Some(value)) => (Some(value), Some(TestProcedure::Nedc)),
        (None, None) => (None, None),
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct ListingBuilder {
    translator: Translator,
}

impl ListingBuilder {
    pub fn new(translator: Translator) -> Self {
        ListingBuilder { translator }
    }

    /// Build the canonical record for a listing seen for the first time
    pub fn build(
        &self,
        raw: &RawListing,
        identity: &str,
        reference_date: NaiveDate,
    ) -> ListingResult<ListingRecord> {
        let publication_datetime = interpret(&raw.publication_phrase, reference_date)?;
        let mut record = ListingRecord::new(identity, publication_datetime);

        record.location = extract_city(raw.location_or_online());
        record.provider = raw.provider.trim().to_string();
        record.price_sek = extract_integer(raw.price.as_deref())?;

        let (manufacturer, title_model, note) = split_title(&raw.title)?;
        record.manufacturer = manufacturer;
        record.note = note;

        let raw_fields = raw.fields();
        self.apply_fields(&mut record, &raw_fields)?;

        // An explicit "Modell" row beats the model word from the title
        record.model = raw_fields
            .get(fields::MODEL)
            .map(str::to_string)
            .unwrap_or(title_model);

        Ok(record)
    }

    /// Fill the vehicle attributes from the characteristic mapping
    pub fn apply_fields(&self, record: &mut ListingRecord, raw: &RawFields) -> ListingResult<()> {
        let t = &self.translator;

        record.entry_year = extract_integer(raw.get(fields::ENTRY_YEAR))?;
        record.fuel = t.fuel(raw.get(fields::FUEL));
        record.mileage_km = Some(extract_mileage_km(raw.get(fields::MILEAGE))?);
        record.transmission = t.transmission(raw.get(fields::TRANSMISSION));
        record.type_of_drive = t.type_of_drive(raw.get(fields::DRIVE));
        record.horse_power = extract_integer(raw.get(fields::HORSE_POWER))?;
        record.engine_size_ccm = extract_integer(raw.get(fields::ENGINE_SIZE))?;
        record.top_speed_km_h = extract_integer(raw.get(fields::TOP_SPEED))?;
        record.emission_class = raw.get(fields::EMISSION_CLASS).map(str::to_string);

        let (co2, procedure) = select_emission(raw.get(fields::CO2_WLTP), raw.get(fields::CO2_NEDC));
        record.co2_emission_g_km = extract_integer(co2)?;
        record.test_procedure = procedure;

        record.fuel_consumption_mixed_l_100km = extract_float(raw.get(fields::CONSUMPTION_MIXED))?;
        record.fuel_consumption_highway_l_100km =
            extract_float(raw.get(fields::CONSUMPTION_HIGHWAY))?;
        record.electric_range_km = extract_integer(raw.get(fields::ELECTRIC_RANGE))?;
        record.number_of_seats = extract_integer(raw.get(fields::SEATS))?;
        record.car_type = t.car_type(raw.get(fields::CAR_TYPE));
        record.length_mm = extract_integer(raw.get(fields::LENGTH))?;
        record.width_mm = extract_integer(raw.get(fields::WIDTH))?;
        record.height_mm = extract_integer(raw.get(fields::HEIGHT))?;
        record.load_capacity_kg = extract_integer(raw.get(fields::LOAD_CAPACITY))?;
        record.empty_weight_kg = extract_integer(raw.get(fields::EMPTY_WEIGHT))?;
        record.total_weight_kg = extract_integer(raw.get(fields::TOTAL_WEIGHT))?;

        Ok(())
    }
}

impl Default for ListingBuilder {
    fn default() -> Self {
        Self::new(Translator::new())
    }
}

// ============================================================================
// TESTS
// ============================================================================
