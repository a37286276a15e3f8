use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column holding the precomputed "indexed to 100 at release" value.
pub const INDEXED_COLUMN: &str = "Round indexed_at 100";

/// A raw date cell, as found in whichever ingestion path produced the row.
///
/// The offline export writes `MM/DD/YY` strings, the client-side CSV fallback
/// reads spreadsheet serial day numbers. Serialized untagged so the JSON
/// artifacts carry a plain number or a plain string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Serial(f64),
    Text(String),
}

impl Default for RawDate {
    fn default() -> Self {
        RawDate::Text(String::new())
    }
}

/// One CSV line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub asset_id: String,
    pub price_date: RawDate,
    pub value_eur: f64,
    pub release_date: RawDate,
    pub issuance_value_eur: f64,
    pub number_of_splints: f64,
    #[serde(rename = "Round indexed_at 100")]
    pub indexed_at_100: f64,
    pub asset_en: String,
    pub asset_de: String,
    pub asset_fr: String,
    pub category_en: String,
    pub category_de: String,
    pub category_fr: String,
    pub subcategory_en: String,
    pub subcategory_de: String,
    pub subcategory_fr: String,
    pub expert: String,
}

/// A raw row plus its derived columns.
///
/// Field names are part of the artifact contract: chunk files, the metadata
/// file and the full-data file all carry rows in exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRow {
    #[serde(flatten)]
    pub raw: RawRow,
    pub price_date_formatted: Option<String>,
    pub release_date_formatted: Option<String>,
    pub indexed_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
}

impl ProcessedRow {
    pub fn asset(&self) -> &str {
        &self.raw.asset_en
    }

    pub fn category(&self) -> &str {
        &self.raw.category_en
    }

    pub fn subcategory(&self) -> &str {
        &self.raw.subcategory_en
    }

    pub fn expert(&self) -> &str {
        &self.raw.expert
    }

    /// Parsed `price_date_formatted`; `None` when the raw date was unparseable.
    pub fn price_date(&self) -> Option<NaiveDate> {
        self.price_date_formatted
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn asset_name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.raw.asset_en,
            Language::De => &self.raw.asset_de,
            Language::Fr => &self.raw.asset_fr,
        }
    }

    pub fn category_name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.raw.category_en,
            Language::De => &self.raw.category_de,
            Language::Fr => &self.raw.category_fr,
        }
    }

    pub fn subcategory_name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.raw.subcategory_en,
            Language::De => &self.raw.subcategory_de,
            Language::Fr => &self.raw.subcategory_fr,
        }
    }
}
