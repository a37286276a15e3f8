use crate::models::{ProcessedRow, RawDate, RawRow};
use crate::services::row_processor::process_row;

/// Builds a processed row from the fields the engine keys on.
pub fn row(asset: &str, category: &str, subcategory: &str, expert: &str, date: &str, value: f64) -> ProcessedRow {
    process_row(RawRow {
        asset_id: format!("id-{asset}"),
        price_date: RawDate::Text(date.to_string()),
        value_eur: value,
        release_date: RawDate::Text("1/1/21".to_string()),
        issuance_value_eur: 50.0,
        number_of_splints: 1000.0,
        indexed_at_100: value * 2.0,
        asset_en: asset.to_string(),
        asset_de: asset.to_string(),
        asset_fr: asset.to_string(),
        category_en: category.to_string(),
        category_de: category.to_string(),
        category_fr: category.to_string(),
        subcategory_en: subcategory.to_string(),
        subcategory_de: subcategory.to_string(),
        subcategory_fr: subcategory.to_string(),
        expert: expert.to_string(),
    })
}
