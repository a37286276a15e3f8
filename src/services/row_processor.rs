use crate::models::{ProcessedRow, RawRow};
use crate::services::date_service::normalize_raw_date;

/// Derives the formatted date columns and copies the precomputed index value.
pub fn process_row(raw: RawRow) -> ProcessedRow {
    let price_date_formatted = normalize_raw_date(&raw.price_date);
    let release_date_formatted = normalize_raw_date(&raw.release_date);
    let indexed_value = raw.indexed_at_100;

    ProcessedRow {
        raw,
        price_date_formatted,
        release_date_formatted,
        indexed_value,
    }
}

pub fn process_rows(raw_rows: Vec<RawRow>) -> Vec<ProcessedRow> {
    raw_rows.into_iter().map(process_row).collect()
}
