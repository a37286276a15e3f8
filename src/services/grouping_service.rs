use crate::models::{GroupedSeries, ProcessedRow};

/// Buckets rows by `asset_en` and sorts each bucket chronologically.
///
/// The sort is stable, so rows sharing a date keep their input order. Rows
/// whose price date is null sort before every dated row.
pub fn group_by_asset<'a, I>(rows: I) -> GroupedSeries
where
    I: IntoIterator<Item = &'a ProcessedRow>,
{
    let mut grouped = GroupedSeries::new();
    for row in rows {
        grouped
            .entry(row.asset().to_string())
            .or_default()
            .push(row.clone());
    }

    for series in grouped.values_mut() {
        sort_chronologically(series);
    }

    grouped
}

/// Stable sort on the parsed price date, nulls first.
pub fn sort_chronologically(series: &mut [ProcessedRow]) {
    series.sort_by_key(|row| row.price_date());
}
