use std::collections::HashMap;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::models::{RawDate, RawRow, INDEXED_COLUMN};
use crate::services::date_service::DateEncoding;

/// Rows parsed from one CSV document plus what was thrown away.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub rows: Vec<RawRow>,
    /// Non-blank data lines whose field count did not match the header.
    pub dropped: usize,
    /// Non-blank data lines seen after the header.
    pub data_lines: usize,
}

/// Strips whitespace and every quote character left in the field.
fn clean(s: &str) -> String {
    s.replace('"', "").trim().to_string()
}

/// Numeric cell: a finite float, or 0 when it does not parse.
fn parse_number(s: &str) -> f64 {
    match clean(s).parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (clean(h), i))
            .collect();
        Self { positions }
    }

    fn text(&self, record: &StringRecord, column: &str) -> String {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .map(clean)
            .unwrap_or_default()
    }

    fn number(&self, record: &StringRecord, column: &str) -> f64 {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .map(parse_number)
            .unwrap_or(0.0)
    }

    fn date(&self, record: &StringRecord, column: &str, encoding: DateEncoding) -> RawDate {
        match encoding {
            DateEncoding::SlashString => RawDate::Text(self.text(record, column)),
            DateEncoding::ExcelSerial => RawDate::Serial(self.number(record, column)),
        }
    }

    fn row(&self, record: &StringRecord, encoding: DateEncoding) -> RawRow {
        RawRow {
            asset_id: self.text(record, "asset_id"),
            price_date: self.date(record, "price_date", encoding),
            value_eur: self.number(record, "value_eur"),
            release_date: self.date(record, "release_date", encoding),
            issuance_value_eur: self.number(record, "issuance_value_eur"),
            number_of_splints: self.number(record, "number_of_splints"),
            indexed_at_100: self.number(record, INDEXED_COLUMN),
            asset_en: self.text(record, "asset_en"),
            asset_de: self.text(record, "asset_de"),
            asset_fr: self.text(record, "asset_fr"),
            category_en: self.text(record, "category_en"),
            category_de: self.text(record, "category_de"),
            category_fr: self.text(record, "category_fr"),
            subcategory_en: self.text(record, "subcategory_en"),
            subcategory_de: self.text(record, "subcategory_de"),
            subcategory_fr: self.text(record, "subcategory_fr"),
            expert: self.text(record, "expert"),
        }
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty()) && record.len() <= 1
}

/// Parses CSV text into raw rows, preserving input order.
///
/// The first line is the header. Data lines whose field count differs from
/// the header's are dropped and counted, never reported as errors. Date
/// columns are read according to `encoding`.
pub fn ingest_csv(content: &str, encoding: DateEncoding) -> Result<IngestReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let columns = ColumnMap::new(&headers);
    let expected = headers.len();

    let mut report = IngestReport::default();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV line {}", line_num + 2))?;
        if is_blank(&record) {
            continue;
        }
        report.data_lines += 1;

        if record.len() != expected {
            debug!(
                "Dropping CSV line {}: {} fields, header has {}",
                line_num + 2,
                record.len(),
                expected
            );
            report.dropped += 1;
            continue;
        }

        report.rows.push(columns.row(&record, encoding));
    }

    info!(
        "Parsed {} rows ({} dropped of {} data lines)",
        report.rows.len(),
        report.dropped,
        report.data_lines
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "asset_id,price_date,value_eur,release_date,issuance_value_eur,number_of_splints,Round indexed_at 100,asset_en,asset_de,asset_fr,category_en,category_de,category_fr,subcategory_en,subcategory_de,subcategory_fr,expert";

    fn line(asset: &str, date: &str, value: &str) -> String {
        format!(
            "A1,{date},{value},1/1/21,50,1000,110.5,\"{asset}\",\"{asset}\",\"{asset}\",Watches,Uhren,Montres,Rolex,Rolex,Rolex,ExpertA"
        )
    }

    #[test]
    fn test_parses_rows_in_order() {
        let csv = format!("{}\n{}\n{}\n", HEADER, line("Daytona", "1/15/24", "55.5"), line("Submariner", "2/15/24", "60"));
        let report = ingest_csv(&csv, DateEncoding::SlashString).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].asset_en, "Daytona");
        assert_eq!(report.rows[1].asset_en, "Submariner");
        assert_eq!(report.rows[0].value_eur, 55.5);
        assert_eq!(report.rows[0].indexed_at_100, 110.5);
        assert_eq!(report.rows[0].price_date, RawDate::Text("1/15/24".to_string()));
    }

    #[test]
    fn test_quoted_commas_stay_in_one_field() {
        let csv = format!("{}\n{}\n", HEADER, line("Nautilus, 5711", "1/15/24", "10"));
        let report = ingest_csv(&csv, DateEncoding::SlashString).unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].asset_en, "Nautilus, 5711");
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_escaped_quotes_are_stripped() {
        let csv = "asset_id,price_date,asset_en\nA1,1/1/24,\"x \"\"y\"\" z\"\n";
        let report = ingest_csv(csv, DateEncoding::SlashString).unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].asset_en, "x y z");
    }

    #[test]
    fn test_quotes_inside_unquoted_field_do_not_protect_commas() {
        // `ab"c,d"e` is two unquoted fields, so the line has one field too many
        let csv = "asset_id,asset_en,value_eur\n1,ab\"c,d\"e,3\n1,\"x \"\"y\"\" z\",3\n";
        let report = ingest_csv(csv, DateEncoding::SlashString).unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.rows[0].asset_en, "x y z");
    }

    #[test]
    fn test_mismatched_lines_dropped_and_counted() {
        let csv = format!(
            "{}\n{}\n\nshort,line\n{}\n",
            HEADER,
            line("Daytona", "1/15/24", "1"),
            line("Submariner", "2/15/24", "2")
        );
        let report = ingest_csv(&csv, DateEncoding::SlashString).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.data_lines, report.rows.len() + report.dropped);
    }

    #[test]
    fn test_bad_numbers_default_to_zero() {
        let csv = format!("{}\n{}\n", HEADER, line("Daytona", "1/15/24", "n/a"));
        let report = ingest_csv(&csv, DateEncoding::SlashString).unwrap();
        assert_eq!(report.rows[0].value_eur, 0.0);
    }

    #[test]
    fn test_serial_encoding_parses_date_columns_as_numbers() {
        let csv = format!("{}\n{}\n", HEADER, line("Daytona", "44927", "1"));
        let report = ingest_csv(&csv, DateEncoding::ExcelSerial).unwrap();
        assert_eq!(report.rows[0].price_date, RawDate::Serial(44927.0));
        // "1/1/21" is not a number
        assert_eq!(report.rows[0].release_date, RawDate::Serial(0.0));
    }

    #[test]
    fn test_header_only_and_empty_input() {
        let report = ingest_csv(HEADER, DateEncoding::SlashString).unwrap();
        assert!(report.rows.is_empty());

        let report = ingest_csv("", DateEncoding::SlashString).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.data_lines, 0);
    }
}
