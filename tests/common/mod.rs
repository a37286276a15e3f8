#![allow(dead_code)]

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use splintboard::config::DataConfig;

pub const HEADER: &str = "asset_id,price_date,value_eur,release_date,issuance_value_eur,\
number_of_splints,Round indexed_at 100,asset_en,asset_de,asset_fr,category_en,category_de,\
category_fr,subcategory_en,subcategory_de,subcategory_fr,expert";

const ASSETS: [(&str, &str, &str, &str); 4] = [
    ("Daytona", "Watches", "Rolex", "ExpertA"),
    ("Nautilus", "Watches", "Patek", "ExpertB"),
    ("Guernica Print", "Art", "Prints", "ExpertA"),
    ("Banksy Rat", "Art", "Street", "ExpertC"),
];

/// One CSV line for row `i`; assets rotate and dates walk forward monthly.
pub fn csv_line(i: usize) -> String {
    let (asset, category, subcategory, expert) = ASSETS[i % ASSETS.len()];
    let month = (i / ASSETS.len()) % 12 + 1;
    let year = 10 + (i / ASSETS.len() / 12) % 90;
    format!(
        "A{},{}/1/{:02},{},1/1/10,100,1000,{},{},{},{},{},{},{},{},{},{},{}",
        i % ASSETS.len(),
        month,
        year,
        100 + i % 50,
        100 + i % 50,
        asset,
        asset,
        asset,
        category,
        category,
        category,
        subcategory,
        subcategory,
        subcategory,
        expert
    )
}

pub fn csv_with_rows(n: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..n {
        csv.push_str(&csv_line(i));
        csv.push('\n');
    }
    csv
}

pub fn write_csv(config: &DataConfig, content: &str) {
    std::fs::create_dir_all(&config.data_dir).unwrap();
    std::fs::write(config.csv_path(), content).unwrap();
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub fn gunzip(bytes: &[u8]) -> String {
    let mut out = String::new();
    GzDecoder::new(bytes).read_to_string(&mut out).unwrap();
    out
}
