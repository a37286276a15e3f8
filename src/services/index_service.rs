use std::collections::BTreeSet;

use crate::models::{IndexVocabulary, ProcessedRow};

/// Scans the rows once and returns the four filter vocabularies, each sorted
/// ascending with duplicates removed.
pub fn build_indexes(rows: &[ProcessedRow]) -> IndexVocabulary {
    let mut categories = BTreeSet::new();
    let mut subcategories = BTreeSet::new();
    let mut experts = BTreeSet::new();
    let mut assets = BTreeSet::new();

    for row in rows {
        categories.insert(row.category());
        subcategories.insert(row.subcategory());
        experts.insert(row.expert());
        assets.insert(row.asset());
    }

    fn to_vec(set: BTreeSet<&str>) -> Vec<String> {
        set.into_iter().map(str::to_string).collect()
    }

    IndexVocabulary {
        categories: to_vec(categories),
        subcategories: to_vec(subcategories),
        experts: to_vec(experts),
        assets: to_vec(assets),
    }
}
