use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::ProcessedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Asset,
    Category,
    Expert,
    PriceDate,
    Value,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Percentage change from issuance to current value; `None` without an issuance value.
pub fn performance_pct(row: &ProcessedRow) -> Option<f64> {
    let issuance = row.raw.issuance_value_eur;
    if issuance == 0.0 {
        return None;
    }
    Some((row.raw.value_eur - issuance) / issuance * 100.0)
}

/// Keeps rows of the selected assets; an empty selection keeps everything.
pub fn restrict_to_assets<'a>(rows: &[&'a ProcessedRow], selected: &BTreeSet<String>) -> Vec<&'a ProcessedRow> {
    rows.iter()
        .copied()
        .filter(|row| selected.is_empty() || selected.contains(row.asset()))
        .collect()
}

/// Case-insensitive substring match on asset, category, subcategory and expert.
pub fn search_rows<'a>(rows: &[&'a ProcessedRow], term: &str) -> Vec<&'a ProcessedRow> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .copied()
        .filter(|row| {
            [row.asset(), row.category(), row.subcategory(), row.expert()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

fn compare_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// Stable sort; missing dates and performances sort first ascending.
pub fn sort_rows(rows: &mut [&ProcessedRow], column: SortColumn, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = match column {
            SortColumn::Asset => a.asset().cmp(b.asset()),
            SortColumn::Category => a.category().cmp(b.category()),
            SortColumn::Expert => a.expert().cmp(b.expert()),
            SortColumn::PriceDate => a.price_date().cmp(&b.price_date()),
            SortColumn::Value => a.raw.value_eur.total_cmp(&b.raw.value_eur),
            SortColumn::Performance => compare_f64(performance_pct(a), performance_pct(b)),
        };
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::row;

    #[test]
    fn test_performance_pct() {
        let mut r = row("Daytona", "Watches", "Rolex", "ExpertA", "1/1/24", 75.0);
        assert_eq!(performance_pct(&r), Some(50.0));
        r.raw.issuance_value_eur = 0.0;
        assert_eq!(performance_pct(&r), None);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let rows = vec![
            row("Daytona", "Watches", "Rolex", "ExpertA", "1/1/24", 1.0),
            row("Guernica Print", "Art", "Prints", "Jane Doe", "1/1/24", 1.0),
        ];
        let refs: Vec<&ProcessedRow> = rows.iter().collect();

        assert_eq!(search_rows(&refs, "rolex").len(), 1);
        assert_eq!(search_rows(&refs, "JANE")[0].asset(), "Guernica Print");
        assert_eq!(search_rows(&refs, "").len(), 2);
        assert!(search_rows(&refs, "bitcoin").is_empty());
    }

    #[test]
    fn test_restrict_to_assets() {
        let rows = vec![
            row("Daytona", "Watches", "Rolex", "ExpertA", "1/1/24", 1.0),
            row("Nautilus", "Watches", "Patek", "ExpertA", "1/1/24", 1.0),
        ];
        let refs: Vec<&ProcessedRow> = rows.iter().collect();
        let selected: BTreeSet<String> = ["Nautilus".to_string()].into();
        assert_eq!(restrict_to_assets(&refs, &selected).len(), 1);
        assert_eq!(restrict_to_assets(&refs, &BTreeSet::new()).len(), 2);
    }

    #[test]
    fn test_sort_by_value_desc_and_date() {
        let rows = vec![
            row("A", "Watches", "Rolex", "ExpertA", "3/1/24", 10.0),
            row("B", "Watches", "Rolex", "ExpertA", "1/1/24", 30.0),
            row("C", "Watches", "Rolex", "ExpertA", "bad", 20.0),
        ];
        let mut refs: Vec<&ProcessedRow> = rows.iter().collect();

        sort_rows(&mut refs, SortColumn::Value, SortDirection::Desc);
        let order: Vec<&str> = refs.iter().map(|r| r.asset()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);

        sort_rows(&mut refs, SortColumn::PriceDate, SortDirection::Asc);
        let order: Vec<&str> = refs.iter().map(|r| r.asset()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }
}
