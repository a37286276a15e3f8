use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DateRange, Dimension, FilterOptions, FilterSelection, ProcessedRow};

/// A selection compiled into hash sets, one per non-empty dimension.
struct CompiledSelection<'s> {
    sets: [Option<HashSet<&'s str>>; 4],
    date_range: DateRange,
}

impl<'s> CompiledSelection<'s> {
    fn new(selection: &'s FilterSelection) -> Self {
        let compile = |dimension: Dimension| {
            let values = selection.get(dimension);
            (!values.is_empty()).then(|| values.iter().map(String::as_str).collect())
        };
        Self {
            sets: Dimension::ALL.map(compile),
            date_range: selection.date_range,
        }
    }

    /// AND across dimensions, membership within one. `skip` ignores that
    /// dimension's own constraint.
    fn matches(&self, row: &ProcessedRow, skip: Option<Dimension>) -> bool {
        for (dimension, set) in Dimension::ALL.iter().zip(&self.sets) {
            if Some(*dimension) == skip {
                continue;
            }
            if let Some(set) = set {
                if !set.contains(dimension.value_of(row)) {
                    return false;
                }
            }
        }
        self.date_range.contains(row.price_date())
    }
}

/// Rows satisfying every non-empty dimension and the date range.
pub fn filter_rows<'a>(rows: &'a [ProcessedRow], selection: &FilterSelection) -> Vec<&'a ProcessedRow> {
    let compiled = CompiledSelection::new(selection);
    rows.iter().filter(|row| compiled.matches(row, None)).collect()
}

/// Sorted distinct values of one dimension.
pub fn unique_values<'a, I>(rows: I, dimension: Dimension) -> Vec<String>
where
    I: IntoIterator<Item = &'a ProcessedRow>,
{
    rows.into_iter()
        .map(|row| dimension.value_of(row))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// For each dimension, the values still selectable given the *other*
/// dimensions' selections. A dimension's own selection never narrows its own
/// option list, so the user can always broaden it.
pub fn cascading_options(rows: &[ProcessedRow], selection: &FilterSelection) -> FilterOptions {
    let compiled = CompiledSelection::new(selection);
    let mut options = FilterOptions::default();

    for dimension in Dimension::ALL {
        *options.get_mut(dimension) = unique_values(
            rows.iter().filter(|row| compiled.matches(row, Some(dimension))),
            dimension,
        );
    }

    options
}

/// Drops selected values that are no longer offered. Returns whether anything changed.
pub fn prune_selection(selection: &mut FilterSelection, options: &FilterOptions) -> bool {
    let mut changed = false;
    for dimension in Dimension::ALL {
        let valid: HashSet<&str> = options.get(dimension).iter().map(String::as_str).collect();
        let selected = selection.get_mut(dimension);
        let before = selected.len();
        selected.retain(|value| valid.contains(value.as_str()));
        if selected.len() != before {
            debug!("Pruned {} stale {:?} selections", before - selected.len(), dimension);
            changed = true;
        }
    }
    changed
}

/// Prunes until stable and returns the options matching the final selection.
///
/// Pruning one dimension changes the options of the others, so this repeats
/// until nothing is dropped. Selections only shrink, so the loop terminates.
pub fn resolve_selection(rows: &[ProcessedRow], selection: &mut FilterSelection) -> FilterOptions {
    loop {
        let options = cascading_options(rows, selection);
        if !prune_selection(selection, &options) {
            return options;
        }
    }
}

/// Earliest and latest formatted price dates, for date-picker limits.
pub fn date_bounds(rows: &[ProcessedRow]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = rows.iter().filter_map(ProcessedRow::price_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Owns a row collection and the selection made against it.
///
/// Every selection change is resolved immediately: options are recomputed and
/// stale selections pruned before the filtered rows are read, so readers never
/// see a result computed from pruned-away values.
#[derive(Debug, Clone)]
pub struct FilterSession {
    rows: Arc<Vec<ProcessedRow>>,
    selection: FilterSelection,
    options: FilterOptions,
}

impl FilterSession {
    pub fn new(rows: Arc<Vec<ProcessedRow>>) -> Self {
        let mut selection = FilterSelection::default();
        let options = resolve_selection(&rows, &mut selection);
        Self {
            rows,
            selection,
            options,
        }
    }

    /// Swaps in a newer row collection, e.g. after another chunk arrived.
    pub fn set_rows(&mut self, rows: Arc<Vec<ProcessedRow>>) {
        self.rows = rows;
        self.options = resolve_selection(&self.rows, &mut self.selection);
    }

    pub fn apply(&mut self, mut selection: FilterSelection) -> &FilterOptions {
        self.options = resolve_selection(&self.rows, &mut selection);
        self.selection = selection;
        &self.options
    }

    pub fn set_dimension<I, S>(&mut self, dimension: Dimension, values: I) -> &FilterOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selection = self.selection.clone().with(dimension, values);
        self.apply(selection)
    }

    pub fn set_date_range(&mut self, range: DateRange) -> &FilterOptions {
        let mut selection = self.selection.clone();
        selection.date_range = range;
        self.apply(selection)
    }

    pub fn rows(&self) -> &Arc<Vec<ProcessedRow>> {
        &self.rows
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn filtered_rows(&self) -> Vec<&ProcessedRow> {
        filter_rows(&self.rows, &self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::row;

    fn dataset() -> Vec<ProcessedRow> {
        vec![
            row("Daytona", "Watches", "Rolex", "ExpertA", "1/1/24", 100.0),
            row("Nautilus", "Watches", "Patek", "ExpertB", "2/1/24", 200.0),
            row("Guernica Print", "Art", "Prints", "ExpertA", "3/1/24", 300.0),
            row("Banksy Rat", "Art", "Street", "ExpertC", "4/1/24", 400.0),
        ]
    }

    fn assets(rows: &[&ProcessedRow]) -> Vec<String> {
        rows.iter().map(|r| r.asset().to_string()).collect()
    }

    #[test]
    fn test_empty_selection_returns_everything() {
        let rows = dataset();
        assert_eq!(filter_rows(&rows, &FilterSelection::default()).len(), 4);
    }

    #[test]
    fn test_or_within_dimension_and_across() {
        let rows = dataset();
        let selection = FilterSelection::default()
            .with(Dimension::Expert, ["ExpertA", "ExpertB"])
            .with(Dimension::Category, ["Watches"]);
        let result = filter_rows(&rows, &selection);
        assert_eq!(assets(&result), vec!["Daytona", "Nautilus"]);
    }

    #[test]
    fn test_watches_scenario_keeps_expert_options() {
        let rows = dataset();
        let selection = FilterSelection::default().with(Dimension::Category, ["Watches"]);

        let filtered = filter_rows(&rows, &selection);
        assert!(filtered.iter().all(|r| r.category() == "Watches"));

        let options = cascading_options(&rows, &selection);
        assert!(options.experts.contains(&"ExpertA".to_string()));
        assert_eq!(options.assets, vec!["Daytona", "Nautilus"]);
        // own dimension is not narrowed
        assert_eq!(options.categories, vec!["Art", "Watches"]);
    }

    #[test]
    fn test_own_selection_never_changes_own_options() {
        let rows = dataset();
        let base = FilterSelection::default().with(Dimension::Expert, ["ExpertA"]);

        for dimension in Dimension::ALL {
            let without = cascading_options(&rows, &base);
            let all_values = unique_values(&rows, dimension);
            let with = cascading_options(&rows, &base.clone().with(dimension, all_values.iter().take(1).cloned()));
            assert_eq!(without.get(dimension), with.get(dimension), "{:?}", dimension);
        }
    }

    #[test]
    fn test_prune_drops_values_no_longer_offered() {
        let rows = dataset();
        let mut selection = FilterSelection::default()
            .with(Dimension::Category, ["Art"])
            .with(Dimension::Asset, ["Daytona", "Banksy Rat"]);

        let options = resolve_selection(&rows, &mut selection);

        assert_eq!(selection.assets.iter().cloned().collect::<Vec<_>>(), vec!["Banksy Rat"]);
        for dimension in Dimension::ALL {
            for value in selection.get(dimension) {
                assert!(options.get(dimension).contains(value));
            }
        }
    }

    #[test]
    fn test_date_range_constrains_rows_and_options() {
        let rows = dataset();
        let mut selection = FilterSelection::default();
        selection.date_range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1),
            end: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        let filtered = filter_rows(&rows, &selection);
        assert_eq!(assets(&filtered), vec!["Nautilus", "Guernica Print"]);

        let options = cascading_options(&rows, &selection);
        assert_eq!(options.experts, vec!["ExpertA", "ExpertB"]);
    }

    #[test]
    fn test_date_bounds() {
        let rows = dataset();
        let (lo, hi) = date_bounds(&rows).unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(date_bounds(&[]).is_none());
    }

    #[test]
    fn test_session_prunes_on_narrowing() {
        let mut session = FilterSession::new(Arc::new(dataset()));
        session.set_dimension(Dimension::Asset, ["Daytona", "Guernica Print"]);
        assert_eq!(session.selection().assets.len(), 2);

        session.set_dimension(Dimension::Category, ["Art"]);
        assert_eq!(
            session.selection().assets.iter().cloned().collect::<Vec<_>>(),
            vec!["Guernica Print"]
        );
        assert_eq!(session.filtered_rows().len(), 1);
    }

    #[test]
    fn test_session_tracks_new_rows() {
        let mut rows = dataset();
        let mut session = FilterSession::new(Arc::new(rows[..2].to_vec()));
        assert_eq!(session.options().categories, vec!["Watches"]);

        rows.push(row("Warhol Soup", "Art", "Prints", "ExpertD", "5/1/24", 1.0));
        session.set_rows(Arc::new(rows));
        assert_eq!(session.options().categories, vec!["Art", "Watches"]);
    }
}
