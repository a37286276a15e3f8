use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::models::{ChartPoint, ChartSeries, ProcessedRow};
use crate::services::grouping_service::group_by_asset;

pub const DEFAULT_MAX_POINTS: usize = 100;
pub const DEFAULT_CACHE_CAPACITY: usize = 50;
/// Number of series drawn when the user has not picked any asset.
pub const DEFAULT_SERIES_COUNT: usize = 5;

/// Indices kept by the stride sample: `0, step, 2*step, ...` with
/// `step = ceil(len / max_points)`. Everything is kept when `len <= max_points`.
pub fn downsample_indices(len: usize, max_points: usize) -> Vec<usize> {
    if max_points == 0 || len <= max_points {
        return (0..len).collect();
    }
    let step = len.div_ceil(max_points);
    (0..len).step_by(step).collect()
}

/// Builds the plotted points for one chronologically sorted series.
///
/// `value` is the indexed value or the EUR value depending on `show_indexed`;
/// both raw values are always carried along.
pub fn build_chart_points(series: &[ProcessedRow], show_indexed: bool, max_points: usize) -> Vec<ChartPoint> {
    downsample_indices(series.len(), max_points)
        .into_iter()
        .enumerate()
        .map(|(position, index)| {
            let row = &series[index];
            ChartPoint {
                sequence_index: position + 1,
                value: if show_indexed {
                    row.indexed_value
                } else {
                    row.raw.value_eur
                },
                raw_value_eur: row.raw.value_eur,
                raw_indexed_value: row.indexed_value,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartCacheKey {
    pub series: String,
    pub len: usize,
    /// First and last dates of the series; a shifted date window keeps
    /// the length but moves these.
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub show_indexed: bool,
    pub max_points: usize,
}

/// Session-scoped memo of built chart series.
///
/// Eviction is deliberately coarse: once the entry count passes `capacity`
/// the whole map is cleared, there is no LRU ordering.
#[derive(Clone)]
pub struct ChartCache {
    entries: Arc<Mutex<HashMap<ChartCacheKey, Arc<Vec<ChartPoint>>>>>,
    capacity: usize,
}

impl Default for ChartCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ChartCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    pub fn get_or_build(
        &self,
        series_name: &str,
        series: &[ProcessedRow],
        show_indexed: bool,
        max_points: usize,
    ) -> Arc<Vec<ChartPoint>> {
        let key = ChartCacheKey {
            series: series_name.to_string(),
            len: series.len(),
            first_date: series.first().and_then(|r| r.price_date_formatted.clone()),
            last_date: series.last().and_then(|r| r.price_date_formatted.clone()),
            show_indexed,
            max_points,
        };

        if let Some(hit) = self.entries.lock().get(&key) {
            return hit.clone();
        }

        let points = Arc::new(build_chart_points(series, show_indexed, max_points));

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            debug!("Chart cache reached {} entries, clearing", entries.len());
            entries.clear();
        }
        entries.insert(key, points.clone());
        points
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One labelled series per asset in the filtered rows.
///
/// Selected assets that actually occur are drawn in name order; with no
/// selection the first [`DEFAULT_SERIES_COUNT`] assets by name are drawn.
pub fn build_datasets(
    filtered: &[&ProcessedRow],
    selected_assets: &BTreeSet<String>,
    show_indexed: bool,
    max_points: usize,
    cache: &ChartCache,
) -> Vec<ChartSeries> {
    let grouped = group_by_asset(filtered.iter().copied());

    let labels: Vec<&String> = if selected_assets.is_empty() {
        grouped.keys().take(DEFAULT_SERIES_COUNT).collect()
    } else {
        selected_assets
            .iter()
            .filter(|asset| grouped.contains_key(*asset))
            .collect()
    };

    labels
        .into_iter()
        .map(|label| ChartSeries {
            label: label.clone(),
            points: cache.get_or_build(label, &grouped[label], show_indexed, max_points),
        })
        .collect()
}
