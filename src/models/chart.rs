use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One plotted point. `sequence_index` is the 1-based position in the
/// downsampled series, not a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub sequence_index: usize,
    pub value: f64,
    pub raw_value_eur: f64,
    pub raw_indexed_value: f64,
}

/// A labelled series ready for the chart widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Arc<Vec<ChartPoint>>,
}
