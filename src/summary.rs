use crate::{config::RankField, filter::FilteredItem};
use serde::Serialize;

/// Percentiles of a ranking field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub p10: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub max: f64,
    pub samples: usize,
}

impl Summary {
    /// Create a summary out of values sorted from the highest to the lowest.
    ///
    /// Uses the nearest rank: percentile `p` is the value at `floor((100 - p) / 100 * n)`.
    pub fn from_descending(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len();
        let at = |percentile: f64| {
            let index = ((100.0 - percentile) / 100.0 * n as f64).floor() as usize;
            values[index.min(n - 1)]
        };

        Self {
            min: at(0.0),
            p10: at(10.0),
            p25: at(25.0),
            median: at(50.0),
            p75: at(75.0),
            p90: at(90.0),
            max: at(100.0),
            samples: n,
        }
    }
}

/// Summarize the ranking field of items already sorted by it, highest first.
pub fn summarize(items: &[FilteredItem], field: RankField) -> Summary {
    let values: Vec<f64> = items.iter().map(|item| field.value(&item.stats)).collect();
    Summary::from_descending(&values)
}
