use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The number of items to mark on each side: `floor(population ^ exponent / divisor)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkTarget {
    pub exponent: f64,
    pub divisor: f64,
}

impl Default for MarkTarget {
    fn default() -> Self {
        Self {
            exponent: 0.5,
            divisor: 1.0,
        }
    }
}

impl MarkTarget {
    pub const fn new(exponent: f64, divisor: f64) -> Self {
        Self { exponent, divisor }
    }

    pub fn count(&self, population: usize) -> usize {
        if population == 0 || self.divisor <= 0.0 {
            return 0;
        }
        let count = ((population as f64).powf(self.exponent) / self.divisor).floor();
        if count.is_finite() && count > 0.0 {
            (count as usize).min(population)
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkSide {
    Above,
    Below,
}

/// The scores at and beyond which an item is significant on one dimension.
///
/// An infinite threshold marks nothing on its side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkThresholds {
    pub above: f64,
    pub below: f64,
}

impl Default for MarkThresholds {
    fn default() -> Self {
        Self {
            above: f64::INFINITY,
            below: f64::NEG_INFINITY,
        }
    }
}

impl MarkThresholds {
    /// Find the thresholds marking at most `count` scores on each side of zero.
    ///
    /// Only strictly positive scores can be marked above and strictly negative ones below, so a
    /// population with fewer than `count` of them marks all it has.
    pub fn derive(scores: &[f64], count: usize) -> Self {
        let sorted = scores
            .iter()
            .copied()
            .filter(|score| !score.is_nan())
            .sorted_by(f64::total_cmp)
            .collect_vec();
        let population = sorted.len();

        let mut above = count.min(population);
        while above > 0 && sorted[population - above] <= 0.0 {
            above -= 1;
        }
        let mut below = count.min(population);
        while below > 0 && sorted[below - 1] >= 0.0 {
            below -= 1;
        }

        Self {
            above: if above > 0 {
                sorted[population - above]
            } else {
                f64::INFINITY
            },
            below: if below > 0 {
                sorted[below - 1]
            } else {
                f64::NEG_INFINITY
            },
        }
    }

    pub fn mark(&self, score: f64) -> Option<MarkSide> {
        if score >= self.above {
            Some(MarkSide::Above)
        } else if score <= self.below {
            Some(MarkSide::Below)
        } else {
            None
        }
    }
}
