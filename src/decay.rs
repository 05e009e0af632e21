use serde::{Deserialize, Serialize};

/// A logistic curve scaling a score by the rank position of its item.
///
/// The first position keeps the full score and the last one keeps `max_decay` of it. `base` places
/// the inflection point as a fraction of the ranking and `steepness` controls how sharp the drop
/// around it is; a steepness of (almost) zero degrades into a straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayCurve {
    pub base: f64,
    pub steepness: f64,
    pub max_decay: f64,
}

impl Default for DecayCurve {
    fn default() -> Self {
        Self {
            base: 0.5,
            steepness: 10.0,
            max_decay: 0.25,
        }
    }
}

impl DecayCurve {
    const FLAT_STEEPNESS: f64 = 1e-6;

    pub const fn new(base: f64, steepness: f64, max_decay: f64) -> Self {
        Self {
            base,
            steepness,
            max_decay,
        }
    }

    /// The factor applied at `index` in a ranking of `count` items.
    pub fn factor(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return 1.0;
        }

        let x = index.min(count - 1) as f64 / (count - 1) as f64;
        let normalized = if self.steepness.abs() < Self::FLAT_STEEPNESS {
            1.0 - x
        } else {
            let (first, last) = (self.logistic(0.0), self.logistic(1.0));
            (self.logistic(x) - last) / (first - last)
        };
        self.max_decay + (1.0 - self.max_decay) * normalized
    }

    #[inline]
    fn logistic(&self, x: f64) -> f64 {
        1.0 / (1.0 + (self.steepness * (x - self.base)).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn keep_the_full_score_at_the_top() {
        assert!((DecayCurve::default().factor(0, 100) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn keep_the_max_decay_at_the_bottom() {
        let curve = DecayCurve::new(0.3, 8.0, 0.1);

        assert!((curve.factor(99, 100) - 0.1).abs() < EPSILON);
    }

    #[test]
    fn do_not_decay_a_single_item() {
        assert_eq!(1.0, DecayCurve::default().factor(0, 1));
        assert_eq!(1.0, DecayCurve::default().factor(0, 0));
    }

    #[test]
    fn the_inflection_point_sits_at_the_base() {
        let curve = DecayCurve::new(0.5, 10.0, 0.0);

        assert!((curve.factor(50, 101) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn a_flat_curve_is_linear() {
        let curve = DecayCurve::new(0.5, 0.0, 0.0);

        assert!((curve.factor(25, 101) - 0.75).abs() < EPSILON);
    }

    proptest! {
        #[test]
        fn decay_never_increases_down_the_ranking(
            base in 0.0f64..1.0,
            steepness in 0.0f64..20.0,
            max_decay in 0.0f64..1.0,
            count in 2usize..200,
        ) {
            let curve = DecayCurve::new(base, steepness, max_decay);
            let factors: Vec<f64> = (0..count).map(|i| curve.factor(i, count)).collect();

            for pair in factors.windows(2) {
                prop_assert!(pair[1] <= pair[0] + EPSILON);
            }
            prop_assert!(factors.iter().all(|f| *f >= max_decay - EPSILON && *f <= 1.0 + EPSILON));
        }
    }
}
