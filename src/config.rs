use crate::{decay::DecayCurve, item::Stats, marks::MarkTarget};
use serde::{Deserialize, Deserializer, Serialize};

/// How strictly the counters of an item are validated before filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strictness {
    /// Every counter is a non-negative integer.
    #[default]
    NonNegative,
    /// Additionally `downloads >= month >= week`.
    Monotonic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub strictness: Strictness,
}

/// Which lifetime and month counters the rates are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatsWindow {
    /// Lifetime and 30-day counters.
    #[default]
    All,
    /// Lifetime minus the last month, and the 23 days before the last week.
    Old,
}

impl StatsWindow {
    #[inline]
    pub fn lifetime_ratio(&self, stats: &Stats) -> f64 {
        match self {
            Self::All => stats.ratio_all,
            Self::Old => stats.ratio_old,
        }
    }

    #[inline]
    pub fn month_ratio(&self, stats: &Stats) -> f64 {
        match self {
            Self::All => stats.ratio_30,
            Self::Old => stats.ratio_23,
        }
    }
}

/// The field items are ranked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankField {
    Downloads,
    Old,
    Month,
    Month23,
    Week,
    Favorites,
    #[default]
    RatioAll,
    RatioOld,
    Ratio30,
    Ratio23,
    Ratio7,
}

impl RankField {
    pub fn value(&self, stats: &Stats) -> f64 {
        match self {
            Self::Downloads => stats.views_all,
            Self::Old => stats.views_old,
            Self::Month => stats.views_30,
            Self::Month23 => stats.views_23,
            Self::Week => stats.views_7,
            Self::Favorites => stats.favorites as f64,
            Self::RatioAll => stats.ratio_all,
            Self::RatioOld => stats.ratio_old,
            Self::Ratio30 => stats.ratio_30,
            Self::Ratio23 => stats.ratio_23,
            Self::Ratio7 => stats.ratio_7,
        }
    }
}

/// The tuning of one change dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionConfig {
    pub decay: DecayCurve,
    pub target: MarkTarget,
}

impl DimensionConfig {
    pub const HORIZONTAL: Self =
        Self::new(DecayCurve::new(0.5, 10.0, 0.25), MarkTarget::new(0.6, 2.0));
    pub const VERTICAL: Self =
        Self::new(DecayCurve::new(0.5, 10.0, 0.25), MarkTarget::new(0.6, 2.0));
    pub const RANK: Self = Self::new(DecayCurve::new(0.3, 8.0, 0.1), MarkTarget::new(0.5, 1.0));
    pub const MOOD: Self = Self::new(DecayCurve::new(0.5, 6.0, 0.5), MarkTarget::new(0.5, 1.0));

    pub const fn new(decay: DecayCurve, target: MarkTarget) -> Self {
        Self { decay, target }
    }

    /// Replace the fields given in a configuration file, keeping the others.
    fn overlay(self, given: DimensionOverride) -> Self {
        let (decay, target) = (given.decay, given.target);
        Self {
            decay: DecayCurve {
                base: decay.base.unwrap_or(self.decay.base),
                steepness: decay.steepness.unwrap_or(self.decay.steepness),
                max_decay: decay.max_decay.unwrap_or(self.decay.max_decay),
            },
            target: MarkTarget {
                exponent: target.exponent.unwrap_or(self.target.exponent),
                divisor: target.divisor.unwrap_or(self.target.divisor),
            },
        }
    }
}

/// A dimension as written in a configuration file, where every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DimensionOverride {
    decay: DecayOverride,
    target: TargetOverride,
}

#[derive(Debug, Default, Deserialize)]
struct DecayOverride {
    base: Option<f64>,
    steepness: Option<f64>,
    max_decay: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct TargetOverride {
    exponent: Option<f64>,
    divisor: Option<f64>,
}

fn overlay_dimension<'de, D>(
    deserializer: D,
    defaults: DimensionConfig,
) -> Result<DimensionConfig, D::Error>
where
    D: Deserializer<'de>,
{
    DimensionOverride::deserialize(deserializer).map(|given| defaults.overlay(given))
}

fn horizontal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DimensionConfig, D::Error> {
    overlay_dimension(deserializer, DimensionConfig::HORIZONTAL)
}

fn vertical<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DimensionConfig, D::Error> {
    overlay_dimension(deserializer, DimensionConfig::VERTICAL)
}

fn rank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DimensionConfig, D::Error> {
    overlay_dimension(deserializer, DimensionConfig::RANK)
}

fn mood<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DimensionConfig, D::Error> {
    overlay_dimension(deserializer, DimensionConfig::MOOD)
}

/// One step of the mood ladder: a rate change counts when the larger rate is at least `ratio`
/// times the smaller one and they differ by more than `diff` views per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodStep {
    pub ratio: f64,
    pub diff: f64,
}

impl MoodStep {
    pub const fn new(ratio: f64, diff: f64) -> Self {
        Self { ratio, diff }
    }
}

pub const DEFAULT_MOOD_LADDER: [MoodStep; 6] = [
    MoodStep::new(1.05, 0.05),
    MoodStep::new(1.25, 0.25),
    MoodStep::new(1.5, 0.5),
    MoodStep::new(2.0, 1.0),
    MoodStep::new(4.0, 2.0),
    MoodStep::new(8.0, 4.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub rank_field: RankField,
    pub window: StatsWindow,
    /// A partial dimension keeps the defaults of that dimension for the fields it leaves out.
    #[serde(deserialize_with = "horizontal")]
    pub horizontal: DimensionConfig,
    #[serde(deserialize_with = "vertical")]
    pub vertical: DimensionConfig,
    #[serde(deserialize_with = "rank")]
    pub rank: DimensionConfig,
    #[serde(deserialize_with = "mood")]
    pub mood: DimensionConfig,
    pub mood_ladder: Vec<MoodStep>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            rank_field: RankField::default(),
            window: StatsWindow::default(),
            horizontal: DimensionConfig::HORIZONTAL,
            vertical: DimensionConfig::VERTICAL,
            rank: DimensionConfig::RANK,
            mood: DimensionConfig::MOOD,
            mood_ladder: DEFAULT_MOOD_LADDER.to_vec(),
        }
    }
}
