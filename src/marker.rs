use crate::{
    config::{DimensionConfig, MarkerConfig, RankField},
    filter::FilteredItem,
    marks::{MarkSide, MarkThresholds},
    mood::Moods,
    numeric::RankEnd,
    pairs::rank_order,
};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Sort items by the ranking field, highest first.
///
/// NaN values go last and ties are broken by identifier, so the order is fully determined.
pub fn sort_by_rank(items: &mut [FilteredItem], field: RankField) {
    items.sort_by(|a, b| {
        rank_order(field.value(&a.stats), field.value(&b.stats), RankEnd::Top)
            .then_with(|| a.identifier().cmp(b.identifier()))
    });
}

/// Which snapshots an identifier is found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presence {
    PrevOnly,
    CurrOnly,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Change of the ranking field between the snapshots.
    Horizontal,
    /// Lifetime rate against the last week's rate, in the current snapshot.
    Vertical,
    /// Positions gained in the ranking.
    Rank,
    /// Agreement of the lifetime, month and week rate changes.
    Mood,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Self::Horizontal, Self::Vertical, Self::Rank, Self::Mood];
}

/// Per-dimension values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerDimension<T> {
    pub horizontal: T,
    pub vertical: T,
    pub rank: T,
    pub mood: T,
}

impl<T: Copy> PerDimension<T> {
    pub fn get(&self, dimension: Dimension) -> T {
        match dimension {
            Dimension::Horizontal => self.horizontal,
            Dimension::Vertical => self.vertical,
            Dimension::Rank => self.rank,
            Dimension::Mood => self.mood,
        }
    }

    fn from_fn<F: FnMut(Dimension) -> T>(mut f: F) -> Self {
        Self {
            horizontal: f(Dimension::Horizontal),
            vertical: f(Dimension::Vertical),
            rank: f(Dimension::Rank),
            mood: f(Dimension::Mood),
        }
    }
}

pub type Scores = PerDimension<f64>;
pub type Marks = PerDimension<Option<MarkSide>>;
pub type Thresholds = PerDimension<MarkThresholds>;

impl MarkerConfig {
    fn dimension(&self, dimension: Dimension) -> &DimensionConfig {
        match dimension {
            Dimension::Horizontal => &self.horizontal,
            Dimension::Vertical => &self.vertical,
            Dimension::Rank => &self.rank,
            Dimension::Mood => &self.mood,
        }
    }
}

/// An identifier of either snapshot with its change scores and marks.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedItem<'a> {
    pub identifier: &'a str,
    pub presence: Presence,
    pub prev: Option<FilteredItem<'a>>,
    pub curr: Option<FilteredItem<'a>>,
    pub prev_rank: Option<usize>,
    pub curr_rank: Option<usize>,
    pub moods: Moods,
    /// Scores after the position decay.
    pub scores: Scores,
    pub marks: Marks,
}

impl MarkedItem<'_> {
    pub fn is_marked(&self) -> bool {
        Dimension::ALL
            .iter()
            .any(|dimension| self.marks.get(*dimension).is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkReport<'a> {
    /// The current ranking followed by the items found in the previous snapshot only.
    pub items: Vec<MarkedItem<'a>>,
    pub thresholds: Thresholds,
}

impl<'a> MarkReport<'a> {
    pub fn marked(&self) -> impl Iterator<Item = &MarkedItem<'a>> {
        self.items.iter().filter(|item| item.is_marked())
    }
}

#[inline]
fn finite_or_zero(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn raw_scores(
    prev: Option<(&FilteredItem, usize)>,
    curr: Option<(&FilteredItem, usize)>,
    moods: &Moods,
    config: &MarkerConfig,
) -> Scores {
    let field = config.rank_field;
    let horizontal = match (prev, curr) {
        (Some((prev, _)), Some((curr, _))) => {
            (field.value(&curr.stats) / field.value(&prev.stats)).ln()
        }
        _ => 0.0,
    };
    let vertical = match curr {
        Some((curr, _)) => (config.window.lifetime_ratio(&curr.stats) / curr.stats.ratio_7).ln(),
        None => 0.0,
    };
    let rank = match (prev, curr) {
        (Some((_, prev_rank)), Some((_, curr_rank))) => prev_rank as f64 - curr_rank as f64,
        _ => 0.0,
    };
    let mood = match (prev, curr) {
        (Some(_), Some(_)) => moods.score(),
        _ => 0.0,
    };

    Scores {
        horizontal: finite_or_zero(horizontal),
        vertical: finite_or_zero(vertical),
        rank: finite_or_zero(rank),
        mood: finite_or_zero(mood),
    }
}

/// Score every identifier of both filtered snapshots and mark the significant ones.
///
/// Both snapshots are ranked by the configured field. Each score is scaled by the decay of its
/// dimension at the item's current position (its previous one for items gone from the current
/// snapshot), so that a smaller change suffices near the top of the ranking. The thresholds of a
/// dimension are then derived from the whole population of its scores.
pub fn mark<'a>(
    prev: &[FilteredItem<'a>],
    curr: &[FilteredItem<'a>],
    config: &MarkerConfig,
) -> MarkReport<'a> {
    let mut prev_ranking = prev.to_vec();
    let mut curr_ranking = curr.to_vec();
    sort_by_rank(&mut prev_ranking, config.rank_field);
    sort_by_rank(&mut curr_ranking, config.rank_field);

    let prev_positions: HashMap<&str, usize> = prev_ranking
        .iter()
        .enumerate()
        .map(|(position, item)| (item.identifier(), position))
        .collect();
    let curr_positions: HashMap<&str, usize> = curr_ranking
        .iter()
        .enumerate()
        .map(|(position, item)| (item.identifier(), position))
        .collect();

    let in_curr = curr_ranking.iter().enumerate().map(|(curr_rank, item)| {
        let prev_rank = prev_positions.get(item.identifier()).copied();
        (prev_rank, Some(curr_rank))
    });
    let prev_only = prev_ranking
        .iter()
        .enumerate()
        .filter(|(_, item)| !curr_positions.contains_key(item.identifier()))
        .map(|(prev_rank, _)| (Some(prev_rank), None));

    let mut items = in_curr
        .chain(prev_only)
        .map(|(prev_rank, curr_rank)| {
            let prev = prev_rank.map(|rank| (&prev_ranking[rank], rank));
            let curr = curr_rank.map(|rank| (&curr_ranking[rank], rank));
            let moods = match (prev, curr) {
                (Some((prev, _)), Some((curr, _))) => Moods::compute(
                    &prev.stats,
                    &curr.stats,
                    config.window,
                    &config.mood_ladder,
                ),
                _ => Moods::default(),
            };
            let raw = raw_scores(prev, curr, &moods, config);
            let (position, count) = match curr_rank {
                Some(rank) => (rank, curr_ranking.len()),
                None => (prev_rank.unwrap_or_default(), prev_ranking.len()),
            };
            let scores = Scores::from_fn(|dimension| {
                raw.get(dimension) * config.dimension(dimension).decay.factor(position, count)
            });
            let presence = match (prev_rank, curr_rank) {
                (Some(_), Some(_)) => Presence::Both,
                (Some(_), None) => Presence::PrevOnly,
                (None, _) => Presence::CurrOnly,
            };
            let identifier = curr.or(prev).map_or("", |(item, _)| item.identifier());

            MarkedItem {
                identifier,
                presence,
                prev: prev.map(|(item, _)| item.clone()),
                curr: curr.map(|(item, _)| item.clone()),
                prev_rank,
                curr_rank,
                moods,
                scores,
                marks: Marks::default(),
            }
        })
        .collect_vec();

    let thresholds = Thresholds::from_fn(|dimension| {
        let scores = items
            .iter()
            .map(|item| item.scores.get(dimension))
            .collect_vec();
        let count = config.dimension(dimension).target.count(scores.len());
        MarkThresholds::derive(&scores, count)
    });
    for item in &mut items {
        item.marks = Marks::from_fn(|dimension| {
            thresholds.get(dimension).mark(item.scores.get(dimension))
        });
    }

    debug!(
        items = items.len(),
        marked = items.iter().filter(|item| item.is_marked()).count(),
        horizontal = ?thresholds.horizontal,
        vertical = ?thresholds.vertical,
        rank = ?thresholds.rank,
        mood = ?thresholds.mood,
        "marks derived"
    );
    MarkReport { items, thresholds }
}
