use crate::{
    filter::FilteredItem,
    numeric::{BoundPair, RankEnd},
    strings::IdentifierTable,
};
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::debug;

/// Order two values for a rank selection, NaN always last.
pub(crate) fn rank_order(a: f64, b: f64, end: RankEnd) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match end {
            RankEnd::Top => b.total_cmp(&a),
            RankEnd::Bottom => a.total_cmp(&b),
        },
    }
}

/// The positions of the identifiers present in both snapshots.
#[derive(Debug)]
struct Pairs {
    positions: Vec<(usize, usize)>,
}

impl Pairs {
    fn new(prev: &[FilteredItem], curr: &[FilteredItem]) -> Self {
        let mut table = IdentifierTable::new();
        let mut prev_positions = Vec::with_capacity(prev.len());
        for (position, item) in prev.iter().enumerate() {
            let id = table.get_or_update(&item.item.identifier);
            if id.index() == prev_positions.len() {
                prev_positions.push(position);
            }
        }

        let positions = curr
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                table
                    .get(&item.item.identifier)
                    .map(|id| (prev_positions[id.index()], position))
            })
            .collect();
        Self { positions }
    }
}

/// Keep only the given pairs, dropping every other item of both snapshots.
fn retain_positions(
    prev: &mut Vec<FilteredItem>,
    curr: &mut Vec<FilteredItem>,
    kept: &[(usize, usize)],
) {
    let mut keep_prev = vec![false; prev.len()];
    let mut keep_curr = vec![false; curr.len()];
    for (p, c) in kept {
        keep_prev[*p] = true;
        keep_curr[*c] = true;
    }

    let mut position = 0;
    prev.retain(|_| {
        position += 1;
        keep_prev[position - 1]
    });
    let mut position = 0;
    curr.retain(|_| {
        position += 1;
        keep_curr[position - 1]
    });
}

/// Keep the items present in both snapshots whose pair satisfies `keep`.
pub(crate) fn retain_pairs<F>(prev: &mut Vec<FilteredItem>, curr: &mut Vec<FilteredItem>, keep: F)
where
    F: Fn(&FilteredItem, &FilteredItem) -> bool,
{
    let kept = Pairs::new(prev, curr)
        .positions
        .into_iter()
        .filter(|(p, c)| keep(&prev[*p], &curr[*c]))
        .collect_vec();
    retain_positions(prev, curr, &kept);
}

/// Apply the bounds that compare the previous and current counters of each identifier.
///
/// Items present in one snapshot only never satisfy such bounds. A rank bound then selects the
/// `n` best (or worst) of the remaining pairs by the aggregated value, ties going to the smallest
/// identifier.
pub(crate) fn apply_bounds(
    bounds: &BoundPair,
    prev: &mut Vec<FilteredItem>,
    curr: &mut Vec<FilteredItem>,
) {
    let pairs = Pairs::new(prev, curr);
    let candidates = pairs.positions.len();
    let mut kept = pairs
        .positions
        .into_iter()
        .filter(|(p, c)| bounds.accepts_pair(&prev[*p].stats, &curr[*c].stats))
        .collect_vec();

    if let Some((function, end, count)) = bounds.rank() {
        let value = |(p, c): &(usize, usize)| {
            function.apply(bounds.value(&prev[*p].stats), bounds.value(&curr[*c].stats))
        };
        kept.sort_by(|a, b| {
            rank_order(value(a), value(b), end)
                .then_with(|| curr[a.1].item.identifier.cmp(&curr[b.1].item.identifier))
        });
        kept.truncate(usize::try_from(count).unwrap_or(usize::MAX));
    }

    debug!(
        bounds = %bounds,
        candidates,
        kept = kept.len(),
        "paired bounds applied"
    );
    retain_positions(prev, curr, &kept);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{parse_bounds, CounterField};
    use crate::test_utils::{filtered, identifiers, paired_item};

    #[test]
    fn order_values_with_nan_last() {
        assert_eq!(Ordering::Less, rank_order(2.0, 1.0, RankEnd::Top));
        assert_eq!(Ordering::Greater, rank_order(2.0, 1.0, RankEnd::Bottom));
        assert_eq!(Ordering::Greater, rank_order(f64::NAN, 1.0, RankEnd::Top));
        assert_eq!(Ordering::Greater, rank_order(f64::NAN, 1.0, RankEnd::Bottom));
    }

    #[test]
    fn drop_the_items_present_in_a_single_snapshot() {
        let (a_prev, a_curr) = paired_item("a", 100, 150);
        let (b_prev, _) = paired_item("b", 100, 150);
        let (_, c_curr) = paired_item("c", 100, 150);
        let mut prev = vec![filtered(&a_prev), filtered(&b_prev)];
        let mut curr = vec![filtered(&c_curr), filtered(&a_curr)];

        retain_pairs(&mut prev, &mut curr, |_, _| true);

        assert_eq!(vec!["a"], identifiers(&prev));
        assert_eq!(vec!["a"], identifiers(&curr));
    }

    #[test]
    fn keep_the_pairs_satisfying_a_key() {
        let (a_prev, a_curr) = paired_item("a", 100, 150);
        let (b_prev, b_curr) = paired_item("b", 100, 90);
        let mut prev = vec![filtered(&a_prev), filtered(&b_prev)];
        let mut curr = vec![filtered(&a_curr), filtered(&b_curr)];
        let bounds = parse_bounds(CounterField::Downloads, "fall", "").unwrap();

        apply_bounds(&bounds, &mut prev, &mut curr);

        assert_eq!(vec!["b"], identifiers(&prev));
        assert_eq!(vec!["b"], identifiers(&curr));
    }

    #[test]
    fn select_the_top_pairs_by_aggregated_value() {
        let items = [
            paired_item("a", 100, 110),
            paired_item("b", 100, 400),
            paired_item("c", 100, 200),
            paired_item("d", 100, 300),
        ];
        let mut prev = items.iter().map(|(p, _)| filtered(p)).collect_vec();
        let mut curr = items.iter().map(|(_, c)| filtered(c)).collect_vec();
        let bounds = parse_bounds(CounterField::Downloads, "topsub2", "").unwrap();

        apply_bounds(&bounds, &mut prev, &mut curr);

        assert_eq!(vec!["b", "d"], identifiers(&curr));
        assert_eq!(vec!["b", "d"], identifiers(&prev));
    }

    #[test]
    fn select_the_bottom_pairs_after_the_thresholds() {
        let items = [
            paired_item("a", 100, 110),
            paired_item("b", 100, 400),
            paired_item("c", 100, 200),
            paired_item("d", 100, 300),
        ];
        let mut prev = items.iter().map(|(p, _)| filtered(p)).collect_vec();
        let mut curr = items.iter().map(|(_, c)| filtered(c)).collect_vec();
        let bounds = parse_bounds(CounterField::Downloads, "bottom1", "150").unwrap();

        apply_bounds(&bounds, &mut prev, &mut curr);

        assert_eq!(vec!["a"], identifiers(&curr));
    }

    #[test]
    fn break_rank_ties_by_identifier() {
        let items = [
            paired_item("z", 100, 200),
            paired_item("m", 100, 200),
            paired_item("a", 100, 200),
        ];
        let mut prev = items.iter().map(|(p, _)| filtered(p)).collect_vec();
        let mut curr = items.iter().map(|(_, c)| filtered(c)).collect_vec();
        let bounds = parse_bounds(CounterField::Downloads, "", "top2").unwrap();

        apply_bounds(&bounds, &mut prev, &mut curr);

        assert_eq!(vec!["m", "a"], identifiers(&curr));
    }
}
