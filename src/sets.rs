use crate::{
    filter::FilteredItem,
    numeric::{BoundPair, KeyOp, KeySpec, NumericSpec},
    pairs,
    strings::IdentifierTable,
};
use tracing::debug;

const PLAIN_DIFF: NumericSpec = NumericSpec::Key(KeySpec {
    op: KeyOp::Diff,
    value: 0,
    is_percent: false,
});

/// Apply the favorites bounds, which always compare the two snapshots when they are not absolute.
///
/// A lone `diff` keeps the pairs whose favorite counts differ.
pub(crate) fn filter_favorites(
    bounds: &BoundPair,
    prev: &mut Vec<FilteredItem>,
    curr: &mut Vec<FilteredItem>,
) {
    let plain_diff = (bounds.min == PLAIN_DIFF && bounds.max == NumericSpec::Unbounded)
        || (bounds.min == NumericSpec::Unbounded && bounds.max == PLAIN_DIFF);
    if plain_diff {
        pairs::retain_pairs(prev, curr, |p, c| p.stats.favorites != c.stats.favorites);
        debug!(kept = curr.len(), "favorites diff applied");
    } else if bounds.requires_pairing() {
        pairs::apply_bounds(bounds, prev, curr);
    }
}

/// Which side of the snapshot difference to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SetSelection {
    pub prev_only: bool,
    pub curr_only: bool,
}

impl SetSelection {
    pub fn new(prev_only: bool, curr_only: bool) -> Self {
        Self {
            prev_only,
            curr_only,
        }
    }

    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        !self.prev_only && !self.curr_only
    }

    /// Keep the items missing from the other snapshot on the selected sides, and nothing on the
    /// others. Selecting both sides keeps the symmetric difference.
    pub fn apply(&self, prev: &mut Vec<FilteredItem>, curr: &mut Vec<FilteredItem>) {
        if self.is_unrestricted() {
            return;
        }

        let in_prev = IdentifierTable::with_identifiers(
            prev.iter().map(|item| item.item.identifier.as_str()),
        );
        let in_curr = IdentifierTable::with_identifiers(
            curr.iter().map(|item| item.item.identifier.as_str()),
        );
        let (prev_only, curr_only) = (self.prev_only, self.curr_only);
        prev.retain(|item| prev_only && in_curr.get(&item.item.identifier).is_none());
        curr.retain(|item| curr_only && in_prev.get(&item.item.identifier).is_none());

        debug!(
            prev_only,
            curr_only,
            prev = prev.len(),
            curr = curr.len(),
            "sets applied"
        );
    }
}
