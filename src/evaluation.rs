use crate::{
    ast::{Term, TermNode},
    strings::IdentifierId,
    values::ValueSet,
};

impl Term {
    /// Evaluate the term against the values an item exposes for a field.
    ///
    /// * `AND` holds when every sub-term holds, `OR` when any does and `XOR` when exactly one
    ///   does;
    /// * `NOTANY` holds when the inclusion (if any) holds and the exclusion matches no value;
    /// * `NOTALL` holds when the inclusion (if any) holds and the exclusion does not match every
    ///   value taken one at a time;
    /// * text holds when any value contains it.
    pub fn evaluate(&self, values: &ValueSet) -> bool {
        self.matches(values.as_slice())
    }

    fn matches(&self, values: &[String]) -> bool {
        match self {
            Self::And(terms) => terms.iter().all(|term| term.matches(values)),
            Self::Or(terms) => terms.iter().any(|term| term.matches(values)),
            Self::Xor(terms) => exactly_one(terms, values),
            Self::NotAny { incl, excl } => included(incl, values) && !excl.matches(values),
            Self::NotAll { incl, excl } => {
                included(incl, values)
                    && !values
                        .iter()
                        .all(|value| excl.matches(std::slice::from_ref(value)))
            }
            Self::Text(text) => values.iter().any(|value| value.contains(text.as_str())),
        }
    }
}

#[inline]
fn included(incl: &Option<TermNode>, values: &[String]) -> bool {
    incl.as_ref().map_or(true, |incl| incl.matches(values))
}

fn exactly_one(terms: &[Term], values: &[String]) -> bool {
    let mut found = false;
    for term in terms {
        if term.matches(values) {
            if found {
                return false;
            }
            found = true;
        }
    }
    found
}

/// Memoizes one boolean per identifier for the duration of a filter pass.
///
/// An identifier present in both snapshots shares its looked-up tags, so the expensive subject and
/// description filters only need to run once for it.
#[derive(Debug)]
pub struct MatchCache {
    matched: Vec<u64>,
    evaluated: Vec<u64>,
}

impl MatchCache {
    const IDENTIFIERS_PER_BUCKET: usize = 64;

    pub fn new(identifiers: usize) -> Self {
        let size = identifiers / Self::IDENTIFIERS_PER_BUCKET + 1;
        Self {
            matched: vec![0; size],
            evaluated: vec![0; size],
        }
    }

    #[inline]
    pub fn is_evaluated(&self, id: IdentifierId) -> bool {
        Self::get_bit(&self.evaluated, id.index()) != 0u64
    }

    pub fn get_or_evaluate<F>(&mut self, id: IdentifierId, evaluate: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let index = id.index();
        if self.is_evaluated(id) {
            return Self::get_bit(&self.matched, index) != 0u64;
        }

        let result = evaluate();
        if result {
            Self::set_bit(&mut self.matched, index);
        }
        Self::set_bit(&mut self.evaluated, index);
        result
    }

    #[inline]
    fn set_bit(entries: &mut [u64], index: usize) {
        let position_in_entry: usize = index % Self::IDENTIFIERS_PER_BUCKET;
        entries[index / Self::IDENTIFIERS_PER_BUCKET] |= 1u64 << position_in_entry;
    }

    #[inline]
    fn get_bit(entries: &[u64], index: usize) -> u64 {
        let entry = entries[index / Self::IDENTIFIERS_PER_BUCKET];
        let position_in_entry: usize = index % Self::IDENTIFIERS_PER_BUCKET;
        entry & (1u64 << position_in_entry)
    }
}
