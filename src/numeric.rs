use crate::{error::FilterError, item::Stats};
use logos::Logos;
use std::fmt::{Display, Formatter};

/// The counters that accept numeric range filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterField {
    Downloads,
    Month,
    Week,
    Favorites,
}

impl CounterField {
    pub const VIEWS: [CounterField; 3] = [Self::Downloads, Self::Month, Self::Week];

    const VIEWS_DIGITS: usize = 8;
    const FAVORITES_DIGITS: usize = 4;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Downloads => "downloads",
            Self::Month => "month",
            Self::Week => "week",
            Self::Favorites => "favs",
        }
    }

    #[inline]
    fn digit_limit(&self) -> usize {
        match self {
            Self::Favorites => Self::FAVORITES_DIGITS,
            _ => Self::VIEWS_DIGITS,
        }
    }

    /// The counter a bound measures; `derived` leaves out the most recent window.
    pub fn value(&self, stats: &Stats, derived: bool) -> f64 {
        match (self, derived) {
            (Self::Downloads, false) => stats.views_all,
            (Self::Downloads, true) => stats.views_old,
            (Self::Month, false) => stats.views_30,
            (Self::Month, true) => stats.views_23,
            (Self::Week, _) => stats.views_7,
            (Self::Favorites, _) => stats.favorites as f64,
        }
    }
}

impl Display for CounterField {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyOp {
    Grow,
    Fall,
    Same,
    Diff,
}

impl KeyOp {
    fn default_value(&self) -> u64 {
        match self {
            Self::Grow | Self::Fall => 1,
            Self::Same | Self::Diff => 0,
        }
    }

    /// The comparison used by the opposite bound when it carries no prefix.
    fn default_comparison(&self) -> Comparison {
        match self {
            Self::Grow => Comparison::BelowEqual,
            Self::Fall => Comparison::AboveEqual,
            Self::Same => Comparison::Equal,
            Self::Diff => Comparison::NotEqual,
        }
    }
}

impl Display for KeyOp {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Grow => write!(formatter, "grow"),
            Self::Fall => write!(formatter, "fall"),
            Self::Same => write!(formatter, "same"),
            Self::Diff => write!(formatter, "diff"),
        }
    }
}

/// A relation between the previous and the current value of a counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub op: KeyOp,
    pub value: u64,
    pub is_percent: bool,
}

impl KeySpec {
    pub fn new(op: KeyOp, value: Option<u64>, is_percent: bool) -> Self {
        Self {
            op,
            value: value.unwrap_or_else(|| op.default_value()),
            is_percent,
        }
    }

    pub fn accepts(&self, prev: f64, curr: f64) -> bool {
        let change = if self.is_percent {
            percent_change(prev, curr)
        } else {
            curr - prev
        };
        let value = self.value as f64;
        match self.op {
            KeyOp::Grow => change >= value,
            KeyOp::Fall => -change >= value,
            KeyOp::Same => change.abs() <= value,
            KeyOp::Diff => change.abs() > value,
        }
    }
}

impl Display for KeySpec {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        let percent = if self.is_percent { "%" } else { "" };
        write!(formatter, "{}{}{percent}", self.op, self.value)
    }
}

fn percent_change(prev: f64, curr: f64) -> f64 {
    if prev == 0.0 {
        match curr.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => f64::INFINITY,
            Some(std::cmp::Ordering::Less) => f64::NEG_INFINITY,
            _ => 0.0,
        }
    } else {
        (curr - prev) / prev.abs() * 100.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    Above,
    AboveEqual,
    Below,
    BelowEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    pub fn apply<T: PartialOrd>(&self, a: &T, b: &T) -> bool {
        match self {
            Self::Above => *a > *b,
            Self::AboveEqual => *a >= *b,
            Self::Below => *a < *b,
            Self::BelowEqual => *a <= *b,
            Self::Equal => *a == *b,
            Self::NotEqual => *a != *b,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Above => write!(formatter, ">"),
            Self::AboveEqual => write!(formatter, ">="),
            Self::Below => write!(formatter, "<"),
            Self::BelowEqual => write!(formatter, "<="),
            Self::Equal => write!(formatter, "="),
            Self::NotEqual => write!(formatter, "!="),
        }
    }
}

/// A function over the previous and current value of a counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Min,
    Avg,
    Max,
    Add,
    Sub,
    Pos,
    Neg,
    Prev,
    Curr,
}

impl AggregateFn {
    pub fn apply(&self, prev: f64, curr: f64) -> f64 {
        match self {
            Self::Min => prev.min(curr),
            Self::Avg => (prev + curr) / 2.0,
            Self::Max => prev.max(curr),
            Self::Add => prev + curr,
            Self::Sub => curr - prev,
            Self::Pos => (curr - prev).max(0.0),
            Self::Neg => (curr - prev).min(0.0),
            Self::Prev => prev,
            Self::Curr => curr,
        }
    }
}

impl Display for AggregateFn {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Self::Min => "min",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Pos => "pos",
            Self::Neg => "neg",
            Self::Prev => "prev",
            Self::Curr => "curr",
        };
        write!(formatter, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RankEnd {
    Top,
    Bottom,
}

impl Display for RankEnd {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Top => write!(formatter, "top"),
            Self::Bottom => write!(formatter, "bottom"),
        }
    }
}

/// One side of a numeric range filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumericSpec {
    Unbounded,
    /// Inclusive bound on each item's counter, snapshot by snapshot.
    Absolute(u64),
    /// Relation between the paired previous and current counters.
    Key(KeySpec),
    /// The bound facing a [`NumericSpec::Key`]: compares the current counter.
    Threshold(Comparison, u64),
    /// Bound on a function of the paired counters; the limit may come from the other side.
    Aggregate(AggregateFn, Option<u64>),
    /// Selects the `n` highest or lowest paired items by the function value.
    RankAggregate(AggregateFn, RankEnd, u64),
}

impl Display for NumericSpec {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(formatter, "*"),
            Self::Absolute(value) => write!(formatter, "{value}"),
            Self::Key(key) => write!(formatter, "{key}"),
            Self::Threshold(comparison, value) => write!(formatter, "{comparison}{value}"),
            Self::Aggregate(function, Some(value)) => write!(formatter, "{function}{value}"),
            Self::Aggregate(function, None) => write!(formatter, "{function}"),
            Self::RankAggregate(function, end, value) => {
                write!(formatter, "{end}{function}{value}")
            }
        }
    }
}

/// The parsed min/max pair of one counter field.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundPair {
    pub field: CounterField,
    /// The bound strings without their `^` marker.
    pub min_text: String,
    pub max_text: String,
    pub min: NumericSpec,
    pub max: NumericSpec,
    /// Whether the bounds measure the derived window counter instead of the raw one.
    pub derived: bool,
}

impl BoundPair {
    pub fn unbounded(field: CounterField) -> Self {
        Self {
            field,
            min_text: String::new(),
            max_text: String::new(),
            min: NumericSpec::Unbounded,
            max: NumericSpec::Unbounded,
            derived: false,
        }
    }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.min == NumericSpec::Unbounded && self.max == NumericSpec::Unbounded
    }

    /// Whether the pair can only be tested on items present in both snapshots.
    pub fn requires_pairing(&self) -> bool {
        [self.min, self.max].iter().any(|spec| {
            matches!(
                spec,
                NumericSpec::Key(_)
                    | NumericSpec::Threshold(_, _)
                    | NumericSpec::Aggregate(_, _)
                    | NumericSpec::RankAggregate(_, _, _)
            )
        })
    }

    #[inline]
    pub fn value(&self, stats: &Stats) -> f64 {
        self.field.value(stats, self.derived)
    }

    /// Inclusive range test of a single item's counter.
    pub fn accepts_item(&self, stats: &Stats) -> bool {
        let value = self.value(stats);
        let above_min = match self.min {
            NumericSpec::Absolute(min) => value >= min as f64,
            _ => true,
        };
        let below_max = match self.max {
            NumericSpec::Absolute(max) => value <= max as f64,
            _ => true,
        };
        above_min && below_max
    }

    /// The function aggregating the paired counters, taken from whichever side names one.
    pub fn aggregate(&self) -> Option<AggregateFn> {
        let function = |spec: &NumericSpec| match spec {
            NumericSpec::Aggregate(function, _) | NumericSpec::RankAggregate(function, _, _) => {
                Some(*function)
            }
            _ => None,
        };
        function(&self.min).or_else(|| function(&self.max))
    }

    pub fn rank(&self) -> Option<(AggregateFn, RankEnd, u64)> {
        [self.min, self.max].into_iter().find_map(|spec| match spec {
            NumericSpec::RankAggregate(function, end, count) => Some((function, end, count)),
            _ => None,
        })
    }

    /// Threshold test of a paired item; rank selection happens separately.
    pub fn accepts_pair(&self, prev: &Stats, curr: &Stats) -> bool {
        let (prev, curr) = (self.value(prev), self.value(curr));
        let aggregated = self.aggregate().map(|function| function.apply(prev, curr));
        self.accepts_side(&self.min, prev, curr, aggregated, Comparison::AboveEqual)
            && self.accepts_side(&self.max, prev, curr, aggregated, Comparison::BelowEqual)
    }

    fn accepts_side(
        &self,
        spec: &NumericSpec,
        prev: f64,
        curr: f64,
        aggregated: Option<f64>,
        comparison: Comparison,
    ) -> bool {
        match spec {
            NumericSpec::Unbounded | NumericSpec::RankAggregate(_, _, _) => true,
            NumericSpec::Key(key) => key.accepts(prev, curr),
            NumericSpec::Threshold(threshold, value) => threshold.apply(&curr, &(*value as f64)),
            NumericSpec::Aggregate(_, None) => true,
            NumericSpec::Aggregate(function, Some(value)) => {
                comparison.apply(&function.apply(prev, curr), &(*value as f64))
            }
            NumericSpec::Absolute(value) => match aggregated {
                Some(aggregated) => comparison.apply(&aggregated, &(*value as f64)),
                None => comparison.apply(&curr, &(*value as f64)),
            },
        }
    }
}

impl Display for BoundPair {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        let caret = if self.derived { "^" } else { "" };
        write!(formatter, "{}: [{caret}{}, {caret}{}]", self.field, self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, Logos, PartialEq)]
enum BoundToken<'source> {
    #[token("grow", |_| KeyOp::Grow)]
    #[token("/", |_| KeyOp::Grow)]
    #[token("fall", |_| KeyOp::Fall)]
    #[token("\\", |_| KeyOp::Fall)]
    #[token("same", |_| KeyOp::Same)]
    #[token("=", |_| KeyOp::Same)]
    #[token("diff", |_| KeyOp::Diff)]
    #[token("!", |_| KeyOp::Diff)]
    Key(KeyOp),
    #[token("ae", |_| Comparison::AboveEqual)]
    #[token("a", |_| Comparison::Above)]
    #[token("be", |_| Comparison::BelowEqual)]
    #[token("b", |_| Comparison::Below)]
    #[token("e", |_| Comparison::Equal)]
    #[token("ne", |_| Comparison::NotEqual)]
    Prefix(Comparison),
    #[token("min", |_| AggregateFn::Min)]
    #[token("avg", |_| AggregateFn::Avg)]
    #[token("max", |_| AggregateFn::Max)]
    #[token("add", |_| AggregateFn::Add)]
    #[token("sub", |_| AggregateFn::Sub)]
    #[token("pos", |_| AggregateFn::Pos)]
    #[token("neg", |_| AggregateFn::Neg)]
    #[token("prev", |_| AggregateFn::Prev)]
    #[token("curr", |_| AggregateFn::Curr)]
    Function(AggregateFn),
    #[token("top", |_| RankEnd::Top)]
    #[token("bottom", |_| RankEnd::Bottom)]
    Rank(RankEnd),
    #[regex("[0-9]+", |lex| lex.slice())]
    Digits(&'source str),
    #[token("%")]
    Percent,
}

/// A single bound before it is resolved against the other one.
#[derive(Clone, Copy, Debug, PartialEq)]
enum RawBound {
    Empty,
    Number(u64),
    Key(KeySpec),
    Prefixed(Comparison, u64),
    Aggregate(AggregateFn, Option<u64>),
    Rank(AggregateFn, RankEnd, u64),
}

impl RawBound {
    fn parse(field: CounterField, text: &str) -> Result<Self, FilterError> {
        let invalid = || FilterError::InvalidNumericFilter {
            field: field.name(),
            value: text.to_string(),
        };
        let tokens: Vec<BoundToken> = BoundToken::lexer(text)
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let number = |digits: &str| {
            if digits.len() > field.digit_limit() {
                return Err(invalid());
            }
            digits.parse::<u64>().map_err(|_| invalid())
        };

        match tokens.as_slice() {
            [] => Ok(Self::Empty),
            [BoundToken::Digits(digits)] => Ok(Self::Number(number(digits)?)),
            [BoundToken::Key(op)] => Ok(Self::Key(KeySpec::new(*op, None, false))),
            [BoundToken::Key(op), BoundToken::Percent] => {
                Ok(Self::Key(KeySpec::new(*op, None, true)))
            }
            [BoundToken::Key(op), BoundToken::Digits(digits)] => {
                Ok(Self::Key(KeySpec::new(*op, Some(number(digits)?), false)))
            }
            [BoundToken::Key(op), BoundToken::Digits(digits), BoundToken::Percent] => {
                Ok(Self::Key(KeySpec::new(*op, Some(number(digits)?), true)))
            }
            [BoundToken::Prefix(comparison), BoundToken::Digits(digits)] => {
                Ok(Self::Prefixed(*comparison, number(digits)?))
            }
            [BoundToken::Function(function)] => Ok(Self::Aggregate(*function, None)),
            [BoundToken::Function(function), BoundToken::Digits(digits)] => {
                Ok(Self::Aggregate(*function, Some(number(digits)?)))
            }
            [BoundToken::Rank(end), BoundToken::Digits(digits)] => {
                Ok(Self::Rank(AggregateFn::Curr, *end, number(digits)?))
            }
            [BoundToken::Rank(end), BoundToken::Function(function), BoundToken::Digits(digits)] => {
                Ok(Self::Rank(*function, *end, number(digits)?))
            }
            _ => Err(invalid()),
        }
    }

    /// Resolve the bound facing a key.
    fn facing_key(self, field: CounterField, key: &KeySpec) -> Result<NumericSpec, FilterError> {
        match self {
            Self::Empty => Ok(NumericSpec::Unbounded),
            Self::Number(value) => Ok(NumericSpec::Threshold(key.op.default_comparison(), value)),
            Self::Prefixed(comparison, value) => Ok(NumericSpec::Threshold(comparison, value)),
            Self::Key(key) => Ok(NumericSpec::Key(key)),
            Self::Aggregate(_, _) | Self::Rank(_, _, _) => Err(FilterError::KeyAggregateConflict {
                field: field.name(),
            }),
        }
    }

    /// Resolve a bound when neither side is a key.
    fn standalone(self, field: CounterField, text: &str) -> Result<NumericSpec, FilterError> {
        match self {
            Self::Empty => Ok(NumericSpec::Unbounded),
            Self::Number(value) => Ok(NumericSpec::Absolute(value)),
            Self::Key(key) => Ok(NumericSpec::Key(key)),
            Self::Aggregate(function, value) => Ok(NumericSpec::Aggregate(function, value)),
            Self::Rank(function, end, count) => {
                Ok(NumericSpec::RankAggregate(function, end, count))
            }
            Self::Prefixed(_, _) => Err(FilterError::NumberPrefixWithoutKey {
                field: field.name(),
                value: text.to_string(),
            }),
        }
    }
}

/// Strip the `^` marker shared by both bounds.
fn strip_caret(min: &str, max: &str) -> (String, String, bool) {
    let min = min.trim().to_lowercase();
    let max = max.trim().to_lowercase();
    let derived = min.starts_with('^') || max.starts_with('^');
    let strip = |text: String| match text.strip_prefix('^') {
        Some(stripped) => stripped.trim_start().to_string(),
        None => text,
    };
    (strip(min), strip(max), derived)
}

/// Parse the min/max strings of a counter field.
///
/// A key (`grow`, `fall`, `same`, `diff` or `/ \ = !`) on one side turns the other side into a
/// threshold on the current counter, optionally prefixed by `ae a be b e ne`. Without a key,
/// each side may name an aggregate function (`avg30`), a rank selection (`top10`, `bottomavg5`) or
/// a plain number.
///
/// # Errors
///
/// Mixing a key with an aggregate, using a comparison prefix without a key, a digit group that is
/// too long, an inverted range or any unknown syntax rejects the pair.
pub fn parse_bounds(field: CounterField, min: &str, max: &str) -> Result<BoundPair, FilterError> {
    let (min_text, max_text, derived) = strip_caret(min, max);
    let raw_min = RawBound::parse(field, &min_text)?;
    let raw_max = RawBound::parse(field, &max_text)?;

    let (min, max) = match (raw_min, raw_max) {
        (RawBound::Key(min), RawBound::Key(max)) => (NumericSpec::Key(min), NumericSpec::Key(max)),
        (RawBound::Key(key), other) => (NumericSpec::Key(key), other.facing_key(field, &key)?),
        (other, RawBound::Key(key)) => (other.facing_key(field, &key)?, NumericSpec::Key(key)),
        (min, max) => {
            let min = min.standalone(field, &min_text)?;
            let max = max.standalone(field, &max_text)?;
            validate_range(field, &min, &max, &max_text)?;
            (min, max)
        }
    };

    Ok(BoundPair {
        field,
        min_text,
        max_text,
        min,
        max,
        derived,
    })
}

fn validate_range(
    field: CounterField,
    min: &NumericSpec,
    max: &NumericSpec,
    max_text: &str,
) -> Result<(), FilterError> {
    let inverted = match (min, max) {
        (NumericSpec::RankAggregate(_, _, _), NumericSpec::RankAggregate(_, _, _)) => {
            return Err(FilterError::InvalidNumericFilter {
                field: field.name(),
                value: max_text.to_string(),
            });
        }
        (NumericSpec::Absolute(min), NumericSpec::Absolute(max))
        | (NumericSpec::Aggregate(_, Some(min)), NumericSpec::Absolute(max))
        | (NumericSpec::Absolute(min), NumericSpec::Aggregate(_, Some(max))) => min > max,
        (NumericSpec::Aggregate(a, Some(min)), NumericSpec::Aggregate(b, Some(max))) => {
            a == b && min > max
        }
        _ => false,
    };

    if inverted {
        return Err(FilterError::NumericRangeInverted {
            field: field.name(),
        });
    }
    Ok(())
}
