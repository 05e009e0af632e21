use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The external sections that are looked up by identifier instead of being carried by the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Subjects,
    Description,
}

impl Display for Section {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subjects => write!(formatter, "subjects"),
            Self::Description => write!(formatter, "description"),
        }
    }
}

/// Every way a filter pass can be rejected.
///
/// The first failure aborts the pass: nothing is filtered and nothing partial is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("{field}: '{value}' is not a valid date")]
    InvalidDateFormat { field: &'static str, value: String },
    #[error("{field}: cannot mix a year-based and a month-based date")]
    DateBaseMismatch { field: &'static str },
    #[error("{field}: the minimum date comes after the maximum date")]
    DateRangeInverted { field: &'static str },
    #[error("{field}: '{value}' contains invalid characters")]
    InvalidCharacters { field: &'static str, value: String },
    #[error("{field}: '{value}' is not a valid numeric filter")]
    InvalidNumericFilter { field: &'static str, value: String },
    #[error("{field}: the minimum is greater than the maximum")]
    NumericRangeInverted { field: &'static str },
    #[error("{field}: a key filter cannot be combined with an aggregate filter")]
    KeyAggregateConflict { field: &'static str },
    #[error("{field}: '{value}' uses a comparison prefix without a key filter on the other bound")]
    NumberPrefixWithoutKey { field: &'static str, value: String },
    #[error("the {0} section could not be loaded")]
    SectionUnavailable(Section),
}

impl FilterError {
    /// The stable code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDateFormat { .. } => "invalid-date-format",
            Self::DateBaseMismatch { .. } => "date-base-mismatch",
            Self::DateRangeInverted { .. } => "date-range-inverted",
            Self::InvalidCharacters { .. } => "invalid-characters",
            Self::InvalidNumericFilter { .. } => "invalid-numeric-filter",
            Self::NumericRangeInverted { .. } => "numeric-range-inverted",
            Self::KeyAggregateConflict { .. } => "key-aggregate-conflict",
            Self::NumberPrefixWithoutKey { .. } => "number-prefix-without-key",
            Self::SectionUnavailable(_) => "section-unavailable",
        }
    }

    /// The filter field that caused the failure, if the failure belongs to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidDateFormat { field, .. }
            | Self::DateBaseMismatch { field }
            | Self::DateRangeInverted { field }
            | Self::InvalidCharacters { field, .. }
            | Self::InvalidNumericFilter { field, .. }
            | Self::NumericRangeInverted { field }
            | Self::KeyAggregateConflict { field }
            | Self::NumberPrefixWithoutKey { field, .. } => Some(field),
            Self::SectionUnavailable(_) => None,
        }
    }
}
