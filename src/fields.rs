use crate::error::FilterError;
use serde::{Deserialize, Serialize};

const TERM_PUNCTUATION: &str = "-_.,:&()/!?+#'\"";
const NUMERIC_SYMBOLS: &str = "^/\\=!%";

/// The raw filter form: one string per text, counter and date bound, plus the set toggles.
///
/// Deserializes from the flat kebab-case map the form submits (`downloads-min`, `prev-only`, ...).
/// Missing entries are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterFields {
    pub collections: String,
    pub creators: String,
    pub subjects: String,
    pub title: String,
    pub description: String,
    pub downloads_min: String,
    pub downloads_max: String,
    pub month_min: String,
    pub month_max: String,
    pub week_min: String,
    pub week_max: String,
    pub favs_min: String,
    pub favs_max: String,
    pub archived_min: String,
    pub archived_max: String,
    pub created_min: String,
    pub created_max: String,
    pub prev_only: bool,
    pub curr_only: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Term,
    Numeric,
    Date,
}

impl FieldKind {
    fn accepts(&self, c: char) -> bool {
        match self {
            Self::Term => c.is_alphanumeric() || c.is_whitespace() || TERM_PUNCTUATION.contains(c),
            Self::Numeric => {
                c.is_ascii_digit() || c.is_ascii_lowercase() || NUMERIC_SYMBOLS.contains(c)
            }
            Self::Date => c.is_ascii_digit() || c == '-',
        }
    }
}

impl FilterFields {
    fn entries(&self) -> [(&'static str, &str, FieldKind); 17] {
        [
            ("collections", self.collections.as_str(), FieldKind::Term),
            ("creators", self.creators.as_str(), FieldKind::Term),
            ("subjects", self.subjects.as_str(), FieldKind::Term),
            ("title", self.title.as_str(), FieldKind::Term),
            ("description", self.description.as_str(), FieldKind::Term),
            ("downloads-min", self.downloads_min.as_str(), FieldKind::Numeric),
            ("downloads-max", self.downloads_max.as_str(), FieldKind::Numeric),
            ("month-min", self.month_min.as_str(), FieldKind::Numeric),
            ("month-max", self.month_max.as_str(), FieldKind::Numeric),
            ("week-min", self.week_min.as_str(), FieldKind::Numeric),
            ("week-max", self.week_max.as_str(), FieldKind::Numeric),
            ("favs-min", self.favs_min.as_str(), FieldKind::Numeric),
            ("favs-max", self.favs_max.as_str(), FieldKind::Numeric),
            ("archived-min", self.archived_min.as_str(), FieldKind::Date),
            ("archived-max", self.archived_max.as_str(), FieldKind::Date),
            ("created-min", self.created_min.as_str(), FieldKind::Date),
            ("created-max", self.created_max.as_str(), FieldKind::Date),
        ]
    }

    /// Check every field against the characters its kind allows.
    ///
    /// Numeric fields are checked after trimming and lower-casing, like they are parsed.
    pub fn validate(&self) -> Result<(), FilterError> {
        for (field, value, kind) in self.entries() {
            let value = match kind {
                FieldKind::Numeric => value.trim().to_lowercase(),
                _ => value.trim().to_string(),
            };
            if !value.chars().all(|c| kind.accepts(c)) {
                return Err(FilterError::InvalidCharacters { field, value });
            }
        }
        Ok(())
    }
}
