//! Compare two dated snapshots of catalogued media items and spot the unusual trends.
//!
//! A filter pass narrows both snapshots with text, date and counter filters, some of which
//! compare the previous and current counters of each item. The significance marker then scores
//! every remaining item on four change dimensions and flags the outliers of each one.
//!
//! # Examples
//!
//! Filtering two snapshots and marking the items that changed the most:
//!
//! ```
//! use chrono::NaiveDate;
//! use snapshot_trends::{
//!     filter_snapshots, mark, FilterConfig, FilterFields, FilterOutcome, MarkerConfig, RawItem,
//!     Sections, Snapshot,
//! };
//!
//! let raw = |downloads: u64| -> RawItem {
//!     serde_json::from_value(serde_json::json!({
//!         "identifier": "radio-show-1947",
//!         "title": "Radio Show",
//!         "mediatype": "audio",
//!         "item_size": 1024,
//!         "archived_date": "2020-01-01",
//!         "downloads": downloads,
//!         "month": 40,
//!         "week": 10,
//!         "collections": ["oldtimeradio"],
//!     }))
//!     .unwrap()
//! };
//! let prev = Snapshot::from_raw(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[raw(100)]);
//! let curr = Snapshot::from_raw(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), &[raw(150)]);
//!
//! let fields = FilterFields {
//!     collections: "oldtimeradio NOT comedy".to_string(),
//!     downloads_min: "grow".to_string(),
//!     ..FilterFields::default()
//! };
//! let outcome =
//!     filter_snapshots(&prev, &curr, &fields, &Sections::default(), &FilterConfig::default())
//!         .unwrap();
//!
//! let FilterOutcome::Done { prev, curr } = outcome else {
//!     panic!("no external section is needed");
//! };
//! assert_eq!(1, curr.len());
//!
//! let report = mark(&prev, &curr, &MarkerConfig::default());
//! for item in report.marked() {
//!     println!("{}: {:?}", item.identifier, item.marks);
//! }
//! ```
//!
//! # Text filters
//!
//! The text fields (collections, creators, subjects, title and description) take a
//! comma-separated list of terms, any of which must match. A term is built out of these operators,
//! from the loosest to the tightest binding:
//!
//! * `AND`: every operand matches;
//! * `NOTANY`: the left operand, if any, matches and the right one matches no value;
//! * `NOTALL`: the left operand, if any, matches and the right one does not match every value;
//! * `NOT`: same as `NOTANY`, binding tighter;
//! * `XOR`: exactly one operand matches;
//! * `OR`: any operand matches;
//! * anything else is text, matching the values that contain it regardless of case.
//!
//! Operators are upper-case words. Quoting (`"..."` or `'...'`) keeps operators and commas as
//! text, and an operator missing an operand is text too. For example:
//!
//! ```text
//! jazz AND live NOT bootleg, "rock, and roll"
//! fav- NOTALL fav-archivist
//! ```
//!
//! # Counter filters
//!
//! The downloads, month, week and favorites counters take a minimum and a maximum:
//!
//! * a number is an inclusive bound on each item;
//! * a key compares the previous and current counters of an item: `grow` (`/`), `fall` (`\`),
//!   `same` (`=`) and `diff` (`!`), optionally followed by a tolerance and `%` (`grow20%`). The
//!   other bound then applies to the current counter, prefixed by `ae`, `a`, `be`, `b`, `e` or
//!   `ne` to pick the comparison;
//! * an aggregate (`min`, `avg`, `max`, `add`, `sub`, `pos`, `neg`, `prev` or `curr`) bounds a
//!   function of both counters (`avg30`);
//! * `top` or `bottom` selects the `n` best or worst items by an aggregate (`top10`,
//!   `bottomsub5`).
//!
//! A leading `^` reads the downloads without the last month, or the month without the last week.
//!
//! # Significance
//!
//! Every item gets four scores: the change of its ranking field between the snapshots
//! (horizontal), its lifetime rate against its last week's rate (vertical), the positions it
//! gained (rank) and the agreement of its rate changes (mood). Each score is scaled down the
//! ranking by a logistic decay, and the most extreme scores of each dimension are marked, their
//! number growing sub-linearly with the population.
mod ast;
mod cache;
mod config;
mod dates;
mod decay;
mod error;
mod evaluation;
mod fields;
mod filter;
mod item;
mod lexer;
mod marker;
mod marks;
mod mood;
mod numeric;
mod pairs;
mod parser;
mod sets;
mod strings;
mod summary;
#[cfg(test)]
mod test_utils;
mod values;

pub use crate::{
    ast::Term,
    cache::SnapshotCache,
    config::{
        DimensionConfig, FilterConfig, MarkerConfig, MoodStep, RankField, StatsWindow,
        Strictness, DEFAULT_MOOD_LADDER,
    },
    dates::{date_range, parse_date_filter, DateField, DateFilter, MonthDay},
    decay::DecayCurve,
    error::{FilterError, Section},
    evaluation::MatchCache,
    fields::FilterFields,
    filter::{
        filter_snapshots, FilterOutcome, FilterRequest, FilteredItem, SectionState, Sections,
        TermFilter, TextField,
    },
    item::{
        earliest_created_date, parse_timestamp, Item, MediaType, RawItem, RawNumber, Snapshot,
        Stats, FAVORITE_PREFIX,
    },
    marker::{
        mark, sort_by_rank, Dimension, MarkReport, MarkedItem, Marks, PerDimension, Presence,
        Scores, Thresholds,
    },
    marks::{MarkSide, MarkTarget, MarkThresholds},
    mood::{Mood, Moods},
    numeric::{
        parse_bounds, AggregateFn, BoundPair, Comparison, CounterField, KeyOp, KeySpec,
        NumericSpec, RankEnd,
    },
    parser::parse,
    sets::SetSelection,
    strings::{IdentifierId, IdentifierTable},
    summary::{summarize, Summary},
    values::ValueSet,
};
