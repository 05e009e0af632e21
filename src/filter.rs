use crate::{
    ast::Term,
    config::{FilterConfig, Strictness},
    dates::{parse_date_filter, DateField, DateFilter},
    error::{FilterError, Section},
    evaluation::MatchCache,
    fields::FilterFields,
    item::{Item, Snapshot, Stats},
    numeric::{parse_bounds, BoundPair, CounterField},
    pairs,
    parser::parse,
    sets::{self, SetSelection},
    strings::IdentifierTable,
    values::ValueSet,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, trace};

/// An item that went through a filter pass, with its counters as of its snapshot date.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredItem<'a> {
    pub item: &'a Item,
    pub stats: Stats,
}

impl<'a> FilteredItem<'a> {
    pub fn new(item: &'a Item, date: NaiveDate) -> Self {
        Self {
            item,
            stats: Stats::compute(item, date),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &'a str {
        &self.item.identifier
    }
}

/// The loading state of an external section, mapping identifiers to their tags.
#[derive(Debug)]
pub enum SectionState<'a, T> {
    NotRequested,
    Loading,
    Failed,
    Ready(&'a HashMap<String, T>),
}

impl<T> Default for SectionState<'_, T> {
    fn default() -> Self {
        Self::NotRequested
    }
}

#[derive(Debug, Default)]
pub struct Sections<'a> {
    pub subjects: SectionState<'a, Vec<String>>,
    pub description: SectionState<'a, String>,
}

/// The result of a filter pass.
#[derive(Debug, PartialEq)]
pub enum FilterOutcome<'a> {
    /// A section the filters need is not loaded yet; run the pass again once it is.
    Wait(Section),
    Done {
        prev: Vec<FilteredItem<'a>>,
        curr: Vec<FilteredItem<'a>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextField {
    Collections,
    Creators,
    Subjects,
    Title,
    Description,
}

/// The terms of a text field, any of which must match.
#[derive(Clone, Debug, PartialEq)]
pub struct TermFilter {
    pub field: TextField,
    pub terms: Vec<Term>,
}

impl TermFilter {
    /// Parse the terms, the cheapest first.
    pub fn new(field: TextField, input: &str) -> Self {
        let mut terms = parse(input);
        terms.sort_by_key(Term::cost);
        Self { field, terms }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.terms.is_empty()
    }

    pub fn accepts(&self, values: &ValueSet) -> bool {
        !self.is_active() || self.terms.iter().any(|term| term.evaluate(values))
    }
}

/// Every filter of a pass, parsed and validated.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRequest {
    pub collections: TermFilter,
    pub creators: TermFilter,
    pub subjects: TermFilter,
    pub title: TermFilter,
    pub description: TermFilter,
    pub downloads: BoundPair,
    pub month: BoundPair,
    pub week: BoundPair,
    pub favorites: BoundPair,
    pub archived: DateFilter,
    pub created: DateFilter,
    pub sets: SetSelection,
}

/// The external tags and their per-identifier match results for one pass.
struct TagLookup<'a> {
    table: IdentifierTable,
    subjects: Option<&'a HashMap<String, Vec<String>>>,
    description: Option<&'a HashMap<String, String>>,
    subject_matches: MatchCache,
    description_matches: MatchCache,
}

/// The tags of a section, or `None` while they are not loaded.
fn ready<'a, T>(
    section: Section,
    state: &SectionState<'a, T>,
) -> Result<Option<&'a HashMap<String, T>>, FilterError> {
    match state {
        SectionState::Ready(map) => Ok(Some(*map)),
        SectionState::Failed => Err(FilterError::SectionUnavailable(section)),
        SectionState::NotRequested | SectionState::Loading => Ok(None),
    }
}

impl FilterRequest {
    /// Validate and parse every field of the form, stopping at the first failure.
    pub fn parse(fields: &FilterFields) -> Result<Self, FilterError> {
        fields.validate()?;

        Ok(Self {
            collections: TermFilter::new(TextField::Collections, &fields.collections),
            creators: TermFilter::new(TextField::Creators, &fields.creators),
            subjects: TermFilter::new(TextField::Subjects, &fields.subjects),
            title: TermFilter::new(TextField::Title, &fields.title),
            description: TermFilter::new(TextField::Description, &fields.description),
            downloads: parse_bounds(
                CounterField::Downloads,
                &fields.downloads_min,
                &fields.downloads_max,
            )?,
            month: parse_bounds(CounterField::Month, &fields.month_min, &fields.month_max)?,
            week: parse_bounds(CounterField::Week, &fields.week_min, &fields.week_max)?,
            favorites: parse_bounds(CounterField::Favorites, &fields.favs_min, &fields.favs_max)?,
            archived: parse_date_filter(
                DateField::Archived,
                &fields.archived_min,
                &fields.archived_max,
            )?,
            created: parse_date_filter(
                DateField::Created,
                &fields.created_min,
                &fields.created_max,
            )?,
            sets: SetSelection::new(fields.prev_only, fields.curr_only),
        })
    }

    /// Run the filters over both snapshots.
    ///
    /// Each snapshot is filtered on its own first. Then the bounds comparing the snapshots are
    /// applied to the views counters, then to the favorites, and the set selection goes last.
    ///
    /// # Errors
    ///
    /// Fails when a section the text filters need could not be loaded.
    pub fn apply<'a>(
        &self,
        prev: &'a Snapshot,
        curr: &'a Snapshot,
        sections: &Sections,
        config: &FilterConfig,
    ) -> Result<FilterOutcome<'a>, FilterError> {
        let mut subjects = None;
        if self.subjects.is_active() {
            match ready(Section::Subjects, &sections.subjects)? {
                Some(map) => subjects = Some(map),
                None => return Ok(FilterOutcome::Wait(Section::Subjects)),
            }
        }
        let mut description = None;
        if self.description.is_active() {
            match ready(Section::Description, &sections.description)? {
                Some(map) => description = Some(map),
                None => return Ok(FilterOutcome::Wait(Section::Description)),
            }
        }

        let table = IdentifierTable::with_identifiers(
            prev.items
                .iter()
                .chain(curr.items.iter())
                .map(|item| item.identifier.as_str()),
        );
        let mut lookup = TagLookup {
            subject_matches: MatchCache::new(table.len()),
            description_matches: MatchCache::new(table.len()),
            table,
            subjects,
            description,
        };

        let mut prev_items = self.filter_snapshot(prev, &mut lookup, config);
        let mut curr_items = self.filter_snapshot(curr, &mut lookup, config);

        for bounds in [&self.downloads, &self.month, &self.week] {
            if bounds.requires_pairing() {
                pairs::apply_bounds(bounds, &mut prev_items, &mut curr_items);
            }
        }
        sets::filter_favorites(&self.favorites, &mut prev_items, &mut curr_items);
        self.sets.apply(&mut prev_items, &mut curr_items);

        debug!(
            prev = prev_items.len(),
            curr = curr_items.len(),
            "filter pass done"
        );
        Ok(FilterOutcome::Done {
            prev: prev_items,
            curr: curr_items,
        })
    }

    fn filter_snapshot<'a>(
        &self,
        snapshot: &'a Snapshot,
        lookup: &mut TagLookup,
        config: &FilterConfig,
    ) -> Vec<FilteredItem<'a>> {
        let kept: Vec<FilteredItem> = snapshot
            .items
            .iter()
            .filter(|item| {
                let keep = config.strictness == Strictness::NonNegative || item.is_monotonic();
                if !keep {
                    trace!(identifier = %item.identifier, "dropping non monotonic item");
                }
                keep
            })
            .filter(|item| self.accepts_dates(item) && self.accepts_texts(item))
            .map(|item| FilteredItem::new(item, snapshot.date))
            .filter(|item| self.accepts_counters(&item.stats))
            .filter(|item| self.accepts_sections(item.item, lookup))
            .collect();

        debug!(
            date = %snapshot.date,
            kept = kept.len(),
            dropped = snapshot.items.len() - kept.len(),
            "snapshot filtered"
        );
        kept
    }

    fn accepts_dates(&self, item: &Item) -> bool {
        self.archived.contains(Some(item.archived_date)) && self.created.contains(item.created_date)
    }

    fn accepts_texts(&self, item: &Item) -> bool {
        (!self.title.is_active() || self.title.accepts(&ValueSet::single(&item.title)))
            && (!self.collections.is_active()
                || self.collections.accepts(&ValueSet::new(&item.collections)))
            && (!self.creators.is_active() || self.creators.accepts(&ValueSet::new(&item.creators)))
    }

    /// Absolute bounds only; the others wait for both snapshots.
    fn accepts_counters(&self, stats: &Stats) -> bool {
        [&self.downloads, &self.month, &self.week, &self.favorites]
            .iter()
            .all(|bounds| bounds.requires_pairing() || bounds.accepts_item(stats))
    }

    fn accepts_sections(&self, item: &Item, lookup: &mut TagLookup) -> bool {
        let Some(id) = lookup.table.get(&item.identifier) else {
            return false;
        };

        if let Some(subjects) = lookup.subjects {
            let accepted = lookup.subject_matches.get_or_evaluate(id, || {
                let values = subjects
                    .get(&item.identifier)
                    .map(|tags| ValueSet::new(tags))
                    .unwrap_or_default();
                self.subjects.accepts(&values)
            });
            if !accepted {
                return false;
            }
        }

        if let Some(description) = lookup.description {
            let accepted = lookup.description_matches.get_or_evaluate(id, || {
                let values = description
                    .get(&item.identifier)
                    .map(|text| ValueSet::single(text))
                    .unwrap_or_default();
                self.description.accepts(&values)
            });
            if !accepted {
                return false;
            }
        }

        true
    }
}

/// Validate the form and run a filter pass over both snapshots.
///
/// Nothing is filtered when the form is invalid: the first failure is returned as is.
pub fn filter_snapshots<'a>(
    prev: &'a Snapshot,
    curr: &'a Snapshot,
    fields: &FilterFields,
    sections: &Sections,
    config: &FilterConfig,
) -> Result<FilterOutcome<'a>, FilterError> {
    let request = FilterRequest::parse(fields)?;
    debug!(
        downloads = %request.downloads,
        month = %request.month,
        week = %request.week,
        favorites = %request.favorites,
        "filter request parsed"
    );
    request.apply(prev, curr, sections, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{an_item, curr_date, identifiers, prev_date};

    type Kept<'a> = (Vec<FilteredItem<'a>>, Vec<FilteredItem<'a>>);

    fn done(outcome: Result<FilterOutcome, FilterError>) -> Kept {
        match outcome.unwrap() {
            FilterOutcome::Done { prev, curr } => (prev, curr),
            FilterOutcome::Wait(section) => panic!("waiting for {section}"),
        }
    }

    fn snapshots() -> (Snapshot, Snapshot) {
        (
            Snapshot::new(prev_date(), vec![an_item("a", 100, 40, 10)]),
            Snapshot::new(curr_date(), vec![an_item("a", 150, 50, 12)]),
        )
    }

    fn fields(configure: impl FnOnce(&mut FilterFields)) -> FilterFields {
        let mut fields = FilterFields::default();
        configure(&mut fields);
        fields
    }

    fn run<'a>(prev: &'a Snapshot, curr: &'a Snapshot, fields: &FilterFields) -> Kept<'a> {
        run_with(prev, curr, fields, &Sections::default())
    }

    fn run_with<'a>(
        prev: &'a Snapshot,
        curr: &'a Snapshot,
        fields: &FilterFields,
        sections: &Sections,
    ) -> Kept<'a> {
        done(filter_snapshots(
            prev,
            curr,
            fields,
            sections,
            &FilterConfig::default(),
        ))
    }

    fn pass<'a>(
        prev: &'a Snapshot,
        curr: &'a Snapshot,
        fields: &FilterFields,
        sections: &Sections,
    ) -> Result<FilterOutcome<'a>, FilterError> {
        filter_snapshots(prev, curr, fields, sections, &FilterConfig::default())
    }

    #[test]
    fn keep_everything_without_filters() {
        let (prev, curr) = snapshots();

        let (prev_items, curr_items) = run(&prev, &curr, &FilterFields::default());

        assert_eq!(1, prev_items.len());
        assert_eq!(1, curr_items.len());
        assert_eq!(150.0, curr_items[0].stats.views_all);
    }

    #[test]
    fn grow_keeps_a_growing_item() {
        let (prev, curr) = snapshots();

        let fields = fields(|f| f.downloads_min = "grow".into());

        let (prev_items, curr_items) = run(&prev, &curr, &fields);

        assert_eq!(vec!["a"], identifiers(&prev_items));
        assert_eq!(vec!["a"], identifiers(&curr_items));
    }

    #[test]
    fn fall_drops_a_growing_item() {
        let (prev, curr) = snapshots();

        let fields = fields(|f| f.downloads_min = "fall".into());

        let (prev_items, curr_items) = run(&prev, &curr, &fields);

        assert!(prev_items.is_empty());
        assert!(curr_items.is_empty());
    }

    #[test]
    fn reject_an_invalid_form_before_filtering() {
        let (prev, curr) = snapshots();
        let fields = fields(|f| {
            f.downloads_min = "grow".into();
            f.downloads_max = "avg10".into();
        });

        let error = pass(&prev, &curr, &fields, &Sections::default()).unwrap_err();

        assert_eq!("key-aggregate-conflict", error.code());
    }

    #[test]
    fn apply_absolute_bounds_to_each_snapshot() {
        let prev = Snapshot::new(
            prev_date(),
            vec![an_item("a", 100, 40, 10), an_item("b", 900, 40, 10)],
        );
        let curr = Snapshot::new(
            curr_date(),
            vec![an_item("a", 150, 50, 12), an_item("b", 990, 50, 12)],
        );
        let fields = fields(|f| f.downloads_max = "120".into());

        let (prev_items, curr_items) = run(&prev, &curr, &fields);

        assert_eq!(vec!["a"], identifiers(&prev_items));
        assert!(curr_items.is_empty());
    }

    #[test]
    fn filter_the_text_fields() {
        let mut jazz = an_item("jazz", 10, 5, 1);
        jazz.title = "Live Jazz at the Hall".to_string();
        let mut radio = an_item("radio", 10, 5, 1);
        radio.title = "Radio Drama".to_string();
        radio.creators = vec!["Orson Welles".to_string()];
        let curr = Snapshot::new(curr_date(), vec![jazz, radio]);
        let prev = Snapshot::new(prev_date(), vec![]);

        let by_title = fields(|f| f.title = "jazz NOT studio".into());
        let by_creator = fields(|f| f.creators = "welles, nobody".into());

        let (_, by_title) = run(&prev, &curr, &by_title);
        let (_, by_creator) = run(&prev, &curr, &by_creator);

        assert_eq!(vec!["jazz"], identifiers(&by_title));
        assert_eq!(vec!["radio"], identifiers(&by_creator));
    }

    #[test]
    fn filter_the_dates() {
        let mut old = an_item("old", 10, 5, 1);
        old.created_date = crate::item::parse_timestamp("1931-11-20");
        let recent = an_item("recent", 10, 5, 1);
        let curr = Snapshot::new(curr_date(), vec![old, recent]);
        let prev = Snapshot::new(prev_date(), vec![]);

        let by_year = fields(|f| f.created_max = "1940".into());
        let by_season = fields(|f| {
            f.created_min = "11".into();
            f.created_max = "02".into();
        });

        let (_, by_year) = run(&prev, &curr, &by_year);
        let (_, by_season) = run(&prev, &curr, &by_season);

        assert_eq!(vec!["old"], identifiers(&by_year));
        assert_eq!(vec!["old"], identifiers(&by_season));
    }

    #[test]
    fn the_monotonic_strictness_drops_inconsistent_items() {
        let prev = Snapshot::new(prev_date(), vec![]);
        let curr = Snapshot::new(
            curr_date(),
            vec![an_item("a", 10, 20, 1), an_item("b", 30, 20, 1)],
        );
        let fields = FilterFields::default();
        let sections = Sections::default();
        let config = FilterConfig {
            strictness: Strictness::Monotonic,
        };

        let lenient = run(&prev, &curr, &fields);
        let strict = done(filter_snapshots(&prev, &curr, &fields, &sections, &config));

        assert_eq!(vec!["a", "b"], identifiers(&lenient.1));
        assert_eq!(vec!["b"], identifiers(&strict.1));
    }

    #[test]
    fn wait_for_a_section_that_is_loading() {
        let (prev, curr) = snapshots();
        let sections = Sections {
            subjects: SectionState::Loading,
            ..Sections::default()
        };

        let fields = fields(|f| f.subjects = "jazz".into());

        let outcome = pass(&prev, &curr, &fields, &sections);

        assert_eq!(Ok(FilterOutcome::Wait(Section::Subjects)), outcome);
    }

    #[test]
    fn wait_for_a_section_that_was_not_requested() {
        let (prev, curr) = snapshots();

        let fields = fields(|f| f.description = "jazz".into());

        let outcome = pass(&prev, &curr, &fields, &Sections::default());

        assert_eq!(Ok(FilterOutcome::Wait(Section::Description)), outcome);
    }

    #[test]
    fn fail_on_a_section_that_could_not_be_loaded() {
        let (prev, curr) = snapshots();
        let sections = Sections {
            description: SectionState::Failed,
            ..Sections::default()
        };

        let fields = fields(|f| f.description = "jazz".into());

        let outcome = pass(&prev, &curr, &fields, &sections);

        assert_eq!(Err(FilterError::SectionUnavailable(Section::Description)), outcome);
    }

    #[test]
    fn ignore_the_sections_nobody_filters_on() {
        let (prev, curr) = snapshots();
        let sections = Sections {
            subjects: SectionState::Failed,
            ..Sections::default()
        };

        let outcome = pass(&prev, &curr, &FilterFields::default(), &sections);

        assert!(matches!(outcome, Ok(FilterOutcome::Done { .. })));
    }

    #[test]
    fn filter_the_subjects_once_loaded() {
        let prev = Snapshot::new(
            prev_date(),
            vec![an_item("a", 100, 40, 10), an_item("b", 100, 40, 10)],
        );
        let curr = Snapshot::new(
            curr_date(),
            vec![an_item("a", 150, 50, 12), an_item("b", 150, 50, 12)],
        );
        let subjects = HashMap::from([
            ("a".to_string(), vec!["Jazz".to_string(), "Live".to_string()]),
            ("b".to_string(), vec!["Comedy".to_string()]),
        ]);
        let sections = Sections {
            subjects: SectionState::Ready(&subjects),
            ..Sections::default()
        };

        let fields = fields(|f| f.subjects = "jazz AND live".into());

        let (prev_items, curr_items) = run_with(&prev, &curr, &fields, &sections);

        assert_eq!(vec!["a"], identifiers(&prev_items));
        assert_eq!(vec!["a"], identifiers(&curr_items));
    }

    #[test]
    fn apply_the_sets_last() {
        let prev = Snapshot::new(
            prev_date(),
            vec![an_item("a", 100, 40, 10), an_item("gone", 100, 40, 10)],
        );
        let curr = Snapshot::new(
            curr_date(),
            vec![an_item("a", 150, 50, 12), an_item("new", 10, 5, 1)],
        );
        let fields = fields(|f| {
            f.prev_only = true;
            f.curr_only = true;
        });

        let (prev_items, curr_items) = run(&prev, &curr, &fields);

        assert_eq!(vec!["gone"], identifiers(&prev_items));
        assert_eq!(vec!["new"], identifiers(&curr_items));
    }

    #[test]
    fn a_pass_is_idempotent() {
        let prev = Snapshot::new(
            prev_date(),
            vec![
                an_item("a", 100, 40, 10),
                an_item("b", 300, 40, 10),
                an_item("c", 50, 40, 10),
            ],
        );
        let curr = Snapshot::new(
            curr_date(),
            vec![
                an_item("c", 60, 50, 12),
                an_item("a", 150, 50, 12),
                an_item("b", 290, 40, 10),
            ],
        );
        let fields = fields(|f| {
            f.downloads_min = "top2".into();
            f.week_max = "20".into();
        });

        let first = run(&prev, &curr, &fields);
        let second = run(&prev, &curr, &fields);

        assert_eq!(first, second);
        assert_eq!(vec!["a", "b"], identifiers(&first.0));
    }

    #[test]
    fn the_cheapest_terms_come_first() {
        let filter = TermFilter::new(TextField::Title, "a AND b AND c, d");

        assert_eq!(Term::text("d"), filter.terms[0]);
    }
}
