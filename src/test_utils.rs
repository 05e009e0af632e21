pub mod ast {
    macro_rules! and {
        ($($term:expr),+ $(,)?) => {
            $crate::ast::Term::And(vec![$($term),+])
        };
    }

    macro_rules! or {
        ($($term:expr),+ $(,)?) => {
            $crate::ast::Term::Or(vec![$($term),+])
        };
    }

    macro_rules! xor {
        ($($term:expr),+ $(,)?) => {
            $crate::ast::Term::Xor(vec![$($term),+])
        };
    }

    macro_rules! not_any {
        ($excl:expr) => {
            $crate::ast::Term::NotAny {
                incl: None,
                excl: Box::new($excl),
            }
        };
        ($incl:expr, $excl:expr) => {
            $crate::ast::Term::NotAny {
                incl: Some(Box::new($incl)),
                excl: Box::new($excl),
            }
        };
    }

    macro_rules! not_all {
        ($excl:expr) => {
            $crate::ast::Term::NotAll {
                incl: None,
                excl: Box::new($excl),
            }
        };
        ($incl:expr, $excl:expr) => {
            $crate::ast::Term::NotAll {
                incl: Some(Box::new($incl)),
                excl: Box::new($excl),
            }
        };
    }

    macro_rules! text {
        ($text:expr) => {
            $crate::ast::Term::text($text)
        };
    }

    pub(crate) use and;
    pub(crate) use not_all;
    pub(crate) use not_any;
    pub(crate) use or;
    pub(crate) use text;
    pub(crate) use xor;
}

use crate::filter::FilteredItem;
use crate::item::{midnight, Item, MediaType, Stats};
use chrono::NaiveDate;

pub fn a_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn prev_date() -> NaiveDate {
    a_date(2024, 1, 1)
}

pub fn curr_date() -> NaiveDate {
    a_date(2024, 2, 1)
}

/// An audio item archived on 2020-01-01 with the given counters.
pub fn an_item(identifier: &str, downloads: u64, month: u64, week: u64) -> Item {
    Item {
        identifier: identifier.to_string(),
        title: format!("Title of {identifier}"),
        mediatype: MediaType::Audio,
        item_size: 1024,
        created_date: Some(midnight(a_date(1950, 6, 15))),
        archived_date: midnight(a_date(2020, 1, 1)),
        downloads,
        month,
        week,
        collections: vec!["oldtimeradio".to_string()],
        creators: vec!["Someone".to_string()],
    }
}

/// The same item in the previous and the current snapshot, only the downloads changing.
pub fn paired_item(identifier: &str, prev_downloads: u64, curr_downloads: u64) -> (Item, Item) {
    (
        an_item(identifier, prev_downloads, 0, 0),
        an_item(identifier, curr_downloads, 0, 0),
    )
}

pub fn filtered(item: &Item) -> FilteredItem {
    FilteredItem::new(item, curr_date())
}

pub fn identifiers<'a>(items: &[FilteredItem<'a>]) -> Vec<&'a str> {
    items.iter().map(FilteredItem::identifier).collect()
}

/// Counters with the given lifetime, "old" and week views; the month counter is what lies between.
pub fn stats(all: u64, old: u64, week: u64) -> Stats {
    let (all, old, week) = (all as f64, old as f64, week as f64);
    Stats {
        days_all: 100.0,
        views_all: all,
        ratio_all: all / 100.0,
        days_old: 70.0,
        views_old: old,
        ratio_old: old / 70.0,
        views_30: all - old,
        ratio_30: (all - old) / 30.0,
        views_23: all - old - week,
        ratio_23: (all - old - week) / 23.0,
        views_7: week,
        ratio_7: week / 7.0,
        favorites: 0,
    }
}
