use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Collections starting with this prefix are user favorite lists.
pub const FAVORITE_PREFIX: &str = "fav-";

const OLD_WINDOW_DAYS: f64 = 30.0;
const MONTH_WINDOW_DAYS: f64 = 30.0;
const WEEK_WINDOW_DAYS: f64 = 7.0;
const MONTH_WITHOUT_WEEK_DAYS: f64 = 23.0;

/// The date given to audio items that do not carry a creation date.
pub fn earliest_created_date() -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(1877, 1, 1).unwrap_or(NaiveDate::MIN);
    midnight(date)
}

#[inline]
pub(crate) fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Movies,
}

impl MediaType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "audio" => Some(Self::Audio),
            "movies" => Some(Self::Movies),
            _ => None,
        }
    }
}

/// A counter as it comes out of a snapshot: a number or a string holding one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    fn coerce(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => u64::try_from(*value).ok(),
            Self::Float(value) if value.is_finite() && *value >= 0.0 && value.fract() == 0.0 => {
                Some(*value as u64)
            }
            Self::Float(_) => None,
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

/// An item exactly as the snapshot loader hands it over; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub mediatype: Option<String>,
    pub item_size: Option<RawNumber>,
    pub created_date: Option<String>,
    pub archived_date: Option<String>,
    pub downloads: Option<RawNumber>,
    pub month: Option<RawNumber>,
    pub week: Option<RawNumber>,
    pub collections: Vec<String>,
    pub creators: Vec<String>,
}

/// A catalogued media item with validated counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub identifier: String,
    pub title: String,
    pub mediatype: MediaType,
    pub item_size: u64,
    pub created_date: Option<DateTime<Utc>>,
    pub archived_date: DateTime<Utc>,
    pub downloads: u64,
    pub month: u64,
    pub week: u64,
    pub collections: Vec<String>,
    pub creators: Vec<String>,
}

impl Item {
    /// Validate a raw item.
    ///
    /// Returns `None` when a required field is missing, a counter is not a non-negative integer, a
    /// date cannot be read or the media type is neither `audio` nor `movies`.
    pub fn from_raw(raw: &RawItem) -> Option<Self> {
        let mediatype = MediaType::parse(raw.mediatype.as_deref()?)?;
        let created_date = match raw.created_date.as_deref() {
            Some(value) => Some(parse_timestamp(value)?),
            None if mediatype == MediaType::Audio => Some(earliest_created_date()),
            None => None,
        };

        Some(Self {
            identifier: raw.identifier.clone().filter(|id| !id.is_empty())?,
            title: raw.title.clone()?,
            mediatype,
            item_size: raw.item_size.as_ref()?.coerce()?,
            created_date,
            archived_date: parse_timestamp(raw.archived_date.as_deref()?)?,
            downloads: raw.downloads.as_ref()?.coerce()?,
            month: raw.month.as_ref()?.coerce()?,
            week: raw.week.as_ref()?.coerce()?,
            collections: raw.collections.clone(),
            creators: raw.creators.clone(),
        })
    }

    #[inline]
    pub fn favorites(&self) -> u64 {
        self.collections
            .iter()
            .filter(|collection| collection.starts_with(FAVORITE_PREFIX))
            .count() as u64
    }

    /// Whether the lifetime counter covers the month counter which covers the week counter.
    #[inline]
    pub fn is_monotonic(&self) -> bool {
        self.downloads >= self.month && self.month >= self.week
    }
}

/// Read `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(timestamp) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&timestamp));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(midnight)
}

/// A dated, immutable collection of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub items: Vec<Item>,
}

impl Snapshot {
    pub fn new(date: NaiveDate, items: Vec<Item>) -> Self {
        Self { date, items }
    }

    /// Build a snapshot out of raw items, silently leaving out the ones that do not validate.
    pub fn from_raw(date: NaiveDate, raw: &[RawItem]) -> Self {
        let items: Vec<Item> = raw
            .iter()
            .filter_map(|raw| {
                let item = Item::from_raw(raw);
                if item.is_none() {
                    trace!(identifier = ?raw.identifier, "dropping malformed item");
                }
                item
            })
            .collect();
        debug!(
            %date,
            kept = items.len(),
            dropped = raw.len() - items.len(),
            "snapshot loaded"
        );
        Self { date, items }
    }
}

/// Counters derived from an item as of a snapshot date.
///
/// The "all" family measures from the archive date, the "old" family leaves out the last month.
/// Ratios are views per day rounded to three decimals; day counts of zero or less yield infinite
/// or NaN ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub days_all: f64,
    pub views_all: f64,
    pub ratio_all: f64,
    pub days_old: f64,
    pub views_old: f64,
    pub ratio_old: f64,
    pub views_30: f64,
    pub ratio_30: f64,
    pub views_23: f64,
    pub ratio_23: f64,
    pub views_7: f64,
    pub ratio_7: f64,
    pub favorites: u64,
}

impl Stats {
    pub fn compute(item: &Item, date: NaiveDate) -> Self {
        let days_all = (midnight(date) - item.archived_date).num_days() as f64;
        let days_old = days_all - OLD_WINDOW_DAYS;
        let views_all = item.downloads as f64;
        let views_old = item.downloads as f64 - item.month as f64;
        let views_30 = item.month as f64;
        let views_23 = item.month as f64 - item.week as f64;
        let views_7 = item.week as f64;

        Self {
            days_all,
            views_all,
            ratio_all: ratio(views_all, days_all),
            days_old,
            views_old,
            ratio_old: ratio(views_old, days_old),
            views_30,
            ratio_30: ratio(views_30, MONTH_WINDOW_DAYS),
            views_23,
            ratio_23: ratio(views_23, MONTH_WITHOUT_WEEK_DAYS),
            views_7,
            ratio_7: ratio(views_7, WEEK_WINDOW_DAYS),
            favorites: item.favorites(),
        }
    }
}

#[inline]
fn ratio(views: f64, days: f64) -> f64 {
    (views / days * 1000.0).round() / 1000.0
}
