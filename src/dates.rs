use crate::{error::FilterError, item::midnight};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::fmt::{Display, Formatter};

/// The item dates that accept range filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateField {
    Archived,
    Created,
}

impl DateField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Archived => "archived",
            Self::Created => "created",
        }
    }
}

impl Display for DateField {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

/// A day of the year, the day being left open for a whole month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: Option<u32>,
}

impl MonthDay {
    const FIRST: MonthDay = MonthDay {
        month: 1,
        day: Some(1),
    };
    const LAST: MonthDay = MonthDay {
        month: 12,
        day: Some(31),
    };

    #[inline]
    fn start_key(&self) -> u32 {
        self.month * 100 + self.day.unwrap_or(1)
    }

    #[inline]
    fn end_key(&self) -> u32 {
        self.month * 100 + self.day.unwrap_or(31)
    }
}

/// A date range applied to one item date.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateFilter {
    Unbounded,
    /// Inclusive instants, the first one at midnight and the last one at `23:59:59.999`.
    Absolute {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// A yearly window that wraps around the new year when `from` comes after `to`.
    Recurring { from: MonthDay, to: MonthDay },
}

impl DateFilter {
    /// Whether the date falls in the range; a missing date only passes an unbounded range.
    pub fn contains(&self, date: Option<DateTime<Utc>>) -> bool {
        let date = match (self, date) {
            (Self::Unbounded, _) => return true,
            (_, None) => return false,
            (_, Some(date)) => date,
        };

        match self {
            Self::Unbounded => true,
            Self::Absolute { from, to } => *from <= date && date <= *to,
            Self::Recurring { from, to } => {
                let key = date.month() * 100 + date.day();
                let (start, end) = (from.start_key(), to.end_key());
                if start <= end {
                    start <= key && key <= end
                } else {
                    key >= start || key <= end
                }
            }
        }
    }
}

/// One side of a date range before both sides are combined.
#[derive(Clone, Copy, Debug, PartialEq)]
enum DateBound {
    Absolute(DateTime<Utc>, DateTime<Utc>),
    Recurring(MonthDay),
}

/// The instants covered by `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
///
/// ```rust
/// use snapshot_trends::date_range;
///
/// let (from, to) = date_range("2024-02").unwrap();
/// assert_eq!("2024-02-01T00:00:00.000Z", from.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
/// assert_eq!("2024-02-29T23:59:59.999Z", to.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
/// assert_eq!(None, date_range("2024-13"));
/// ```
pub fn date_range(text: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match parse_bound(text)? {
        DateBound::Absolute(from, to) => Some((from, to)),
        DateBound::Recurring(_) => None,
    }
}

fn parse_bound(text: &str) -> Option<DateBound> {
    let parts: Vec<&str> = text.trim().split('-').collect();
    if parts
        .iter()
        .any(|part| part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }
    let lengths: Vec<usize> = parts.iter().map(|part| part.len()).collect();
    let number = |index: usize| parts[index].parse::<u32>().ok();

    match lengths.as_slice() {
        [4] => {
            let first = NaiveDate::from_ymd_opt(parts[0].parse().ok()?, 1, 1)?;
            absolute(first, first.checked_add_months(Months::new(12))?)
        }
        [4, 2] => {
            let first = NaiveDate::from_ymd_opt(parts[0].parse().ok()?, number(1)?, 1)?;
            absolute(first, first.checked_add_months(Months::new(1))?)
        }
        [4, 2, 2] => {
            let day = NaiveDate::from_ymd_opt(parts[0].parse().ok()?, number(1)?, number(2)?)?;
            absolute(day, day.succ_opt()?)
        }
        [1 | 2] => {
            let month = number(0)?;
            (1..=12).contains(&month).then_some(DateBound::Recurring(MonthDay {
                month,
                day: None,
            }))
        }
        [1 | 2, 1 | 2] => {
            let (month, day) = (number(0)?, number(1)?);
            // 2000 is a leap year, so February 29 stays valid.
            NaiveDate::from_ymd_opt(2000, month, day)?;
            Some(DateBound::Recurring(MonthDay {
                month,
                day: Some(day),
            }))
        }
        _ => None,
    }
}

/// `[first, next)` as inclusive instants.
fn absolute(first: NaiveDate, next: NaiveDate) -> Option<DateBound> {
    Some(DateBound::Absolute(
        midnight(first),
        midnight(next) - Duration::milliseconds(1),
    ))
}

/// Parse the min/max strings of a date field.
///
/// # Errors
///
/// A string that is not a supported date, a year-based bound facing a month-based one, or an
/// absolute range that ends before it starts rejects the pair.
pub fn parse_date_filter(
    field: DateField,
    min: &str,
    max: &str,
) -> Result<DateFilter, FilterError> {
    let parse = |text: &str| -> Result<Option<DateBound>, FilterError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        parse_bound(text)
            .map(Some)
            .ok_or_else(|| FilterError::InvalidDateFormat {
                field: field.name(),
                value: text.trim().to_string(),
            })
    };

    match (parse(min)?, parse(max)?) {
        (None, None) => Ok(DateFilter::Unbounded),
        (Some(DateBound::Absolute(from, _)), None) => Ok(DateFilter::Absolute {
            from,
            to: DateTime::<Utc>::MAX_UTC,
        }),
        (None, Some(DateBound::Absolute(_, to))) => Ok(DateFilter::Absolute {
            from: DateTime::<Utc>::MIN_UTC,
            to,
        }),
        (Some(DateBound::Absolute(from, _)), Some(DateBound::Absolute(_, to))) => {
            if from > to {
                return Err(FilterError::DateRangeInverted {
                    field: field.name(),
                });
            }
            Ok(DateFilter::Absolute { from, to })
        }
        (Some(DateBound::Recurring(from)), None) => Ok(DateFilter::Recurring {
            from,
            to: MonthDay::LAST,
        }),
        (None, Some(DateBound::Recurring(to))) => Ok(DateFilter::Recurring {
            from: MonthDay::FIRST,
            to,
        }),
        (Some(DateBound::Recurring(from)), Some(DateBound::Recurring(to))) => {
            Ok(DateFilter::Recurring { from, to })
        }
        (Some(_), Some(_)) => Err(FilterError::DateBaseMismatch {
            field: field.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap() + Duration::milliseconds(ms)
    }

    fn day(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
        Some(instant(y, m, d, 12, 0, 0, 0))
    }

    #[test]
    fn a_year_covers_all_of_it() {
        assert_eq!(
            Some((
                instant(2024, 1, 1, 0, 0, 0, 0),
                instant(2024, 12, 31, 23, 59, 59, 999)
            )),
            date_range("2024")
        );
    }

    #[test]
    fn a_month_covers_every_day_of_it() {
        assert_eq!(
            Some((
                instant(2024, 2, 1, 0, 0, 0, 0),
                instant(2024, 2, 29, 23, 59, 59, 999)
            )),
            date_range("2024-02")
        );
        assert_eq!(
            Some(instant(2023, 2, 28, 23, 59, 59, 999)),
            date_range("2023-02").map(|(_, to)| to)
        );
    }

    #[test]
    fn a_day_covers_a_single_day() {
        assert_eq!(
            Some((
                instant(2024, 12, 31, 0, 0, 0, 0),
                instant(2024, 12, 31, 23, 59, 59, 999)
            )),
            date_range("2024-12-31")
        );
    }

    #[test]
    fn reject_impossible_dates() {
        for text in ["2024-13", "2024-02-30", "24", "2024-1-011", "20x4", "2024--01", ""] {
            assert_eq!(None, date_range(text), "'{text}' should be rejected");
        }
    }

    #[test]
    fn recurring_dates_have_no_absolute_range() {
        assert_eq!(None, date_range("02-29"));
    }

    #[test]
    fn empty_bounds_are_unbounded() {
        let filter = parse_date_filter(DateField::Archived, "", " ").unwrap();

        assert_eq!(DateFilter::Unbounded, filter);
        assert!(filter.contains(None));
    }

    #[test]
    fn absolute_ranges_are_inclusive() {
        let filter = parse_date_filter(DateField::Archived, "2020", "2021-06").unwrap();

        assert!(filter.contains(day(2020, 1, 1)));
        assert!(filter.contains(day(2021, 6, 30)));
        assert!(!filter.contains(day(2021, 7, 1)));
        assert!(!filter.contains(day(2019, 12, 31)));
    }

    #[test]
    fn an_absolute_range_may_be_half_open() {
        let filter = parse_date_filter(DateField::Archived, "", "2000").unwrap();

        assert!(filter.contains(day(1900, 1, 1)));
        assert!(!filter.contains(day(2001, 1, 1)));
    }

    #[test]
    fn a_missing_date_fails_an_active_range() {
        let filter = parse_date_filter(DateField::Created, "1950", "").unwrap();

        assert!(!filter.contains(None));
    }

    #[test]
    fn recurring_ranges_ignore_the_year() {
        let filter = parse_date_filter(DateField::Created, "03", "05").unwrap();

        assert!(filter.contains(day(1931, 3, 1)));
        assert!(filter.contains(day(2022, 5, 31)));
        assert!(!filter.contains(day(2022, 6, 1)));
    }

    #[test]
    fn recurring_ranges_wrap_around_the_new_year() {
        let filter = parse_date_filter(DateField::Created, "11", "02").unwrap();

        assert!(filter.contains(day(1950, 11, 15)));
        assert!(filter.contains(day(1950, 1, 15)));
        assert!(filter.contains(day(1952, 2, 29)));
        assert!(!filter.contains(day(1950, 3, 1)));
        assert!(!filter.contains(day(1950, 10, 31)));
    }

    #[test]
    fn recurring_ranges_may_name_days() {
        let filter = parse_date_filter(DateField::Created, "12-24", "12-26").unwrap();

        assert!(filter.contains(day(1960, 12, 25)));
        assert!(!filter.contains(day(1960, 12, 27)));
    }

    #[test]
    fn recurring_day_ranges_wrap_around_the_new_year() {
        let filter = parse_date_filter(DateField::Created, "12-20", "01-10").unwrap();

        assert!(filter.contains(day(1948, 12, 25)));
        assert!(filter.contains(day(1949, 1, 5)));
        assert!(filter.contains(day(1949, 1, 10)));
        assert!(!filter.contains(day(1949, 1, 11)));
        assert!(!filter.contains(day(1948, 12, 19)));
    }

    #[test]
    fn reject_mixed_bases() {
        let error = parse_date_filter(DateField::Created, "1950", "06").unwrap_err();

        assert_eq!(FilterError::DateBaseMismatch { field: "created" }, error);
    }

    #[test]
    fn reject_an_inverted_absolute_range() {
        let error = parse_date_filter(DateField::Archived, "2021", "2020").unwrap_err();

        assert_eq!(FilterError::DateRangeInverted { field: "archived" }, error);
    }

    #[test]
    fn reject_an_invalid_date() {
        let error = parse_date_filter(DateField::Archived, "2021-13", "").unwrap_err();

        assert_eq!(
            FilterError::InvalidDateFormat {
                field: "archived",
                value: "2021-13".to_string()
            },
            error
        );
    }
}
