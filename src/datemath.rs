use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::{
    error::ComponentRange, format_description::FormatItem, macros::format_description, Date,
    Month, Weekday,
};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Number of week rows in every month grid
pub(crate) const GRID_ROWS: usize = 6;

/// Weekdays in the order the grid lays them out
pub(crate) const WEEKDAYS: [Weekday; DAYS_IN_WEEK] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

/// A local calendar date identified by its canonical `YYYY-MM-DD` form.
///
/// This is the only key the event store is looked up by.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct DateKey(Date);

impl DateKey {
    pub(crate) fn year(self) -> i32 {
        self.0.year()
    }

    pub(crate) fn month(self) -> Month {
        self.0.month()
    }

    pub(crate) fn day(self) -> u8 {
        self.0.day()
    }

    /// Returns the key `days` days away, or `None` at the end of time
    pub(crate) fn offset(self, days: i32) -> Option<DateKey> {
        let jd = self.0.to_julian_day().checked_add(days)?;
        Date::from_julian_day(jd).ok().map(DateKey)
    }

    /// Formats the key as e.g. "Monday, October 19, 2026"
    pub(crate) fn long_form(self) -> String {
        format!(
            "{}, {} {}, {}",
            self.0.weekday(),
            self.0.month(),
            self.0.day(),
            self.0.year()
        )
    }
}

impl From<Date> for DateKey {
    fn from(date: Date) -> DateKey {
        DateKey(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Four digits after an optional sign, matching what `YMD_FMT` parses
        let year = self.0.year();
        let sign = if year < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{:04}-{:02}-{:02}",
            year.unsigned_abs(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<DateKey, DateKeyError> {
        parse_date_key(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(s: String) -> Result<DateKey, DateKeyError> {
        parse_date_key(&s)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> String {
        key.to_string()
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid date key {key:?}: {source}")]
pub(crate) struct DateKeyError {
    key: String,
    source: time::error::Parse,
}

pub(crate) fn format_date_key(year: i32, month: Month, day: u8) -> Result<DateKey, ComponentRange> {
    Date::from_calendar_date(year, month, day).map(DateKey)
}

pub(crate) fn parse_date_key(s: &str) -> Result<DateKey, DateKeyError> {
    Date::parse(s, &YMD_FMT)
        .map(DateKey)
        .map_err(|source| DateKeyError {
            key: s.to_owned(),
            source,
        })
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;

// Julian day 0 fell on a Monday, so the day number modulo 7 counts days since
// Monday without consulting any calendar tables.
pub(crate) fn days_from_monday(date: Date) -> u8 {
    to_weekday_index(date.to_julian_day())
}

pub(crate) fn days_from_sunday(date: Date) -> u8 {
    to_weekday_index(date.to_julian_day() + 1)
}

fn to_weekday_index(jd: i32) -> u8 {
    // rem_euclid(7) is always in 0..7
    u8::try_from(jd.rem_euclid(7)).unwrap_or_default()
}

fn add_days(date: Date, days: i32) -> Result<Date, OutOfTimeError> {
    date.to_julian_day()
        .checked_add(days)
        .and_then(|jd| Date::from_julian_day(jd).ok())
        .ok_or(OutOfTimeError)
}

/// Computes the ISO 8601 week number of `date`.
///
/// The Thursday of the date's Monday-to-Sunday week decides which year the
/// week belongs to, so the last days of December can land in week 1 and the
/// first days of January in week 52 or 53.
pub(crate) fn iso_week_number(date: Date) -> u8 {
    let shift = 3 - i32::from(days_from_monday(date));
    let thursday = add_days(date, shift).unwrap_or(date);
    // ceil(ordinal / 7); at most 53
    u8::try_from(thursday.ordinal().div_ceil(7)).unwrap_or(u8::MAX)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GridCell {
    pub(crate) date: DateKey,
    pub(crate) weekday: Weekday,
    pub(crate) is_current_month: bool,
    pub(crate) is_today: bool,
    pub(crate) is_selected: bool,
    pub(crate) has_events: bool,
}

impl GridCell {
    pub(crate) fn day(&self) -> u8 {
        self.date.day()
    }

    pub(crate) fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Saturday | Weekday::Sunday)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GridRow {
    pub(crate) week_number: u8,
    pub(crate) days: [GridCell; DAYS_IN_WEEK],
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthGrid {
    pub(crate) year: i32,
    pub(crate) month: Month,
    pub(crate) rows: [GridRow; GRID_ROWS],
}

impl MonthGrid {
    pub(crate) fn title(&self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

#[cfg(test)]
impl MonthGrid {
    pub(crate) fn cells(&self) -> impl Iterator<Item = &GridCell> + '_ {
        self.rows.iter().flat_map(|row| row.days.iter())
    }

    pub(crate) fn week_numbers(&self) -> [u8; GRID_ROWS] {
        self.rows.map(|row| row.week_number)
    }
}

/// Lays out the month as six Sunday-first weeks starting on the Sunday on or
/// before the 1st, so every month fills the same 42 cells.
pub(crate) fn build_month_grid<F>(
    year: i32,
    month: Month,
    today: Date,
    selected: Option<DateKey>,
    mut has_events: F,
) -> Result<MonthGrid, OutOfTimeError>
where
    F: FnMut(DateKey) -> bool,
{
    let first = Date::from_calendar_date(year, month, 1).map_err(|_| OutOfTimeError)?;
    let start = add_days(first, -i32::from(days_from_sunday(first)))?;
    let mut rows = Vec::with_capacity(GRID_ROWS);
    for r in 0..GRID_ROWS {
        let row_start = add_days(start, offset_days(r * DAYS_IN_WEEK))?;
        let week_number = iso_week_number(add_days(row_start, 4)?);
        let mut days = Vec::with_capacity(DAYS_IN_WEEK);
        for (c, weekday) in WEEKDAYS.into_iter().enumerate() {
            let date = add_days(row_start, offset_days(c))?;
            let key = DateKey(date);
            days.push(GridCell {
                date: key,
                weekday,
                is_current_month: date.year() == year && date.month() == month,
                is_today: date == today,
                is_selected: selected == Some(key),
                has_events: has_events(key),
            });
        }
        let days = <[GridCell; DAYS_IN_WEEK]>::try_from(days).map_err(|_| OutOfTimeError)?;
        rows.push(GridRow { week_number, days });
    }
    let rows = <[GridRow; GRID_ROWS]>::try_from(rows).map_err(|_| OutOfTimeError)?;
    Ok(MonthGrid { year, month, rows })
}

fn offset_days(n: usize) -> i32 {
    // Offsets within a grid are below 42
    i32::try_from(n).unwrap_or(i32::MAX)
}
