//! Month grid arithmetic and navigation bounds.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::models::Event;

/// Six weeks of seven days.
pub const GRID_DAYS: usize = 42;

pub const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// A calendar month, held as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth(date.with_day(1).unwrap_or(date))
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn previous(self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(YearMonth)
            .unwrap_or(self)
    }

    pub fn next(self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .map(YearMonth)
            .unwrap_or(self)
    }

    /// Heading text, e.g. `2024年 6月`.
    pub fn label(self) -> String {
        format!("{}年 {}月", self.year(), self.month())
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = chrono::ParseError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").map(YearMonth)
    }
}

/// Latest date events may be scheduled on and the calendar may reach:
/// one calendar month after `today`, clamped to the end of shorter months.
pub fn horizon(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// Whether `month` may be shown, i.e. it starts no later than the horizon.
pub fn within_horizon(month: YearMonth, today: NaiveDate) -> bool {
    month.first_day() <= horizon(today)
}

/// Whether navigating forward from `current` stays within the horizon.
pub fn can_advance(current: YearMonth, today: NaiveDate) -> bool {
    within_horizon(current.next(), today)
}

/// The Sunday on or before the first of the month.
pub fn grid_start(month: YearMonth) -> NaiveDate {
    let first = month.first_day();
    let back = u64::from(first.weekday().num_days_from_sunday());
    first.checked_sub_days(Days::new(back)).unwrap_or(first)
}

#[derive(Debug, Clone)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub iso: String,
    pub in_month: bool,
    pub is_today: bool,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub month: YearMonth,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    pub fn weeks(&self) -> std::slice::Chunks<'_, DayCell> {
        self.cells.chunks(7)
    }
}

/// Lay `events` out over the 42-day grid covering `month`.
pub fn month_grid(month: YearMonth, events: &[Event], today: NaiveDate) -> MonthGrid {
    let cells = grid_start(month)
        .iter_days()
        .take(GRID_DAYS)
        .map(|date| DayCell {
            date,
            day: date.day(),
            iso: date.format("%Y-%m-%d").to_string(),
            in_month: month.contains(date),
            is_today: date == today,
            events: crate::models::event::events_for_date(events, date)
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect();

    MonthGrid { month, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn event(id: i64, on: &str) -> Event {
        Event {
            id,
            location: String::new(),
            name: format!("e{id}"),
            date: date(on),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            instructor: String::new(),
            color: "#000000".to_string(),
        }
    }

    #[test]
    fn every_month_has_42_cells_starting_on_a_sunday() {
        let today = date("2024-06-15");
        for year in 1999..=2031 {
            for m in 1..=12 {
                let month = YearMonth::new(year, m).unwrap();
                let grid = month_grid(month, &[], today);
                assert_eq!(grid.cells.len(), GRID_DAYS);
                let first = &grid.cells[0];
                assert_eq!(first.date.weekday(), Weekday::Sun);
                assert!(first.date <= month.first_day());
                assert!(month.first_day() - first.date < chrono::Duration::days(7));
                assert_eq!(grid.weeks().count(), 6);
            }
        }
    }

    #[test]
    fn cells_are_tagged_in_or_out_of_month() {
        // June 2024 starts on a Saturday.
        let grid = month_grid(YearMonth::new(2024, 6).unwrap(), &[], date("2024-06-15"));
        assert_eq!(grid.cells[0].iso, "2024-05-26");
        assert!(!grid.cells[0].in_month);
        assert_eq!(grid.cells[6].iso, "2024-06-01");
        assert!(grid.cells[6].in_month);
        assert!(grid.cells.iter().filter(|c| c.is_today).count() == 1);
        assert_eq!(grid.cells.iter().filter(|c| c.in_month).count(), 30);
    }

    #[test]
    fn first_of_month_on_sunday_starts_the_grid() {
        // September 2024 starts on a Sunday.
        let grid = month_grid(YearMonth::new(2024, 9).unwrap(), &[], date("2024-09-01"));
        assert_eq!(grid.cells[0].iso, "2024-09-01");
    }

    #[test]
    fn events_land_on_their_day_in_collection_order() {
        let events = vec![event(2, "2024-06-03"), event(1, "2024-06-03"), event(3, "2024-07-01")];
        let grid = month_grid(YearMonth::new(2024, 6).unwrap(), &events, date("2024-06-15"));
        let cell = grid.cells.iter().find(|c| c.iso == "2024-06-03").unwrap();
        let ids: Vec<_> = cell.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
        // July 1st trails the June grid as an other-month cell.
        let trailing = grid.cells.iter().find(|c| c.iso == "2024-07-01").unwrap();
        assert!(!trailing.in_month);
        assert_eq!(trailing.events.len(), 1);
    }

    #[test]
    fn forward_navigation_stops_past_one_month() {
        let today = date("2024-06-15");
        let june = YearMonth::of(today);
        assert!(can_advance(june, today));
        assert!(!can_advance(june.next(), today));
        assert!(within_horizon(june.previous().previous(), today));
    }

    #[test]
    fn horizon_clamps_to_shorter_months() {
        assert_eq!(horizon(date("2024-01-31")), date("2024-02-29"));
        assert_eq!(horizon(date("2024-06-15")), date("2024-07-15"));
    }

    #[test]
    fn year_month_parses_and_wraps() {
        let dec: YearMonth = "2024-12".parse().unwrap();
        assert_eq!(dec.next().to_string(), "2025-01");
        assert_eq!(YearMonth::new(2024, 1).unwrap().previous().to_string(), "2023-12");
        assert_eq!(dec.label(), "2024年 12月");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("june".parse::<YearMonth>().is_err());
    }
}
