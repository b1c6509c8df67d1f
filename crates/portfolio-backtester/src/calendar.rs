//! Exchange calendars: which dates are open trading sessions.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use core_types::Exchange;

/// A schedule of open sessions.
pub trait TradingCalendar: Send + Sync {
    fn name(&self) -> &str;

    fn is_session(&self, date: NaiveDate) -> bool;

    /// All sessions in `[start, end]`, ascending. Empty when `end < start`.
    fn sessions(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| self.is_session(*date))
            .collect()
    }
}

/// Monday to Friday. Not holiday-aware.
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every weekday is a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl TradingCalendar for WeekdayCalendar {
    fn name(&self) -> &str {
        "weekday"
    }

    fn is_session(&self, date: NaiveDate) -> bool {
        is_weekday(date)
    }
}

/// The New York Stock Exchange: weekdays minus the regular full-day holidays.
///
/// One-off closures (national days of mourning, weather) are not modelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NyseCalendar;

impl NyseCalendar {
    pub fn is_holiday(date: NaiveDate) -> bool {
        Self::holidays(date.year()).contains(&date)
    }

    /// The observed full-day holidays of `year`, in calendar order.
    pub fn holidays(year: i32) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(10);

        // A Saturday New Year's Day is not moved back into the previous year.
        if let Some(new_year) = NaiveDate::from_ymd_opt(year, 1, 1) {
            match new_year.weekday() {
                Weekday::Sat => {}
                Weekday::Sun => days.extend(new_year.checked_add_days(Days::new(1))),
                _ => days.push(new_year),
            }
        }
        if year >= 1998 {
            days.extend(nth_weekday(year, 1, Weekday::Mon, 3));
        }
        days.extend(nth_weekday(year, 2, Weekday::Mon, 3));
        days.extend(easter_sunday(year).and_then(|easter| easter.checked_sub_days(Days::new(2))));
        days.extend(last_weekday(year, 5, Weekday::Mon));
        if year >= 2022 {
            days.extend(observed(year, 6, 19));
        }
        days.extend(observed(year, 7, 4));
        days.extend(nth_weekday(year, 9, Weekday::Mon, 1));
        days.extend(nth_weekday(year, 11, Weekday::Thu, 4));
        days.extend(observed(year, 12, 25));

        days
    }
}

impl TradingCalendar for NyseCalendar {
    fn name(&self) -> &str {
        "NYSE"
    }

    fn is_session(&self, date: NaiveDate) -> bool {
        is_weekday(date) && !Self::is_holiday(date)
    }

    fn sessions(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut holidays = Vec::new();
        for year in start.year()..=end.year() {
            holidays.extend(Self::holidays(year));
        }
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| is_weekday(*date) && !holidays.contains(date))
            .collect()
    }
}

pub fn calendar_for(exchange: Exchange) -> Box<dyn TradingCalendar> {
    match exchange {
        Exchange::Nyse => Box::new(NyseCalendar),
        Exchange::Weekday => Box::new(WeekdayCalendar),
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    match date.weekday() {
        Weekday::Sat => date.checked_sub_days(Days::new(1)),
        Weekday::Sun => date.checked_add_days(Days::new(1)),
        _ => Some(date),
    }
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2023), Some(d(2023, 4, 9)));
        assert_eq!(easter_sunday(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
    }

    #[test]
    fn nyse_holidays_2023() {
        let expected = vec![
            d(2023, 1, 2),
            d(2023, 1, 16),
            d(2023, 2, 20),
            d(2023, 4, 7),
            d(2023, 5, 29),
            d(2023, 6, 19),
            d(2023, 7, 4),
            d(2023, 9, 4),
            d(2023, 11, 23),
            d(2023, 12, 25),
        ];
        assert_eq!(NyseCalendar::holidays(2023), expected);
    }

    #[test]
    fn saturday_new_year_is_not_observed_on_friday() {
        // 2022-01-01 was a Saturday; the exchange was open on 2021-12-31.
        assert!(NyseCalendar.is_session(d(2021, 12, 31)));
        // 2021-07-04 was a Sunday, observed Monday.
        assert!(!NyseCalendar.is_session(d(2021, 7, 5)));
        // Juneteenth 2021 predates the holiday.
        assert!(NyseCalendar.is_session(d(2021, 6, 18)));
    }

    #[test]
    fn nyse_has_250_sessions_in_2023() {
        let sessions = NyseCalendar.sessions(d(2023, 1, 1), d(2023, 12, 31));
        assert_eq!(sessions.len(), 250);
        assert_eq!(sessions.first(), Some(&d(2023, 1, 3)));
        assert_eq!(sessions.last(), Some(&d(2023, 12, 29)));
    }

    #[test]
    fn weekday_calendar_ignores_holidays() {
        let sessions = WeekdayCalendar.sessions(d(2023, 12, 22), d(2023, 12, 27));
        assert_eq!(sessions, vec![d(2023, 12, 22), d(2023, 12, 25), d(2023, 12, 26), d(2023, 12, 27)]);
        assert!(WeekdayCalendar.sessions(d(2023, 12, 27), d(2023, 12, 22)).is_empty());
    }
}
