use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Good Friday for a given year: Gregorian Easter via the Computus
/// (Meeus/Jones/Butcher) minus two days.
pub fn good_friday(year: i32) -> Option<NaiveDate> {
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
    let day = ((h + l - 7 * m + 114) % 31) + 1;

    let easter = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    Some(easter - Duration::days(2))
}

/// Fourth Thursday of November.
pub fn thanksgiving(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_monday_of_may(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, 5, Weekday::Mon, 5)
        .or_else(|| NaiveDate::from_weekday_of_month_opt(year, 5, Weekday::Mon, 4))
}

/// A fixed-date holiday plus its observed date when it falls on a weekend
/// (Saturday observed Friday, Sunday observed Monday).
fn with_observed(date: NaiveDate, out: &mut HashSet<NaiveDate>) {
    out.insert(date);
    match date.weekday() {
        Weekday::Sat => {
            out.insert(date - Duration::days(1));
        }
        Weekday::Sun => {
            out.insert(date + Duration::days(1));
        }
        _ => {}
    }
}

fn federal_holidays(year: i32, out: &mut HashSet<NaiveDate>) {
    if let Some(d) = NaiveDate::from_ymd_opt(year, 1, 1) {
        with_observed(d, out);
    }
    if let Some(d) = nth_weekday(year, 1, Weekday::Mon, 3) {
        out.insert(d); // Martin Luther King Jr. Day
    }
    if let Some(d) = nth_weekday(year, 2, Weekday::Mon, 3) {
        out.insert(d); // Washington's Birthday
    }
    if let Some(d) = last_monday_of_may(year) {
        out.insert(d); // Memorial Day
    }
    if year >= 2021 {
        if let Some(d) = NaiveDate::from_ymd_opt(year, 6, 19) {
            with_observed(d, out); // Juneteenth
        }
    }
    if let Some(d) = NaiveDate::from_ymd_opt(year, 7, 4) {
        with_observed(d, out);
    }
    if let Some(d) = nth_weekday(year, 9, Weekday::Mon, 1) {
        out.insert(d); // Labor Day
    }
    if let Some(d) = nth_weekday(year, 10, Weekday::Mon, 2) {
        out.insert(d); // Columbus Day
    }
    if let Some(d) = NaiveDate::from_ymd_opt(year, 11, 11) {
        with_observed(d, out); // Veterans Day
    }
    if let Some(d) = thanksgiving(year) {
        out.insert(d - Duration::days(1));
        out.insert(d);
        out.insert(d + Duration::days(1));
    }
    if let Some(d) = NaiveDate::from_ymd_opt(year, 12, 25) {
        with_observed(d, out);
    }
}

/// Market closure dates for the given year range: US federal holidays plus
/// Good Friday and the days surrounding Thanksgiving. Built once per session
/// and held by the price cache.
pub fn market_holidays(years: RangeInclusive<i32>) -> HashSet<NaiveDate> {
    let mut out = HashSet::new();
    for year in years {
        federal_holidays(year, &mut out);
        if let Some(d) = good_friday(year) {
            out.insert(d);
        }
    }
    out
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Shift a weekend date back to the preceding Friday; weekdays pass through.
pub fn nearest_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

/// Resolve an arbitrary calendar date to the trading day a close would be
/// quoted for: Saturday back one day, Sunday back two; if that lands on a
/// recognized holiday, back one further day, or three when the holiday is a
/// Monday (skipping the adjacent weekend).
pub fn to_trading_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> NaiveDate {
    let mut adjusted = nearest_weekday(date);
    if holidays.contains(&adjusted) {
        if adjusted.weekday() == Weekday::Mon {
            adjusted -= Duration::days(3);
        } else {
            adjusted -= Duration::days(1);
        }
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn computes_good_friday() {
        assert_eq!(good_friday(2023), Some(date(2023, 4, 7)));
        assert_eq!(good_friday(2024), Some(date(2024, 3, 29)));
        assert_eq!(good_friday(2025), Some(date(2025, 4, 18)));
    }

    #[test]
    fn computes_thanksgiving() {
        assert_eq!(thanksgiving(2023), Some(date(2023, 11, 23)));
        assert_eq!(thanksgiving(2024), Some(date(2024, 11, 28)));
    }

    #[test]
    fn holiday_set_includes_thanksgiving_neighbors() {
        let holidays = market_holidays(2024..=2024);
        assert!(holidays.contains(&date(2024, 11, 27)));
        assert!(holidays.contains(&date(2024, 11, 28)));
        assert!(holidays.contains(&date(2024, 11, 29)));
        assert!(holidays.contains(&date(2024, 3, 29)));
        assert!(holidays.contains(&date(2024, 1, 1)));
        assert!(holidays.contains(&date(2024, 7, 4)));
    }

    #[test]
    fn weekend_shifts_to_friday() {
        let holidays = market_holidays(2023..=2023);
        // 2023-08-05 is a Saturday, 2023-08-06 a Sunday.
        assert_eq!(to_trading_day(date(2023, 8, 5), &holidays), date(2023, 8, 4));
        assert_eq!(to_trading_day(date(2023, 8, 6), &holidays), date(2023, 8, 4));
        assert_eq!(to_trading_day(date(2023, 8, 7), &holidays), date(2023, 8, 7));
    }

    #[test]
    fn midweek_holiday_shifts_back_one() {
        let holidays = market_holidays(2023..=2023);
        // 2023-07-04 is a Tuesday.
        assert_eq!(to_trading_day(date(2023, 7, 4), &holidays), date(2023, 7, 3));
    }

    #[test]
    fn monday_holiday_shifts_back_three() {
        let holidays = market_holidays(2024..=2024);
        // MLK Day 2024-01-15 is a Monday; previous trading day is Friday the 12th.
        assert_eq!(
            to_trading_day(date(2024, 1, 15), &holidays),
            date(2024, 1, 12)
        );
    }
}
