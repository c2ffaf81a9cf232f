//! Date ranges for reporting periods.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::Error;

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// The first day of the range.
    pub start: Date,
    /// The last day of the range.
    pub end: Date,
}

impl DateRange {
    /// Create a date range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The first and last day of a calendar month.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is not between 1 and 12, or
/// [Error::InvalidYear] if `year` is outside the supported range.
pub fn month_bounds(year: i32, month: u8) -> Result<DateRange, Error> {
    let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;
    let start = Date::from_calendar_date(year, month, 1).map_err(|_| Error::InvalidYear(year))?;
    let end = Date::from_calendar_date(year, month, last_day_of_month(year, month))
        .map_err(|_| Error::InvalidYear(year))?;

    Ok(DateRange { start, end })
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February if is_leap_year(year) => 29,
        Month::February => 28,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::range::{DateRange, month_bounds},
    };

    #[test]
    fn rejects_start_after_end() {
        let result = DateRange::new(date!(2025 - 02 - 01), date!(2025 - 01 - 01));

        assert_eq!(
            result,
            Err(Error::InvalidDateRange {
                start: date!(2025 - 02 - 01),
                end: date!(2025 - 01 - 01)
            })
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = DateRange::new(date!(2025 - 02 - 01), date!(2025 - 02 - 01)).unwrap();

        assert!(range.contains(date!(2025 - 02 - 01)));
        assert!(!range.contains(date!(2025 - 02 - 02)));
    }

    #[test]
    fn month_bounds_handles_leap_years() {
        assert_eq!(
            month_bounds(2024, 2),
            Ok(DateRange {
                start: date!(2024 - 02 - 01),
                end: date!(2024 - 02 - 29)
            })
        );
        assert_eq!(month_bounds(2025, 2).unwrap().end, date!(2025 - 02 - 28));
        assert_eq!(month_bounds(1900, 2).unwrap().end, date!(1900 - 02 - 28));
        assert_eq!(month_bounds(2000, 2).unwrap().end, date!(2000 - 02 - 29));
    }

    #[test]
    fn month_bounds_rejects_invalid_month() {
        assert_eq!(month_bounds(2025, 13), Err(Error::InvalidMonth(13)));
        assert_eq!(month_bounds(2025, 0), Err(Error::InvalidMonth(0)));
    }
}
