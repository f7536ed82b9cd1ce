use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
const DAYS_PER_MONTH: i64 = 30;

/// Inclusive time window used to select commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// How the user expressed the window on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Between(NaiveDate, NaiveDate),
    Default,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "start date {} is after end date {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Window ending at `now` and reaching `length` into the past.
    pub fn trailing(now: DateTime<Utc>, length: TimeDelta) -> AppResult<Self> {
        let start = now.checked_sub_signed(length).ok_or_else(window_too_large)?;
        Self::new(start, now)
    }

    /// From the first second of `start` to the last second of `end`, local time.
    pub fn between_days(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        let first = local_to_utc(start, NaiveTime::MIN)?;
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let last = local_to_utc(end, last_second)?;
        Self::new(first, last)
    }

    pub fn from_window(window: Window, now: DateTime<Utc>) -> AppResult<Self> {
        match window {
            Window::Days(days) => Self::trailing(now, days_long(i64::from(days))?),
            Window::Weeks(weeks) => {
                let length = TimeDelta::try_weeks(i64::from(weeks)).ok_or_else(window_too_large)?;
                Self::trailing(now, length)
            }
            Window::Months(months) => {
                Self::trailing(now, days_long(i64::from(months) * DAYS_PER_MONTH)?)
            }
            Window::Between(start, end) => Self::between_days(start, end),
            Window::Default => Self::trailing(now, days_long(DEFAULT_WINDOW_DAYS)?),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn describe(&self) -> String {
        format!(
            "{} to {}",
            self.start.with_timezone(&Local).format(DATE_FORMAT),
            self.end.with_timezone(&Local).format(DATE_FORMAT)
        )
    }
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        AppError::InvalidInput(format!("'{value}' is not a YYYY-MM-DD date: {err}"))
    })
}

fn days_long(days: i64) -> AppResult<TimeDelta> {
    TimeDelta::try_days(days).ok_or_else(window_too_large)
}

fn window_too_large() -> AppError {
    AppError::InvalidInput("window too large".to_string())
}

fn local_to_utc(date: NaiveDate, time: NaiveTime) -> AppResult<DateTime<Utc>> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidInput(format!("{date} {time} does not exist locally")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let result = DateRange::new(at(2024, 3, 5, 0), at(2024, 3, 4, 0));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn both_endpoints_are_inclusive() {
        let range = DateRange::new(at(2024, 3, 4, 9), at(2024, 3, 4, 17)).unwrap();
        assert!(range.contains(at(2024, 3, 4, 9)));
        assert!(range.contains(at(2024, 3, 4, 17)));
        assert!(!range.contains(at(2024, 3, 4, 8)));
        assert!(!range.contains(at(2024, 3, 4, 18)));
    }

    #[test]
    fn relative_windows_end_now() {
        let now = at(2024, 3, 31, 12);
        let days = DateRange::from_window(Window::Days(3), now).unwrap();
        assert_eq!(days.start(), at(2024, 3, 28, 12));
        assert_eq!(days.end(), now);

        let weeks = DateRange::from_window(Window::Weeks(2), now).unwrap();
        assert_eq!(weeks.start(), at(2024, 3, 17, 12));

        let months = DateRange::from_window(Window::Months(1), now).unwrap();
        assert_eq!(months.start(), at(2024, 3, 1, 12));

        let fallback = DateRange::from_window(Window::Default, now).unwrap();
        assert_eq!(fallback.start(), at(2024, 3, 24, 12));
    }

    #[test]
    fn oversized_windows_are_rejected() {
        let now = at(2024, 3, 31, 12);
        for window in [
            Window::Days(100_000_000),
            Window::Weeks(u32::MAX),
            Window::Months(u32::MAX),
        ] {
            assert!(
                matches!(
                    DateRange::from_window(window, now),
                    Err(AppError::InvalidInput(_))
                ),
                "{window:?}"
            );
        }
        assert!(DateRange::from_window(Window::Days(u32::MAX / 1_000), now).is_ok());
    }

    #[test]
    fn single_day_covers_the_whole_day() {
        let day = parse_date("2024-03-04").unwrap();
        let range = DateRange::between_days(day, day).unwrap();
        assert_eq!(range.end() - range.start(), TimeDelta::seconds(86_399));
    }

    #[test]
    fn parses_dates_strictly() {
        assert_eq!(
            parse_date("2024-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
        assert!(matches!(
            parse_date("03/04/2024"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
