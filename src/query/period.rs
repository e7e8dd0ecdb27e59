use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{last_day_of_month, quarter_of, start_of_day};
use crate::error::{Error, Result};
use crate::query::window::Window;

static RE_HALF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-H([12])$").unwrap());
static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// Explicit years are four digits, like every other period form.
const MAX_YEAR: i32 = 9999;

/// A calendar period for stat cards and period-over-period comparisons.
///
/// To-date variants end on the `today` passed to [`Period::date_range`];
/// nothing here reads the system clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Half(i32, u8),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    Rolling(u32, NaiveDate),
    YearToDate(i32),
    HalfToDate(i32, u8),
    QuarterToDate(i32, u8),
    MonthToDate(i32, u8),
    WeekToDate(i32, u8),
}

impl Period {
    /// The calendar month containing `today`.
    pub fn current_month(today: NaiveDate) -> Self {
        Period::Month(today.year(), today.month() as u8)
    }

    /// Parse a period string relative to `today`.
    ///
    /// Supported formats:
    /// - `2025`: year
    /// - `2025-H1`: half
    /// - `2025-Q1`: quarter
    /// - `2025-01`: month
    /// - `2025-W05`: ISO week
    /// - `30d`: rolling last N days ending today
    /// - `ytd`, `htd`, `qtd`, `mtd`, `wtd`: current period to date
    /// - `2025-ytd`: year to date for an explicit year
    pub fn parse_at(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "ytd" => return Ok(Period::YearToDate(today.year())),
            "htd" => {
                let half = if today.month() <= 6 { 1 } else { 2 };
                return Ok(Period::HalfToDate(today.year(), half));
            }
            "qtd" => return Ok(Period::QuarterToDate(today.year(), quarter_of(today))),
            "mtd" => return Ok(Period::MonthToDate(today.year(), today.month() as u8)),
            "wtd" => {
                let iw = today.iso_week();
                return Ok(Period::WeekToDate(iw.year(), iw.week() as u8));
            }
            _ => {}
        }

        if let Some(days) = s.strip_suffix('d').or_else(|| s.strip_suffix('D')) {
            if let Ok(n) = days.parse::<u32>() {
                if n == 0 {
                    return Err(Error::PeriodParse(format!("rolling period must be at least 1 day: {s}")));
                }
                // The previous window reaches back 2n days.
                if today.checked_sub_signed(Duration::days(2 * n as i64)).is_none() {
                    return Err(Error::PeriodParse(format!("rolling period out of range: {s}")));
                }
                return Ok(Period::Rolling(n, today));
            }
        }

        if let Some(rest) = s.strip_suffix("-ytd") {
            let year: i32 = rest
                .parse()
                .map_err(|_| Error::PeriodParse(format!("invalid year: {s}")))?;
            if !(0..=MAX_YEAR).contains(&year) {
                return Err(Error::PeriodParse(format!("year out of range: {s}")));
            }
            return Ok(Period::YearToDate(year));
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_HALF.captures(s) {
            let (year, half) = (parse_cap(&caps[1], s)?, parse_cap(&caps[2], s)?);
            return Ok(Period::Half(year, half));
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            let (year, q) = (parse_cap(&caps[1], s)?, parse_cap(&caps[2], s)?);
            return Ok(Period::Quarter(year, q));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let (year, week): (i32, u8) = (parse_cap(&caps[1], s)?, parse_cap(&caps[2], s)?);
            if NaiveDate::from_isoywd_opt(year, week as u32, Weekday::Mon).is_some() {
                return Ok(Period::Week(year, week));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let (year, month): (i32, u8) = (parse_cap(&caps[1], s)?, parse_cap(&caps[2], s)?);
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Canonical key string, e.g. for JSON output.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Half(y, h) => format!("{y}-H{h}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
            Period::YearToDate(y) => format!("{y}-ytd"),
            Period::HalfToDate(y, h) => format!("{y}-H{h}-td"),
            Period::QuarterToDate(y, q) => format!("{y}-Q{q}-td"),
            Period::MonthToDate(y, m) => format!("{y}-{m:02}-td"),
            Period::WeekToDate(y, w) => format!("{y}-W{w:02}-td"),
        }
    }

    /// Inclusive first and last day. To-date variants end at `today`,
    /// clamped to the end of their calendar period.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Year(y) => year_range(*y),
            Period::Half(y, h) => half_range(*y, *h),
            Period::Quarter(y, q) => quarter_range(*y, *q),
            Period::Month(y, m) => month_range(*y, *m),
            Period::Week(y, w) => week_range(*y, *w),
            Period::Rolling(n, as_of) => (*as_of - Duration::days(*n as i64 - 1), *as_of),
            Period::YearToDate(y) => to_date(year_range(*y), today),
            Period::HalfToDate(y, h) => to_date(half_range(*y, *h), today),
            Period::QuarterToDate(y, q) => to_date(quarter_range(*y, *q), today),
            Period::MonthToDate(y, m) => to_date(month_range(*y, *m), today),
            Period::WeekToDate(y, w) => to_date(week_range(*y, *w), today),
        }
    }

    /// Half-open window of instants: midnight of the first day up to
    /// midnight after the last day.
    pub fn window(&self, today: NaiveDate) -> Window {
        let (start, end) = self.date_range(today);
        Window::half_open(start_of_day(start), start_of_day(end) + Duration::days(1))
    }

    /// Get the previous period of the same type.
    pub fn previous(&self) -> Self {
        match self {
            Period::Year(y) => Period::Year(y - 1),
            Period::Half(y, h) => {
                let (y, h) = previous_half(*y, *h);
                Period::Half(y, h)
            }
            Period::Quarter(y, q) => {
                let (y, q) = previous_quarter(*y, *q);
                Period::Quarter(y, q)
            }
            Period::Month(y, m) => {
                let (y, m) = previous_month(*y, *m);
                Period::Month(y, m)
            }
            Period::Week(y, w) => {
                let (y, w) = previous_week(*y, *w);
                Period::Week(y, w)
            }
            Period::Rolling(n, as_of) => {
                Period::Rolling(*n, *as_of - Duration::days(*n as i64))
            }
            Period::YearToDate(y) => Period::YearToDate(y - 1),
            Period::HalfToDate(y, h) => {
                let (y, h) = previous_half(*y, *h);
                Period::HalfToDate(y, h)
            }
            Period::QuarterToDate(y, q) => {
                let (y, q) = previous_quarter(*y, *q);
                Period::QuarterToDate(y, q)
            }
            Period::MonthToDate(y, m) => {
                let (y, m) = previous_month(*y, *m);
                Period::MonthToDate(y, m)
            }
            Period::WeekToDate(y, w) => {
                let (y, w) = previous_week(*y, *w);
                Period::WeekToDate(y, w)
            }
        }
    }

    /// For period-over-period comparisons: returns the equivalent to-date
    /// range in the prior period. E.g., if this is Q1 2026 and as_of is
    /// Feb 7, returns the prior quarter clamped to the same day offset.
    pub fn prior_period_to_date(&self, as_of: NaiveDate) -> Self {
        let (start, _end) = self.date_range(as_of);
        let offset = (as_of - start).num_days().max(0);

        let prev = self.previous();
        let (prev_start, prev_end) = prev.date_range(as_of);
        let target = prev_start + Duration::days(offset);
        let clamped = target.min(prev_end);

        let days = (clamped - prev_start).num_days() + 1;
        Period::Rolling(days as u32, clamped)
    }

    pub fn is_to_date(&self) -> bool {
        matches!(
            self,
            Period::YearToDate(_)
                | Period::HalfToDate(..)
                | Period::QuarterToDate(..)
                | Period::MonthToDate(..)
                | Period::WeekToDate(..)
        )
    }

    /// Current and previous windows for a comparison. To-date periods are
    /// compared against the same elapsed span of the prior period; complete
    /// periods against the whole previous period.
    pub fn comparison_windows(&self, today: NaiveDate) -> (Window, Window) {
        let previous = if self.is_to_date() {
            self.prior_period_to_date(today)
        } else {
            self.previous()
        };
        (self.window(today), previous.window(today))
    }

    /// Returns true if this period contains `today`.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        let (start, end) = self.date_range(today);
        today >= start && today <= end
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn parse_cap<T: std::str::FromStr>(cap: &str, s: &str) -> Result<T> {
    cap.parse()
        .map_err(|_| Error::PeriodParse(format!("invalid period: {s}")))
}

fn to_date((start, end): (NaiveDate, NaiveDate), today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (start, today.clamp(start, end))
}

fn year_range(y: i32) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap(),
    )
}

fn half_range(y: i32, h: u8) -> (NaiveDate, NaiveDate) {
    if h == 1 {
        (
            NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, 6, 30).unwrap(),
        )
    } else {
        (
            NaiveDate::from_ymd_opt(y, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, 12, 31).unwrap(),
        )
    }
}

fn quarter_range(y: i32, q: u8) -> (NaiveDate, NaiveDate) {
    let start_month = (q as u32 - 1) * 3 + 1;
    let end_month = q as u32 * 3;
    (
        NaiveDate::from_ymd_opt(y, start_month, 1).unwrap(),
        last_day_of_month(y, end_month),
    )
}

fn month_range(y: i32, m: u8) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(y, m as u32, 1).unwrap(),
        last_day_of_month(y, m as u32),
    )
}

fn week_range(y: i32, w: u8) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_isoywd_opt(y, w as u32, Weekday::Mon).unwrap();
    (start, start + Duration::days(6))
}

fn previous_half(y: i32, h: u8) -> (i32, u8) {
    if h == 1 {
        (y - 1, 2)
    } else {
        (y, 1)
    }
}

fn previous_quarter(y: i32, q: u8) -> (i32, u8) {
    if q == 1 {
        (y - 1, 4)
    } else {
        (y, q - 1)
    }
}

fn previous_month(y: i32, m: u8) -> (i32, u8) {
    if m == 1 {
        (y - 1, 12)
    } else {
        (y, m - 1)
    }
}

fn previous_week(y: i32, w: u8) -> (i32, u8) {
    let (start, _) = week_range(y, w);
    let prior = (start - Duration::days(7)).iso_week();
    (prior.year(), prior.week() as u8)
}
