use std::ops::{Bound, RangeBounds};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::date_util::start_of_day;

/// A span of instants with explicit bound semantics.
///
/// The aggregator's window is inclusive on both ends; calendar periods and
/// the comparator use half-open windows so adjacent periods never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Bound<NaiveDateTime>,
    pub end: Bound<NaiveDateTime>,
}

impl Window {
    pub fn new(start: Bound<NaiveDateTime>, end: Bound<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Unbounded on both sides.
    pub fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[start, end]`
    pub fn inclusive(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(Bound::Included(start), Bound::Included(end))
    }

    /// `[start, end)`
    pub fn half_open(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(Bound::Included(start), Bound::Excluded(end))
    }

    /// Inclusive on whole days: from midnight of `first` up to, but not
    /// including, midnight after `last`. Either side may be open.
    pub fn days(first: Option<NaiveDate>, last: Option<NaiveDate>) -> Self {
        let start = first.map_or(Bound::Unbounded, |d| Bound::Included(start_of_day(d)));
        let end = last.map_or(Bound::Unbounded, |d| {
            Bound::Excluded(start_of_day(d) + Duration::days(1))
        });
        Self::new(start, end)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self.start, Bound::Unbounded) && matches!(self.end, Bound::Unbounded)
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        (self.start, self.end).contains(t)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::all()
    }
}
