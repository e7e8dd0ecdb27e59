use chrono::NaiveDate;
use serde::Serialize;

use crate::query::window::Window;
use crate::record::Record;

/// Option value that disables a dropdown criterion.
pub const ALL: &str = "all";

/// Criteria for narrowing a record list, as driven by a dashboard's search
/// box and filter dropdowns. All set criteria must hold.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterCriteria {
    search_text: Option<String>,
    search_fields: Vec<String>,
    status: Option<String>,
    category: Option<String>,
    record_type: Option<String>,
    equals: Vec<(String, String)>,
    date_field: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring search across `fields`. A record matches
    /// when any one of them contains `text`.
    pub fn search<S: AsRef<str>>(mut self, text: &str, fields: &[S]) -> Self {
        self.search_text = Some(text.to_string());
        self.search_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn status(mut self, value: &str) -> Self {
        self.status = selection(value);
        self
    }

    pub fn category(mut self, value: &str) -> Self {
        self.category = selection(value);
        self
    }

    /// Exact match on the record's `type` field.
    pub fn record_type(mut self, value: &str) -> Self {
        self.record_type = selection(value);
        self
    }

    /// Exact match on an arbitrary field. `"all"` is ignored.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        if let Some(v) = selection(value) {
            self.equals.push((name.to_string(), v));
        }
        self
    }

    /// Inclusive day range on `field`. Either end may be open.
    pub fn date_range(mut self, field: &str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_field = Some(field.to_string());
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.active_search().is_none()
            && self.status.is_none()
            && self.category.is_none()
            && self.record_type.is_none()
            && self.equals.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    fn active_search(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

fn selection(value: &str) -> Option<String> {
    if value.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(value.to_string())
    }
}

fn field_equals(record: &Record, field: &str, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => record.text(field).is_some_and(|v| v == expected),
    }
}

/// Evaluate `criteria` against a single record.
///
/// A missing field fails the criterion that names it; it is never an error.
pub fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    if let Some(needle) = criteria.active_search() {
        let hit = criteria.search_fields.iter().any(|f| {
            record
                .text(f)
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        });
        if !hit {
            return false;
        }
    }

    if !field_equals(record, "status", criteria.status.as_deref())
        || !field_equals(record, "category", criteria.category.as_deref())
        || !field_equals(record, "type", criteria.record_type.as_deref())
    {
        return false;
    }

    if !criteria
        .equals
        .iter()
        .all(|(name, value)| field_equals(record, name, Some(value)))
    {
        return false;
    }

    if criteria.date_from.is_some() || criteria.date_to.is_some() {
        let window = Window::days(criteria.date_from, criteria.date_to);
        let in_range = criteria
            .date_field
            .as_deref()
            .and_then(|f| record.datetime(f))
            .is_some_and(|t| window.contains(&t));
        if !in_range {
            return false;
        }
    }

    true
}

/// Records matching `criteria`, in input order.
pub fn filter<'a>(records: &'a [Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    records.iter().filter(|r| matches(r, criteria)).collect()
}
