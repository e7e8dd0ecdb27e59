pub mod amount;

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::date_util::{from_epoch_millis, parse_datetime};
use crate::error::{Error, Result};

pub use amount::{parse_amount, parse_amount_str};

/// Group key used when a record has no value for the grouped field.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// One dashboard entity as returned by the backend: a flat field/value map.
///
/// No schema is imposed. Accessors normalize on read and never mutate the
/// underlying values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The record's `id`, rendered as text. Not guaranteed unique or present.
    pub fn id(&self) -> Option<Cow<'_, str>> {
        self.text("id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Text view of a field. Numbers and booleans are rendered; null,
    /// arrays and objects count as absent.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.fields.get(field)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Normalized monetary/numeric value of a field.
    pub fn amount(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(parse_amount)
    }

    /// Normalized instant of a date field. Numbers are epoch milliseconds.
    pub fn datetime(&self, field: &str) -> Option<NaiveDateTime> {
        match self.fields.get(field)? {
            Value::String(s) => parse_datetime(s),
            Value::Number(n) => n.as_f64().and_then(from_epoch_millis),
            _ => None,
        }
    }

    /// Grouping key for a field: the trimmed text value, or
    /// [`UNKNOWN_GROUP`] when missing or blank.
    pub fn group_key(&self, field: &str) -> String {
        self.group_key_or(field, UNKNOWN_GROUP)
    }

    pub fn group_key_or(&self, field: &str, unknown: &str) -> String {
        match self.text(field) {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => unknown.to_string(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Build a record from a `serde_json::json!({...})` object literal.
/// Non-object values produce an empty record.
impl From<Value> for Record {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::new(fields),
            _ => Self::default(),
        }
    }
}

/// Load a point-in-time snapshot of records from a JSON array.
///
/// Non-object array elements are skipped with a warning; a document that is
/// not an array is an error.
pub fn load_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let doc: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = doc else {
        return Err(Error::Snapshot("expected a JSON array of records".into()));
    };

    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            Value::Object(fields) => Some(Record::new(fields)),
            other => {
                log::warn!("Skipping snapshot element {idx}: not an object ({other})");
                None
            }
        })
        .collect();

    log::info!("Loaded {} of {} records from snapshot", records.len(), total);
    Ok(records)
}

/// Load a snapshot file. Open failures surface as [`Error::Io`].
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    log::debug!("Reading snapshot {}", path.display());
    let file = File::open(path)?;
    load_records(BufReader::new(file))
}
