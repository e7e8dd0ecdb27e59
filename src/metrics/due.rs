use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Badge classification for a due or expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueStatus {
    Overdue,
    DueSoon,
    Upcoming,
    NotApplicable,
}

impl DueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "Overdue",
            DueStatus::DueSoon => "Due Soon",
            DueStatus::Upcoming => "Upcoming",
            DueStatus::NotApplicable => "N/A",
        }
    }
}

impl std::fmt::Display for DueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How far ahead a date still counts as due soon. Each dashboard picks its
/// own window (license renewals look months ahead, maintenance a week).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub due_soon_days: u32,
}

impl Thresholds {
    pub fn days(due_soon_days: u32) -> Self {
        Self { due_soon_days }
    }
}

/// Tally of statuses over a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DueCounts {
    pub overdue: u64,
    pub due_soon: u64,
    pub upcoming: u64,
    pub not_applicable: u64,
}

impl DueCounts {
    fn record(&mut self, status: DueStatus) {
        match status {
            DueStatus::Overdue => self.overdue += 1,
            DueStatus::DueSoon => self.due_soon += 1,
            DueStatus::Upcoming => self.upcoming += 1,
            DueStatus::NotApplicable => self.not_applicable += 1,
        }
    }
}

/// Classify `date` relative to `now`.
///
/// The due-soon window `[now, now + due_soon_days]` is inclusive at both
/// ends, so a date exactly equal to `now` is `DueSoon` rather than `Overdue`.
pub fn classify(date: Option<NaiveDateTime>, now: NaiveDateTime, thresholds: &Thresholds) -> DueStatus {
    let Some(date) = date else {
        return DueStatus::NotApplicable;
    };
    if date < now {
        DueStatus::Overdue
    } else if within(date, now, thresholds.due_soon_days) {
        DueStatus::DueSoon
    } else {
        DueStatus::Upcoming
    }
}

/// `date <= now + days`. A horizon past the last representable date is
/// unbounded.
fn within(date: NaiveDateTime, now: NaiveDateTime, days: u32) -> bool {
    match now.checked_add_signed(Duration::days(days as i64)) {
        Some(horizon) => date <= horizon,
        None => true,
    }
}

/// Classify a record's date field. Missing or unparseable dates are
/// `NotApplicable`.
pub fn classify_field(record: &Record, field: &str, now: NaiveDateTime, thresholds: &Thresholds) -> DueStatus {
    classify(record.datetime(field), now, thresholds)
}

/// Whole days from `now` until the record's date; negative when past.
pub fn days_until(record: &Record, field: &str, now: NaiveDateTime) -> Option<i64> {
    record.datetime(field).map(|d| (d - now).num_days())
}

/// Alert severity for scheduled work, ahead of the dashboard badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

/// Two-tier alert windows in days before the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub critical_days: u32,
    pub warning_days: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            critical_days: 1,
            warning_days: 7,
        }
    }
}

/// `Critical` when overdue or due within `critical_days`, `Warning` within
/// `warning_days`, otherwise no alert. Absent dates raise nothing.
pub fn alert_severity(date: Option<NaiveDateTime>, now: NaiveDateTime, thresholds: &AlertThresholds) -> Option<Severity> {
    let date = date?;
    if within(date, now, thresholds.critical_days) {
        Some(Severity::Critical)
    } else if within(date, now, thresholds.warning_days) {
        Some(Severity::Warning)
    } else {
        None
    }
}

pub fn count_by_status<'a, I>(records: I, field: &str, now: NaiveDateTime, thresholds: &Thresholds) -> DueCounts
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = DueCounts::default();
    for record in records {
        counts.record(classify_field(record, field, now, thresholds));
    }
    counts
}

/// One age band of an aging report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingBucket {
    pub label: String,
    pub count: u64,
    pub total: f64,
}

/// Outstanding amounts bucketed by days past due.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgingReport {
    pub buckets: Vec<AgingBucket>,
    pub total_outstanding: f64,
    /// Records without a parseable due date; not bucketed.
    pub undated: u64,
}

/// Bucket records by whole days past `date_field`, summing `amount_field`.
///
/// `intervals` are upper bounds in days, e.g. `[30, 60, 90]` gives
/// `Current` (not yet past due), `1-30 days`, `31-60 days`, `61-90 days`
/// and `90+ days`. With no intervals, everything past due lands in a single
/// `Past due` bucket. Zeros and duplicates are ignored. Unparseable amounts
/// are counted but add nothing to totals.
pub fn aging<'a, I>(records: I, date_field: &str, amount_field: &str, now: NaiveDateTime, intervals: &[u32]) -> AgingReport
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut bounds: Vec<u32> = intervals.iter().copied().filter(|&d| d > 0).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut labels = vec!["Current".to_string()];
    let mut lower = 1;
    for &upper in &bounds {
        labels.push(format!("{lower}-{upper} days"));
        lower = upper.saturating_add(1);
    }
    labels.push(match bounds.last() {
        Some(last) => format!("{last}+ days"),
        None => "Past due".to_string(),
    });

    let mut report = AgingReport {
        buckets: labels
            .into_iter()
            .map(|label| AgingBucket {
                label,
                count: 0,
                total: 0.0,
            })
            .collect(),
        ..Default::default()
    };

    for record in records {
        let Some(due) = record.datetime(date_field) else {
            report.undated += 1;
            continue;
        };
        let age = (now.date() - due.date()).num_days();
        let idx = if age <= 0 {
            0
        } else {
            1 + bounds.iter().take_while(|&&b| age > b as i64).count()
        };

        let bucket = &mut report.buckets[idx];
        bucket.count += 1;
        if let Some(amount) = record.amount(amount_field) {
            bucket.total += amount;
            report.total_outstanding += amount;
        }
    }
    report
}
