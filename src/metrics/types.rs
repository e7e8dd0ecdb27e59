use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::due::{AgingReport, DueCounts};
use crate::query::window::Window;

/// What to aggregate and over which records.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Field whose exact value buckets `by_group`.
    pub group_by: Option<String>,
    /// Numeric or monetary field summed into `sum`/`average`.
    pub value_field: Option<String>,
    /// Date field tested against `window`.
    pub date_field: Option<String>,
    /// Only applies when `date_field` is set; a bounded window without a
    /// date field is ignored. Unbounded by default.
    pub window: Window,
    /// Sum absolute values (expense ledgers store negative amounts).
    pub absolute: bool,
    /// Bucket for records missing the group field. Defaults to
    /// [`UNKNOWN_GROUP`](crate::record::UNKNOWN_GROUP).
    pub unknown_group: Option<String>,
}

impl AggregateOptions {
    pub fn grouped_by(field: &str) -> Self {
        Self {
            group_by: Some(field.to_string()),
            ..Self::default()
        }
    }

    pub fn summing(field: &str) -> Self {
        Self {
            value_field: Some(field.to_string()),
            ..Self::default()
        }
    }

    pub fn unknown_as(mut self, label: &str) -> Self {
        self.unknown_group = Some(label.to_string());
        self
    }
}

/// Count, sum and average over a record collection.
///
/// `count` includes every record that passed the window; `valued` is the
/// subset with a parseable value, and is the denominator of `average`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub count: u64,
    pub valued: u64,
    pub sum: f64,
    /// `sum / valued`, or 0 when nothing was valued.
    pub average: f64,
    pub by_group: BTreeMap<String, u64>,
    pub sum_by_group: BTreeMap<String, f64>,
}

/// Inputs for a period-over-period comparison.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub date_field: String,
    /// Sum this field; count records when absent.
    pub amount_field: Option<String>,
    /// Half-open.
    pub current: Window,
    /// Half-open.
    pub previous: Window,
    pub absolute: bool,
}

/// Current vs. previous period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    /// `current - previous`
    pub delta: f64,
    /// Rounded to one decimal place.
    pub percent_change: f64,
}

/// Racing-team payments dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentMetrics {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_income: f64,
    pub income_change: Comparison,
    pub expense_change: Comparison,
    pub net_change: Comparison,
    /// Status `Pending` or `Overdue`.
    pub pending_count: u64,
    /// Unsettled payments classified by `dueDate`.
    pub due: DueCounts,
    /// Unsettled income bucketed by days past `dueDate`.
    pub receivables_aging: AgingReport,
}

/// Driver management dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverMetrics {
    pub total: u64,
    pub active: u64,
    pub average_rating: f64,
    pub license_renewals_due: u64,
    pub expired_licenses: u64,
    pub by_status: BTreeMap<String, u64>,
}

/// Maintenance scheduling dashboards (house and fleet).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleMetrics {
    pub total: u64,
    pub scheduled: u64,
    pub in_progress: u64,
    pub cost_this_month: f64,
    pub cost_by_group: BTreeMap<String, f64>,
    /// Open schedules classified by their due date.
    pub due: DueCounts,
    /// Open schedules overdue or inside the critical alert window.
    pub critical: u64,
    pub by_status: BTreeMap<String, u64>,
}

/// Maintenance request queues.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMetrics {
    pub total: u64,
    /// Anything not `Completed`.
    pub open: u64,
    pub pending_approval: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total_estimated_cost: f64,
    pub average_estimated_cost: f64,
    pub cost_by_priority: BTreeMap<String, f64>,
    pub by_priority: BTreeMap<String, u64>,
}
