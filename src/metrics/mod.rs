pub mod aggregate;
pub mod compare;
pub mod due;
pub mod types;

pub use aggregate::{aggregate, count_by, count_where};
pub use compare::{compare, percent_change};
pub use due::{
    aging, alert_severity, classify, classify_field, count_by_status, AgingBucket, AgingReport, AlertThresholds,
    DueCounts, DueStatus, Severity, Thresholds,
};
pub use types::*;

use chrono::NaiveDateTime;

use crate::config::Config;
use crate::query::filter::{filter, FilterCriteria};
use crate::query::period::Period;
use crate::record::Record;

const SETTLED_PAYMENT: &[&str] = &["Paid", "Received", "Cancelled"];
const CLOSED_SCHEDULE: &[&str] = &["Completed", "Cancelled"];

fn status_in(record: &Record, statuses: &[&str]) -> bool {
    record
        .text("status")
        .is_some_and(|s| statuses.contains(&s.as_ref()))
}

fn status_counts(records: &[Record], config: &Config) -> std::collections::BTreeMap<String, u64> {
    aggregate(
        records,
        &AggregateOptions::grouped_by("status").unknown_as(&config.unknown_group_label),
    )
    .by_group
}

/// Compute the payments dashboard over a ledger of `Income`/`Expense`
/// transactions. Expense amounts may be stored signed; they are summed by
/// magnitude.
pub fn compute_payment_metrics(records: &[Record], now: NaiveDateTime, config: &Config) -> PaymentMetrics {
    let today = now.date();
    let income = filter(records, &FilterCriteria::new().record_type("Income"));
    let expenses = filter(records, &FilterCriteria::new().record_type("Expense"));

    let total_income = aggregate(income.iter().copied(), &AggregateOptions::summing("amount")).sum;
    let total_expenses = aggregate(
        expenses.iter().copied(),
        &AggregateOptions {
            value_field: Some("amount".into()),
            absolute: true,
            ..Default::default()
        },
    )
    .sum;

    let month_over_month = CompareOptions::month_over_month("date", today).amount("amount");
    let income_change = compare(income.iter().copied(), &month_over_month);
    let expense_change = compare(expenses.iter().copied(), &month_over_month.clone().absolute());
    let net_change = Comparison::from_values(
        income_change.current - expense_change.current,
        income_change.previous - expense_change.previous,
    );

    let pending_count = records
        .iter()
        .filter(|r| status_in(r, &["Pending", "Overdue"]))
        .count() as u64;
    let due = count_by_status(
        records.iter().filter(|r| !status_in(r, SETTLED_PAYMENT)),
        "dueDate",
        now,
        &config.thresholds.payment(),
    );
    let receivables_aging = aging(
        income.iter().copied().filter(|r| !status_in(r, SETTLED_PAYMENT)),
        "dueDate",
        "amount",
        now,
        &config.aging_intervals,
    );

    PaymentMetrics {
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
        income_change,
        expense_change,
        net_change,
        pending_count,
        due,
        receivables_aging,
    }
}

/// Compute the driver management dashboard.
pub fn compute_driver_metrics(records: &[Record], now: NaiveDateTime, config: &Config) -> DriverMetrics {
    let by_status = status_counts(records, config);
    let ratings = aggregate(records, &AggregateOptions::summing("rating"));
    let licenses = count_by_status(
        records,
        "licenseExpiry",
        now,
        &config.thresholds.license_renewal(),
    );

    DriverMetrics {
        total: records.len() as u64,
        active: by_status.get("Active").copied().unwrap_or(0),
        average_rating: ratings.average,
        license_renewals_due: licenses.due_soon,
        expired_licenses: licenses.overdue,
        by_status,
    }
}

/// Compute a maintenance schedule dashboard. Field names come from
/// `config.schedule` so house and fleet schedules share this.
pub fn compute_schedule_metrics(records: &[Record], now: NaiveDateTime, config: &Config) -> ScheduleMetrics {
    let fields = &config.schedule;
    let today = now.date();

    let this_month = aggregate(
        records,
        &AggregateOptions {
            value_field: Some(fields.cost_field.clone()),
            date_field: Some(fields.date_field.clone()),
            window: Period::current_month(today).window(today),
            ..Default::default()
        },
    );
    let overall = aggregate(
        records,
        &AggregateOptions {
            group_by: Some(fields.group_field.clone()),
            value_field: Some(fields.cost_field.clone()),
            unknown_group: Some(config.unknown_group_label.clone()),
            ..Default::default()
        },
    );
    let by_status = status_counts(records, config);
    let open = || records.iter().filter(|r| !status_in(r, CLOSED_SCHEDULE));
    let due = count_by_status(open(), &fields.date_field, now, &config.thresholds.maintenance());
    let alerts = config.thresholds.maintenance_alerts();
    let critical = open()
        .filter(|r| alert_severity(r.datetime(&fields.date_field), now, &alerts) == Some(Severity::Critical))
        .count() as u64;

    ScheduleMetrics {
        total: overall.count,
        scheduled: by_status.get("Scheduled").copied().unwrap_or(0),
        in_progress: by_status.get("In Progress").copied().unwrap_or(0),
        cost_this_month: this_month.sum,
        cost_by_group: overall.sum_by_group,
        due,
        critical,
        by_status,
    }
}

/// Compute the maintenance request queue summary.
pub fn compute_request_metrics(records: &[Record], config: &Config) -> RequestMetrics {
    let by_status = status_counts(records, config);
    let costs = aggregate(
        records,
        &AggregateOptions {
            group_by: Some("priority".into()),
            value_field: Some("estimatedCost".into()),
            unknown_group: Some(config.unknown_group_label.clone()),
            ..Default::default()
        },
    );
    let completed = by_status.get("Completed").copied().unwrap_or(0);

    RequestMetrics {
        total: costs.count,
        open: costs.count - completed,
        pending_approval: by_status.get("Pending Approval").copied().unwrap_or(0),
        in_progress: by_status.get("In Progress").copied().unwrap_or(0),
        completed,
        total_estimated_cost: costs.sum,
        average_estimated_cost: costs.average,
        cost_by_priority: costs.sum_by_group,
        by_priority: costs.by_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values.into_iter().map(Record::from).collect()
    }

    #[test]
    fn test_payment_metrics() {
        let ledger = records(vec![
            json!({"id": "1", "type": "Income", "amount": 5000, "status": "Received", "date": "2025-01-03"}),
            json!({"id": "2", "type": "Income", "amount": 2000, "status": "Pending", "date": "2024-12-20",
                   "dueDate": "2025-01-18"}),
            json!({"id": "3", "type": "Expense", "amount": -1500, "status": "Paid", "date": "2025-01-10"}),
            json!({"id": "4", "type": "Expense", "amount": -3000, "status": "Overdue", "date": "2024-12-05",
                   "dueDate": "2025-01-01"}),
            json!({"id": "5", "type": "Expense", "amount": "TBD", "status": "Pending", "date": "2025-01-12",
                   "dueDate": "2025-03-01"}),
        ]);
        let m = compute_payment_metrics(&ledger, now(), &Config::default());

        assert_eq!(m.total_income, 7000.0);
        assert_eq!(m.total_expenses, 4500.0);
        assert_eq!(m.net_income, 2500.0);

        assert_eq!(m.income_change.current, 5000.0);
        assert_eq!(m.income_change.previous, 2000.0);
        assert_eq!(m.income_change.percent_change, 150.0);

        assert_eq!(m.expense_change.current, 1500.0);
        assert_eq!(m.expense_change.previous, 3000.0);
        assert_eq!(m.expense_change.percent_change, -50.0);

        // Net: 3500 this month vs -1000 last month.
        assert_eq!(m.net_change.current, 3500.0);
        assert_eq!(m.net_change.previous, -1000.0);
        assert_eq!(m.net_change.delta, 4500.0);
        assert_eq!(m.net_change.percent_change, 450.0);

        assert_eq!(m.pending_count, 3);
        assert_eq!(m.due.overdue, 1);
        assert_eq!(m.due.due_soon, 1);
        assert_eq!(m.due.upcoming, 1);

        let aging = &m.receivables_aging;
        assert_eq!(aging.buckets[0].label, "Current");
        assert_eq!(aging.buckets[0].count, 1);
        assert_eq!(aging.total_outstanding, 2000.0);
        assert_eq!(aging.buckets.len(), 6);
    }

    #[test]
    fn test_payment_metrics_empty() {
        let m = compute_payment_metrics(&[], now(), &Config::default());
        assert_eq!(m.total_income, 0.0);
        assert_eq!(m.net_change.percent_change, 0.0);
        assert_eq!(m.pending_count, 0);
    }

    #[test]
    fn test_driver_metrics() {
        let drivers = records(vec![
            json!({"name": "A", "status": "Active", "rating": 4.5, "licenseExpiry": "2025-03-01"}),
            json!({"name": "B", "status": "Active", "rating": "4.0", "licenseExpiry": "2026-06-01"}),
            json!({"name": "C", "status": "On Leave", "rating": "unrated", "licenseExpiry": "2024-12-31"}),
            json!({"name": "D", "licenseExpiry": "2025-04-14"}),
        ]);
        let m = compute_driver_metrics(&drivers, now(), &Config::default());
        assert_eq!(m.total, 4);
        assert_eq!(m.active, 2);
        assert_eq!(m.average_rating, 4.25);
        assert_eq!(m.license_renewals_due, 2);
        assert_eq!(m.expired_licenses, 1);
        assert_eq!(m.by_status.get("Unknown"), Some(&1));
    }

    #[test]
    fn test_driver_metrics_empty_average_is_zero() {
        let m = compute_driver_metrics(&[], now(), &Config::default());
        assert_eq!(m.average_rating, 0.0);
        assert_eq!(m.total, 0);
    }

    #[test]
    fn test_schedule_metrics() {
        let schedules = records(vec![
            json!({"property": "Muscat Villa", "status": "Scheduled", "nextDue": "2025-01-20", "cost": "$1,200"}),
            json!({"property": "Muscat Villa", "status": "In Progress", "nextDue": "2025-01-10", "cost": "$300"}),
            json!({"property": "London Flat", "status": "Scheduled", "nextDue": "2025-02-03", "cost": "TBD"}),
            json!({"property": "London Flat", "status": "Completed", "nextDue": "2024-12-01", "cost": 450}),
            json!({"status": "Scheduled", "nextDue": "2025-01-31", "cost": 50}),
        ]);
        let m = compute_schedule_metrics(&schedules, now(), &Config::default());
        assert_eq!(m.total, 5);
        assert_eq!(m.scheduled, 3);
        assert_eq!(m.in_progress, 1);
        assert_eq!(m.cost_this_month, 1550.0);
        assert_eq!(m.cost_by_group.get("Muscat Villa"), Some(&1500.0));
        assert_eq!(m.cost_by_group.get("London Flat"), Some(&450.0));
        assert_eq!(m.cost_by_group.get("Unknown"), Some(&50.0));
        assert_eq!(m.due.overdue, 1);
        assert_eq!(m.due.due_soon, 1);
        assert_eq!(m.due.upcoming, 2);
        assert_eq!(m.critical, 1);
    }

    #[test]
    fn test_schedule_metrics_fleet_fields() {
        let mut config = Config::default();
        config.schedule.date_field = "scheduledDate".into();
        config.schedule.cost_field = "estimatedCost".into();
        config.schedule.group_field = "vehicle".into();

        let schedules = records(vec![
            json!({"vehicle": "Range Rover", "status": "Scheduled", "scheduledDate": "2025-01-16", "estimatedCost": 800}),
            json!({"vehicle": "Range Rover", "status": "Scheduled", "scheduledDate": "2025-02-16", "estimatedCost": 200}),
        ]);
        let m = compute_schedule_metrics(&schedules, now(), &config);
        assert_eq!(m.cost_this_month, 800.0);
        assert_eq!(m.cost_by_group.get("Range Rover"), Some(&1000.0));
        assert_eq!(m.due.due_soon, 1);
    }

    #[test]
    fn test_request_metrics() {
        let requests = records(vec![
            json!({"status": "Pending Approval", "priority": "High", "estimatedCost": "$2,000"}),
            json!({"status": "In Progress", "priority": "High", "estimatedCost": 1000}),
            json!({"status": "Completed", "priority": "Low", "estimatedCost": "TBD"}),
            json!({"status": "Open", "estimatedCost": 300}),
        ]);
        let m = compute_request_metrics(&requests, &Config::default());
        assert_eq!(m.total, 4);
        assert_eq!(m.open, 3);
        assert_eq!(m.pending_approval, 1);
        assert_eq!(m.in_progress, 1);
        assert_eq!(m.completed, 1);
        assert_eq!(m.total_estimated_cost, 3300.0);
        assert_eq!(m.average_estimated_cost, 1100.0);
        assert_eq!(m.cost_by_priority.get("High"), Some(&3000.0));
        assert_eq!(m.by_priority.get("Low"), Some(&1));
        assert_eq!(m.by_priority.get("Unknown"), Some(&1));
    }

    #[test]
    fn test_presets_use_configured_unknown_label() {
        let config = Config {
            unknown_group_label: "Unassigned".into(),
            ..Config::default()
        };
        let requests = records(vec![
            json!({"status": "Open", "estimatedCost": 100}),
            json!({"estimatedCost": 50}),
        ]);
        let m = compute_request_metrics(&requests, &config);
        assert_eq!(m.by_priority.get("Unassigned"), Some(&2));
        assert_eq!(m.cost_by_priority.get("Unassigned"), Some(&150.0));

        let drivers = records(vec![json!({"name": "A"})]);
        let d = compute_driver_metrics(&drivers, now(), &config);
        assert_eq!(d.by_status.get("Unassigned"), Some(&1));
    }
}
