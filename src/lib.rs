pub mod config;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod query;
pub mod record;

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{
    aggregate, aging, alert_severity, classify, classify_field, compare, count_by_status, Aggregate,
    AggregateOptions, AgingBucket, AgingReport, AlertThresholds, CompareOptions, Comparison, DriverMetrics,
    DueCounts, DueStatus, PaymentMetrics, RequestMetrics, ScheduleMetrics, Severity, Thresholds,
};
pub use query::filter::{filter, matches, FilterCriteria};
pub use query::period::Period;
pub use query::window::Window;
pub use record::{load_records, load_snapshot, parse_amount, Record, UNKNOWN_GROUP};

/// The dashboards with a stat-card preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Payments,
    Drivers,
    Schedules,
    Requests,
}

impl FromStr for Dashboard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "payments" => Ok(Dashboard::Payments),
            "drivers" => Ok(Dashboard::Drivers),
            "schedules" => Ok(Dashboard::Schedules),
            "requests" => Ok(Dashboard::Requests),
            other => Err(Error::UnknownDashboard(other.to_string())),
        }
    }
}

/// Stat-card values for one dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardMetrics {
    Payments(PaymentMetrics),
    Drivers(DriverMetrics),
    Schedules(ScheduleMetrics),
    Requests(RequestMetrics),
}

/// Main entry point: the derived-metrics engine bound to a configuration.
///
/// Holds no record state. Every call works on the snapshot it is given,
/// with `now` injected by the caller.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: Config,
}

impl MetricsEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configured search fields for a dashboard's search box.
    pub fn search_fields(&self, dashboard: Dashboard) -> &[String] {
        let fields = &self.config.search_fields;
        match dashboard {
            Dashboard::Payments => &fields.payments,
            Dashboard::Drivers => &fields.drivers,
            Dashboard::Schedules => &fields.schedules,
            Dashboard::Requests => &fields.requests,
        }
    }

    /// Due-soon threshold a dashboard's badges use.
    pub fn thresholds(&self, dashboard: Dashboard) -> Thresholds {
        let t = &self.config.thresholds;
        match dashboard {
            Dashboard::Payments => t.payment(),
            Dashboard::Drivers => t.license_renewal(),
            Dashboard::Schedules | Dashboard::Requests => t.maintenance(),
        }
    }

    pub fn dashboard(&self, dashboard: Dashboard, records: &[Record], now: NaiveDateTime) -> DashboardMetrics {
        log::debug!("Computing {dashboard:?} metrics over {} records", records.len());
        match dashboard {
            Dashboard::Payments => {
                DashboardMetrics::Payments(metrics::compute_payment_metrics(records, now, &self.config))
            }
            Dashboard::Drivers => {
                DashboardMetrics::Drivers(metrics::compute_driver_metrics(records, now, &self.config))
            }
            Dashboard::Schedules => {
                DashboardMetrics::Schedules(metrics::compute_schedule_metrics(records, now, &self.config))
            }
            Dashboard::Requests => {
                DashboardMetrics::Requests(metrics::compute_request_metrics(records, &self.config))
            }
        }
    }

    /// Aggregation options carrying the configured unknown-group label.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions::default().unknown_as(&self.config.unknown_group_label)
    }

    /// Receivables aging over `records` with the configured intervals.
    pub fn aging<'a, I>(&self, records: I, date_field: &str, amount_field: &str, now: NaiveDateTime) -> AgingReport
    where
        I: IntoIterator<Item = &'a Record>,
    {
        aging(records, date_field, amount_field, now, &self.config.aging_intervals)
    }

    /// Classify a record's date field with the dashboard's threshold.
    pub fn badge(&self, dashboard: Dashboard, record: &Record, field: &str, now: NaiveDateTime) -> DueStatus {
        classify_field(record, field, now, &self.thresholds(dashboard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_dashboard() {
        assert_eq!("payments".parse::<Dashboard>().unwrap(), Dashboard::Payments);
        assert_eq!(" Drivers ".parse::<Dashboard>().unwrap(), Dashboard::Drivers);
        assert!(matches!(
            "payroll".parse::<Dashboard>(),
            Err(Error::UnknownDashboard(_))
        ));
    }

    #[test]
    fn test_engine_uses_configured_thresholds() {
        let mut config = Config::default();
        config.thresholds.license_renewal_days = 30;
        let engine = MetricsEngine::new(config);

        let driver = Record::from(json!({"licenseExpiry": "2025-07-31"}));
        assert_eq!(
            engine.badge(Dashboard::Drivers, &driver, "licenseExpiry", now()),
            DueStatus::Upcoming
        );
        assert_eq!(
            MetricsEngine::default().badge(Dashboard::Drivers, &driver, "licenseExpiry", now()),
            DueStatus::DueSoon
        );
    }

    #[test]
    fn test_search_fields_drive_filter() {
        let engine = MetricsEngine::default();
        let drivers: Vec<Record> = vec![
            json!({"name": "Salim", "employeeId": "DRV-001", "email": "salim@example.com"}),
            json!({"name": "Noor", "employeeId": "DRV-002", "email": "noor@example.com"}),
        ]
        .into_iter()
        .map(Record::from)
        .collect();

        let criteria = FilterCriteria::new().search("drv-002", engine.search_fields(Dashboard::Drivers));
        let hits = filter(&drivers, &criteria);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text("name").as_deref(), Some("Noor"));
    }

    #[test]
    fn test_dashboard_dispatch_serializes_flat() {
        let engine = MetricsEngine::default();
        let requests = vec![Record::from(json!({"status": "Completed", "estimatedCost": 10}))];
        let out = engine.dashboard(Dashboard::Requests, &requests, now());
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["completed"], json!(1));
        assert_eq!(value["open"], json!(0));
    }

    #[test]
    fn test_engine_aging_uses_configured_intervals() {
        let config = Config {
            aging_intervals: vec![15],
            ..Config::default()
        };
        let engine = MetricsEngine::new(config);
        let invoices = vec![
            Record::from(json!({"dueDate": "2025-05-20", "outstanding": 100})),
            Record::from(json!({"dueDate": "2025-04-01", "outstanding": 250})),
        ];
        let report = engine.aging(&invoices, "dueDate", "outstanding", now());
        let labels: Vec<&str> = report.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Current", "1-15 days", "15+ days"]);
        assert_eq!(report.buckets[1].total, 100.0);
        assert_eq!(report.buckets[2].total, 250.0);
    }

    #[test]
    fn test_engine_aggregate_options_carry_label() {
        let mut config = Config::default();
        config.unknown_group_label = "Unassigned".into();
        let engine = MetricsEngine::new(config);
        let rs = vec![Record::from(json!({"id": "1"}))];
        let options = AggregateOptions {
            group_by: Some("vehicle".into()),
            ..engine.aggregate_options()
        };
        assert_eq!(aggregate(&rs, &options).by_group.get("Unassigned"), Some(&1));
    }
}
