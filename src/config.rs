use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::due::{AlertThresholds, Thresholds};
use crate::record::UNKNOWN_GROUP;

/// Due-soon windows, in days, per dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub license_renewal_days: u32,
    pub maintenance_due_days: u32,
    /// Maintenance alerts escalate to critical inside this window.
    pub maintenance_critical_days: u32,
    pub payment_due_days: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            license_renewal_days: 90,
            maintenance_due_days: 7,
            maintenance_critical_days: 1,
            payment_due_days: 7,
        }
    }
}

impl ThresholdConfig {
    pub fn license_renewal(&self) -> Thresholds {
        Thresholds::days(self.license_renewal_days)
    }

    pub fn maintenance(&self) -> Thresholds {
        Thresholds::days(self.maintenance_due_days)
    }

    pub fn maintenance_alerts(&self) -> AlertThresholds {
        AlertThresholds {
            critical_days: self.maintenance_critical_days,
            warning_days: self.maintenance_due_days,
        }
    }

    pub fn payment(&self) -> Thresholds {
        Thresholds::days(self.payment_due_days)
    }
}

/// Fields searched by each dashboard's search box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFields {
    pub payments: Vec<String>,
    pub drivers: Vec<String>,
    pub schedules: Vec<String>,
    pub requests: Vec<String>,
}

impl Default for SearchFields {
    fn default() -> Self {
        fn fields(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }
        Self {
            payments: fields(&["title", "category", "reference"]),
            drivers: fields(&["name", "employeeId", "email"]),
            schedules: fields(&["property", "task", "assignedTo"]),
            requests: fields(&["title", "location", "requestedBy"]),
        }
    }
}

/// Field names of maintenance schedule records. House schedules use
/// `nextDue`/`cost`/`property`; fleet schedules use
/// `scheduledDate`/`estimatedCost`/`vehicle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleFields {
    pub date_field: String,
    pub cost_field: String,
    pub group_field: String,
}

impl Default for ScheduleFields {
    fn default() -> Self {
        Self {
            date_field: "nextDue".into(),
            cost_field: "cost".into(),
            group_field: "property".into(),
        }
    }
}

/// Engine configuration, read from JSON. Unspecified keys keep defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub search_fields: SearchFields,
    pub schedule: ScheduleFields,
    /// Group for records missing the grouped field.
    pub unknown_group_label: String,
    /// Upper bounds, in days past due, of the receivables aging buckets.
    pub aging_intervals: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            search_fields: SearchFields::default(),
            schedule: ScheduleFields::default(),
            unknown_group_label: UNKNOWN_GROUP.to_string(),
            aging_intervals: vec![30, 60, 90, 120],
        }
    }
}

impl Config {
    /// Default location: `<config dir>/universe-metrics/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("universe-metrics").join("config.json"))
    }

    /// Load from the default location. A missing or unreadable file yields
    /// defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                log::warn!("Cannot determine config directory, using defaults");
                Self::default()
            }
        }
    }

    fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path. Missing or malformed files are errors.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}
