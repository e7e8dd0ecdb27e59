use chrono::NaiveDate;

use crate::metrics::aggregate::aggregate;
use crate::metrics::types::{AggregateOptions, CompareOptions, Comparison};
use crate::query::period::Period;
use crate::record::Record;

impl CompareOptions {
    /// Calendar month containing `today` against the month before it.
    /// January compares with December of the previous year.
    pub fn month_over_month(date_field: &str, today: NaiveDate) -> Self {
        Self::for_period(date_field, &Period::current_month(today), today)
    }

    /// `period` against its predecessor, per [`Period::comparison_windows`].
    pub fn for_period(date_field: &str, period: &Period, today: NaiveDate) -> Self {
        let (current, previous) = period.comparison_windows(today);
        Self {
            date_field: date_field.to_string(),
            amount_field: None,
            current,
            previous,
            absolute: false,
        }
    }

    pub fn amount(mut self, field: &str) -> Self {
        self.amount_field = Some(field.to_string());
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

impl Comparison {
    pub fn from_values(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            delta: current - previous,
            percent_change: percent_change(current, previous),
        }
    }

    /// Signed percentage label for stat cards: `+12.5%`, `-3.0%`, `0.0%`.
    pub fn change_label(&self) -> String {
        if self.percent_change > 0.0 {
            format!("+{:.1}%", self.percent_change)
        } else {
            format!("{:.1}%", self.percent_change)
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {} ({})", self.current, self.previous, self.change_label())
    }
}

/// Count or sum `records` in the current and previous windows.
pub fn compare<'a, I>(records: I, options: &CompareOptions) -> Comparison
where
    I: IntoIterator<Item = &'a Record>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    let current = period_value(records.clone(), options, true);
    let previous = period_value(records, options, false);
    Comparison::from_values(current, previous)
}

fn period_value<'a, I>(records: I, options: &CompareOptions, current: bool) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    let agg = aggregate(
        records,
        &AggregateOptions {
            group_by: None,
            value_field: options.amount_field.clone(),
            date_field: Some(options.date_field.clone()),
            window: if current { options.current } else { options.previous },
            absolute: options.absolute,
            unknown_group: None,
        },
    );
    match options.amount_field {
        Some(_) => agg.sum,
        None => agg.count as f64,
    }
}

/// Percentage change from `previous` to `current`, one decimal place.
///
/// A zero baseline reports +100 for growth, -100 for a decline into
/// negative territory, and 0 when both are zero. Otherwise the change is
/// relative to `|previous|` so a recovering negative net reads as growth.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 {
            100.0
        } else if current < 0.0 {
            -100.0
        } else {
            0.0
        };
    }
    let pct = round1((current - previous) / previous.abs() * 100.0);
    // Avoid reporting "-0.0".
    if pct == 0.0 {
        0.0
    } else {
        pct
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records(values: Vec<serde_json::Value>) -> Vec<Record> {
        values.into_iter().map(Record::from).collect()
    }

    #[test]
    fn test_zero_previous_growth_is_plus_100() {
        let c = Comparison::from_values(5.0, 0.0);
        assert_eq!(c.percent_change, 100.0);
        assert_eq!(c.delta, 5.0);
        assert_eq!(c.change_label(), "+100.0%");
    }

    #[test]
    fn test_both_zero_is_zero() {
        let c = Comparison::from_values(0.0, 0.0);
        assert_eq!(c.percent_change, 0.0);
        assert_eq!(c.delta, 0.0);
        assert_eq!(c.change_label(), "0.0%");
    }

    #[test]
    fn test_zero_previous_decline_is_minus_100() {
        assert_eq!(percent_change(-20.0, 0.0), -100.0);
    }

    #[test]
    fn test_percent_rounded_to_one_decimal() {
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(1.0, 3.0), -66.7);
        assert_eq!(percent_change(2.0, 3.0), -33.3);
        assert_eq!(percent_change(100.0, 100.04), 0.0);
        assert_eq!(Comparison::from_values(1.0, 3.0).change_label(), "-66.7%");
    }

    #[test]
    fn test_negative_previous_uses_magnitude() {
        // Net moved from -200 to -100: an improvement.
        assert_eq!(percent_change(-100.0, -200.0), 50.0);
        assert_eq!(percent_change(-300.0, -200.0), -50.0);
    }

    #[test]
    fn test_compare_counts_without_amount() {
        let rs = records(vec![
            json!({"date": "2025-03-01"}),
            json!({"date": "2025-03-31T23:59:59"}),
            json!({"date": "2025-04-01"}),
            json!({"date": "2025-02-14"}),
            json!({"date": "garbage"}),
        ]);
        let options = CompareOptions::month_over_month("date", day(2025, 3, 10));
        let c = compare(&rs, &options);
        assert_eq!(c.current, 2.0);
        assert_eq!(c.previous, 1.0);
        assert_eq!(c.delta, 1.0);
        assert_eq!(c.percent_change, 100.0);
    }

    #[test]
    fn test_compare_sums_with_amount_across_january() {
        let rs = records(vec![
            json!({"date": "2025-01-05", "amount": "$1,000"}),
            json!({"date": "2025-01-20", "amount": 500}),
            json!({"date": "2024-12-31", "amount": 1000}),
            json!({"date": "2024-12-15", "amount": "TBD"}),
            json!({"date": "2024-01-10", "amount": 9999}),
        ]);
        let options = CompareOptions::month_over_month("date", day(2025, 1, 25)).amount("amount");
        let c = compare(&rs, &options);
        assert_eq!(c.current, 1500.0);
        assert_eq!(c.previous, 1000.0);
        assert_eq!(c.delta, 500.0);
        assert_eq!(c.percent_change, 50.0);
        assert_eq!(c.change_label(), "+50.0%");
    }

    #[test]
    fn test_compare_absolute_expenses() {
        let rs = records(vec![
            json!({"date": "2025-06-02", "amount": -300}),
            json!({"date": "2025-05-02", "amount": -400}),
        ]);
        let options = CompareOptions::month_over_month("date", day(2025, 6, 15))
            .amount("amount")
            .absolute();
        let c = compare(&rs, &options);
        assert_eq!(c.current, 300.0);
        assert_eq!(c.previous, 400.0);
        assert_eq!(c.delta, -100.0);
        assert_eq!(c.percent_change, -25.0);
    }

    #[test]
    fn test_compare_empty_collection() {
        let rs: Vec<Record> = Vec::new();
        let c = compare(&rs, &CompareOptions::month_over_month("date", day(2025, 6, 15)));
        assert_eq!(c, Comparison::from_values(0.0, 0.0));
    }

    #[test]
    fn test_compare_quarter_to_date() {
        let today = day(2025, 5, 10);
        let rs = records(vec![
            json!({"date": "2025-04-03"}),
            json!({"date": "2025-05-09"}),
            json!({"date": "2025-01-05"}),
            json!({"date": "2025-02-20"}), // after the equivalent offset
        ]);
        let period = Period::QuarterToDate(2025, 2);
        let c = compare(&rs, &CompareOptions::for_period("date", &period, today));
        assert_eq!(c.current, 2.0);
        assert_eq!(c.previous, 1.0);
    }
}
