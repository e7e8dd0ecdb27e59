use crate::metrics::types::{Aggregate, AggregateOptions};
use crate::record::{Record, UNKNOWN_GROUP};

/// Count, sum, average and group tallies over `records`.
///
/// Records outside the window (or with an unparseable date while a window
/// is active) are skipped entirely. Records with an unparseable value are
/// still counted and grouped but contribute nothing to `sum`/`average`.
pub fn aggregate<'a, I>(records: I, options: &AggregateOptions) -> Aggregate
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut out = Aggregate::default();
    let windowed = options.date_field.as_deref().filter(|_| !options.window.is_unbounded());
    if options.date_field.is_none() && !options.window.is_unbounded() {
        log::debug!("Ignoring aggregation window: no date field set");
    }
    let unknown = options.unknown_group.as_deref().unwrap_or(UNKNOWN_GROUP);

    for record in records {
        if let Some(date_field) = windowed {
            match record.datetime(date_field) {
                Some(t) if options.window.contains(&t) => {}
                _ => continue,
            }
        }

        out.count += 1;

        let group = options
            .group_by
            .as_deref()
            .map(|field| record.group_key_or(field, unknown));
        if let Some(ref key) = group {
            *out.by_group.entry(key.clone()).or_insert(0) += 1;
        }

        let Some(value_field) = options.value_field.as_deref() else {
            continue;
        };
        match record.amount(value_field) {
            Some(v) => {
                let v = if options.absolute { v.abs() } else { v };
                out.sum += v;
                out.valued += 1;
                if let Some(key) = group {
                    *out.sum_by_group.entry(key).or_insert(0.0) += v;
                }
            }
            None => {
                log::debug!(
                    "Excluding record {} from {value_field} sum: unparseable value {:?}",
                    record.id().as_deref().unwrap_or("<no id>"),
                    record.get(value_field),
                );
            }
        }
    }

    out.average = mean(out.sum, out.valued);
    out
}

/// Number of records whose `field` equals `value` exactly.
pub fn count_where<'a, I>(records: I, field: &str, value: &str) -> u64
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| r.text(field).is_some_and(|v| v == value))
        .count() as u64
}

/// Group tallies only; missing values land under [`UNKNOWN_GROUP`].
pub fn count_by<'a, I>(records: I, field: &str) -> std::collections::BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Record>,
{
    aggregate(records, &AggregateOptions::grouped_by(field)).by_group
}

fn mean(sum: f64, n: u64) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
