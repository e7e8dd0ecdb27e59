use std::io;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use universe_metrics::{
    date_util, AggregateOptions, AgingReport, CompareOptions, Config, Dashboard, DashboardMetrics, FilterCriteria,
    MetricsEngine, Period, Record, Thresholds, Window,
};

#[derive(Parser)]
#[command(name = "universe-metrics", about = "Derived metrics over dashboard record snapshots")]
struct Cli {
    /// Config file (default: <config dir>/universe-metrics/config.json)
    #[arg(long)]
    config: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Evaluate as of this date or timestamp (default: local now)
    #[arg(long)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count, sum and average records, optionally grouped
    Aggregate {
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Field to group counts and sums by
        #[arg(long)]
        group_by: Option<String>,
        /// Numeric or monetary field to sum
        #[arg(long)]
        sum: Option<String>,
        /// Date field for --from/--to
        #[arg(long)]
        date_field: Option<String>,
        /// First day included (YYYY-MM-DD)
        #[arg(long, requires = "date_field")]
        from: Option<String>,
        /// Last day included (YYYY-MM-DD)
        #[arg(long, requires = "date_field")]
        to: Option<String>,
        /// Sum magnitudes
        #[arg(long)]
        absolute: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare a period against the previous one
    Compare {
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Date field placing records into periods
        #[arg(long)]
        date_field: String,
        /// Sum this field instead of counting records
        #[arg(long)]
        amount: Option<String>,
        /// Period: 2025-03, 2025-Q1, 2025-W10, ytd, qtd, mtd, 30d (default: current month)
        #[arg(long)]
        period: Option<String>,
        /// Sum magnitudes
        #[arg(long)]
        absolute: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Badge each record's date as Overdue, Due Soon or Upcoming
    Classify {
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Date field to classify
        #[arg(long)]
        field: String,
        /// Due-soon window in days
        #[arg(long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply search and dropdown filters
    Filter {
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Case-insensitive search text
        #[arg(long)]
        search: Option<String>,
        /// Field to search (repeatable)
        #[arg(long = "search-field")]
        search_fields: Vec<String>,
        /// Use this dashboard's configured search fields
        #[arg(long)]
        dashboard: Option<String>,
        /// Exact status, or "all"
        #[arg(long)]
        status: Option<String>,
        /// Exact category, or "all"
        #[arg(long)]
        category: Option<String>,
        /// Exact type, or "all"
        #[arg(long = "type", value_name = "TYPE")]
        r#type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bucket outstanding amounts by days past due
    Aging {
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Due date field
        #[arg(long, default_value = "dueDate")]
        date_field: String,
        /// Outstanding amount field
        #[arg(long, default_value = "amount")]
        amount: String,
        /// Bucket upper bounds in days, e.g. 30,60,90 (default: from config)
        #[arg(long, value_delimiter = ',')]
        intervals: Vec<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute a dashboard's stat cards
    Dashboard {
        /// payments, drivers, schedules or requests
        kind: String,
        /// Snapshot JSON file, or - for stdin
        input: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let engine = MetricsEngine::new(config);
    let now = match &cli.now {
        Some(s) => date_util::parse_datetime(s).ok_or_else(|| anyhow::anyhow!("Invalid --now: {s}"))?,
        None => chrono::Local::now().naive_local(),
    };
    log::debug!("Evaluating as of {now}");

    match cli.command {
        Commands::Aggregate {
            input,
            group_by,
            sum,
            date_field,
            from,
            to,
            absolute,
            json,
        } => {
            let window = Window::days(parse_day(from.as_deref())?, parse_day(to.as_deref())?);
            let options = AggregateOptions {
                group_by,
                value_field: sum,
                date_field,
                window,
                absolute,
                ..engine.aggregate_options()
            };
            handle_aggregate(&read_input(&input)?, &options, json)?;
        }
        Commands::Compare {
            input,
            date_field,
            amount,
            period,
            absolute,
            json,
        } => {
            let today = now.date();
            let period = match period {
                Some(p) => Period::parse_at(&p, today)?,
                None => Period::current_month(today),
            };
            let mut options = CompareOptions::for_period(&date_field, &period, today);
            if let Some(field) = amount {
                options = options.amount(&field);
            }
            if absolute {
                options = options.absolute();
            }
            handle_compare(&read_input(&input)?, &period, &options, json)?;
        }
        Commands::Classify {
            input,
            field,
            days,
            json,
        } => {
            handle_classify(&read_input(&input)?, &field, now, Thresholds::days(days), json)?;
        }
        Commands::Filter {
            input,
            search,
            search_fields,
            dashboard,
            status,
            category,
            r#type,
            json,
        } => {
            let mut criteria = FilterCriteria::new();
            if let Some(text) = search {
                let fields = if !search_fields.is_empty() {
                    search_fields
                } else if let Some(d) = dashboard {
                    engine.search_fields(d.parse()?).to_vec()
                } else {
                    anyhow::bail!("--search needs --search-field or --dashboard");
                };
                criteria = criteria.search(&text, &fields);
            }
            if let Some(s) = status {
                criteria = criteria.status(&s);
            }
            if let Some(c) = category {
                criteria = criteria.category(&c);
            }
            if let Some(t) = r#type {
                criteria = criteria.record_type(&t);
            }
            handle_filter(&read_input(&input)?, &criteria, json)?;
        }
        Commands::Aging {
            input,
            date_field,
            amount,
            intervals,
            json,
        } => {
            let records = read_input(&input)?;
            let report = if intervals.is_empty() {
                engine.aging(&records, &date_field, &amount, now)
            } else {
                universe_metrics::aging(&records, &date_field, &amount, now, &intervals)
            };
            handle_aging(&report, json)?;
        }
        Commands::Dashboard { kind, input, json } => {
            handle_dashboard(&engine, kind.parse()?, &read_input(&input)?, now, json)?;
        }
    }

    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<Vec<Record>> {
    let records = if input == "-" {
        universe_metrics::load_records(io::stdin().lock())?
    } else {
        universe_metrics::load_snapshot(input).map_err(|e| anyhow::anyhow!("{input}: {e}"))?
    };
    Ok(records)
}

fn parse_day(s: Option<&str>) -> anyhow::Result<Option<chrono::NaiveDate>> {
    match s {
        None => Ok(None),
        Some(s) => date_util::parse_datetime(s)
            .map(|dt| Some(dt.date()))
            .ok_or_else(|| anyhow::anyhow!("Invalid date: {s}")),
    }
}

fn handle_aggregate(records: &[Record], options: &AggregateOptions, json: bool) -> anyhow::Result<()> {
    let result = universe_metrics::aggregate(records, options);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Records:  {}", result.count);
    if options.value_field.is_some() {
        println!("Valued:   {}", result.valued);
        println!("Sum:      {:.2}", result.sum);
        println!("Average:  {:.2}", result.average);
    }
    if options.group_by.is_some() {
        println!();
        for (group, count) in &result.by_group {
            match result.sum_by_group.get(group) {
                Some(sum) if options.value_field.is_some() => println!("  {group}: {count} ({sum:.2})"),
                _ => println!("  {group}: {count}"),
            }
        }
    }
    Ok(())
}

fn handle_compare(records: &[Record], period: &Period, options: &CompareOptions, json: bool) -> anyhow::Result<()> {
    let result = universe_metrics::compare(records, options);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Period:   {period}");
        println!("Current:  {:.2}", result.current);
        println!("Previous: {:.2}", result.previous);
        println!("Change:   {:+.2} ({})", result.delta, result.change_label());
    }
    Ok(())
}

fn handle_classify(
    records: &[Record],
    field: &str,
    now: NaiveDateTime,
    thresholds: Thresholds,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id(),
                    "status": universe_metrics::classify_field(r, field, now, &thresholds),
                    "days_until": universe_metrics::metrics::due::days_until(r, field, now),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (i, r) in records.iter().enumerate() {
        let id = r.id().map(|s| s.into_owned()).unwrap_or_else(|| format!("#{i}"));
        let status = universe_metrics::classify_field(r, field, now, &thresholds);
        match universe_metrics::metrics::due::days_until(r, field, now) {
            Some(days) => println!("[{status}] {id} ({days:+} days)"),
            None => println!("[{status}] {id}"),
        }
    }
    let counts = universe_metrics::count_by_status(records, field, now, &thresholds);
    println!(
        "\n{} overdue, {} due soon, {} upcoming, {} n/a",
        counts.overdue, counts.due_soon, counts.upcoming, counts.not_applicable
    );
    Ok(())
}

fn handle_filter(records: &[Record], criteria: &FilterCriteria, json: bool) -> anyhow::Result<()> {
    let hits = universe_metrics::filter(records, criteria);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No records found.");
    } else {
        for r in &hits {
            println!("{}", serde_json::to_string(r)?);
        }
        println!("\n{} of {} records", hits.len(), records.len());
    }
    Ok(())
}

fn handle_aging(report: &AgingReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for bucket in &report.buckets {
        println!("  {:<12} {:>4}  {:.2}", bucket.label, bucket.count, bucket.total);
    }
    println!("\nOutstanding: {:.2}", report.total_outstanding);
    if report.undated > 0 {
        println!("{} records without a due date", report.undated);
    }
    Ok(())
}

fn handle_dashboard(
    engine: &MetricsEngine,
    dashboard: Dashboard,
    records: &[Record],
    now: NaiveDateTime,
    json: bool,
) -> anyhow::Result<()> {
    let metrics = engine.dashboard(dashboard, records, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    match metrics {
        DashboardMetrics::Payments(m) => {
            println!("Payments");
            println!("  Income:    {:.2} ({})", m.total_income, m.income_change.change_label());
            println!("  Expenses:  {:.2} ({})", m.total_expenses, m.expense_change.change_label());
            println!("  Net:       {:.2} ({})", m.net_income, m.net_change.change_label());
            println!("  Pending:   {}", m.pending_count);
            println!("  Overdue:   {}", m.due.overdue);
            println!("  Due soon:  {}", m.due.due_soon);
            println!("  Receivables:");
            for bucket in &m.receivables_aging.buckets {
                println!("    {}: {:.2}", bucket.label, bucket.total);
            }
        }
        DashboardMetrics::Drivers(m) => {
            println!("Drivers");
            println!("  Total:             {}", m.total);
            println!("  Active:            {}", m.active);
            println!("  Average rating:    {:.1}", m.average_rating);
            println!("  License renewals:  {}", m.license_renewals_due);
            println!("  Expired licenses:  {}", m.expired_licenses);
        }
        DashboardMetrics::Schedules(m) => {
            println!("Maintenance Schedules");
            println!("  Total:        {}", m.total);
            println!("  Scheduled:    {}", m.scheduled);
            println!("  In progress:  {}", m.in_progress);
            println!("  Cost (month): {:.2}", m.cost_this_month);
            println!("  Overdue:      {}", m.due.overdue);
            println!("  Due soon:     {}", m.due.due_soon);
            println!("  Critical:     {}", m.critical);
            for (group, cost) in &m.cost_by_group {
                println!("    {group}: {cost:.2}");
            }
        }
        DashboardMetrics::Requests(m) => {
            println!("Maintenance Requests");
            println!("  Total:            {}", m.total);
            println!("  Open:             {}", m.open);
            println!("  Pending approval: {}", m.pending_approval);
            println!("  In progress:      {}", m.in_progress);
            println!("  Completed:        {}", m.completed);
            println!("  Estimated cost:   {:.2} (avg {:.2})", m.total_estimated_cost, m.average_estimated_cost);
        }
    }
    Ok(())
}
