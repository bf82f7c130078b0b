use crate::aggregate::{Aggregator, DayBuckets};
use crate::cli::CommonArgs;
use crate::model::{Aggregate, AggregateTable, GroupBy, StatsOutput, StatsRow, ThenBy, SCHEMA_VERSION};
use crate::pipeline::{discover_all, record_stream};
use anyhow::Context;
use chrono::{DateTime, Utc};
use console::style;
use std::collections::BTreeSet;

pub fn exec(
    common: CommonArgs,
    group_by: GroupBy,
    then_by: ThenBy,
    days: Vec<u32>,
    as_of: Option<String>,
    json: bool,
    ndjson: bool,
) -> anyhow::Result<()> {
    let buckets = if days.is_empty() {
        DayBuckets::default()
    } else {
        DayBuckets::new(days).context("Invalid --days")?
    };
    let now = match as_of.as_deref() {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --as-of time '{s}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let opts = common.run_options();
    let mut sources = discover_all(&common.repo, &opts).context("Failed to discover repositories")?;
    let repositories: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();

    let aggregator = Aggregator::new(group_by, then_by, buckets, now);
    let aggregate = aggregator.run(record_stream(&mut sources, opts.show_progress, common.cancellation()));

    let columns = column_order(&aggregate.table, then_by, aggregator.buckets());
    let rows = stats_rows(&aggregate.table);

    if json {
        let output = StatsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repositories,
            group_by,
            then_by,
            day_buckets: aggregator.buckets().days().to_vec(),
            columns,
            partial: aggregate.is_partial(),
            status: aggregate.status.clone(),
            rows,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ndjson {
        output_ndjson(&rows)?;
    } else {
        output_table(&rows, &columns, &aggregate)?;
    }
    super::warn_if_partial(&aggregate.status);

    Ok(())
}

/// Rows sorted by total lines, largest first.
pub fn stats_rows(table: &AggregateTable) -> Vec<StatsRow> {
    let mut rows: Vec<StatsRow> = table
        .iter()
        .map(|(key, counts)| StatsRow {
            key: key.clone(),
            total: counts.values().sum(),
            counts: counts.clone(),
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Secondary keys present in `table`: bucket order for dates, sorted otherwise.
pub fn column_order(table: &AggregateTable, then_by: ThenBy, buckets: &DayBuckets) -> Vec<String> {
    let present: BTreeSet<&String> = table.values().flat_map(|row| row.keys()).collect();
    match then_by {
        ThenBy::Date => buckets
            .keys()
            .into_iter()
            .filter(|k| present.contains(&k))
            .collect(),
        _ => present.into_iter().cloned().collect(),
    }
}

fn output_ndjson(rows: &[StatsRow]) -> anyhow::Result<()> {
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

fn output_table(rows: &[StatsRow], columns: &[String], aggregate: &Aggregate) -> anyhow::Result<()> {
    if rows.is_empty() {
        println!("No data to display");
        return Ok(());
    }

    let mut header = format!("{:<30}", style("Key").bold());
    for column in columns {
        header.push_str(&format!(" {:>10}", style(truncate(column, 10)).bold()));
    }
    header.push_str(&format!(" {:>10}", style("Total").bold()));
    println!("{header}");
    println!("{}", "─".repeat(30 + 11 * (columns.len() + 1)));

    for row in rows.iter().take(50) {
        let mut line = format!("{:<30}", truncate(&row.key, 30));
        for column in columns {
            line.push_str(&format!(" {:>10}", row.counts.get(column).copied().unwrap_or(0)));
        }
        line.push_str(&format!(" {:>10}", row.total));
        println!("{line}");
    }
    if rows.len() > 50 {
        println!("\n... and {} more rows", rows.len() - 50);
    }

    let grand_total: u64 = rows.iter().map(|r| r.total).sum();
    let marker = if aggregate.is_partial() { " (partial)" } else { "" };
    println!("\n{} {}{}", style("Total lines:").bold(), grand_total, marker);
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}
