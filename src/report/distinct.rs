use crate::cli::CommonArgs;
use crate::model::{DistinctEntry, DistinctOutput, SCHEMA_VERSION};
use crate::pipeline::{discover_all, distinct_lines, record_stream};
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let opts = common.run_options();
    let mut sources = discover_all(&common.repo, &opts).context("Failed to discover repositories")?;
    let repositories: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();

    let (entries, status) = distinct_lines(record_stream(&mut sources, opts.show_progress, common.cancellation()));

    if json {
        let output = DistinctOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repositories,
            partial: status.is_partial(),
            status: status.clone(),
            entries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ndjson {
        for e in &entries {
            println!("{}", serde_json::to_string(e)?);
        }
    } else {
        output_table(&entries);
    }
    super::warn_if_partial(&status);

    Ok(())
}

fn output_table(entries: &[DistinctEntry]) {
    if entries.is_empty() {
        println!("No data to display");
        return;
    }
    println!(
        "{:<30} {:<20} {:<10} {:>8}",
        style("Author").bold(),
        style("Repository").bold(),
        style("Language").bold(),
        style("Lines").bold()
    );
    println!("{}", "─".repeat(71));
    for e in entries {
        println!(
            "{:<30} {:<20} {:<10} {:>8}",
            e.key.author, e.key.repository, e.key.language, e.lines
        );
    }
}
