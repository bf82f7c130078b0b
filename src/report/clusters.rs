use crate::cli::CommonArgs;
use crate::model::{ClusterOutput, RepoClusters, SCHEMA_VERSION};
use crate::pipeline::discover_all;
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let opts = common.run_options();
    let sources = discover_all(&common.repo, &opts).context("Failed to discover repositories")?;

    let repositories: Vec<RepoClusters> = sources
        .into_iter()
        .map(|s| RepoClusters {
            repository: s.name,
            min_size: s.bounds.min_size,
            max_size: s.bounds.max_size,
            clusters: s.clusters,
        })
        .collect();

    if json {
        let output = ClusterOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repositories,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for repo in &repositories {
        println!(
            "{} {}",
            style(&repo.repository).bold(),
            style(format!("(min {}, max {})", repo.min_size, repo.max_size)).dim()
        );
        for cluster in &repo.clusters {
            println!("  {:<60} {:>6}", cluster.label.to_string(), cluster.weight);
        }
    }
    Ok(())
}
