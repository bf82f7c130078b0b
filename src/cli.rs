use crate::cancel::CancellationToken;
use crate::cluster::MergeOrder;
use crate::model::{GroupBy, ThenBy};
use crate::pipeline::RunOptions;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gcontrib")]
#[command(about = "Per-author contribution statistics from git blame")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to git repository (repeatable)")]
    pub repo: Vec<PathBuf>,

    #[arg(long, global = true, help = "Directory for the blame cache database")]
    pub cache: Option<PathBuf>,

    #[arg(long, global = true, help = "Do not read or write the blame cache", default_value_t = false)]
    pub no_cache: bool,

    #[arg(long, global = true, help = "Gitignore-style pattern of files to skip (repeatable)")]
    pub exclude: Vec<String>,

    #[arg(long, global = true, help = "Minimum files per cluster (default: max(2, files/100))")]
    pub min_cluster: Option<usize>,

    #[arg(long, global = true, help = "Maximum files per cluster (default: max(20, files/30))")]
    pub max_cluster: Option<usize>,

    #[arg(long, global = true, value_enum, default_value_t = MergeOrder::Lexicographic, help = "Order in which undersized clusters are merged")]
    pub merge_order: MergeOrder,

    #[arg(long, global = true, value_parser = humantime::parse_duration, help = "Stop blaming after this long and report partial results (e.g. 30s, 5m)")]
    pub time_limit: Option<Duration>,

    #[arg(long, global = true, help = "Hide the progress bar", default_value_t = false)]
    pub no_progress: bool,

    #[arg(short, long, global = true, help = "Enable debug logging", default_value_t = false)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            exclude: self.exclude.clone(),
            min_cluster: self.min_cluster,
            max_cluster: self.max_cluster,
            merge_order: self.merge_order,
            cache_dir: self.cache.clone(),
            use_cache: !self.no_cache,
            show_progress: !self.no_progress && console::Term::stderr().is_term(),
        }
    }

    /// Token for this run, armed with `--time-limit` if given. The watchdog
    /// thread is not joined.
    pub fn cancellation(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(limit) = self.time_limit {
            let _ = token.cancel_after(limit);
        }
        token
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Blamed lines per primary key, broken down by a secondary key
    Stats {
        #[arg(long, value_enum, default_value_t = GroupBy::User, help = "Primary dimension")]
        group_by: GroupBy,

        #[arg(long, value_enum, default_value_t = ThenBy::Lang, help = "Secondary dimension")]
        then_by: ThenBy,

        #[arg(long, value_delimiter = ',', help = "Ascending age buckets in days, e.g. 7,30,365")]
        days: Vec<u32>,

        #[arg(long, help = "Reference time for age buckets (RFC3339, default: now)")]
        as_of: Option<String>,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Blamed lines per distinct (author, repository, language)
    Distinct {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Directory clusters of each repository
    Clusters {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.common.verbose);
        match self.command {
            Commands::Stats {
                group_by,
                then_by,
                days,
                as_of,
                json,
                ndjson,
            } => crate::report::stats::exec(self.common, group_by, then_by, days, as_of, json, ndjson),
            Commands::Distinct { json, ndjson } => crate::report::distinct::exec(self.common, json, ndjson),
            Commands::Clusters { json } => crate::report::clusters::exec(self.common, json),
        }
    }
}
