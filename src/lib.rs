//! Per-author contribution statistics from `git blame`.
//!
//! Tracked files are grouped into directory clusters, every blamed line
//! becomes an [`model::AuthorshipRecord`], and records are folded into a
//! two-level count table along configurable dimensions.

pub mod aggregate;
pub mod cache;
pub mod cancel;
pub mod cli;
pub mod cluster;
pub mod dedup;
pub mod error;
pub mod git;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod stream;
pub mod trie;
pub mod util;

pub use aggregate::{Aggregator, DayBuckets};
pub use cancel::CancellationToken;
pub use cluster::{ClusterBounds, Clusterer, MergeOrder};
pub use dedup::{distinct_count, distinct_count_weighted};
pub use stream::RecordStream;
pub use trie::PathTrie;
