use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{GcontribError, Result};

pub const SCHEMA_VERSION: u32 = 2;

/// Secondary key used when a record has no value for the chosen dimension.
pub const OTHER_KEY: &str = "Other";

/// Secondary key for records older than every day bucket.
pub const OLDER_KEY: &str = "Older";

/// Repository-relative file path, stored as its segments.
///
/// Ordering is lexicographic over the `/`-joined form, so `a/b` sorts after
/// `a.b` even though segment-wise comparison would say otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RepoPath(Vec<String>);

impl RepoPath {
    /// Split a forward-slash path, dropping empty and `.` segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(GcontribError::MalformedPath(raw.to_string()));
        }
        Ok(Self(segments))
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Longest shared segment prefix of two paths.
    pub fn common_prefix(&self, other: &RepoPath) -> RepoPath {
        let shared = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.clone())
            .collect();
        RepoPath(shared)
    }

    fn joined_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().enumerate().flat_map(|(i, seg)| {
            let sep = if i > 0 { Some(b'/') } else { None };
            sep.into_iter().chain(seg.bytes())
        })
    }
}

impl Ord for RepoPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.joined_bytes().cmp(other.joined_bytes())
    }
}

impl PartialOrd for RepoPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        f.write_str(&self.0.join("/"))
    }
}

impl Serialize for RepoPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A labeled group of files produced by the clusterer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub label: RepoPath,
    pub weight: usize,
    pub files: BTreeSet<RepoPath>,
}

impl Cluster {
    /// Build a cluster labeled by the common prefix of its files.
    pub fn from_files(files: BTreeSet<RepoPath>) -> Self {
        let mut iter = files.iter();
        let label = match iter.next() {
            Some(first) => iter.fold(first.clone(), |acc, p| acc.common_prefix(p)),
            None => RepoPath::default(),
        };
        Self {
            label,
            weight: files.len(),
            files,
        }
    }
}

/// One blamed source line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorshipRecord {
    pub repository: String,
    pub file_path: String,
    pub author: String,
    pub commit_timestamp: i64,
    pub language: String,
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    User,
    Repo,
    Lang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThenBy {
    Repo,
    Lang,
    Date,
    Cluster,
}

/// Two-level count table: primary key -> secondary key -> lines.
pub type AggregateTable = BTreeMap<String, BTreeMap<String, u64>>;

/// How a record stream ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StreamStatus {
    Running,
    Complete,
    Cancelled,
    Failed { error: String },
}

impl StreamStatus {
    pub fn is_partial(&self) -> bool {
        matches!(self, StreamStatus::Cancelled | StreamStatus::Failed { .. })
    }
}

/// Table plus the status of the stream that filled it.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub table: AggregateTable,
    pub status: StreamStatus,
}

impl Aggregate {
    pub fn is_partial(&self) -> bool {
        self.status.is_partial()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsRow {
    pub key: String,
    pub total: u64,
    pub counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repositories: Vec<String>,
    pub group_by: GroupBy,
    pub then_by: ThenBy,
    pub day_buckets: Vec<u32>,
    pub columns: Vec<String>,
    pub status: StreamStatus,
    pub partial: bool,
    pub rows: Vec<StatsRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DistinctKey {
    pub author: String,
    pub repository: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistinctEntry {
    #[serde(flatten)]
    pub key: DistinctKey,
    pub lines: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistinctOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repositories: Vec<String>,
    pub status: StreamStatus,
    pub partial: bool,
    pub entries: Vec<DistinctEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoClusters {
    pub repository: String,
    pub min_size: usize,
    pub max_size: usize,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repositories: Vec<RepoClusters>,
}
