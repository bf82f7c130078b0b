//! Directory-locality clustering of file paths.
//!
//! Files are grouped bottom-up over a [`PathTrie`]: small groups are merged
//! with their next sibling, and whole subtrees collapse into one cluster when
//! they fit under the size cap. The result is an exact partition of the input.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::model::{Cluster, RepoPath};
use crate::trie::{NodeId, PathTrie};

/// Order in which sibling candidates are considered for merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOrder {
    /// Sorted segment order.
    #[default]
    Lexicographic,
    /// Lightest candidates first; ties keep segment order.
    WeightAscending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterBounds {
    pub min_size: usize,
    pub max_size: usize,
}

impl ClusterBounds {
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self { min_size, max_size }
    }

    /// Default sizing for a repository with `file_count` files.
    pub fn for_file_count(file_count: usize) -> Self {
        let min_size = (file_count / 100).max(2);
        let max_size = ((file_count as f64 / 30.0).round() as usize).max(20);
        Self { min_size, max_size }
    }
}

struct Candidate {
    files: Vec<RepoPath>,
}

impl Candidate {
    fn file(path: RepoPath) -> Self {
        Self { files: vec![path] }
    }

    fn weight(&self) -> usize {
        self.files.len()
    }

    fn absorb(&mut self, other: Candidate) {
        self.files.extend(other.files);
    }

    fn into_cluster(self) -> Cluster {
        Cluster::from_files(self.files.into_iter().collect())
    }
}

pub struct Clusterer {
    bounds: ClusterBounds,
    merge_order: MergeOrder,
}

impl Clusterer {
    pub fn new(bounds: ClusterBounds) -> Self {
        Self {
            bounds,
            merge_order: MergeOrder::default(),
        }
    }

    pub fn with_merge_order(mut self, merge_order: MergeOrder) -> Self {
        self.merge_order = merge_order;
        self
    }

    /// Partition `paths` into clusters. Malformed paths are skipped.
    pub fn cluster<I, S>(&self, paths: I) -> Vec<Cluster>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = PathTrie::new();
        for raw in paths {
            if let Err(e) = trie.insert_str(raw.as_ref()) {
                warn!(error = %e, "skipping path");
            }
        }
        self.cluster_trie(&trie)
    }

    pub fn cluster_trie(&self, trie: &PathTrie) -> Vec<Cluster> {
        let mut prefix = Vec::new();
        let clusters: Vec<Cluster> = self
            .resolve(trie, trie.root(), &mut prefix)
            .into_iter()
            .map(Candidate::into_cluster)
            .collect();
        debug!(
            files = trie.len(),
            clusters = clusters.len(),
            min_size = self.bounds.min_size,
            max_size = self.bounds.max_size,
            "clustered paths"
        );
        clusters
    }

    fn resolve(&self, trie: &PathTrie, node: NodeId, prefix: &mut Vec<String>) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        if trie.is_terminal(node) {
            candidates.push(Candidate::file(RepoPath::from_segments(prefix.clone())));
        }
        if trie.is_leaf(node) {
            return candidates;
        }

        let mut flat = true;
        for (segment, child) in trie.children(node) {
            prefix.push(segment.to_string());
            candidates.extend(self.resolve(trie, child, prefix));
            prefix.pop();
            flat &= trie.is_leaf(child);
        }

        let candidates = self.merge_undersized(candidates);
        let total: usize = candidates.iter().map(Candidate::weight).sum();

        // A flat directory cannot be split below file granularity.
        if total <= self.bounds.max_size || flat {
            return candidates
                .into_iter()
                .reduce(|mut acc, next| {
                    acc.absorb(next);
                    acc
                })
                .into_iter()
                .collect();
        }
        candidates
    }

    fn merge_undersized(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if self.merge_order == MergeOrder::WeightAscending {
            candidates.sort_by_key(Candidate::weight);
        }

        let mut merged = Vec::with_capacity(candidates.len());
        let mut pending = candidates.into_iter().peekable();
        while let Some(mut current) = pending.next() {
            while current.weight() < self.bounds.min_size {
                match pending.peek() {
                    Some(next) if current.weight() + next.weight() <= self.bounds.max_size => {
                        if let Some(next) = pending.next() {
                            current.absorb(next);
                        }
                    }
                    _ => break,
                }
            }
            merged.push(current);
        }
        merged
    }
}

/// Map every clustered file (as a `/`-joined string) to its cluster label.
pub fn label_index(clusters: &[Cluster]) -> HashMap<String, String> {
    clusters
        .iter()
        .flat_map(|c| {
            let label = c.label.to_string();
            c.files.iter().map(move |f| (f.to_string(), label.clone()))
        })
        .collect()
}
