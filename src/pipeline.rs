//! Discovery and extraction: turns repositories into a stream of
//! authorship records.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::cancel::CancellationToken;
use crate::cluster::{label_index, ClusterBounds, Clusterer, MergeOrder};
use crate::dedup::distinct_count;
use crate::error::Result;
use crate::git::{BlameLine, GitRepo, TrackedFile};
use crate::model::{AuthorshipRecord, Cluster, DistinctEntry, DistinctKey, StreamStatus};
use crate::stream::RecordStream;
use crate::util::{language_of, ExcludeMatcher};

/// Settings shared by every repository in a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub exclude: Vec<String>,
    pub min_cluster: Option<usize>,
    pub max_cluster: Option<usize>,
    pub merge_order: MergeOrder,
    pub cache_dir: Option<PathBuf>,
    pub use_cache: bool,
    pub show_progress: bool,
}

impl RunOptions {
    fn bounds_for(&self, file_count: usize) -> ClusterBounds {
        let defaults = ClusterBounds::for_file_count(file_count);
        ClusterBounds::new(
            self.min_cluster.unwrap_or(defaults.min_size),
            self.max_cluster.unwrap_or(defaults.max_size),
        )
    }
}

/// One repository, discovered and clustered, ready to be blamed.
pub struct RepoSource {
    repo: GitRepo,
    pub name: String,
    pub revision: String,
    pub files: Vec<TrackedFile>,
    pub bounds: ClusterBounds,
    pub clusters: Vec<Cluster>,
    cache: Option<Cache>,
}

impl RepoSource {
    pub fn discover(path: Option<&PathBuf>, opts: &RunOptions) -> Result<Self> {
        let repo = GitRepo::open(path)?;
        let name = repo.name();
        let revision = repo.head_revision()?;
        let exclude = ExcludeMatcher::new(repo.path(), &opts.exclude)?;

        let mut files = Vec::new();
        for file in repo.tracked_files(&revision)? {
            if exclude.is_excluded(&file.path) {
                continue;
            }
            if repo.is_binary(file.id)? {
                debug!(path = %file.path, "skipping binary file");
                continue;
            }
            files.push(file);
        }

        let bounds = opts.bounds_for(files.len());
        let clusters = Clusterer::new(bounds)
            .with_merge_order(opts.merge_order)
            .cluster(files.iter().map(|f| f.path.as_str()));

        let cache = if opts.use_cache {
            let mut cache = Cache::new(opts.cache_dir.as_ref(), repo.path())?;
            let pruned = cache.prune_except(&repo.path().to_string_lossy(), &revision)?;
            if pruned > 0 {
                debug!(pruned, "dropped stale cache entries");
            }
            Some(cache)
        } else {
            None
        };

        info!(
            repository = %name,
            revision = %revision,
            files = files.len(),
            clusters = clusters.len(),
            "discovered repository"
        );

        Ok(Self {
            repo,
            name,
            revision,
            files,
            bounds,
            clusters,
            cache,
        })
    }

    /// Distinct `(author, time)` rows with line counts for one file.
    fn blame_rows(&mut self, path: &str) -> Result<Vec<(BlameLine, u64)>> {
        let repository = self.repo.path().to_string_lossy();
        if let Some(cache) = &self.cache {
            if let Some(rows) = cache.get_blame(&repository, &self.revision, path)? {
                return Ok(rows);
            }
        }

        let rows = distinct_count(self.repo.blame(path, &self.revision)?);
        if let Some(cache) = &mut self.cache {
            if let Err(e) = cache.store_blame(&repository, &self.revision, path, &rows) {
                warn!(error = %e, path, "failed to cache blame");
            }
        }
        Ok(rows)
    }
}

/// Discover every repository of a run. `None` means the current directory.
pub fn discover_all(paths: &[PathBuf], opts: &RunOptions) -> Result<Vec<RepoSource>> {
    if paths.is_empty() {
        return Ok(vec![RepoSource::discover(None, opts)?]);
    }
    paths
        .iter()
        .map(|p| RepoSource::discover(Some(p), opts))
        .collect()
}

/// Lazily blames one file at a time across all sources and yields one record
/// per blamed line.
pub struct BlameRecords<'a> {
    sources: &'a mut [RepoSource],
    labels: Vec<HashMap<String, String>>,
    repo_idx: usize,
    file_idx: usize,
    buffer: VecDeque<AuthorshipRecord>,
    progress: ProgressBar,
}

impl<'a> BlameRecords<'a> {
    /// With more than one source, cluster labels are prefixed by the
    /// repository name (`core:src`) so equal paths stay apart.
    pub fn new(sources: &'a mut [RepoSource], show_progress: bool) -> Self {
        let qualify = sources.len() > 1;
        let labels = sources
            .iter()
            .map(|s| {
                let mut index = label_index(&s.clusters);
                if qualify {
                    for label in index.values_mut() {
                        *label = format!("{}:{}", s.name, label);
                    }
                }
                index
            })
            .collect();
        let total: usize = sources.iter().map(|s| s.files.len()).sum();

        let progress = if show_progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            sources,
            labels,
            repo_idx: 0,
            file_idx: 0,
            buffer: VecDeque::new(),
            progress,
        }
    }

    fn next_file(&mut self) -> Option<(usize, String)> {
        while let Some(source) = self.sources.get(self.repo_idx) {
            if let Some(file) = source.files.get(self.file_idx) {
                self.file_idx += 1;
                return Some((self.repo_idx, file.path.clone()));
            }
            self.repo_idx += 1;
            self.file_idx = 0;
        }
        None
    }
}

impl Iterator for BlameRecords<'_> {
    type Item = Result<AuthorshipRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }

            let Some((repo_idx, path)) = self.next_file() else {
                self.progress.finish_and_clear();
                return None;
            };

            self.progress.set_message(path.clone());
            let source = &mut self.sources[repo_idx];
            let rows = match source.blame_rows(&path) {
                Ok(rows) => rows,
                Err(e) => {
                    self.progress.abandon();
                    return Some(Err(e));
                }
            };
            self.progress.inc(1);

            let language = language_of(&path);
            let cluster = self.labels[repo_idx].get(&path).cloned();
            for (line, count) in rows {
                let record = AuthorshipRecord {
                    repository: source.name.clone(),
                    file_path: path.clone(),
                    author: line.author,
                    commit_timestamp: line.timestamp,
                    language: language.clone(),
                    cluster: cluster.clone(),
                };
                for _ in 0..count {
                    self.buffer.push_back(record.clone());
                }
            }
        }
    }
}

/// Record stream over every file of `sources`.
pub fn record_stream<'a>(
    sources: &'a mut [RepoSource],
    show_progress: bool,
    cancel: CancellationToken,
) -> RecordStream<BlameRecords<'a>> {
    RecordStream::new(BlameRecords::new(sources, show_progress), cancel)
}

/// Lines per `(author, repository, language)`, in first-seen order.
pub fn distinct_lines<I>(mut stream: RecordStream<I>) -> (Vec<DistinctEntry>, StreamStatus)
where
    I: Iterator<Item = Result<AuthorshipRecord>>,
{
    let keys = stream.by_ref().map(|r| DistinctKey {
        author: r.author,
        repository: r.repository,
        language: r.language,
    });
    let entries = distinct_count(keys)
        .into_iter()
        .map(|(key, lines)| DistinctEntry { key, lines })
        .collect();
    (entries, stream.into_status())
}
