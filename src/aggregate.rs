use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{GcontribError, Result};
use crate::model::{
    Aggregate, AggregateTable, AuthorshipRecord, GroupBy, ThenBy, OLDER_KEY, OTHER_KEY,
};
use crate::stream::RecordStream;

const SECONDS_PER_DAY: i64 = 86_400;

/// Ascending age boundaries, in days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBuckets(Vec<u32>);

impl DayBuckets {
    pub fn new(days: Vec<u32>) -> Result<Self> {
        if days.is_empty() {
            return Err(GcontribError::InvalidBuckets("no buckets given".to_string()));
        }
        if days.contains(&0) {
            return Err(GcontribError::InvalidBuckets(
                "bucket boundaries must be positive".to_string(),
            ));
        }
        if days.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GcontribError::InvalidBuckets(format!(
                "boundaries must be strictly ascending: {days:?}"
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> &[u32] {
        &self.0
    }

    /// First boundary `d` with `age_days <= d`.
    pub fn bucket_for(&self, age_days: i64) -> Option<u32> {
        self.0.iter().copied().find(|&d| age_days <= i64::from(d))
    }

    /// Secondary keys in bucket order, ending with the overflow key.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .iter()
            .map(u32::to_string)
            .chain(std::iter::once(OLDER_KEY.to_string()))
            .collect()
    }
}

impl Default for DayBuckets {
    fn default() -> Self {
        Self(vec![7, 30, 90, 180, 365])
    }
}

pub struct Aggregator {
    group_by: GroupBy,
    then_by: ThenBy,
    buckets: DayBuckets,
    now: DateTime<Utc>,
}

impl Aggregator {
    pub fn new(group_by: GroupBy, then_by: ThenBy, buckets: DayBuckets, now: DateTime<Utc>) -> Self {
        Self {
            group_by,
            then_by,
            buckets,
            now,
        }
    }

    pub fn buckets(&self) -> &DayBuckets {
        &self.buckets
    }

    pub fn primary_key<'a>(&self, record: &'a AuthorshipRecord) -> &'a str {
        match self.group_by {
            GroupBy::User => &record.author,
            GroupBy::Repo => &record.repository,
            GroupBy::Lang => &record.language,
        }
    }

    pub fn secondary_key(&self, record: &AuthorshipRecord) -> String {
        match self.then_by {
            ThenBy::Repo => record.repository.clone(),
            ThenBy::Lang => record.language.clone(),
            ThenBy::Cluster => record
                .cluster
                .clone()
                .unwrap_or_else(|| OTHER_KEY.to_string()),
            ThenBy::Date => {
                let age_days = (self.now.timestamp() - record.commit_timestamp).div_euclid(SECONDS_PER_DAY);
                match self.buckets.bucket_for(age_days) {
                    Some(d) => d.to_string(),
                    None => OLDER_KEY.to_string(),
                }
            }
        }
    }

    /// Fold records into `table`.
    pub fn accumulate<I>(&self, table: &mut AggregateTable, records: I)
    where
        I: IntoIterator<Item = AuthorshipRecord>,
    {
        for record in records {
            let secondary = self.secondary_key(&record);
            *table
                .entry(self.primary_key(&record).to_string())
                .or_default()
                .entry(secondary)
                .or_insert(0) += 1;
        }
    }

    pub fn aggregate<I>(&self, records: I) -> AggregateTable
    where
        I: IntoIterator<Item = AuthorshipRecord>,
    {
        let mut table = AggregateTable::new();
        self.accumulate(&mut table, records);
        table
    }

    /// Drain `stream` and keep whatever was accumulated, however it ended.
    pub fn run<I>(&self, mut stream: RecordStream<I>) -> Aggregate
    where
        I: Iterator<Item = Result<AuthorshipRecord>>,
    {
        let table = self.aggregate(&mut stream);
        debug!(records = stream.yielded(), rows = table.len(), status = ?stream.status(), "aggregation finished");
        Aggregate {
            table,
            status: stream.into_status(),
        }
    }
}
