use chrono::{DateTime, TimeZone, Utc};
use gcontrib::error::GcontribError;
use gcontrib::model::{AggregateTable, AuthorshipRecord, GroupBy, StreamStatus, ThenBy};
use gcontrib::pipeline::distinct_lines;
use gcontrib::report::stats::{column_order, stats_rows};
use gcontrib::stream::from_records;
use gcontrib::{distinct_count, Aggregator, CancellationToken, DayBuckets, RecordStream};
use pretty_assertions::assert_eq;

const DAY: i64 = 86_400;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn record(repo: &str, path: &str, author: &str, age_secs: i64, lang: &str) -> AuthorshipRecord {
    AuthorshipRecord {
        repository: repo.to_string(),
        file_path: path.to_string(),
        author: author.to_string(),
        commit_timestamp: now().timestamp() - age_secs,
        language: lang.to_string(),
        cluster: None,
    }
}

fn sample() -> Vec<AuthorshipRecord> {
    vec![
        record("core", "src/lib.rs", "ada", DAY, "rs"),
        record("core", "src/lib.rs", "ada", DAY, "rs"),
        record("core", "src/lib.rs", "grace", 40 * DAY, "rs"),
        record("core", "build.py", "ada", 400 * DAY, "py"),
        record("web", "app.ts", "grace", 3 * DAY, "ts"),
        record("web", "app.ts", "grace", 3 * DAY, "ts"),
        record("web", "index.html", "linus", 100 * DAY, "html"),
    ]
}

fn aggregator(group_by: GroupBy, then_by: ThenBy) -> Aggregator {
    Aggregator::new(group_by, then_by, DayBuckets::new(vec![7, 30, 90]).unwrap(), now())
}

fn cell(table: &AggregateTable, primary: &str, secondary: &str) -> u64 {
    table
        .get(primary)
        .and_then(|row| row.get(secondary))
        .copied()
        .unwrap_or(0)
}

#[test]
fn groups_by_user_then_language() {
    let table = aggregator(GroupBy::User, ThenBy::Lang).aggregate(sample());
    assert_eq!(table.len(), 3);
    assert_eq!(cell(&table, "ada", "rs"), 2);
    assert_eq!(cell(&table, "ada", "py"), 1);
    assert_eq!(cell(&table, "grace", "rs"), 1);
    assert_eq!(cell(&table, "grace", "ts"), 2);
    assert_eq!(cell(&table, "linus", "html"), 1);
}

#[test]
fn groups_by_language_then_repository() {
    let table = aggregator(GroupBy::Lang, ThenBy::Repo).aggregate(sample());
    assert_eq!(cell(&table, "rs", "core"), 3);
    assert_eq!(cell(&table, "ts", "web"), 2);
    assert_eq!(table.keys().cloned().collect::<Vec<_>>(), vec!["html", "py", "rs", "ts"]);
}

#[test]
fn date_buckets_use_first_matching_boundary() {
    let table = aggregator(GroupBy::Repo, ThenBy::Date).aggregate(sample());
    assert_eq!(cell(&table, "core", "7"), 2);
    assert_eq!(cell(&table, "core", "90"), 1);
    assert_eq!(cell(&table, "core", "Older"), 1);
    assert_eq!(cell(&table, "web", "7"), 2);
    assert_eq!(cell(&table, "web", "Older"), 1);
}

#[test]
fn age_on_boundary_stays_in_that_bucket() {
    let agg = aggregator(GroupBy::User, ThenBy::Date);
    assert_eq!(agg.secondary_key(&record("r", "f", "a", 7 * DAY, "rs")), "7");
    assert_eq!(agg.secondary_key(&record("r", "f", "a", 8 * DAY, "rs")), "30");
    assert_eq!(agg.secondary_key(&record("r", "f", "a", 30 * DAY, "rs")), "30");
    assert_eq!(agg.secondary_key(&record("r", "f", "a", 90 * DAY, "rs")), "90");
    assert_eq!(agg.secondary_key(&record("r", "f", "a", 91 * DAY, "rs")), "Older");
    assert_eq!(agg.secondary_key(&record("r", "f", "a", -DAY, "rs")), "7");
}

#[test]
fn cluster_dimension_falls_back_to_other() {
    let mut with_cluster = record("core", "src/lib.rs", "ada", DAY, "rs");
    with_cluster.cluster = Some("src".to_string());
    let without = record("core", "README", "ada", DAY, "Other");

    let table = aggregator(GroupBy::User, ThenBy::Cluster).aggregate(vec![with_cluster, without]);
    assert_eq!(cell(&table, "ada", "src"), 1);
    assert_eq!(cell(&table, "ada", "Other"), 1);
}

#[test]
fn aggregation_is_commutative() {
    let agg = aggregator(GroupBy::User, ThenBy::Date);
    let reference = agg.aggregate(sample());

    let mut reversed = sample();
    reversed.reverse();
    assert_eq!(agg.aggregate(reversed), reference);

    let mut rotated = sample();
    rotated.rotate_left(3);
    assert_eq!(agg.aggregate(rotated), reference);
}

#[test]
fn complete_stream_is_not_partial() {
    let aggregate = aggregator(GroupBy::User, ThenBy::Lang).run(from_records(sample(), CancellationToken::new()));
    assert_eq!(aggregate.status, StreamStatus::Complete);
    assert!(!aggregate.is_partial());
    let total: u64 = aggregate.table.values().flat_map(|r| r.values()).sum();
    assert_eq!(total, 7);
}

#[test]
fn cancelled_before_start_returns_empty_partial_table() {
    let token = CancellationToken::new();
    token.cancel();
    let aggregate = aggregator(GroupBy::User, ThenBy::Lang).run(from_records(sample(), token));
    assert_eq!(aggregate.status, StreamStatus::Cancelled);
    assert!(aggregate.table.is_empty());
}

#[test]
fn cancellation_mid_stream_keeps_partial_counts() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let inner = sample().into_iter().enumerate().map(move |(i, r)| {
        if i == 2 {
            trigger.cancel();
        }
        Ok(r)
    });

    let stream = RecordStream::new(inner, token);
    let aggregate = aggregator(GroupBy::User, ThenBy::Lang).run(stream);
    assert_eq!(aggregate.status, StreamStatus::Cancelled);
    assert_eq!(cell(&aggregate.table, "ada", "rs"), 2);
    assert_eq!(cell(&aggregate.table, "grace", "rs"), 1);
    let total: u64 = aggregate.table.values().flat_map(|r| r.values()).sum();
    assert_eq!(total, 3);
}

#[test]
fn upstream_failure_keeps_partial_counts() {
    let mut items: Vec<Result<AuthorshipRecord, GcontribError>> = sample().into_iter().take(2).map(Ok).collect();
    items.push(Err(GcontribError::Parse("boom".to_string())));
    items.push(Ok(record("core", "x.rs", "late", DAY, "rs")));

    let mut stream = RecordStream::new(items.into_iter(), CancellationToken::new());
    let table = aggregator(GroupBy::User, ThenBy::Lang).aggregate(&mut stream);
    assert_eq!(cell(&table, "ada", "rs"), 2);
    assert!(!table.contains_key("late"));
    assert_eq!(stream.yielded(), 2);
    assert_eq!(
        stream.into_status(),
        StreamStatus::Failed {
            error: "Parse error: boom".to_string()
        }
    );
}

#[test]
fn stream_stays_finished_after_failure() {
    let items: Vec<Result<AuthorshipRecord, GcontribError>> = vec![
        Err(GcontribError::Parse("first".to_string())),
        Ok(record("r", "f", "a", DAY, "rs")),
    ];
    let mut stream = RecordStream::new(items.into_iter(), CancellationToken::new());
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
    assert!(stream.status().is_partial());
}

#[test]
fn distinct_counts_sum_to_input_length() {
    let authors: Vec<String> = sample().into_iter().map(|r| r.author).collect();
    let counts = distinct_count(authors.clone());
    assert_eq!(counts.iter().map(|(_, n)| n).sum::<u64>(), authors.len() as u64);
    assert_eq!(
        counts,
        vec![("ada".to_string(), 3), ("grace".to_string(), 3), ("linus".to_string(), 1)]
    );
}

#[test]
fn distinct_lines_groups_author_repo_language() {
    let (entries, status) = distinct_lines(from_records(sample(), CancellationToken::new()));
    assert_eq!(status, StreamStatus::Complete);
    let flat: Vec<(String, String, String, u64)> = entries
        .into_iter()
        .map(|e| (e.key.author, e.key.repository, e.key.language, e.lines))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("ada".into(), "core".into(), "rs".into(), 2),
            ("grace".into(), "core".into(), "rs".into(), 1),
            ("ada".into(), "core".into(), "py".into(), 1),
            ("grace".into(), "web".into(), "ts".into(), 2),
            ("linus".into(), "web".into(), "html".into(), 1),
        ]
    );
}

#[test]
fn date_columns_follow_bucket_order() {
    let agg = aggregator(GroupBy::User, ThenBy::Date);
    let table = agg.aggregate(sample());
    assert_eq!(column_order(&table, ThenBy::Date, agg.buckets()), vec!["7", "90", "Older"]);

    let rows = stats_rows(&table);
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["ada", "grace", "linus"]);
    assert_eq!(rows[0].total, 3);
}
