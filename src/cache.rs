use crate::error::{GcontribError, Result};
use crate::git::BlameLine;
use crate::model::SCHEMA_VERSION;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

/// Blame results keyed by `(repository, revision, path)`.
///
/// `repository` is the work-tree path, so one database can hold several
/// repositories. Rows are stored already grouped by `(author, timestamp)` with a line
/// count, so a file costs one row per distinct commit touching it.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, RP: AsRef<Path>>(cache_path: Option<CP>, repo_path: RP) -> Result<Self> {
        let cache_dir = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => repo_path.as_ref().join(".gcontrib"),
        };
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("cache.db");
        debug!(path = %db_path.display(), "opening blame cache");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    pub fn in_memory() -> Result<Self> {
        let mut cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS files (
                repository TEXT NOT NULL,
                revision TEXT NOT NULL,
                path TEXT NOT NULL,
                PRIMARY KEY (repository, revision, path)
            );
            CREATE TABLE IF NOT EXISTS blame (
                repository TEXT NOT NULL,
                revision TEXT NOT NULL,
                path TEXT NOT NULL,
                author TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                lines INTEGER NOT NULL,
                FOREIGN KEY (repository, revision, path) REFERENCES files(repository, revision, path)
            );
            CREATE INDEX IF NOT EXISTS idx_blame_file ON blame(repository, revision, path);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(GcontribError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Cached blame for a file, or `None` if it was never stored.
    pub fn get_blame(
        &self,
        repository: &str,
        revision: &str,
        path: &str,
    ) -> Result<Option<Vec<(BlameLine, u64)>>> {
        let known: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM files WHERE repository = ? AND revision = ? AND path = ?)",
            params![repository, revision, path],
            |row| row.get(0),
        )?;
        if !known {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT author, timestamp, lines FROM blame
             WHERE repository = ? AND revision = ? AND path = ?
             ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![repository, revision, path], |row| {
                Ok((
                    BlameLine {
                        author: row.get(0)?,
                        timestamp: row.get(1)?,
                    },
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
    }

    pub fn store_blame(
        &mut self,
        repository: &str,
        revision: &str,
        path: &str,
        rows: &[(BlameLine, u64)],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            tx.execute(
                "INSERT OR REPLACE INTO files (repository, revision, path) VALUES (?, ?, ?)",
                params![repository, revision, path],
            )?;
            tx.execute(
                "DELETE FROM blame WHERE repository = ? AND revision = ? AND path = ?",
                params![repository, revision, path],
            )?;
            let mut insert = tx.prepare(
                "INSERT INTO blame (repository, revision, path, author, timestamp, lines)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for (line, count) in rows {
                insert.execute(params![
                    repository,
                    revision,
                    path,
                    line.author,
                    line.timestamp,
                    *count as i64
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop entries of `repository` not recorded at `revision`. Other
    /// repositories are left alone.
    pub fn prune_except(&mut self, repository: &str, revision: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM blame WHERE repository = ? AND revision != ?",
            params![repository, revision],
        )?;
        let removed = tx.execute(
            "DELETE FROM files WHERE repository = ? AND revision != ?",
            params![repository, revision],
        )?;
        tx.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(author: &str, timestamp: i64) -> BlameLine {
        BlameLine {
            author: author.to_string(),
            timestamp,
        }
    }

    #[test]
    fn round_trips_blame_rows() {
        let mut cache = Cache::in_memory().unwrap();
        assert!(cache.get_blame("/w/core", "abc", "src/lib.rs").unwrap().is_none());

        let rows = vec![(line("ada", 10), 3), (line("grace", 20), 1)];
        cache.store_blame("/w/core", "abc", "src/lib.rs", &rows).unwrap();
        assert_eq!(cache.get_blame("/w/core", "abc", "src/lib.rs").unwrap(), Some(rows));
        assert!(cache.get_blame("/w/core", "def", "src/lib.rs").unwrap().is_none());
        assert!(cache.get_blame("/w/web", "abc", "src/lib.rs").unwrap().is_none());
    }

    #[test]
    fn empty_files_are_remembered() {
        let mut cache = Cache::in_memory().unwrap();
        cache.store_blame("/w/core", "abc", "empty.txt", &[]).unwrap();
        assert_eq!(cache.get_blame("/w/core", "abc", "empty.txt").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn prune_keeps_current_revision() {
        let mut cache = Cache::in_memory().unwrap();
        cache.store_blame("/w/core", "old", "a.rs", &[(line("ada", 1), 1)]).unwrap();
        cache.store_blame("/w/core", "new", "a.rs", &[(line("ada", 2), 1)]).unwrap();
        assert_eq!(cache.prune_except("/w/core", "new").unwrap(), 1);
        assert!(cache.get_blame("/w/core", "old", "a.rs").unwrap().is_none());
        assert!(cache.get_blame("/w/core", "new", "a.rs").unwrap().is_some());
    }

    #[test]
    fn prune_leaves_other_repositories() {
        let mut cache = Cache::in_memory().unwrap();
        cache.store_blame("/w/core", "r1", "a.rs", &[(line("ada", 1), 2)]).unwrap();
        cache.store_blame("/w/web", "s1", "app.ts", &[(line("grace", 5), 4)]).unwrap();

        assert_eq!(cache.prune_except("/w/core", "r1").unwrap(), 0);
        assert_eq!(cache.prune_except("/w/web", "s1").unwrap(), 0);
        assert_eq!(
            cache.get_blame("/w/core", "r1", "a.rs").unwrap(),
            Some(vec![(line("ada", 1), 2)])
        );
        assert_eq!(
            cache.get_blame("/w/web", "s1", "app.ts").unwrap(),
            Some(vec![(line("grace", 5), 4)])
        );

        assert_eq!(cache.prune_except("/w/web", "s2").unwrap(), 1);
        assert!(cache.get_blame("/w/web", "s1", "app.ts").unwrap().is_none());
        assert!(cache.get_blame("/w/core", "r1", "a.rs").unwrap().is_some());
    }
}
