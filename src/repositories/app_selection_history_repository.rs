// src/repositories/app_selection_history_repository.rs
//
// Per-host app selection history

use std::collections::HashMap;
use std::sync::Arc;
use rusqlite::params;

use crate::db::ConnectionPool;
use crate::domain::AppSelectionHistory;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait AppSelectionHistoryRepository: Send + Sync {
    /// Most recent selection per package for `host`, as epoch millis
    fn get_last_used_for_host_grouped_by_package(&self, host: &str) -> AppResult<HashMap<String, i64>>;

    fn insert(&self, entry: &AppSelectionHistory) -> AppResult<()>;

    /// Delete all history for `packages`; returns rows removed
    fn delete(&self, packages: &[String]) -> AppResult<usize>;
}

pub struct SqliteAppSelectionHistoryRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteAppSelectionHistoryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl AppSelectionHistoryRepository for SqliteAppSelectionHistoryRepository {
    fn get_last_used_for_host_grouped_by_package(&self, host: &str) -> AppResult<HashMap<String, i64>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(
            "SELECT package_name, MAX(last_used) AS last_used
             FROM app_selection_history
             WHERE host = ?1
             GROUP BY package_name",
        )?;

        let rows = stmt.query_map(params![host.to_lowercase()], |row| {
            Ok((row.get::<_, String>("package_name")?, row.get::<_, i64>("last_used")?))
        })?;

        let mut last_used = HashMap::new();
        for row in rows {
            let (package, millis) = row?;
            last_used.insert(package, millis);
        }

        Ok(last_used)
    }

    fn insert(&self, entry: &AppSelectionHistory) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO app_selection_history (id, host, package_name, last_used)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id.to_string(),
                entry.host,
                entry.package_name,
                entry.last_used.timestamp_millis(),
            ],
        )?;

        Ok(())
    }

    fn delete(&self, packages: &[String]) -> AppResult<usize> {
        if packages.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM app_selection_history WHERE package_name = ?1")?;
            for package in packages {
                removed += stmt.execute(params![package])?;
            }
        }
        tx.commit()?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::db::create_memory_pool;

    fn at(millis: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_grouped_by_package_keeps_latest() {
        let repo = SqliteAppSelectionHistoryRepository::new(Arc::new(create_memory_pool().unwrap()));

        repo.insert(&AppSelectionHistory::new("example.com", "com.a", at(1_000))).unwrap();
        repo.insert(&AppSelectionHistory::new("example.com", "com.a", at(3_000))).unwrap();
        repo.insert(&AppSelectionHistory::new("example.com", "com.b", at(2_000))).unwrap();
        repo.insert(&AppSelectionHistory::new("other.com", "com.c", at(9_000))).unwrap();

        let last_used = repo.get_last_used_for_host_grouped_by_package("example.com").unwrap();
        assert_eq!(last_used.len(), 2);
        assert_eq!(last_used["com.a"], 3_000);
        assert_eq!(last_used["com.b"], 2_000);
    }

    #[test]
    fn test_delete_packages() {
        let repo = SqliteAppSelectionHistoryRepository::new(Arc::new(create_memory_pool().unwrap()));

        repo.insert(&AppSelectionHistory::new("example.com", "com.a", at(1_000))).unwrap();
        repo.insert(&AppSelectionHistory::new("example.com", "com.b", at(2_000))).unwrap();

        assert_eq!(repo.delete(&["com.a".to_string()]).unwrap(), 1);

        let last_used = repo.get_last_used_for_host_grouped_by_package("example.com").unwrap();
        assert!(!last_used.contains_key("com.a"));
        assert!(last_used.contains_key("com.b"));
    }
}
