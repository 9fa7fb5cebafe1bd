// src/repositories/whitelisted_browsers_repository.rs
//
// Browser whitelists. The normal and in-app lists share one shape and
// live in separate tables.

use std::collections::BTreeSet;
use std::sync::Arc;
use rusqlite::params;

use crate::db::ConnectionPool;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait WhitelistedBrowsersRepository: Send + Sync {
    fn get_all(&self) -> AppResult<BTreeSet<String>>;
    fn insert(&self, package_name: &str) -> AppResult<()>;
    fn delete(&self, package_name: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistKind {
    Normal,
    InApp,
}

impl WhitelistKind {
    fn table(self) -> &'static str {
        match self {
            WhitelistKind::Normal => "whitelisted_browser",
            WhitelistKind::InApp => "whitelisted_in_app_browser",
        }
    }
}

pub struct SqliteWhitelistedBrowsersRepository {
    pool: Arc<ConnectionPool>,
    kind: WhitelistKind,
}

impl SqliteWhitelistedBrowsersRepository {
    pub fn new(pool: Arc<ConnectionPool>, kind: WhitelistKind) -> Self {
        Self { pool, kind }
    }
}

impl WhitelistedBrowsersRepository for SqliteWhitelistedBrowsersRepository {
    fn get_all(&self) -> AppResult<BTreeSet<String>> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!("SELECT package_name FROM {}", self.kind.table()))?;
        let packages = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(packages)
    }

    fn insert(&self, package_name: &str) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            &format!("INSERT OR IGNORE INTO {} (package_name) VALUES (?1)", self.kind.table()),
            params![package_name],
        )?;

        Ok(())
    }

    fn delete(&self, package_name: &str) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            &format!("DELETE FROM {} WHERE package_name = ?1", self.kind.table()),
            params![package_name],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[test]
    fn test_lists_are_independent() {
        let pool = Arc::new(create_memory_pool().unwrap());
        let normal = SqliteWhitelistedBrowsersRepository::new(Arc::clone(&pool), WhitelistKind::Normal);
        let in_app = SqliteWhitelistedBrowsersRepository::new(pool, WhitelistKind::InApp);

        normal.insert("org.mozilla.firefox").unwrap();
        normal.insert("org.mozilla.firefox").unwrap();
        in_app.insert("com.android.chrome").unwrap();

        assert_eq!(normal.get_all().unwrap().len(), 1);
        assert!(normal.get_all().unwrap().contains("org.mozilla.firefox"));
        assert!(in_app.get_all().unwrap().contains("com.android.chrome"));

        normal.delete("org.mozilla.firefox").unwrap();
        assert!(normal.get_all().unwrap().is_empty());
        assert_eq!(in_app.get_all().unwrap().len(), 1);
    }
}
