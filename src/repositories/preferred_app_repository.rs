// src/repositories/preferred_app_repository.rs
//
// Preferred app persistence (one row per host)

use std::sync::Arc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::db::ConnectionPool;
use crate::domain::PreferredApp;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait PreferredAppRepository: Send + Sync {
    fn get_by_host(&self, host: &str) -> AppResult<Option<PreferredApp>>;

    /// Insert or replace the choice for `app.host`
    fn save(&self, app: &PreferredApp) -> AppResult<()>;

    /// Delete every row pointing at one of `packages`; returns rows removed
    fn delete(&self, packages: &[String]) -> AppResult<usize>;
}

pub struct SqlitePreferredAppRepository {
    pool: Arc<ConnectionPool>,
}

impl SqlitePreferredAppRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_preferred_app(row: &Row) -> Result<PreferredApp, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let created_at_str: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        Ok(PreferredApp {
            id,
            host: row.get("host")?,
            package_name: row.get("package_name")?,
            component: row.get("component")?,
            always_preferred: row.get("always_preferred")?,
            created_at,
        })
    }
}

impl PreferredAppRepository for SqlitePreferredAppRepository {
    fn get_by_host(&self, host: &str) -> AppResult<Option<PreferredApp>> {
        let conn = self.pool.get()?;

        let app = conn
            .query_row(
                "SELECT id, host, package_name, component, always_preferred, created_at
                 FROM preferred_app WHERE host = ?1",
                params![host.to_lowercase()],
                Self::row_to_preferred_app,
            )
            .optional()?;

        Ok(app)
    }

    fn save(&self, app: &PreferredApp) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO preferred_app (
                id, host, package_name, component, always_preferred, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                app.id.to_string(),
                app.host,
                app.package_name,
                app.component,
                app.always_preferred,
                app.created_at.to_rfc3339(),
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
            let mut stmt = tx.prepare("DELETE FROM preferred_app WHERE package_name = ?1")?;
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
    use crate::db::create_memory_pool;

    fn repo() -> SqlitePreferredAppRepository {
        SqlitePreferredAppRepository::new(Arc::new(create_memory_pool().unwrap()))
    }

    #[test]
    fn test_save_and_get_by_host() {
        let repo = repo();
        let app = PreferredApp::new("example.com", "com.example", None, true);
        repo.save(&app).unwrap();

        let loaded = repo.get_by_host("EXAMPLE.com").unwrap().unwrap();
        assert_eq!(loaded.id, app.id);
        assert_eq!(loaded.package_name, "com.example");
        assert!(loaded.always_preferred);
        assert!(repo.get_by_host("other.com").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_choice_for_host() {
        let repo = repo();
        repo.save(&PreferredApp::new("example.com", "com.first", None, false)).unwrap();
        repo.save(&PreferredApp::new(
            "example.com",
            "com.second",
            Some("com.second/com.second.Main".to_string()),
            true,
        ))
        .unwrap();

        let loaded = repo.get_by_host("example.com").unwrap().unwrap();
        assert_eq!(loaded.package_name, "com.second");
        assert_eq!(loaded.component.as_deref(), Some("com.second/com.second.Main"));
    }

    #[test]
    fn test_delete_by_packages() {
        let repo = repo();
        repo.save(&PreferredApp::new("a.com", "com.gone", None, true)).unwrap();
        repo.save(&PreferredApp::new("b.com", "com.gone", None, true)).unwrap();
        repo.save(&PreferredApp::new("c.com", "com.kept", None, true)).unwrap();

        let removed = repo.delete(&["com.gone".to_string()]).unwrap();
        assert_eq!(removed, 2);
        assert!(repo.get_by_host("a.com").unwrap().is_none());
        assert!(repo.get_by_host("c.com").unwrap().is_some());
        assert_eq!(repo.delete(&[]).unwrap(), 0);
    }
}
