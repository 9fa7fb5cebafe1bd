// src/repositories/lib_redirect_repository.rs
//
// Per-service LibRedirect state: enabled flag and chosen front-end/instance

use std::sync::Arc;
use rusqlite::{params, OptionalExtension};

use crate::db::ConnectionPool;
use crate::domain::LibRedirectDefault;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait LibRedirectStateRepository: Send + Sync {
    /// `None` when the user never toggled the service
    fn is_enabled(&self, service_key: &str) -> AppResult<Option<bool>>;
    fn set_enabled(&self, service_key: &str, enabled: bool) -> AppResult<()>;

    fn get_default(&self, service_key: &str) -> AppResult<Option<LibRedirectDefault>>;
    fn save_default(&self, default: &LibRedirectDefault) -> AppResult<()>;
}

pub struct SqliteLibRedirectStateRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteLibRedirectStateRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl LibRedirectStateRepository for SqliteLibRedirectStateRepository {
    fn is_enabled(&self, service_key: &str) -> AppResult<Option<bool>> {
        let conn = self.pool.get()?;

        let enabled = conn
            .query_row(
                "SELECT enabled FROM lib_redirect_service_state WHERE service_key = ?1",
                params![service_key],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;

        Ok(enabled)
    }

    fn set_enabled(&self, service_key: &str, enabled: bool) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO lib_redirect_service_state (service_key, enabled) VALUES (?1, ?2)",
            params![service_key, enabled],
        )?;

        Ok(())
    }

    fn get_default(&self, service_key: &str) -> AppResult<Option<LibRedirectDefault>> {
        let conn = self.pool.get()?;

        let default = conn
            .query_row(
                "SELECT service_key, frontend_key, instance_url
                 FROM lib_redirect_default WHERE service_key = ?1",
                params![service_key],
                |row| {
                    Ok(LibRedirectDefault {
                        service_key: row.get(0)?,
                        frontend_key: row.get(1)?,
                        instance_url: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(default)
    }

    fn save_default(&self, default: &LibRedirectDefault) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO lib_redirect_default (service_key, frontend_key, instance_url)
             VALUES (?1, ?2, ?3)",
            params![default.service_key, default.frontend_key, default.instance_url],
        )?;

        Ok(())
    }
}
