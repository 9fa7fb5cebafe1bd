// src/repositories/resolve_cache_repository.rs
//
// Local cache for redirect and AMP resolution.
//
// Rows are keyed by the SHA-256 of the input URL. Concurrent writers for
// the same input race with INSERT OR REPLACE; the last one wins.

use std::sync::Arc;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::db::ConnectionPool;
use crate::domain::ResolveModule;
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
pub trait ResolveCacheRepository: Send + Sync {
    fn get(&self, module: ResolveModule, input_url: &str) -> AppResult<Option<String>>;
    fn insert(&self, module: ResolveModule, input_url: &str, resolved_url: &str) -> AppResult<()>;
}

/// Hex SHA-256 of a URL, used as the cache key
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn table_for(module: ResolveModule) -> &'static str {
    match module {
        ResolveModule::Redirect => "resolved_redirect",
        ResolveModule::Amp2Html => "amp2html_mapping",
    }
}

pub struct SqliteResolveCacheRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteResolveCacheRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl ResolveCacheRepository for SqliteResolveCacheRepository {
    fn get(&self, module: ResolveModule, input_url: &str) -> AppResult<Option<String>> {
        let conn = self.pool.get()?;

        let resolved = conn
            .query_row(
                &format!("SELECT resolved_url FROM {} WHERE input_hash = ?1", table_for(module)),
                params![cache_key(input_url)],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(resolved)
    }

    fn insert(&self, module: ResolveModule, input_url: &str, resolved_url: &str) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (input_hash, input_url, resolved_url, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                table_for(module)
            ),
            params![cache_key(input_url), input_url, resolved_url, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[test]
    fn test_cache_key_is_stable_hex() {
        let key = cache_key("https://t.co/abc");
        assert_eq!(key.len(), 64);
        assert_eq!(key, cache_key("https://t.co/abc"));
        assert_ne!(key, cache_key("https://t.co/abd"));
    }

    #[test]
    fn test_modules_use_separate_tables() {
        let repo = SqliteResolveCacheRepository::new(Arc::new(create_memory_pool().unwrap()));

        repo.insert(ResolveModule::Redirect, "https://t.co/x", "https://example.com/").unwrap();

        assert_eq!(
            repo.get(ResolveModule::Redirect, "https://t.co/x").unwrap().as_deref(),
            Some("https://example.com/")
        );
        assert!(repo.get(ResolveModule::Amp2Html, "https://t.co/x").unwrap().is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let repo = SqliteResolveCacheRepository::new(Arc::new(create_memory_pool().unwrap()));

        repo.insert(ResolveModule::Amp2Html, "https://amp.example.com/p", "https://example.com/a").unwrap();
        repo.insert(ResolveModule::Amp2Html, "https://amp.example.com/p", "https://example.com/b").unwrap();

        assert_eq!(
            repo.get(ResolveModule::Amp2Html, "https://amp.example.com/p").unwrap().as_deref(),
            Some("https://example.com/b")
        );
    }
}
