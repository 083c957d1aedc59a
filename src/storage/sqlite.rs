//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::PageKind;
use crate::extract::ProductRecord;
use crate::state::PageState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use crate::ScraperError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const PAGE_COLUMNS: &str = "id, url, kind, state, referer, status_code, content_type, \
     visited_at, discovered_at, discovered_run, error_message, retry_count, canonical_url";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and applies the schema
    pub fn new(path: &Path) -> Result<Self, ScraperError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScraperError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        kind: PageKind::from_db_string(&row.get::<_, String>(2)?).unwrap_or(PageKind::Listing),
        state: PageState::from_db_string(&row.get::<_, String>(3)?).unwrap_or(PageState::Failed),
        referer: row.get(4)?,
        status_code: row.get(5)?,
        content_type: row.get(6)?,
        visited_at: row.get(7)?,
        discovered_at: row.get(8)?,
        discovered_run: row.get(9)?,
        error_message: row.get(10)?,
        retry_count: row.get(11)?,
        canonical_url: row.get(12)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    fn reset_crawl_state(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM frontier; DELETE FROM pages;")?;
        Ok(())
    }

    // ===== Page Management =====

    fn insert_or_get_page(
        &mut self,
        url: &str,
        canonical_url: &str,
        kind: PageKind,
        referer: Option<&str>,
        discovered_run: i64,
    ) -> StorageResult<(i64, bool)> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM pages WHERE canonical_url = ?1",
                params![canonical_url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok((id, false));
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (url, canonical_url, kind, state, referer, discovered_at, discovered_run)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                url,
                canonical_url,
                kind.to_db_string(),
                PageState::Discovered.to_db_string(),
                referer,
                now,
                discovered_run
            ],
        )?;

        Ok((self.conn.last_insert_rowid(), true))
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn update_page_state(
        &mut self,
        page_id: i64,
        state: PageState,
        status_code: Option<u16>,
        content_type: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let visited_at = state.is_terminal().then(|| Utc::now().to_rfc3339());
        self.conn.execute(
            "UPDATE pages SET state = ?1,
                 status_code = COALESCE(?2, status_code),
                 content_type = COALESCE(?3, content_type),
                 visited_at = COALESCE(?4, visited_at),
                 error_message = ?5
             WHERE id = ?6",
            params![
                state.to_db_string(),
                status_code,
                content_type,
                visited_at,
                error_message,
                page_id
            ],
        )?;
        Ok(())
    }

    fn increment_retry_count(&mut self, page_id: i64) -> StorageResult<u32> {
        self.conn.execute(
            "UPDATE pages SET retry_count = retry_count + 1 WHERE id = ?1",
            params![page_id],
        )?;
        let count: u32 = self.conn.query_row(
            "SELECT retry_count FROM pages WHERE id = ?1",
            params![page_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn get_pages_by_state(&self, state: PageState) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE state = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![state.to_db_string()], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn get_interrupted_pages(&self) -> StorageResult<Vec<PageRecord>> {
        self.get_pages_by_state(PageState::Fetching)
    }

    // ===== Frontier Management =====

    fn add_to_frontier(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO frontier (page_id) VALUES (?1)",
            params![page_id],
        )?;
        Ok(())
    }

    fn remove_from_frontier(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM frontier WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }

    fn load_frontier(&self) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id FROM frontier ORDER BY position ASC")?;

        let frontier = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(frontier)
    }

    fn clear_frontier(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM frontier", [])?;
        Ok(())
    }

    // ===== Products =====

    fn insert_product(&mut self, run_id: i64, record: &ProductRecord) -> StorageResult<i64> {
        let json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO products (run_id, url, retailer_sku, color, name, sku_count, record_json, extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                record.url,
                record.retailer_sku,
                record.color(),
                record.name,
                record.skus.len() as i64,
                json,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_products(&self, run_id: i64) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_json FROM products WHERE run_id = ?1 ORDER BY id")?;

        let rows = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut products = Vec::with_capacity(rows.len());
        for json in rows {
            products.push(serde_json::from_str(&json)?);
        }
        Ok(products)
    }

    fn count_products(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_distinct_retailer_skus(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT retailer_sku) FROM products WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_skus(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(sku_count), 0) FROM products WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Statistics =====

    fn count_pages_by_state(&self, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_pages_by_kind(&self, kind: PageKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE kind = ?1",
            params![kind.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_error_summary(&self) -> StorageResult<HashMap<PageState, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, COUNT(*) FROM pages GROUP BY state")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut summary = HashMap::new();
        for row in rows {
            let (state_str, count) = row?;
            if let Some(state) = PageState::from_db_string(&state_str) {
                if state.is_error() {
                    summary.insert(state, count as u64);
                }
            }
        }

        Ok(summary)
    }

    fn get_extraction_failures(&self, limit: usize) -> StorageResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, COALESCE(error_message, '') FROM pages
             WHERE state = ?1 ORDER BY id LIMIT ?2",
        )?;

        let failures = stmt
            .query_map(
                params![PageState::ExtractionFailed.to_db_string(), limit as i64],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }
}
