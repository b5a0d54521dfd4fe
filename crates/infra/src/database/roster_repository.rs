//! Counsellor roster and target store implementation

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use tokio::task;
use visapath_core::RosterStore;
use visapath_domain::{Counsellor, CounsellorTarget, Result};

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};

/// SQLite-backed roster store.
pub struct SqliteRosterStore {
    db: Arc<DbManager>,
}

impl SqliteRosterStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RosterStore for SqliteRosterStore {
    async fn counsellors(&self) -> Result<Vec<Counsellor>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Counsellor>> {
            let conn = db.get_connection()?;
            query_counsellors(&conn, None)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn counsellors_for_manager(&self, manager_id: &str) -> Result<Vec<Counsellor>> {
        let db = Arc::clone(&self.db);
        let manager_id = manager_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<Counsellor>> {
            let conn = db.get_connection()?;
            query_counsellors(&conn, Some(&manager_id))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn counsellor(&self, id: &str) -> Result<Option<Counsellor>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        task::spawn_blocking(move || -> Result<Option<Counsellor>> {
            let conn = db.get_connection()?;
            query_counsellor(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn target_for_month(
        &self,
        counsellor_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<CounsellorTarget>> {
        let db = Arc::clone(&self.db);
        let counsellor_id = counsellor_id.to_string();
        task::spawn_blocking(move || -> Result<Option<CounsellorTarget>> {
            let conn = db.get_connection()?;
            query_target(&conn, &counsellor_id, month, year)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_counsellors(conn: &DbConnection, manager_id: Option<&str>) -> Result<Vec<Counsellor>> {
    let sql = "SELECT id, name, manager_id
               FROM counsellors
               WHERE (?1 IS NULL OR manager_id = ?1)
               ORDER BY name, id";

    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt.query_map(params![manager_id], map_counsellor_row).map_err(map_sql_error)?;
    rows.collect::<rusqlite::Result<Vec<Counsellor>>>().map_err(map_sql_error)
}

fn query_counsellor(conn: &DbConnection, id: &str) -> Result<Option<Counsellor>> {
    let sql = "SELECT id, name, manager_id FROM counsellors WHERE id = ?1";
    match conn.query_row(sql, params![id], map_counsellor_row) {
        Ok(counsellor) => Ok(Some(counsellor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(map_sql_error(err)),
    }
}

fn query_target(
    conn: &DbConnection,
    counsellor_id: &str,
    month: u32,
    year: i32,
) -> Result<Option<CounsellorTarget>> {
    let sql = "SELECT id, counsellor_id, manager_id, target, month, year, achieved_target
               FROM counsellor_targets
               WHERE counsellor_id = ?1 AND month = ?2 AND year = ?3";

    let mapped = conn.query_row(sql, params![counsellor_id, month, year], |row| {
        Ok(CounsellorTarget {
            id: row.get(0)?,
            counsellor_id: row.get(1)?,
            manager_id: row.get(2)?,
            target: row.get(3)?,
            month: row.get(4)?,
            year: row.get(5)?,
            achieved_target: row.get(6)?,
        })
    });
    match mapped {
        Ok(target) => Ok(Some(target)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(map_sql_error(err)),
    }
}

fn map_counsellor_row(row: &Row<'_>) -> rusqlite::Result<Counsellor> {
    Ok(Counsellor { id: row.get(0)?, name: row.get(1)?, manager_id: row.get(2)? })
}
