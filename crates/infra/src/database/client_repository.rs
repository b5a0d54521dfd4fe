//! Client store implementation

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use tokio::task;
use visapath_core::ClientStore;
use visapath_domain::{Client, DateRange, Result, RoleScope};

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};

/// SQLite-backed client store.
pub struct SqliteClientStore {
    db: Arc<DbManager>,
}

impl SqliteClientStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientStore for SqliteClientStore {
    async fn clients_enrolled_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<Client>> {
        let db = Arc::clone(&self.db);
        let range = *range;
        let scope = scope.clone();

        task::spawn_blocking(move || -> Result<Vec<Client>> {
            let conn = db.get_connection()?;
            query_clients_enrolled_between(&conn, &range, &scope)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_clients_enrolled_between(
    conn: &DbConnection,
    range: &DateRange,
    scope: &RoleScope,
) -> Result<Vec<Client>> {
    let sql = "SELECT id, counsellor_id, enrollment_date, archived
               FROM clients
               WHERE archived = 0
                 AND enrollment_date BETWEEN ?1 AND ?2
                 AND (?3 IS NULL OR counsellor_id = ?3)
               ORDER BY enrollment_date, id";

    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(
            params![range.start.date(), range.end.date(), scope.restricted_to()],
            |row| {
                Ok(Client {
                    id: row.get(0)?,
                    counsellor_id: row.get(1)?,
                    enrollment_date: row.get(2)?,
                    archived: row.get::<_, i64>(3)? != 0,
                })
            },
        )
        .map_err(map_sql_error)?;

    rows.collect::<rusqlite::Result<Vec<Client>>>().map_err(map_sql_error)
}
