//! Staged payment store implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Row};
use tokio::task;
use visapath_core::PaymentStore;
use visapath_domain::{DateRange, PaymentStage, Result, RoleScope, StagedPayment, VisaPathError};

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};
use super::parse_amount;

/// SQLite-backed staged payment store.
pub struct SqlitePaymentStore {
    db: Arc<DbManager>,
}

impl SqlitePaymentStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaymentStore for SqlitePaymentStore {
    async fn payments_for_clients(&self, client_ids: &[String]) -> Result<Vec<StagedPayment>> {
        let db = Arc::clone(&self.db);
        let client_ids = client_ids.to_vec();

        task::spawn_blocking(move || -> Result<Vec<StagedPayment>> {
            let conn = db.get_connection()?;
            query_payments_for_clients(&conn, &client_ids)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn payments_effective_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<StagedPayment>> {
        let db = Arc::clone(&self.db);
        let range = *range;
        let scope = scope.clone();

        task::spawn_blocking(move || -> Result<Vec<StagedPayment>> {
            let conn = db.get_connection()?;
            query_payments_effective_between(&conn, &range, &scope)
        })
        .await
        .map_err(map_join_error)?
    }
}

const PAYMENT_COLUMNS: &str = "id, client_id, stage, amount, total_payment, payment_date, created_at";

fn query_payments_for_clients(
    conn: &DbConnection,
    client_ids: &[String],
) -> Result<Vec<StagedPayment>> {
    if client_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; client_ids.len()].join(", ");
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}
         FROM staged_payments
         WHERE client_id IN ({placeholders})
         ORDER BY client_id, created_at, id"
    );

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params_from_iter(client_ids.iter()), map_payment_row)
        .map_err(map_sql_error)?;
    collect_payments(rows)
}

fn query_payments_effective_between(
    conn: &DbConnection,
    range: &DateRange,
    scope: &RoleScope,
) -> Result<Vec<StagedPayment>> {
    let sql = format!(
        "SELECT {}
         FROM staged_payments p
         JOIN clients c ON c.id = p.client_id
         WHERE c.archived = 0
           AND COALESCE(p.payment_date, p.created_at) BETWEEN ?1 AND ?2
           AND (?3 IS NULL OR c.counsellor_id = ?3)
         ORDER BY p.client_id, p.created_at, p.id",
        PAYMENT_COLUMNS
            .split(", ")
            .map(|column| format!("p.{column}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![range.start, range.end, scope.restricted_to()], map_payment_row)
        .map_err(map_sql_error)?;
    collect_payments(rows)
}

/// Raw row before decimal/stage decoding.
struct RawPayment {
    id: String,
    client_id: String,
    stage: String,
    amount: String,
    total_payment: String,
    payment_date: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

fn map_payment_row(row: &Row<'_>) -> rusqlite::Result<RawPayment> {
    Ok(RawPayment {
        id: row.get(0)?,
        client_id: row.get(1)?,
        stage: row.get(2)?,
        amount: row.get(3)?,
        total_payment: row.get(4)?,
        payment_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn collect_payments(
    rows: impl Iterator<Item = rusqlite::Result<RawPayment>>,
) -> Result<Vec<StagedPayment>> {
    rows.map(|row| row.map_err(map_sql_error).and_then(decode_payment)).collect()
}

fn decode_payment(raw: RawPayment) -> Result<StagedPayment> {
    let stage = PaymentStage::from_tag(&raw.stage)
        .ok_or_else(|| VisaPathError::Database(format!("unknown payment stage: {}", raw.stage)))?;
    Ok(StagedPayment {
        id: raw.id,
        client_id: raw.client_id,
        stage,
        amount: parse_amount(&raw.amount)?,
        total_payment: parse_amount(&raw.total_payment)?,
        payment_date: raw.payment_date,
        created_at: raw.created_at,
    })
}
