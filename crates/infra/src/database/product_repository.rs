//! Product sale store implementation
//!
//! Carries the closed entity registry: each [`EntityKind`] maps to its
//! table, its own date column, and an optional amount column. Adding a
//! product type means extending the enum, the schema, and this match -
//! all checked at compile time, never a dynamic table lookup.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use tokio::task;
use visapath_core::ProductStore;
use visapath_domain::constants::CORE_PRODUCT;
use visapath_domain::{
    DateRange, EntityKind, EntitySale, ProductPayment, Result, RoleScope,
};

use super::manager::{map_join_error, map_sql_error, DbConnection, DbManager};
use super::parse_amount;

/// SQLite-backed product sale store.
pub struct SqliteProductStore {
    db: Arc<DbManager>,
}

impl SqliteProductStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn direct_sales_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<ProductPayment>> {
        let db = Arc::clone(&self.db);
        let range = *range;
        let scope = scope.clone();

        task::spawn_blocking(move || -> Result<Vec<ProductPayment>> {
            let conn = db.get_connection()?;
            query_direct_sales(&conn, &range, &scope)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn entity_sales_between(
        &self,
        kind: EntityKind,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<EntitySale>> {
        let db = Arc::clone(&self.db);
        let range = *range;
        let scope = scope.clone();

        task::spawn_blocking(move || -> Result<Vec<EntitySale>> {
            let conn = db.get_connection()?;
            query_entity_sales(&conn, kind, &range, &scope)
        })
        .await
        .map_err(map_join_error)?
    }
}

/* -------------------------------------------------------------------------- */
/* Entity Registry */
/* -------------------------------------------------------------------------- */

struct EntityQuery {
    table: &'static str,
    date_column: &'static str,
    amount_column: Option<&'static str>,
}

fn entity_query(kind: EntityKind) -> EntityQuery {
    match kind {
        EntityKind::Insurance => {
            EntityQuery { table: "insurances", date_column: "policy_date", amount_column: None }
        }
        EntityKind::AirTicket => {
            EntityQuery { table: "air_tickets", date_column: "travel_date", amount_column: None }
        }
        EntityKind::ForexFee => {
            EntityQuery { table: "forex_fees", date_column: "transfer_date", amount_column: None }
        }
        EntityKind::ForexCard => {
            EntityQuery { table: "forex_cards", date_column: "issue_date", amount_column: None }
        }
        EntityKind::CreditCard => {
            EntityQuery { table: "credit_cards", date_column: "issue_date", amount_column: None }
        }
        EntityKind::SimCard => {
            EntityQuery { table: "sim_cards", date_column: "activation_date", amount_column: None }
        }
        EntityKind::TuitionFee => {
            EntityQuery { table: "tuition_fees", date_column: "payment_date", amount_column: None }
        }
        EntityKind::Loan => {
            EntityQuery { table: "loans", date_column: "disbursment_date", amount_column: None }
        }
        EntityKind::Ielts => EntityQuery {
            table: "ielts_enrollments",
            date_column: "enrollment_date",
            amount_column: Some("amount"),
        },
        EntityKind::VisaExtension => EntityQuery {
            table: "visa_extensions",
            date_column: "extension_date",
            amount_column: Some("amount"),
        },
        EntityKind::BeaconAccount => {
            EntityQuery { table: "beacon_accounts", date_column: "opening_date", amount_column: None }
        }
        EntityKind::NewSell => EntityQuery {
            table: "new_sells",
            date_column: "sell_date",
            amount_column: Some("amount"),
        },
        EntityKind::FinanceApproval => EntityQuery {
            table: "finance_approvals",
            date_column: "approval_date",
            amount_column: Some("amount"),
        },
    }
}

/* -------------------------------------------------------------------------- */
/* SQL Operations (synchronous) */
/* -------------------------------------------------------------------------- */

fn query_direct_sales(
    conn: &DbConnection,
    range: &DateRange,
    scope: &RoleScope,
) -> Result<Vec<ProductPayment>> {
    let sql = "SELECT pp.id, pp.client_id, pp.product_name, pp.amount, pp.entity_type,
                      pp.entity_id, pp.payment_date, pp.created_at
               FROM product_payments pp
               JOIN clients c ON c.id = pp.client_id
               WHERE c.archived = 0
                 AND pp.amount IS NOT NULL
                 AND pp.payment_date IS NOT NULL
                 AND pp.payment_date BETWEEN ?1 AND ?2
                 AND (?3 IS NULL OR c.counsellor_id = ?3)
               ORDER BY pp.payment_date, pp.id";

    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![range.start, range.end, scope.restricted_to()], map_product_row)
        .map_err(map_sql_error)?;

    rows.map(|row| row.map_err(map_sql_error).and_then(decode_product)).collect()
}

fn query_entity_sales(
    conn: &DbConnection,
    kind: EntityKind,
    range: &DateRange,
    scope: &RoleScope,
) -> Result<Vec<EntitySale>> {
    let entry = entity_query(kind);
    let amount_select =
        entry.amount_column.map_or_else(|| "NULL".to_string(), |column| format!("e.{column}"));
    // The core table carries the core product name; every other entity
    // join excludes it.
    let name_predicate =
        if kind.is_core() { "pp.product_name = ?3" } else { "pp.product_name <> ?3" };

    let sql = format!(
        "SELECT pp.client_id, e.{date_column}, {amount_select}
         FROM product_payments pp
         JOIN {table} e ON e.id = pp.entity_id
         JOIN clients c ON c.id = pp.client_id
         WHERE pp.entity_type = ?4
           AND c.archived = 0
           AND e.{date_column} BETWEEN ?1 AND ?2
           AND {name_predicate}
           AND (?5 IS NULL OR c.counsellor_id = ?5)
         ORDER BY e.{date_column}, pp.id",
        date_column = entry.date_column,
        amount_select = amount_select,
        table = entry.table,
    );

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(
            params![
                range.start.date(),
                range.end.date(),
                CORE_PRODUCT,
                kind.tag(),
                scope.restricted_to(),
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, chrono::NaiveDate>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .map_err(map_sql_error)?;

    rows.map(|row| {
        let (client_id, occurred_on, amount) = row.map_err(map_sql_error)?;
        let amount = amount.as_deref().map(parse_amount).transpose()?;
        Ok(EntitySale { client_id, occurred_on, amount })
    })
    .collect()
}

struct RawProduct {
    id: String,
    client_id: String,
    product_name: String,
    amount: Option<String>,
    entity_type: Option<String>,
    entity_id: Option<String>,
    payment_date: Option<chrono::NaiveDateTime>,
    created_at: chrono::NaiveDateTime,
}

fn map_product_row(row: &Row<'_>) -> rusqlite::Result<RawProduct> {
    Ok(RawProduct {
        id: row.get(0)?,
        client_id: row.get(1)?,
        product_name: row.get(2)?,
        amount: row.get(3)?,
        entity_type: row.get(4)?,
        entity_id: row.get(5)?,
        payment_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn decode_product(raw: RawProduct) -> Result<ProductPayment> {
    Ok(ProductPayment {
        id: raw.id,
        client_id: raw.client_id,
        product_name: raw.product_name,
        amount: raw.amount.as_deref().map(parse_amount).transpose()?,
        entity_type: raw.entity_type,
        entity_id: raw.entity_id,
        payment_date: raw.payment_date,
        created_at: raw.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::*;

    fn setup() -> (SqliteProductStore, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("products.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        manager.run_migrations().expect("migrations run");

        let store = SqliteProductStore::new(Arc::clone(&manager));
        (store, manager, temp_dir)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(at(2026, 1, 1, 0), at(2026, 1, 31, 23))
    }

    fn insert_client(manager: &DbManager, id: &str, counsellor_id: &str) {
        let conn = manager.get_connection().expect("connection acquired");
        conn.execute(
            "INSERT INTO clients (id, counsellor_id, enrollment_date, archived) VALUES (?1, ?2, ?3, 0)",
            params![id, counsellor_id, day(2026, 1, 5)],
        )
        .expect("client inserted");
    }

    fn insert_product_pointer(
        manager: &DbManager,
        id: &str,
        client_id: &str,
        product_name: &str,
        entity_type: &str,
        entity_id: &str,
    ) {
        let conn = manager.get_connection().expect("connection acquired");
        conn.execute(
            "INSERT INTO product_payments (id, client_id, product_name, amount, entity_type, entity_id, payment_date, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, NULL, ?6)",
            params![id, client_id, product_name, entity_type, entity_id, at(2026, 1, 8, 9)],
        )
        .expect("product pointer inserted");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn direct_sales_require_an_explicit_payment_date() {
        let (store, manager, _dir) = setup();
        insert_client(&manager, "cl-1", "csl-1");
        let conn = manager.get_connection().unwrap();
        conn.execute(
            "INSERT INTO product_payments (id, client_id, product_name, amount, entity_type, entity_id, payment_date, created_at)
             VALUES ('prod-1', 'cl-1', 'NOTARY', '150.00', NULL, NULL, ?1, ?1)",
            params![at(2026, 1, 9, 9)],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO product_payments (id, client_id, product_name, amount, entity_type, entity_id, payment_date, created_at)
             VALUES ('prod-2', 'cl-1', 'NOTARY', '990.00', NULL, NULL, NULL, ?1)",
            params![at(2026, 1, 9, 10)],
        )
        .unwrap();
        drop(conn);

        let rows = store.direct_sales_between(&january(), &RoleScope::admin()).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "prod-1");
        assert_eq!(rows[0].amount, Some(Decimal::new(15_000, 2)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn entity_lookup_follows_the_entity_date_column() {
        let (store, manager, _dir) = setup();
        insert_client(&manager, "cl-1", "csl-1");
        insert_product_pointer(
            &manager,
            "prod-1",
            "cl-1",
            "INSURANCE",
            EntityKind::Insurance.tag(),
            "ins-1",
        );
        let conn = manager.get_connection().unwrap();
        // Policy dated outside January: invisible despite the January
        // product payment row.
        conn.execute(
            "INSERT INTO insurances (id, policy_date) VALUES ('ins-1', ?1)",
            params![day(2026, 2, 3)],
        )
        .unwrap();
        drop(conn);

        let rows = store
            .entity_sales_between(EntityKind::Insurance, &january(), &RoleScope::admin())
            .await
            .unwrap();
        assert!(rows.is_empty());

        let february = DateRange::new(at(2026, 2, 1, 0), at(2026, 2, 28, 23));
        let rows = store
            .entity_sales_between(EntityKind::Insurance, &february, &RoleScope::admin())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn the_core_table_requires_the_core_product_name() {
        let (store, manager, _dir) = setup();
        insert_client(&manager, "cl-1", "csl-1");
        insert_product_pointer(
            &manager,
            "prod-1",
            "cl-1",
            CORE_PRODUCT,
            EntityKind::FinanceApproval.tag(),
            "fa-1",
        );
        insert_product_pointer(
            &manager,
            "prod-2",
            "cl-1",
            "SOMETHING_ELSE",
            EntityKind::FinanceApproval.tag(),
            "fa-2",
        );
        let conn = manager.get_connection().unwrap();
        for (id, amount) in [("fa-1", "1200.00"), ("fa-2", "800.00")] {
            conn.execute(
                "INSERT INTO finance_approvals (id, approval_date, amount) VALUES (?1, ?2, ?3)",
                params![id, day(2026, 1, 12), amount],
            )
            .unwrap();
        }
        drop(conn);

        let rows = store
            .entity_sales_between(EntityKind::FinanceApproval, &january(), &RoleScope::admin())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Some(Decimal::new(120_000, 2)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn amount_bearing_entities_return_their_amounts() {
        let (store, manager, _dir) = setup();
        insert_client(&manager, "cl-1", "csl-1");
        insert_product_pointer(
            &manager,
            "prod-1",
            "cl-1",
            "IELTS",
            EntityKind::Ielts.tag(),
            "ielts-1",
        );
        let conn = manager.get_connection().unwrap();
        conn.execute(
            "INSERT INTO ielts_enrollments (id, enrollment_date, amount) VALUES ('ielts-1', ?1, '450.00')",
            params![day(2026, 1, 9)],
        )
        .unwrap();
        drop(conn);

        let rows = store
            .entity_sales_between(EntityKind::Ielts, &january(), &RoleScope::admin())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_id, "cl-1");
        assert_eq!(rows[0].occurred_on, day(2026, 1, 9));
        assert_eq!(rows[0].amount, Some(Decimal::new(45_000, 2)));
    }
}
