//! In-memory implementation of the row-store ports
//!
//! Backs the engine's unit and integration tests without a database, and
//! doubles as the reference adapter: the SQLite adapter must agree with
//! it row for row.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use visapath_domain::constants::CORE_PRODUCT;
use visapath_domain::{
    Client, Counsellor, CounsellorTarget, DateRange, EntityKind, EntitySale, PaymentStage,
    ProductPayment, Result, RoleScope, StagedPayment,
};

use super::ports::{ClientStore, PaymentStore, ProductStore, RosterStore};

/// One row of an entity table, keyed by `(entity_type tag, entity_id)`.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub occurred_on: NaiveDate,
    pub amount: Option<Decimal>,
}

/// In-memory row store. Populate through the `add_*` helpers, then wrap
/// in an `Arc` and hand the same instance to every port parameter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: Vec<Client>,
    payments: Vec<StagedPayment>,
    products: Vec<ProductPayment>,
    entities: HashMap<(String, String), EntityRecord>,
    counsellors: Vec<Counsellor>,
    targets: Vec<CounsellorTarget>,
}

impl MemoryStore {
    pub fn add_counsellor(&mut self, id: &str, name: &str, manager_id: Option<&str>) {
        self.counsellors.push(Counsellor {
            id: id.to_string(),
            name: name.to_string(),
            manager_id: manager_id.map(str::to_string),
        });
    }

    pub fn add_client(&mut self, id: &str, counsellor_id: &str, enrollment_date: NaiveDate) {
        self.clients.push(Client {
            id: id.to_string(),
            counsellor_id: counsellor_id.to_string(),
            enrollment_date,
            archived: false,
        });
    }

    pub fn add_archived_client(
        &mut self,
        id: &str,
        counsellor_id: &str,
        enrollment_date: NaiveDate,
    ) {
        self.clients.push(Client {
            id: id.to_string(),
            counsellor_id: counsellor_id.to_string(),
            enrollment_date,
            archived: true,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_payment(
        &mut self,
        id: &str,
        client_id: &str,
        stage: PaymentStage,
        amount: Decimal,
        total_payment: Decimal,
        payment_date: Option<chrono::NaiveDateTime>,
        created_at: chrono::NaiveDateTime,
    ) {
        self.payments.push(StagedPayment {
            id: id.to_string(),
            client_id: client_id.to_string(),
            stage,
            amount,
            total_payment,
            payment_date,
            created_at,
        });
    }

    /// A self-contained product sale carrying its own amount.
    pub fn add_direct_product(
        &mut self,
        id: &str,
        client_id: &str,
        product_name: &str,
        amount: Decimal,
        payment_date: Option<chrono::NaiveDateTime>,
        created_at: chrono::NaiveDateTime,
    ) {
        self.products.push(ProductPayment {
            id: id.to_string(),
            client_id: client_id.to_string(),
            product_name: product_name.to_string(),
            amount: Some(amount),
            entity_type: None,
            entity_id: None,
            payment_date,
            created_at,
        });
    }

    /// A product sale resolved through an entity table row. The tag is a
    /// plain string on purpose: unknown tags must be representable.
    #[allow(clippy::too_many_arguments)]
    pub fn add_product_entity(
        &mut self,
        id: &str,
        client_id: &str,
        product_name: &str,
        entity_tag: &str,
        entity_id: &str,
        record: EntityRecord,
        created_at: chrono::NaiveDateTime,
    ) {
        self.products.push(ProductPayment {
            id: id.to_string(),
            client_id: client_id.to_string(),
            product_name: product_name.to_string(),
            amount: None,
            entity_type: Some(entity_tag.to_string()),
            entity_id: Some(entity_id.to_string()),
            payment_date: None,
            created_at,
        });
        self.entities.insert((entity_tag.to_string(), entity_id.to_string()), record);
    }

    pub fn add_target(
        &mut self,
        id: &str,
        counsellor_id: &str,
        month: u32,
        year: i32,
        target: i64,
    ) {
        self.targets.push(CounsellorTarget {
            id: id.to_string(),
            counsellor_id: counsellor_id.to_string(),
            manager_id: None,
            target,
            month,
            year,
            achieved_target: 0,
        });
    }

    fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == id)
    }

    fn visible(&self, client_id: &str, scope: &RoleScope) -> bool {
        let Some(client) = self.client(client_id) else { return false };
        if client.archived {
            return false;
        }
        match scope.restricted_to() {
            Some(counsellor_id) => client.counsellor_id == counsellor_id,
            None => true,
        }
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn clients_enrolled_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<Client>> {
        Ok(self
            .clients
            .iter()
            .filter(|client| !client.archived)
            .filter(|client| range.contains_date(client.enrollment_date))
            .filter(|client| match scope.restricted_to() {
                Some(counsellor_id) => client.counsellor_id == counsellor_id,
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn payments_for_clients(&self, client_ids: &[String]) -> Result<Vec<StagedPayment>> {
        let mut rows: Vec<StagedPayment> = self
            .payments
            .iter()
            .filter(|payment| client_ids.contains(&payment.client_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (&a.client_id, a.created_at, &a.id).cmp(&(&b.client_id, b.created_at, &b.id))
        });
        Ok(rows)
    }

    async fn payments_effective_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<StagedPayment>> {
        Ok(self
            .payments
            .iter()
            .filter(|payment| self.visible(&payment.client_id, scope))
            .filter(|payment| range.contains(payment.effective_date()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn direct_sales_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<ProductPayment>> {
        Ok(self
            .products
            .iter()
            .filter(|sale| sale.amount.is_some())
            .filter(|sale| sale.payment_date.is_some_and(|paid_on| range.contains(paid_on)))
            .filter(|sale| self.visible(&sale.client_id, scope))
            .cloned()
            .collect())
    }

    async fn entity_sales_between(
        &self,
        kind: EntityKind,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<EntitySale>> {
        Ok(self
            .products
            .iter()
            .filter_map(|sale| {
                let tag = sale.entity_type.as_deref()?;
                if tag != kind.tag() {
                    return None;
                }
                if kind.is_core() {
                    if sale.product_name != CORE_PRODUCT {
                        return None;
                    }
                } else if sale.product_name == CORE_PRODUCT {
                    return None;
                }
                if !self.visible(&sale.client_id, scope) {
                    return None;
                }
                let entity_id = sale.entity_id.as_deref()?;
                let record = self.entities.get(&(tag.to_string(), entity_id.to_string()))?;
                if !range.contains_date(record.occurred_on) {
                    return None;
                }
                Some(EntitySale {
                    client_id: sale.client_id.clone(),
                    occurred_on: record.occurred_on,
                    amount: record.amount,
                })
            })
            .collect())
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn counsellors(&self) -> Result<Vec<Counsellor>> {
        Ok(self.counsellors.clone())
    }

    async fn counsellors_for_manager(&self, manager_id: &str) -> Result<Vec<Counsellor>> {
        Ok(self
            .counsellors
            .iter()
            .filter(|counsellor| counsellor.manager_id.as_deref() == Some(manager_id))
            .cloned()
            .collect())
    }

    async fn counsellor(&self, id: &str) -> Result<Option<Counsellor>> {
        Ok(self.counsellors.iter().find(|counsellor| counsellor.id == id).cloned())
    }

    async fn target_for_month(
        &self,
        counsellor_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<CounsellorTarget>> {
        Ok(self
            .targets
            .iter()
            .find(|target| {
                target.counsellor_id == counsellor_id
                    && target.month == month
                    && target.year == year
            })
            .cloned())
    }
}
