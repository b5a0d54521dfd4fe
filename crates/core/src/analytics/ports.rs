//! Port interfaces for the CRM row store
//!
//! These traits define the boundary between the aggregation logic and the
//! storage adapter. They are parameterized row queries: date filtering
//! that belongs to a specific table (entity date columns, the
//! payment-date fallback) is applied by the adapter, while every
//! metric-specific predicate stays in the aggregators.

use async_trait::async_trait;
use visapath_domain::{
    Client, Counsellor, CounsellorTarget, DateRange, EntityKind, EntitySale, ProductPayment,
    Result, RoleScope, StagedPayment,
};

/// Read access to enrolled clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Non-archived clients whose `enrollment_date` lies within the
    /// range's calendar days, restricted to one counsellor's client base
    /// when the scope says so.
    async fn clients_enrolled_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<Client>>;
}

/// Read access to staged payments.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// All staged payments of the given clients, any date, ordered by
    /// `(client_id, created_at, id)` so the first observed row per client
    /// is deterministic.
    async fn payments_for_clients(&self, client_ids: &[String]) -> Result<Vec<StagedPayment>>;

    /// Payments whose effective instant (`payment_date`, falling back to
    /// `created_at` when absent) lies in range, joined through
    /// non-archived clients with the scope applied.
    async fn payments_effective_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<StagedPayment>>;
}

/// Read access to product sales, direct and entity-backed.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Self-contained sale rows: `amount` present and `payment_date`
    /// non-null and in range (no fallback to the creation timestamp),
    /// joined through non-archived clients.
    async fn direct_sales_between(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<ProductPayment>>;

    /// The polymorphic entity lookup: rows of the table selected by
    /// `kind`, filtered by that table's own date column and joined back
    /// through `ProductPayment.entity_type`. For the finance-approval
    /// kind the join requires the core product name; for every other
    /// kind it excludes it.
    async fn entity_sales_between(
        &self,
        kind: EntityKind,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<Vec<EntitySale>>;
}

/// Read access to the counsellor roster and monthly targets.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// The full counsellor roster.
    async fn counsellors(&self) -> Result<Vec<Counsellor>>;

    /// Counsellors reporting to one manager.
    async fn counsellors_for_manager(&self, manager_id: &str) -> Result<Vec<Counsellor>>;

    /// Look up a single counsellor.
    async fn counsellor(&self, id: &str) -> Result<Option<Counsellor>>;

    /// The target row for `(counsellor, month, year)`, if one exists.
    async fn target_for_month(
        &self,
        counsellor_id: &str,
        month: u32,
        year: i32,
    ) -> Result<Option<CounsellorTarget>>;
}
