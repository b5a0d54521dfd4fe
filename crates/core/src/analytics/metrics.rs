//! Metric aggregators
//!
//! A family of independent, stateless computations, each deriving one
//! named metric from the row store for a date range and role scope. All
//! sums are exact decimal arithmetic; rendering happens at the payload
//! boundary.
//!
//! The same metric often exists in two date semantics - by enrollment
//! date and by payment date. Those are separate named methods rather than
//! a flag, because the predicates differ in more than the date column
//! (the payment-date variant also falls back to the creation timestamp).

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use visapath_domain::constants::{CORE_PRODUCT, COUNT_ONLY_PRODUCTS};
use visapath_domain::{
    Client, DateRange, EntityKind, MetricBlock, PaymentStage, PendingBreakdown, Result, RoleScope,
    StagedPayment,
};

use super::ports::{ClientStore, PaymentStore, ProductStore};

/// The aggregator family. Stateless; every method is a pure function of
/// its inputs and the current store snapshot.
pub struct MetricEngine {
    clients: Arc<dyn ClientStore>,
    payments: Arc<dyn PaymentStore>,
    products: Arc<dyn ProductStore>,
}

impl MetricEngine {
    /// Create a new metric engine over the row-store ports.
    pub fn new(
        clients: Arc<dyn ClientStore>,
        payments: Arc<dyn PaymentStore>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        Self { clients, payments, products }
    }

    /// Core-sale metric keyed by enrollment date.
    ///
    /// Count: distinct non-archived clients enrolled in range holding at
    /// least one paying-stage payment of any date - a client with all
    /// three stages still counts once. Amount: paying-stage payments of
    /// those clients whose `payment_date` is present and in range.
    pub async fn core_sale_by_enrollment(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<MetricBlock> {
        let (_, payments) = self.enrolled_with_payments(range, scope).await?;

        let mut qualifying: HashSet<&str> = HashSet::new();
        let mut amount = Decimal::ZERO;
        for payment in &payments {
            if !payment.stage.is_paying() {
                continue;
            }
            qualifying.insert(payment.client_id.as_str());
            if let Some(paid_on) = payment.payment_date {
                if range.contains(paid_on) {
                    amount += payment.amount;
                }
            }
        }

        Ok(MetricBlock { count: qualifying.len() as u64, amount })
    }

    /// Core-sale metric keyed by payment date, for charts: reflects when
    /// money moved, not when clients enrolled. The effective instant
    /// falls back to the creation timestamp when `payment_date` is null.
    pub async fn core_sale_by_payment(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<MetricBlock> {
        let rows = self.payments.payments_effective_between(range, scope).await?;

        let mut clients: HashSet<&str> = HashSet::new();
        let mut amount = Decimal::ZERO;
        for payment in rows.iter().filter(|p| p.stage.is_paying()) {
            clients.insert(payment.client_id.as_str());
            amount += payment.amount;
        }

        Ok(MetricBlock { count: clients.len() as u64, amount })
    }

    /// Core-product metric: the finance-approval entity lookup, filtered
    /// by that table's own date column. Count and amount come from the
    /// same row set, so they can never disagree.
    pub async fn core_product(&self, range: &DateRange, scope: &RoleScope) -> Result<MetricBlock> {
        let rows =
            self.products.entity_sales_between(EntityKind::FinanceApproval, range, scope).await?;
        let amount = rows.iter().filter_map(|sale| sale.amount).sum();
        Ok(MetricBlock { count: rows.len() as u64, amount })
    }

    /// Other-product metric: direct rows (strict payment-date filter)
    /// plus one entity lookup per registered kind. Count-only kinds
    /// contribute rows but a zero amount.
    pub async fn other_product(&self, range: &DateRange, scope: &RoleScope) -> Result<MetricBlock> {
        let direct = self.products.direct_sales_between(range, scope).await?;

        let mut count = 0u64;
        let mut amount = Decimal::ZERO;
        for sale in &direct {
            if sale.product_name == CORE_PRODUCT
                || COUNT_ONLY_PRODUCTS.contains(&sale.product_name.as_str())
            {
                continue;
            }
            count += 1;
            amount += sale.amount.unwrap_or(Decimal::ZERO);
        }

        let kinds: Vec<EntityKind> = EntityKind::others().collect();
        let lookups =
            kinds.iter().map(|kind| self.products.entity_sales_between(*kind, range, scope));
        let per_kind = futures::future::try_join_all(lookups).await?;

        for (kind, rows) in kinds.iter().zip(per_kind) {
            count += rows.len() as u64;
            if !kind.count_only() {
                amount += rows.iter().filter_map(|sale| sale.amount).sum::<Decimal>();
            }
        }

        Ok(MetricBlock { count, amount })
    }

    /// Outstanding balance over the reference range (all-time in
    /// practice): expected totals minus paid totals, clamped at zero,
    /// with a per-stage breakdown. `submitted_visa` is reported but
    /// excluded from the paid arithmetic.
    pub async fn pending_amount(
        &self,
        reference: &DateRange,
        scope: &RoleScope,
    ) -> Result<PendingBreakdown> {
        let (_, payments) = self.enrolled_with_payments(reference, scope).await?;

        let mut expected = Decimal::ZERO;
        let mut initial = Decimal::ZERO;
        let mut before_visa = Decimal::ZERO;
        let mut after_visa = Decimal::ZERO;
        let mut submitted_visa = Decimal::ZERO;

        // Rows arrive ordered by (client_id, created_at, id); the first
        // row seen per client carries the expected total.
        let mut seen: HashSet<&str> = HashSet::new();
        for payment in &payments {
            if seen.insert(payment.client_id.as_str()) {
                expected += payment.total_payment;
            }
            match payment.stage {
                PaymentStage::Initial => initial += payment.amount,
                PaymentStage::BeforeVisa => before_visa += payment.amount,
                PaymentStage::AfterVisa => after_visa += payment.amount,
                PaymentStage::SubmittedVisa => submitted_visa += payment.amount,
            }
        }

        let paid = initial + before_visa + after_visa;
        let pending = (expected - paid).max(Decimal::ZERO);

        Ok(PendingBreakdown {
            expected,
            paid,
            pending,
            initial,
            before_visa,
            after_visa,
            submitted_visa,
        })
    }

    /// Count of non-archived clients enrolled in range with at least one
    /// qualifying staged payment - the same qualifying condition as the
    /// core-sale count.
    pub async fn total_clients(&self, range: &DateRange, scope: &RoleScope) -> Result<u64> {
        Ok(self.core_sale_by_enrollment(range, scope).await?.count)
    }

    /// Clients enrolled in the range plus all their staged payments.
    async fn enrolled_with_payments(
        &self,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<(Vec<Client>, Vec<StagedPayment>)> {
        let clients = self.clients.clients_enrolled_between(range, scope).await?;
        let ids: Vec<String> = clients.iter().map(|client| client.id.clone()).collect();
        let payments = if ids.is_empty() {
            Vec::new()
        } else {
            self.payments.payments_for_clients(&ids).await?
        };
        Ok((clients, payments))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use visapath_domain::money;

    use super::*;
    use crate::analytics::memory::{EntityRecord, MemoryStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(at(2026, 1, 1, 0), at(2026, 1, 31, 23))
    }

    fn engine(store: Arc<MemoryStore>) -> MetricEngine {
        MetricEngine::new(store.clone(), store.clone(), store)
    }

    fn dec(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    /// One client enrolled 2026-01-05, one initial payment of 500.00 on
    /// 2026-01-10, expected total 1500.00.
    fn january_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.add_counsellor("csl-1", "Asha", None);
        store.add_client("cl-1", "csl-1", date(2026, 1, 5));
        store.add_payment(
            "pay-1",
            "cl-1",
            PaymentStage::Initial,
            dec(50_000, 2),
            dec(150_000, 2),
            Some(at(2026, 1, 10, 11)),
            at(2026, 1, 10, 11),
        );
        store
    }

    #[tokio::test]
    async fn core_sale_by_enrollment_matches_the_january_scenario() {
        let engine = engine(Arc::new(january_store()));
        let block =
            engine.core_sale_by_enrollment(&january(), &RoleScope::admin()).await.unwrap();

        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "500.00");
    }

    #[tokio::test]
    async fn pending_amount_matches_the_january_scenario() {
        let engine = engine(Arc::new(january_store()));
        let pending = engine.pending_amount(&january(), &RoleScope::admin()).await.unwrap();

        assert_eq!(money(pending.expected), "1500.00");
        assert_eq!(money(pending.paid), "500.00");
        assert_eq!(money(pending.pending), "1000.00");
    }

    #[tokio::test]
    async fn a_client_with_all_three_stages_counts_once() {
        let mut store = january_store();
        for (id, stage) in
            [("pay-2", PaymentStage::BeforeVisa), ("pay-3", PaymentStage::AfterVisa)]
        {
            store.add_payment(
                id,
                "cl-1",
                stage,
                dec(10_000, 2),
                dec(150_000, 2),
                Some(at(2026, 1, 20, 9)),
                at(2026, 1, 20, 9),
            );
        }
        let engine = engine(Arc::new(store));

        let block =
            engine.core_sale_by_enrollment(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "700.00");
    }

    #[tokio::test]
    async fn submitted_visa_is_reported_but_never_paid() {
        let mut store = january_store();
        store.add_payment(
            "pay-4",
            "cl-1",
            PaymentStage::SubmittedVisa,
            dec(20_000, 2),
            dec(150_000, 2),
            Some(at(2026, 1, 25, 9)),
            at(2026, 1, 25, 9),
        );
        let engine = engine(Arc::new(store));

        let pending = engine.pending_amount(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(money(pending.submitted_visa), "200.00");
        assert_eq!(money(pending.paid), "500.00");
        assert_eq!(money(pending.pending), "1000.00");
    }

    #[tokio::test]
    async fn pending_is_clamped_at_zero() {
        let mut store = january_store();
        // Overpaid client: paid 2000 against an expected 1500.
        store.add_payment(
            "pay-5",
            "cl-1",
            PaymentStage::AfterVisa,
            dec(150_000, 2),
            dec(150_000, 2),
            Some(at(2026, 1, 28, 9)),
            at(2026, 1, 28, 9),
        );
        // A client with no payments at all contributes zero expected.
        store.add_client("cl-2", "csl-1", date(2026, 1, 7));
        let engine = engine(Arc::new(store));

        let pending = engine.pending_amount(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(money(pending.expected), "1500.00");
        assert_eq!(money(pending.paid), "2000.00");
        assert_eq!(money(pending.pending), "0.00");
    }

    #[tokio::test]
    async fn archived_clients_are_excluded_everywhere() {
        let mut store = january_store();
        store.add_archived_client("cl-9", "csl-1", date(2026, 1, 6));
        store.add_payment(
            "pay-9",
            "cl-9",
            PaymentStage::Initial,
            dec(90_000, 2),
            dec(90_000, 2),
            Some(at(2026, 1, 12, 9)),
            at(2026, 1, 12, 9),
        );
        let engine = engine(Arc::new(store));

        let block =
            engine.core_sale_by_enrollment(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "500.00");
    }

    #[tokio::test]
    async fn counsellor_scope_restricts_rows() {
        let mut store = january_store();
        store.add_counsellor("csl-2", "Bela", None);
        store.add_client("cl-3", "csl-2", date(2026, 1, 8));
        store.add_payment(
            "pay-6",
            "cl-3",
            PaymentStage::Initial,
            dec(30_000, 2),
            dec(30_000, 2),
            Some(at(2026, 1, 9, 9)),
            at(2026, 1, 9, 9),
        );
        let engine = engine(Arc::new(store));

        let all = engine.core_sale_by_enrollment(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(all.count, 2);

        let scoped = engine
            .core_sale_by_enrollment(&january(), &RoleScope::counsellor("csl-2"))
            .await
            .unwrap();
        assert_eq!(scoped.count, 1);
        assert_eq!(money(scoped.amount), "300.00");
    }

    #[tokio::test]
    async fn payment_date_variant_falls_back_to_created_at() {
        let mut store = january_store();
        // No payment_date; created inside the range.
        store.add_payment(
            "pay-7",
            "cl-1",
            PaymentStage::BeforeVisa,
            dec(25_000, 2),
            dec(150_000, 2),
            None,
            at(2026, 1, 18, 14),
        );
        let engine = engine(Arc::new(store));

        let block = engine.core_sale_by_payment(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "750.00");

        // The enrollment-date variant never applies the fallback.
        let strict =
            engine.core_sale_by_enrollment(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(money(strict.amount), "500.00");
    }

    #[tokio::test]
    async fn core_product_counts_and_amounts_share_one_predicate() {
        let mut store = january_store();
        store.add_product_entity(
            "prod-1",
            "cl-1",
            CORE_PRODUCT,
            EntityKind::FinanceApproval.tag(),
            "fa-1",
            EntityRecord { occurred_on: date(2026, 1, 15), amount: Some(dec(120_000, 2)) },
            at(2026, 1, 15, 9),
        );
        // Dated outside the range: invisible to both count and amount.
        store.add_product_entity(
            "prod-2",
            "cl-1",
            CORE_PRODUCT,
            EntityKind::FinanceApproval.tag(),
            "fa-2",
            EntityRecord { occurred_on: date(2026, 2, 2), amount: Some(dec(80_000, 2)) },
            at(2026, 1, 20, 9),
        );
        let engine = engine(Arc::new(store));

        let block = engine.core_product(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "1200.00");
    }

    #[tokio::test]
    async fn entity_rows_follow_their_own_date_column() {
        let mut store = january_store();
        // The product payment row was created inside January, but the
        // insurance record it points to is dated in February.
        store.add_product_entity(
            "prod-3",
            "cl-1",
            "INSURANCE",
            EntityKind::Insurance.tag(),
            "ins-1",
            EntityRecord { occurred_on: date(2026, 2, 3), amount: None },
            at(2026, 1, 22, 9),
        );
        let engine = engine(Arc::new(store));

        let block = engine.other_product(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 0);
        assert_eq!(money(block.amount), "0.00");
    }

    #[tokio::test]
    async fn count_only_kinds_contribute_rows_but_no_amount() {
        let mut store = january_store();
        store.add_product_entity(
            "prod-4",
            "cl-1",
            "LOAN",
            EntityKind::Loan.tag(),
            "loan-1",
            EntityRecord { occurred_on: date(2026, 1, 16), amount: Some(dec(500_000, 2)) },
            at(2026, 1, 16, 9),
        );
        store.add_product_entity(
            "prod-5",
            "cl-1",
            "IELTS",
            EntityKind::Ielts.tag(),
            "ielts-1",
            EntityRecord { occurred_on: date(2026, 1, 17), amount: Some(dec(45_000, 2)) },
            at(2026, 1, 17, 9),
        );
        let engine = engine(Arc::new(store));

        let block = engine.other_product(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 2);
        assert_eq!(money(block.amount), "450.00");
    }

    #[tokio::test]
    async fn direct_sales_need_an_explicit_payment_date() {
        let mut store = january_store();
        store.add_direct_product(
            "prod-6",
            "cl-1",
            "NOTARY",
            dec(15_000, 2),
            Some(at(2026, 1, 19, 9)),
            at(2026, 1, 19, 9),
        );
        // No payment date: excluded outright, no created-at fallback.
        store.add_direct_product(
            "prod-7",
            "cl-1",
            "NOTARY",
            dec(99_000, 2),
            None,
            at(2026, 1, 19, 10),
        );
        let engine = engine(Arc::new(store));

        let block = engine.other_product(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 1);
        assert_eq!(money(block.amount), "150.00");
    }

    #[tokio::test]
    async fn unknown_entity_tags_contribute_zero() {
        let mut store = january_store();
        store.add_product_entity(
            "prod-8",
            "cl-1",
            "MYSTERY",
            "mystery_id",
            "m-1",
            EntityRecord { occurred_on: date(2026, 1, 15), amount: Some(dec(77_700, 2)) },
            at(2026, 1, 15, 9),
        );
        let engine = engine(Arc::new(store));

        let block = engine.other_product(&january(), &RoleScope::admin()).await.unwrap();
        assert_eq!(block.count, 0);
        assert_eq!(money(block.amount), "0.00");
    }
}
