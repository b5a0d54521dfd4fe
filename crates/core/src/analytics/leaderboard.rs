//! Leaderboard engine
//!
//! Composes counsellor-level enrollment and revenue aggregates into a
//! ranked, target-annotated table. Per-counsellor computations are
//! dispatched together; ranking is applied only after all results are
//! collected, so completion order never affects the output.

use std::sync::Arc;

use visapath_domain::{Counsellor, DateRange, LeaderboardRow, Result, Role, RoleScope};

use super::metrics::MetricEngine;
use super::ports::RosterStore;

/// Builds ranked leaderboards over the counsellor roster.
pub struct LeaderboardEngine {
    metrics: Arc<MetricEngine>,
    roster: Arc<dyn RosterStore>,
}

impl LeaderboardEngine {
    /// Create a leaderboard engine over the shared metric engine and the
    /// roster store.
    pub fn new(metrics: Arc<MetricEngine>, roster: Arc<dyn RosterStore>) -> Self {
        Self { metrics, roster }
    }

    /// Build the leaderboard for a range.
    ///
    /// A manager actor restricts the roster to their own counsellors;
    /// admin and counsellor actors see the full roster.
    pub async fn build(
        &self,
        range: &DateRange,
        actor: Option<(&str, Role)>,
    ) -> Result<Vec<LeaderboardRow>> {
        let roster = match actor {
            Some((manager_id, Role::Manager)) => {
                self.roster.counsellors_for_manager(manager_id).await?
            }
            _ => self.roster.counsellors().await?,
        };
        self.build_for(&roster, range).await
    }

    /// Build the leaderboard for an explicit roster (used by scoped
    /// reports).
    pub async fn build_for(
        &self,
        roster: &[Counsellor],
        range: &DateRange,
    ) -> Result<Vec<LeaderboardRow>> {
        let standings =
            roster.iter().map(|counsellor| self.standing_for(counsellor, range));
        let mut rows = futures::future::try_join_all(standings).await?;

        // Enrollments first, revenue breaks ties; the sort is stable, so
        // full ties keep input order and still receive distinct ranks.
        rows.sort_by(|a, b| {
            b.enrollments.cmp(&a.enrollments).then_with(|| b.revenue.cmp(&a.revenue))
        });
        for (index, row) in rows.iter_mut().enumerate() {
            row.rank = index as u32 + 1;
        }

        let (month, year) = range.month_year();
        let targets = rows.iter().map(|row| {
            self.roster.target_for_month(row.counsellor_id.as_str(), month, year)
        });
        let targets = futures::future::try_join_all(targets).await?;
        for (row, target) in rows.iter_mut().zip(targets) {
            if let Some(target) = target {
                row.target = target.target;
                row.target_id = Some(target.id);
            }
        }

        Ok(rows)
    }

    /// One counsellor's enrollments and revenue over the range, computed
    /// concurrently.
    async fn standing_for(
        &self,
        counsellor: &Counsellor,
        range: &DateRange,
    ) -> Result<LeaderboardRow> {
        let scope = RoleScope::counsellor(counsellor.id.clone());
        let (core_sale, core_product, other_product) = tokio::try_join!(
            self.metrics.core_sale_by_enrollment(range, &scope),
            self.metrics.core_product(range, &scope),
            self.metrics.other_product(range, &scope),
        )?;

        let enrollments = core_sale.count;
        let revenue = core_sale.amount + core_product.amount + other_product.amount;
        Ok(LeaderboardRow {
            rank: 0,
            counsellor_id: counsellor.id.clone(),
            counsellor_name: counsellor.name.clone(),
            enrollments,
            revenue,
            target: 0,
            target_id: None,
            achieved_target: enrollments,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use visapath_domain::PaymentStage;

    use super::*;
    use crate::analytics::memory::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(at(2026, 1, 1, 0), at(2026, 1, 31, 23))
    }

    fn dec(units: i64) -> Decimal {
        Decimal::from(units)
    }

    /// Seed `enrollments` clients for a counsellor, each with one initial
    /// payment of `amount_each`.
    fn seed_counsellor(
        store: &mut MemoryStore,
        counsellor_id: &str,
        name: &str,
        enrollments: usize,
        amount_each: Decimal,
    ) {
        store.add_counsellor(counsellor_id, name, None);
        for i in 0..enrollments {
            let client_id = format!("{counsellor_id}-client-{i}");
            let payment_id = format!("{counsellor_id}-payment-{i}");
            store.add_client(&client_id, counsellor_id, date(2026, 1, 5));
            store.add_payment(
                &payment_id,
                &client_id,
                PaymentStage::Initial,
                amount_each,
                amount_each,
                Some(at(2026, 1, 10, 9)),
                at(2026, 1, 10, 9),
            );
        }
    }

    fn engine_for(store: Arc<MemoryStore>) -> LeaderboardEngine {
        let metrics =
            Arc::new(MetricEngine::new(store.clone(), store.clone(), store.clone()));
        LeaderboardEngine::new(metrics, store)
    }

    #[tokio::test]
    async fn ranks_are_a_gapless_permutation() {
        let mut store = MemoryStore::default();
        seed_counsellor(&mut store, "csl-a", "Asha", 3, dec(100));
        seed_counsellor(&mut store, "csl-b", "Bela", 5, dec(50));
        seed_counsellor(&mut store, "csl-c", "Chand", 1, dec(900));
        let engine = engine_for(Arc::new(store));

        let rows = engine.build(&january(), None).await.unwrap();
        let ranks: Vec<u32> = rows.iter().map(|row| row.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert_eq!(rows[0].counsellor_id, "csl-b");
        assert_eq!(rows[2].counsellor_id, "csl-c");
    }

    #[tokio::test]
    async fn equal_enrollments_are_broken_by_revenue() {
        let mut store = MemoryStore::default();
        seed_counsellor(&mut store, "csl-a", "Asha", 5, dec(40)); // revenue 200
        seed_counsellor(&mut store, "csl-b", "Bela", 5, dec(60)); // revenue 300
        let engine = engine_for(Arc::new(store));

        let rows = engine.build(&january(), None).await.unwrap();
        assert_eq!(rows[0].counsellor_id, "csl-b");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].counsellor_id, "csl-a");
        assert_eq!(rows[1].rank, 2);
    }

    #[tokio::test]
    async fn full_ties_keep_stable_order_with_distinct_ranks() {
        let mut store = MemoryStore::default();
        seed_counsellor(&mut store, "csl-a", "Asha", 2, dec(10));
        seed_counsellor(&mut store, "csl-b", "Bela", 2, dec(10));
        let engine = engine_for(Arc::new(store));

        let rows = engine.build(&january(), None).await.unwrap();
        assert_eq!(rows[0].counsellor_id, "csl-a");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].counsellor_id, "csl-b");
        assert_eq!(rows[1].rank, 2);
    }

    #[tokio::test]
    async fn targets_join_with_defaults_when_absent() {
        let mut store = MemoryStore::default();
        seed_counsellor(&mut store, "csl-a", "Asha", 2, dec(10));
        seed_counsellor(&mut store, "csl-b", "Bela", 1, dec(10));
        store.add_target("tgt-1", "csl-a", 1, 2026, 8);
        let engine = engine_for(Arc::new(store));

        let rows = engine.build(&january(), None).await.unwrap();
        assert_eq!(rows[0].counsellor_id, "csl-a");
        assert_eq!(rows[0].target, 8);
        assert_eq!(rows[0].target_id.as_deref(), Some("tgt-1"));
        assert_eq!(rows[0].achieved_target, 2);

        assert_eq!(rows[1].target, 0);
        assert_eq!(rows[1].target_id, None);
    }

    #[tokio::test]
    async fn manager_actor_narrows_the_roster() {
        let mut store = MemoryStore::default();
        store.add_counsellor("csl-a", "Asha", Some("mgr-1"));
        store.add_counsellor("csl-b", "Bela", Some("mgr-2"));
        let engine = engine_for(Arc::new(store));

        let rows =
            engine.build(&january(), Some(("mgr-1", Role::Manager))).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].counsellor_id, "csl-a");

        let all = engine.build(&january(), Some(("admin-1", Role::Admin))).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
