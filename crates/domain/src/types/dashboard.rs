//! Dashboard, leaderboard, and report view types
//!
//! Aggregators work in exact [`Decimal`] arithmetic; the `*View` types are
//! the output boundary where amounts become fixed-point strings with two
//! fraction digits (see [`money`]).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Render an exact amount as a fixed-point string with two fraction
/// digits, e.g. `"1234.50"`. Midpoints round away from zero.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/* -------------------------------------------------------------------------- */
/* Aggregate Building Blocks */
/* -------------------------------------------------------------------------- */

/// One metric's exact aggregate: a distinct count and a decimal sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBlock {
    pub count: u64,
    pub amount: Decimal,
}

impl MetricBlock {
    pub const ZERO: Self = Self { count: 0, amount: Decimal::ZERO };

    /// Rendered form for payload assembly.
    pub fn to_view(self) -> MetricView {
        MetricView { number: self.count, amount: money(self.amount) }
    }
}

/// Rendered metric: count plus a two-fraction-digit amount string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricView {
    pub number: u64,
    pub amount: String,
}

/// Outstanding-balance breakdown.
///
/// `paid` covers the three paying stages only; `submitted_visa` is
/// reported for display but excluded from the arithmetic. `pending` is
/// clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBreakdown {
    pub expected: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub initial: Decimal,
    pub before_visa: Decimal,
    pub after_visa: Decimal,
    pub submitted_visa: Decimal,
}

/* -------------------------------------------------------------------------- */
/* Performance Delta */
/* -------------------------------------------------------------------------- */

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    Increase,
    Decrease,
    NoChange,
}

/// Percent change against the prior period. `change` is always a
/// non-negative magnitude; `change_type` carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDelta {
    pub change: Decimal,
    pub change_type: ChangeType,
}

/* -------------------------------------------------------------------------- */
/* Leaderboard */
/* -------------------------------------------------------------------------- */

/// One ranked leaderboard entry.
///
/// `achieved_target` aliases `enrollments`; `target`/`target_id` come from
/// the counsellor's current-month target row, defaulting to `0`/`None`
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub counsellor_id: String,
    pub counsellor_name: String,
    pub enrollments: u64,
    pub revenue: Decimal,
    pub target: i64,
    pub target_id: Option<String>,
    pub achieved_target: u64,
}

/// Totals across the leaderboard rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSummary {
    pub total_enrollments: u64,
    pub total_revenue: String,
}

/// The standalone leaderboard view (`GetLeaderboard`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub rows: Vec<LeaderboardRow>,
    pub summary: LeaderboardSummary,
}

/// One counsellor's enrollment goal for a month
/// (`GetLeaderboardEnrollmentGoal`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentGoal {
    pub counsellor_id: String,
    pub month: u32,
    pub year: i32,
    pub target: i64,
    pub achieved: u64,
}

/* -------------------------------------------------------------------------- */
/* Chart Series */
/* -------------------------------------------------------------------------- */

/// One admin/manager chart bucket: payment-date aggregates plus their
/// combined revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChartPoint {
    pub label: String,
    pub core_sale: MetricView,
    pub core_product: MetricView,
    pub other_product: MetricView,
    pub revenue: String,
}

/// Admin/manager chart series; `summary` is the exact sum of the bucket
/// revenues, never an independent recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChartSeries {
    pub data: Vec<TeamChartPoint>,
    pub summary: String,
}

/// One counsellor chart bucket: enrollment volume only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounsellorChartPoint {
    pub label: String,
    pub client_count: u64,
}

/// Counsellor chart series; `summary` is the exact sum of the bucket
/// counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounsellorChartSeries {
    pub data: Vec<CounsellorChartPoint>,
    pub summary: u64,
}

/* -------------------------------------------------------------------------- */
/* Dashboard Payloads */
/* -------------------------------------------------------------------------- */

/// The admin/manager dashboard shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDashboard {
    pub core_sale: MetricView,
    pub core_product: MetricView,
    pub other_product: MetricView,
    pub total_pending_amount: String,
    pub total_clients: u64,
    pub revenue: String,
    pub leaderboard: Vec<LeaderboardRow>,
    pub chart: TeamChartSeries,
}

/// The counsellor dashboard shape: volumes, no dollar figures beyond the
/// pending balance, plus the individual performance delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounsellorDashboard {
    pub core_sale_count: u64,
    pub core_product_count: u64,
    pub other_product_count: u64,
    pub total_pending_amount: String,
    pub total_clients: u64,
    pub individual_performance: PerformanceDelta,
    pub chart: CounsellorChartSeries,
}

/// `GetDashboardStats` result: one of two role-dependent shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardStats {
    Team(TeamDashboard),
    Counsellor(CounsellorDashboard),
}

/* -------------------------------------------------------------------------- */
/* Reports */
/* -------------------------------------------------------------------------- */

/// Optional narrowing of a report to one manager's team or one
/// counsellor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScope {
    pub manager_id: Option<String>,
    pub counsellor_id: Option<String>,
}

/// Access-scoped report payload (`GetReport`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub scope: String,
    pub core_sale: MetricView,
    pub core_product: MetricView,
    pub other_product: MetricView,
    pub total_pending_amount: String,
    pub total_clients: u64,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_two_fraction_digits() {
        assert_eq!(money(Decimal::ZERO), "0.00");
        assert_eq!(money(Decimal::new(50_000, 2)), "500.00");
        assert_eq!(money(Decimal::new(12_345, 1)), "1234.50");
        assert_eq!(money(Decimal::new(9_995, 3)), "10.00");
    }

    #[test]
    fn metric_block_view_renders_amount() {
        let block = MetricBlock { count: 3, amount: Decimal::new(75_050, 2) };
        let view = block.to_view();
        assert_eq!(view.number, 3);
        assert_eq!(view.amount, "750.50");
    }

    #[test]
    fn change_type_serializes_kebab_case() {
        let json = serde_json::to_string(&ChangeType::NoChange).unwrap();
        assert_eq!(json, "\"no-change\"");
    }

    #[test]
    fn dashboard_stats_tags_the_view() {
        let stats = DashboardStats::Counsellor(CounsellorDashboard {
            core_sale_count: 1,
            core_product_count: 0,
            other_product_count: 2,
            total_pending_amount: "0.00".to_string(),
            total_clients: 1,
            individual_performance: PerformanceDelta {
                change: Decimal::ZERO,
                change_type: ChangeType::NoChange,
            },
            chart: CounsellorChartSeries { data: vec![], summary: 0 },
        });

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"view\":\"counsellor\""));
    }
}
