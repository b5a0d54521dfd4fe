//! Dashboard orchestrator - the engine's public entry points
//!
//! Resolves the request's date windows once, fans out to the aggregators,
//! leaderboard, and chart builder concurrently, and assembles one of the
//! two role-dependent payload shapes. Validation happens before any query
//! is issued; a failure in any branch of a fan-out fails the whole
//! request, so a partial dashboard is never returned as success.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;
use visapath_domain::{
    money, Counsellor, CounsellorDashboard, DashboardStats, DateRange, EnrollmentGoal,
    LeaderboardSummary, LeaderboardView, MetricBlock, Report, ReportScope, Result, Role,
    RoleScope, TeamDashboard, VisaPathError,
};

use super::chart::ChartBuilder;
use super::date_range::{all_time, month_range, resolve, DateFilter, ResolvedRange};
use super::leaderboard::LeaderboardEngine;
use super::metrics::MetricEngine;
use super::performance::{delta_counts, previous_range};
use super::ports::{ClientStore, PaymentStore, ProductStore, RosterStore};

/// The top-level analytics service.
pub struct DashboardService {
    metrics: Arc<MetricEngine>,
    leaderboard: LeaderboardEngine,
    charts: ChartBuilder,
    roster: Arc<dyn RosterStore>,
}

impl DashboardService {
    /// Assemble the service from the four row-store ports.
    pub fn new(
        clients: Arc<dyn ClientStore>,
        payments: Arc<dyn PaymentStore>,
        products: Arc<dyn ProductStore>,
        roster: Arc<dyn RosterStore>,
    ) -> Self {
        let metrics = Arc::new(MetricEngine::new(clients, payments, products));
        Self {
            leaderboard: LeaderboardEngine::new(Arc::clone(&metrics), Arc::clone(&roster)),
            charts: ChartBuilder::new(Arc::clone(&metrics)),
            metrics,
            roster,
        }
    }

    /// `GetDashboardStats`: the admin/manager or counsellor dashboard,
    /// depending on the actor's role.
    pub async fn dashboard_stats(
        &self,
        filter: &str,
        after: Option<&str>,
        before: Option<&str>,
        actor_id: &str,
        role: Role,
    ) -> Result<DashboardStats> {
        let now = Local::now().naive_local();
        self.dashboard_stats_at(filter, after, before, actor_id, role, now).await
    }

    /// [`Self::dashboard_stats`] with an explicit clock, for tests.
    #[allow(clippy::too_many_arguments)]
    pub async fn dashboard_stats_at(
        &self,
        filter: &str,
        after: Option<&str>,
        before: Option<&str>,
        actor_id: &str,
        role: Role,
        now: NaiveDateTime,
    ) -> Result<DashboardStats> {
        let filter: DateFilter = filter.parse()?;
        let resolved = resolve(filter, after, before, now)?;
        debug!(%filter, role = role.as_str(), "resolved dashboard windows");

        match role {
            Role::Admin | Role::Manager => Ok(DashboardStats::Team(
                self.team_dashboard(&resolved, actor_id, role, now).await?,
            )),
            Role::Counsellor => Ok(DashboardStats::Counsellor(
                self.counsellor_dashboard(&resolved, actor_id, now).await?,
            )),
        }
    }

    /// `GetLeaderboard`: the ranked table plus totals for one calendar
    /// month.
    pub async fn leaderboard(&self, month: u32, year: i32) -> Result<LeaderboardView> {
        validate_month(month)?;
        let range = month_range(year, month)?;
        let rows = self.leaderboard.build(&range, None).await?;

        let total_enrollments = rows.iter().map(|row| row.enrollments).sum();
        let total_revenue: Decimal = rows.iter().map(|row| row.revenue).sum();
        Ok(LeaderboardView {
            rows,
            summary: LeaderboardSummary { total_enrollments, total_revenue: money(total_revenue) },
        })
    }

    /// `GetLeaderboardEnrollmentGoal`: one counsellor's target and
    /// achieved enrollments for a month.
    pub async fn enrollment_goal(
        &self,
        counsellor_id: &str,
        month: u32,
        year: i32,
    ) -> Result<EnrollmentGoal> {
        validate_month(month)?;
        let counsellor = self
            .roster
            .counsellor(counsellor_id)
            .await?
            .ok_or_else(|| VisaPathError::NotFound(format!("counsellor {counsellor_id}")))?;

        let range = month_range(year, month)?;
        let scope = RoleScope::counsellor(counsellor.id.clone());
        let achieved = self.metrics.total_clients(&range, &scope).await?;
        let target = self
            .roster
            .target_for_month(counsellor_id, month, year)
            .await?
            .map_or(0, |target| target.target);

        Ok(EnrollmentGoal { counsellor_id: counsellor.id, month, year, target, achieved })
    }

    /// `GetReport`: an access-scoped aggregate over one counsellor, one
    /// manager's team, or the whole roster.
    pub async fn report(
        &self,
        actor_id: &str,
        role: Role,
        range: &DateRange,
        scope: &ReportScope,
    ) -> Result<Report> {
        let now = Local::now().naive_local();
        self.report_at(actor_id, role, range, scope, now).await
    }

    /// [`Self::report`] with an explicit clock, for tests.
    pub async fn report_at(
        &self,
        actor_id: &str,
        role: Role,
        range: &DateRange,
        scope: &ReportScope,
        now: NaiveDateTime,
    ) -> Result<Report> {
        let (roster, description) = self.report_roster(actor_id, role, scope).await?;
        debug!(scope = %description, counsellors = roster.len(), "building report");
        let reference = all_time(now);

        let lookups =
            roster.iter().map(|counsellor| self.report_blocks(counsellor, range, &reference));
        let blocks = futures::future::try_join_all(lookups).await?;

        let mut core_sale = MetricBlock::ZERO;
        let mut core_product = MetricBlock::ZERO;
        let mut other_product = MetricBlock::ZERO;
        let mut pending = Decimal::ZERO;
        for (sale, product, other, outstanding) in blocks {
            core_sale.count += sale.count;
            core_sale.amount += sale.amount;
            core_product.count += product.count;
            core_product.amount += product.amount;
            other_product.count += other.count;
            other_product.amount += other.amount;
            pending += outstanding;
        }

        let leaderboard = self.leaderboard.build_for(&roster, range).await?;
        Ok(Report {
            scope: description,
            total_clients: core_sale.count,
            core_sale: core_sale.to_view(),
            core_product: core_product.to_view(),
            other_product: other_product.to_view(),
            total_pending_amount: money(pending),
            leaderboard,
        })
    }

    async fn team_dashboard(
        &self,
        resolved: &ResolvedRange,
        actor_id: &str,
        role: Role,
        now: NaiveDateTime,
    ) -> Result<TeamDashboard> {
        let scope = RoleScope { role, counsellor_id: None };
        let reference = all_time(now);

        let (core_sale, core_product, other_product, pending, total_clients, leaderboard, chart) =
            tokio::try_join!(
                self.metrics.core_sale_by_enrollment(&resolved.summary, &scope),
                self.metrics.core_product(&resolved.summary, &scope),
                self.metrics.other_product(&resolved.summary, &scope),
                self.metrics.pending_amount(&reference, &scope),
                self.metrics.total_clients(&resolved.summary, &scope),
                self.leaderboard.build(&resolved.range, Some((actor_id, role))),
                self.charts.team_series(resolved.filter, &resolved.range, &scope),
            )?;

        let revenue = core_sale.amount + core_product.amount + other_product.amount;
        Ok(TeamDashboard {
            core_sale: core_sale.to_view(),
            core_product: core_product.to_view(),
            other_product: other_product.to_view(),
            total_pending_amount: money(pending.pending),
            total_clients,
            revenue: money(revenue),
            leaderboard,
            chart: chart.to_view(),
        })
    }

    async fn counsellor_dashboard(
        &self,
        resolved: &ResolvedRange,
        actor_id: &str,
        now: NaiveDateTime,
    ) -> Result<CounsellorDashboard> {
        let scope = RoleScope::counsellor(actor_id);
        let reference = all_time(now);
        let prior = previous_range(resolved.filter, &resolved.summary)?;

        let (core_sale, core_product, other_product, pending, total_clients, previous, chart) =
            tokio::try_join!(
                self.metrics.core_sale_by_enrollment(&resolved.summary, &scope),
                self.metrics.core_product(&resolved.summary, &scope),
                self.metrics.other_product(&resolved.summary, &scope),
                self.metrics.pending_amount(&reference, &scope),
                self.metrics.total_clients(&resolved.summary, &scope),
                self.metrics.total_clients(&prior, &scope),
                self.charts.counsellor_series(resolved.filter, &resolved.range, &scope),
            )?;

        Ok(CounsellorDashboard {
            core_sale_count: core_sale.count,
            core_product_count: core_product.count,
            other_product_count: other_product.count,
            total_pending_amount: money(pending.pending),
            total_clients,
            individual_performance: delta_counts(previous, total_clients),
            chart,
        })
    }

    /// Resolve which counsellors a report may cover, enforcing the role
    /// rules before anything else runs.
    async fn report_roster(
        &self,
        actor_id: &str,
        role: Role,
        scope: &ReportScope,
    ) -> Result<(Vec<Counsellor>, String)> {
        match role {
            Role::Counsellor => {
                if scope.manager_id.is_some() {
                    return Err(VisaPathError::UnauthorizedScope(
                        "counsellors cannot request manager reports".to_string(),
                    ));
                }
                if let Some(requested) = scope.counsellor_id.as_deref() {
                    if requested != actor_id {
                        return Err(VisaPathError::UnauthorizedScope(
                            "counsellors may only request their own report".to_string(),
                        ));
                    }
                }
                let own = self.lookup_counsellor(actor_id).await?;
                Ok((vec![own], format!("counsellor:{actor_id}")))
            }
            Role::Manager => {
                if let Some(requested) = scope.manager_id.as_deref() {
                    if requested != actor_id {
                        return Err(VisaPathError::UnauthorizedScope(
                            "managers may only request their own team".to_string(),
                        ));
                    }
                }
                if let Some(counsellor_id) = scope.counsellor_id.as_deref() {
                    let counsellor = self.lookup_counsellor(counsellor_id).await?;
                    if counsellor.manager_id.as_deref() != Some(actor_id) {
                        return Err(VisaPathError::UnauthorizedScope(format!(
                            "counsellor {counsellor_id} is not on this manager's team"
                        )));
                    }
                    Ok((vec![counsellor], format!("counsellor:{counsellor_id}")))
                } else {
                    let team = self.roster.counsellors_for_manager(actor_id).await?;
                    Ok((team, format!("manager:{actor_id}")))
                }
            }
            Role::Admin => {
                if let Some(counsellor_id) = scope.counsellor_id.as_deref() {
                    let counsellor = self.lookup_counsellor(counsellor_id).await?;
                    Ok((vec![counsellor], format!("counsellor:{counsellor_id}")))
                } else if let Some(manager_id) = scope.manager_id.as_deref() {
                    let team = self.roster.counsellors_for_manager(manager_id).await?;
                    Ok((team, format!("manager:{manager_id}")))
                } else {
                    Ok((self.roster.counsellors().await?, "global".to_string()))
                }
            }
        }
    }

    async fn lookup_counsellor(&self, id: &str) -> Result<Counsellor> {
        self.roster
            .counsellor(id)
            .await?
            .ok_or_else(|| VisaPathError::NotFound(format!("counsellor {id}")))
    }

    /// One counsellor's report contribution: sale/product blocks plus
    /// their outstanding balance, computed concurrently.
    async fn report_blocks(
        &self,
        counsellor: &Counsellor,
        range: &DateRange,
        reference: &DateRange,
    ) -> Result<(MetricBlock, MetricBlock, MetricBlock, Decimal)> {
        let scope = RoleScope::counsellor(counsellor.id.clone());
        let (core_sale, core_product, other_product, pending) = tokio::try_join!(
            self.metrics.core_sale_by_enrollment(range, &scope),
            self.metrics.core_product(range, &scope),
            self.metrics.other_product(range, &scope),
            self.metrics.pending_amount(reference, &scope),
        )?;
        Ok((core_sale, core_product, other_product, pending.pending))
    }
}

fn validate_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(VisaPathError::InvalidRange(format!("month {month} is out of range")))
    }
}
