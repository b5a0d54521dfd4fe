//! Chart bucketization
//!
//! Partitions a resolved range into labelled sub-periods and recomputes
//! the relevant aggregators independently per bucket - no incremental
//! reuse, no shared accumulator. Buckets are computed concurrently and
//! merged back by index, so completion order never shows in the series.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use visapath_domain::{
    money, CounsellorChartPoint, CounsellorChartSeries, DateRange, MetricBlock, Result, RoleScope,
    TeamChartPoint, TeamChartSeries,
};

use super::date_range::{end_of_day, last_day_of_month, start_of_day, DateFilter};
use super::metrics::MetricEngine;

/// One chart sub-period with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBucket {
    pub label: String,
    pub range: DateRange,
}

/// Partition a range into the filter's bucket sequence.
///
/// Daily buckets for `today`/`weekly`/`monthly`/`custom`, calendar-month
/// buckets for `yearly`. The final bucket is clamped to the overall
/// range's end rather than the literal end of its period.
pub fn buckets(filter: DateFilter, range: &DateRange) -> Vec<ChartBucket> {
    match filter {
        DateFilter::Today | DateFilter::Weekly | DateFilter::Monthly | DateFilter::Custom => {
            daily_buckets(filter, range)
        }
        DateFilter::Yearly => monthly_buckets(range),
    }
}

fn daily_buckets(filter: DateFilter, range: &DateRange) -> Vec<ChartBucket> {
    let mut out = Vec::new();
    let mut day = range.start.date();
    let last = range.end.date();
    while day <= last {
        let start = range.start.max(start_of_day(day));
        let end = range.end.min(end_of_day(day));
        out.push(ChartBucket { label: day_label(filter, day), range: DateRange::new(start, end) });
        day += Duration::days(1);
    }
    out
}

fn monthly_buckets(range: &DateRange) -> Vec<ChartBucket> {
    let mut out = Vec::new();
    let (mut year, mut month) = (range.start.year(), range.start.month());
    let (end_year, end_month) = (range.end.year(), range.end.month());
    while (year, month) <= (end_year, end_month) {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else { break };
        let Some(last) = last_day_of_month(year, month) else { break };
        let start = range.start.max(start_of_day(first));
        let end = range.end.min(end_of_day(last));
        out.push(ChartBucket {
            label: first.format("%b").to_string(),
            range: DateRange::new(start, end),
        });
        (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    }
    out
}

fn day_label(filter: DateFilter, day: NaiveDate) -> String {
    match filter {
        // The month filter spans ~30 points; day-of-month is enough.
        DateFilter::Monthly => day.day().to_string(),
        // Custom ranges may span months, so the label carries the month.
        DateFilter::Custom => format!("{} {} {}", day.format("%a"), day.day(), day.format("%b")),
        _ => format!("{} {}", day.format("%a"), day.day()),
    }
}

/* -------------------------------------------------------------------------- */
/* Series */
/* -------------------------------------------------------------------------- */

/// One admin/manager bucket in exact arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSeriesPoint {
    pub label: String,
    pub core_sale: MetricBlock,
    pub core_product: MetricBlock,
    pub other_product: MetricBlock,
    pub revenue: Decimal,
}

/// Admin/manager series in exact arithmetic. The summary is the sum of
/// the bucket revenues by construction; [`TeamSeries::to_view`] renders
/// both sides from the same numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSeries {
    pub points: Vec<TeamSeriesPoint>,
    pub summary: Decimal,
}

impl TeamSeries {
    /// Rendered form for payload assembly.
    pub fn to_view(&self) -> TeamChartSeries {
        TeamChartSeries {
            data: self
                .points
                .iter()
                .map(|point| TeamChartPoint {
                    label: point.label.clone(),
                    core_sale: point.core_sale.to_view(),
                    core_product: point.core_product.to_view(),
                    other_product: point.other_product.to_view(),
                    revenue: money(point.revenue),
                })
                .collect(),
            summary: money(self.summary),
        }
    }
}

/// Re-derives the aggregators per bucket to build a time series.
pub struct ChartBuilder {
    metrics: Arc<MetricEngine>,
}

impl ChartBuilder {
    /// Create a chart builder over the shared metric engine.
    pub fn new(metrics: Arc<MetricEngine>) -> Self {
        Self { metrics }
    }

    /// Admin/manager series: payment-date variants per bucket, so chart
    /// points reflect when money moved.
    pub async fn team_series(
        &self,
        filter: DateFilter,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<TeamSeries> {
        let buckets = buckets(filter, range);
        let lookups = buckets.iter().map(|bucket| self.team_point(bucket, scope));
        let points = futures::future::try_join_all(lookups).await?;
        let summary = points.iter().map(|point| point.revenue).sum();
        Ok(TeamSeries { points, summary })
    }

    /// Counsellor series: enrollment-date client volume per bucket,
    /// no dollar figures.
    pub async fn counsellor_series(
        &self,
        filter: DateFilter,
        range: &DateRange,
        scope: &RoleScope,
    ) -> Result<CounsellorChartSeries> {
        let buckets = buckets(filter, range);
        let lookups = buckets.iter().map(|bucket| async move {
            let count = self.metrics.total_clients(&bucket.range, scope).await?;
            Ok::<CounsellorChartPoint, visapath_domain::VisaPathError>(CounsellorChartPoint {
                label: bucket.label.clone(),
                client_count: count,
            })
        });
        let data = futures::future::try_join_all(lookups).await?;
        let summary = data.iter().map(|point| point.client_count).sum();
        Ok(CounsellorChartSeries { data, summary })
    }

    async fn team_point(&self, bucket: &ChartBucket, scope: &RoleScope) -> Result<TeamSeriesPoint> {
        let (core_sale, core_product, other_product) = tokio::try_join!(
            self.metrics.core_sale_by_payment(&bucket.range, scope),
            self.metrics.core_product(&bucket.range, scope),
            self.metrics.other_product(&bucket.range, scope),
        )?;
        let revenue = core_sale.amount + core_product.amount + other_product.amount;
        Ok(TeamSeriesPoint {
            label: bucket.label.clone(),
            core_sale,
            core_product,
            other_product,
            revenue,
        })
    }
}
