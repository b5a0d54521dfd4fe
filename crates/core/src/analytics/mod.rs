//! Dashboard and leaderboard analytics aggregation engine
//!
//! Data flow: [`service::DashboardService`] resolves the request's date
//! windows once, fans out to the [`metrics::MetricEngine`] aggregators and
//! the [`leaderboard::LeaderboardEngine`] concurrently, re-derives the
//! same aggregates per chart bucket through [`chart::ChartBuilder`], and
//! assembles one of the two role-dependent payload shapes. Everything is
//! a pure read; a failure in any branch fails the whole request.

pub mod chart;
pub mod date_range;
pub mod leaderboard;
pub mod memory;
pub mod metrics;
pub mod performance;
pub mod ports;
pub mod service;
