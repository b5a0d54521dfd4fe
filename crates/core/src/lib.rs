//! # VisaPath Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) over the CRM row store
//! - The date-range resolver, metric aggregators, leaderboard engine,
//!   performance-delta calculator, and chart bucketizer
//! - The dashboard orchestrator tying them together
//!
//! ## Architecture Principles
//! - Only depends on `visapath-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Every aggregator is a pure function of its inputs and the current
//!   store snapshot

pub mod analytics;

// Re-export specific items to avoid ambiguity
pub use analytics::chart::{buckets, ChartBucket, ChartBuilder, TeamSeries, TeamSeriesPoint};
pub use analytics::date_range::{all_time, resolve, today_only, DateFilter, ResolvedRange};
pub use analytics::leaderboard::LeaderboardEngine;
pub use analytics::memory::{EntityRecord, MemoryStore};
pub use analytics::metrics::MetricEngine;
pub use analytics::performance::{delta, delta_counts, previous_range};
pub use analytics::ports::{ClientStore, PaymentStore, ProductStore, RosterStore};
pub use analytics::service::DashboardService;
