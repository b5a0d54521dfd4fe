//! # VisaPath Domain
//!
//! Plain data types shared across the analytics engine.
//!
//! This crate contains:
//! - CRM row types (clients, staged payments, product sales, roster)
//! - Date-range and role-scope value objects
//! - Dashboard/leaderboard/report view types
//! - The error taxonomy and `Result` alias
//!
//! It has no behaviour beyond small invariant-preserving helpers and
//! depends on nothing but serialization and date/decimal primitives.

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::{Result, VisaPathError};
pub use types::crm::{
    Client, Counsellor, CounsellorTarget, EntityKind, EntitySale, PaymentStage, ProductPayment,
    StagedPayment,
};
pub use types::dashboard::{
    money, ChangeType, CounsellorChartPoint, CounsellorChartSeries, CounsellorDashboard,
    DashboardStats, EnrollmentGoal, LeaderboardRow, LeaderboardSummary, LeaderboardView,
    MetricBlock, MetricView, PendingBreakdown, PerformanceDelta, Report, ReportScope,
    TeamChartPoint, TeamChartSeries, TeamDashboard,
};
pub use types::range::{DateRange, Role, RoleScope};
