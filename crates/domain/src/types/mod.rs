//! Domain types and models

pub mod crm;
pub mod dashboard;
pub mod range;

pub use crm::{
    Client, Counsellor, CounsellorTarget, EntityKind, EntitySale, PaymentStage, ProductPayment,
    StagedPayment,
};
pub use dashboard::{
    ChangeType, CounsellorDashboard, DashboardStats, LeaderboardRow, MetricBlock, MetricView,
    PendingBreakdown, PerformanceDelta, TeamDashboard,
};
pub use range::{DateRange, Role, RoleScope};
