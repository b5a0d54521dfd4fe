//! # VisaPath Infra
//!
//! Infrastructure adapters for the analytics engine:
//! - SQLite row store implementing the `visapath-core` ports
//! - The dashboard response cache
//! - Configuration loading
//!
//! The engine itself stays storage- and cache-agnostic; everything here
//! plugs into the core through its port traits.

pub mod cache;
pub mod config;
pub mod database;

pub use cache::{CacheKey, DashboardCache};
pub use config::{CacheConfig, DatabaseConfig, EngineConfig};
pub use database::{
    DbManager, SqliteClientStore, SqlitePaymentStore, SqliteProductStore, SqliteRosterStore,
};
