//! SQLite row store implementing the core analytics ports

mod client_repository;
mod manager;
mod payment_repository;
mod product_repository;
mod roster_repository;

use std::str::FromStr;

use rust_decimal::Decimal;
use visapath_domain::{Result, VisaPathError};

pub use client_repository::SqliteClientStore;
pub use manager::{DbConnection, DbManager};
pub use payment_repository::SqlitePaymentStore;
pub use product_repository::SqliteProductStore;
pub use roster_repository::SqliteRosterStore;

/// Money columns are TEXT holding exact decimal strings; a row that does
/// not parse is corrupt data, surfaced as a database error.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal> {
    Decimal::from_str(text)
        .map_err(|err| VisaPathError::Database(format!("invalid decimal '{text}': {err}")))
}
