//! Domain constants
//!
//! Centralized location for the product-catalogue constants the
//! aggregators dispatch on.

/// The distinguished "core product" name. The historical spelling is
/// preserved because it is the literal value stored in production rows.
pub const CORE_PRODUCT: &str = "ALL_FINANCE_EMPLOYEMENT";

/// Product names that are counted but never contribute a dollar amount.
///
/// These products are sold through their entity tables (which carry no
/// amount column); a direct `ProductPayment` row with one of these names
/// is excluded from other-product revenue entirely.
pub const COUNT_ONLY_PRODUCTS: &[&str] = &[
    "LOAN",
    "FOREX_CARD",
    "TUITION_FEE",
    "CREDIT_CARD",
    "SIM_ACTIVATION",
    "INSURANCE",
    "BEACON_ACCOUNT",
    "AIR_TICKET",
    "FOREX_FEE",
];

/// Opening year of the all-time reference window used by the
/// outstanding-balance computation.
pub const ALL_TIME_START_YEAR: i32 = 2000;

/// Default TTL for cached dashboard responses, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 45;

/// Default bound on cached dashboard responses.
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 2_048;
