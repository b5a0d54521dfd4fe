//! Date-range and role-scope value objects

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/* -------------------------------------------------------------------------- */
/* Date Range */
/* -------------------------------------------------------------------------- */

/// An inclusive `[start, end]` instant range, always normalized so
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Build a range from two bounds in either order.
    pub fn new(a: NaiveDateTime, b: NaiveDateTime) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Inclusive instant containment.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Calendar-date containment: the day falls within the range's days.
    ///
    /// Used for columns that carry no time component (enrollment and
    /// entity event dates).
    pub fn contains_date(&self, day: NaiveDate) -> bool {
        self.start.date() <= day && day <= self.end.date()
    }

    /// `(month, year)` of the range's start, used for target lookups.
    pub fn month_year(&self) -> (u32, i32) {
        (self.start.month(), self.start.year())
    }
}

/* -------------------------------------------------------------------------- */
/* Role Scope */
/* -------------------------------------------------------------------------- */

/// Access-control role of the requesting actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Counsellor,
}

impl Role {
    /// Stable string tag, used in cache keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Counsellor => "counsellor",
        }
    }
}

/// The scope every aggregator consults to decide whether rows are
/// restricted to one counsellor's client base.
///
/// Only `Counsellor` scope restricts; admin and manager scopes see all
/// clients (the manager-level team restriction applies to rosters, not to
/// row visibility).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleScope {
    pub role: Role,
    pub counsellor_id: Option<String>,
}

impl RoleScope {
    /// Unrestricted admin scope.
    pub fn admin() -> Self {
        Self { role: Role::Admin, counsellor_id: None }
    }

    /// Unrestricted manager scope.
    pub fn manager() -> Self {
        Self { role: Role::Manager, counsellor_id: None }
    }

    /// Scope restricted to one counsellor's client base.
    pub fn counsellor(id: impl Into<String>) -> Self {
        Self { role: Role::Counsellor, counsellor_id: Some(id.into()) }
    }

    /// The counsellor id rows must belong to, if this scope restricts.
    pub fn restricted_to(&self) -> Option<&str> {
        match self.role {
            Role::Counsellor => self.counsellor_id.as_deref(),
            Role::Admin | Role::Manager => None,
        }
    }
}
