//! CRM row types consumed by the aggregation engine
//!
//! These mirror the transactional tables owned by the storage layer. The
//! engine only reads them; all mutation paths live outside this codebase.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/* -------------------------------------------------------------------------- */
/* Clients */
/* -------------------------------------------------------------------------- */

/// An enrolled client.
///
/// `enrollment_date` is a calendar date with no time component and is the
/// basis for every "enrollment-period" metric. Archived clients are
/// excluded from every aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub counsellor_id: String,
    pub enrollment_date: NaiveDate,
    pub archived: bool,
}

/* -------------------------------------------------------------------------- */
/* Staged Payments */
/* -------------------------------------------------------------------------- */

/// Payment milestone for a staged payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    Initial,
    BeforeVisa,
    AfterVisa,
    SubmittedVisa,
}

impl PaymentStage {
    /// Whether payments at this stage count toward paid/revenue totals.
    ///
    /// `SubmittedVisa` is tracked for display but excluded from the math.
    pub fn is_paying(self) -> bool {
        !matches!(self, Self::SubmittedVisa)
    }

    /// Stable string tag as stored in the payments table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::BeforeVisa => "before_visa",
            Self::AfterVisa => "after_visa",
            Self::SubmittedVisa => "submitted_visa",
        }
    }

    /// Parse a stored stage tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "initial" => Some(Self::Initial),
            "before_visa" => Some(Self::BeforeVisa),
            "after_visa" => Some(Self::AfterVisa),
            "submitted_visa" => Some(Self::SubmittedVisa),
            _ => None,
        }
    }
}

/// One staged payment row.
///
/// `total_payment` repeats the client's expected total on every row; only
/// the first observed row per client (smallest `(created_at, id)`) is used
/// when computing outstanding balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedPayment {
    pub id: String,
    pub client_id: String,
    pub stage: PaymentStage,
    pub amount: Decimal,
    pub total_payment: Decimal,
    pub payment_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl StagedPayment {
    /// The instant this payment is attributed to on payment-date charts:
    /// `payment_date`, falling back to `created_at` when absent.
    pub fn effective_date(&self) -> NaiveDateTime {
        self.payment_date.unwrap_or(self.created_at)
    }
}

/* -------------------------------------------------------------------------- */
/* Product Sales */
/* -------------------------------------------------------------------------- */

/// A product sale row.
///
/// Either self-contained (`amount` present) or a pointer into one of the
/// entity tables (`amount` absent, resolved via `entity_type` +
/// `entity_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPayment {
    pub id: String,
    pub client_id: String,
    pub product_name: String,
    pub amount: Option<Decimal>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub payment_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Closed registry of the per-product entity tables.
///
/// A `ProductPayment.entity_type` tag selects one of these; adding a new
/// product type is a compile-time-checked edit here and in the storage
/// adapter, never an open-ended table lookup. Unknown tags resolve to
/// `None` and contribute zero to every aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Insurance,
    AirTicket,
    ForexFee,
    ForexCard,
    CreditCard,
    SimCard,
    TuitionFee,
    Loan,
    Ielts,
    VisaExtension,
    BeaconAccount,
    NewSell,
    FinanceApproval,
}

impl EntityKind {
    /// Every registered entity kind, core product included.
    pub const ALL: [Self; 13] = [
        Self::Insurance,
        Self::AirTicket,
        Self::ForexFee,
        Self::ForexCard,
        Self::CreditCard,
        Self::SimCard,
        Self::TuitionFee,
        Self::Loan,
        Self::Ielts,
        Self::VisaExtension,
        Self::BeaconAccount,
        Self::NewSell,
        Self::FinanceApproval,
    ];

    /// The `entity_type` tag stored on product payment rows.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Insurance => "insurance_id",
            Self::AirTicket => "airTicket_id",
            Self::ForexFee => "forexFee_id",
            Self::ForexCard => "forexCard_id",
            Self::CreditCard => "creditCard_id",
            Self::SimCard => "simCard_id",
            Self::TuitionFee => "tuitionFee_id",
            Self::Loan => "loan_id",
            Self::Ielts => "ielts_id",
            Self::VisaExtension => "visaExtension_id",
            Self::BeaconAccount => "beaconAccount_id",
            Self::NewSell => "newSell_id",
            Self::FinanceApproval => "allFinance_id",
        }
    }

    /// Resolve a stored tag; unknown tags are not an error, they simply
    /// select nothing.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Count-only kinds contribute to product counts but never to dollar
    /// amounts.
    pub fn count_only(self) -> bool {
        matches!(
            self,
            Self::Insurance
                | Self::AirTicket
                | Self::ForexFee
                | Self::ForexCard
                | Self::CreditCard
                | Self::SimCard
                | Self::TuitionFee
                | Self::Loan
                | Self::BeaconAccount
        )
    }

    /// The finance-approval table backs the distinguished core product.
    pub fn is_core(self) -> bool {
        matches!(self, Self::FinanceApproval)
    }

    /// Entity kinds contributing to the "other product" aggregate.
    pub fn others() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|kind| !kind.is_core())
    }
}

/// Normalized result of a polymorphic entity lookup.
///
/// `occurred_on` is the entity table's own date column; the storage
/// adapter has already applied it, so aggregators never see the
/// `ProductPayment` creation date here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySale {
    pub client_id: String,
    pub occurred_on: NaiveDate,
    pub amount: Option<Decimal>,
}

/* -------------------------------------------------------------------------- */
/* Roster */
/* -------------------------------------------------------------------------- */

/// A counsellor on the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counsellor {
    pub id: String,
    pub name: String,
    pub manager_id: Option<String>,
}

/// Monthly enrollment target for one counsellor.
///
/// One row is expected per counsellor per month; created and updated by an
/// external management action, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounsellorTarget {
    pub id: String,
    pub counsellor_id: String,
    pub manager_id: Option<String>,
    pub target: i64,
    pub month: u32,
    pub year: i32,
    pub achieved_target: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paying_stages_exclude_submitted_visa() {
        assert!(PaymentStage::Initial.is_paying());
        assert!(PaymentStage::BeforeVisa.is_paying());
        assert!(PaymentStage::AfterVisa.is_paying());
        assert!(!PaymentStage::SubmittedVisa.is_paying());
    }

    #[test]
    fn stage_tags_round_trip() {
        for stage in [
            PaymentStage::Initial,
            PaymentStage::BeforeVisa,
            PaymentStage::AfterVisa,
            PaymentStage::SubmittedVisa,
        ] {
            assert_eq!(PaymentStage::from_tag(stage.as_str()), Some(stage));
        }
        assert_eq!(PaymentStage::from_tag("refund"), None);
    }

    #[test]
    fn entity_tags_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EntityKind::from_tag("mystery_id"), None);
    }

    #[test]
    fn count_only_classification() {
        assert!(EntityKind::Insurance.count_only());
        assert!(EntityKind::Loan.count_only());
        assert!(!EntityKind::Ielts.count_only());
        assert!(!EntityKind::VisaExtension.count_only());
        assert!(!EntityKind::NewSell.count_only());
        assert!(!EntityKind::FinanceApproval.count_only());
    }

    #[test]
    fn others_exclude_the_core_table() {
        let others: Vec<EntityKind> = EntityKind::others().collect();
        assert_eq!(others.len(), 12);
        assert!(!others.contains(&EntityKind::FinanceApproval));
    }

    #[test]
    fn effective_date_falls_back_to_created_at() {
        let created = NaiveDate::from_ymd_opt(2026, 1, 3)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap();
        let paid = NaiveDate::from_ymd_opt(2026, 1, 10)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();

        let mut payment = StagedPayment {
            id: "p-1".to_string(),
            client_id: "c-1".to_string(),
            stage: PaymentStage::Initial,
            amount: Decimal::new(50_000, 2),
            total_payment: Decimal::new(150_000, 2),
            payment_date: Some(paid),
            created_at: created,
        };
        assert_eq!(payment.effective_date(), paid);

        payment.payment_date = None;
        assert_eq!(payment.effective_date(), created);
    }
}
