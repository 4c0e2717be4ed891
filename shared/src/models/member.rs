//! Member Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Membership plan duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Monthly,
    Quarterly,
    Semiannual,
}

impl PlanType {
    /// Plan length in calendar months
    pub fn months(&self) -> u32 {
        match self {
            PlanType::Monthly => 1,
            PlanType::Quarterly => 3,
            PlanType::Semiannual => 6,
        }
    }

    /// Display name (UI lists, CSV export)
    pub fn label(&self) -> &'static str {
        match self {
            PlanType::Monthly => "Monthly",
            PlanType::Quarterly => "Quarterly",
            PlanType::Semiannual => "Semiannual",
        }
    }
}

/// Payment method recorded at enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    DigitalWallet,
}

impl PaymentMethod {
    /// Display name (UI lists, CSV export)
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::DigitalWallet => "Digital wallet",
        }
    }
}

/// Member entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub plan: PlanType,
    pub plan_start: NaiveDate,
    /// Derived from plan + plan_start at write time; never recomputed on read
    pub plan_end: NaiveDate,
    pub payment_method: PaymentMethod,
    /// At most one member holds a given card UID at any time
    pub card_uid: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Plan still valid today (end date inclusive)
    pub fn is_vigent(&self) -> bool {
        chrono::Local::now().date_naive() <= self.plan_end
    }

    /// Signed whole days until plan end (negative once expired)
    pub fn days_remaining(&self) -> i64 {
        (self.plan_end - chrono::Local::now().date_naive()).num_days()
    }
}

/// Create member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub plan: PlanType,
    pub plan_start: NaiveDate,
    pub payment_method: PaymentMethod,
    pub card_uid: Option<String>,
}

/// Update member payload (partial; absent fields are left unchanged)
///
/// Card removal goes through the dedicated remove-card operation, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub plan: Option<PlanType>,
    pub plan_start: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub card_uid: Option<String>,
    pub is_active: Option<bool>,
}

/// Search filters; every field is independently optional, present filters are ANDed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberSearch {
    /// Case-insensitive substring on first name
    pub first_name: Option<String>,
    /// Case-insensitive substring on last name
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    /// Exact plan match
    pub plan: Option<PlanType>,
    pub active_only: Option<bool>,
    /// Plan end today or later
    pub vigent_only: Option<bool>,
    pub end_from: Option<NaiveDate>,
    pub end_to: Option<NaiveDate>,
}
