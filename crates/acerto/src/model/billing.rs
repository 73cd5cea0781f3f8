//! Billing records: one per equipment per visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::{BillingBreakdown, BillingInput};

/// A settled visit for one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    /// Document identifier.
    pub id: String,
    /// Customer visited.
    pub customer_id: String,
    /// Machine read.
    pub equipment_id: String,
    /// Machine number at the time, kept for receipts.
    pub equipment_number: String,
    /// Visit date.
    pub date: DateTime<Utc>,
    /// What the operator entered.
    pub input: BillingInput,
    /// What was computed from it.
    pub breakdown: BillingBreakdown,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Billing {
    /// Create a billing dated now.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        equipment_id: impl Into<String>,
        equipment_number: impl Into<String>,
        input: BillingInput,
        breakdown: BillingBreakdown,
    ) -> Self {
        Self {
            id: super::new_id(),
            customer_id: customer_id.into(),
            equipment_id: equipment_id.into(),
            equipment_number: equipment_number.into(),
            date: Utc::now(),
            input,
            breakdown,
            notes: None,
        }
    }
}
