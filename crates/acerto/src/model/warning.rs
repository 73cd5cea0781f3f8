//! Field warnings: broken machines, complaints, things to check next visit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note that stays open until resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Document identifier.
    pub id: String,
    /// Related customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Related equipment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    /// What needs attention.
    pub message: String,
    /// When it was raised.
    pub created_at: DateTime<Utc>,
    /// When it was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Warning {
    /// Raise a new warning.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            customer_id: None,
            equipment_id: None,
            message: message.into(),
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Builder: attach to a customer.
    #[must_use]
    pub fn for_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Builder: attach to equipment.
    #[must_use]
    pub fn for_equipment(mut self, equipment_id: impl Into<String>) -> Self {
        self.equipment_id = Some(equipment_id.into());
        self
    }

    /// Whether it has been dealt with.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}
