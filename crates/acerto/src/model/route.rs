//! Collection routes.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// An ordered list of customers visited together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Document identifier.
    pub id: String,
    /// Route name.
    pub name: String,
    /// Customers in visiting order.
    #[serde(default)]
    pub customer_ids: Vec<String>,
    /// Usual day of the week.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
}

impl Route {
    /// Create an empty route.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            customer_ids: Vec::new(),
            weekday: None,
        }
    }

    /// Number of stops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.customer_ids.len()
    }

    /// Whether the route has no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customer_ids.is_empty()
    }
}
