//! Customers: the establishments where equipment is installed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::routing::GeoPoint;

/// An establishment on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Document identifier.
    pub id: String,
    /// Display name, usually the bar's name.
    pub name: String,
    /// Contact phone, digits only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Coordinates used for route ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Route this customer belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    /// Outstanding amount owed to the operator.
    #[serde(default)]
    pub debt: Money,
    /// Inactive customers are hidden from routes.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the customer was registered.
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Customer {
    /// Create a new active customer with no debt.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            phone: None,
            address: None,
            city: None,
            location: None,
            route_id: None,
            debt: Money::ZERO,
            active: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Builder: set the phone.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Builder: set the address and city.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>, city: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self.city = Some(city.into());
        self
    }

    /// Builder: set the coordinates.
    #[must_use]
    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Builder: assign to a route.
    #[must_use]
    pub fn with_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Whether the customer owes anything.
    #[must_use]
    pub fn has_debt(&self) -> bool {
        self.debt.is_positive()
    }
}
