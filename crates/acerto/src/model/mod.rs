//! Business records.
//!
//! Every record is a plain serde struct stored as one JSON document in the
//! collection named by [`Record::COLLECTION`].

mod billing;
mod customer;
mod equipment;
mod ledger;
mod route;
mod warning;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub use billing::Billing;
pub use customer::Customer;
pub use equipment::{normalize_number, BillingMode, Equipment, EquipmentKind};
pub use ledger::{DebtPayment, Expense, ExpenseCategory, PaymentMethod};
pub use route::Route;
pub use warning::Warning;

/// A record persisted as a document.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name under the account scope.
    const COLLECTION: &'static str;

    /// Document identifier.
    fn id(&self) -> &str;

    /// Serialize into a document payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize from a document payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the record shape.
    fn from_document(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Generate a fresh record identifier.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

macro_rules! impl_record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

impl_record!(Customer, "customers");
impl_record!(Equipment, "equipment");
impl_record!(Billing, "billings");
impl_record!(DebtPayment, "debt_payments");
impl_record!(Expense, "expenses");
impl_record!(Warning, "warnings");
impl_record!(Route, "routes");
