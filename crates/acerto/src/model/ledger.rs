//! Money moving outside of a billing visit: debt payments and expenses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash in hand.
    #[default]
    Cash,
    /// Instant payment.
    Pix,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Label printed on receipts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Dinheiro",
            Self::Pix => "PIX",
            Self::Transfer => "Transferência",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Pix => write!(f, "pix"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// A payment against a customer's outstanding debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPayment {
    /// Document identifier.
    pub id: String,
    /// Paying customer.
    pub customer_id: String,
    /// Amount paid.
    pub amount: Money,
    /// Payment method.
    #[serde(default)]
    pub method: PaymentMethod,
    /// Customer debt right before this payment.
    pub debt_before: Money,
    /// When it was paid.
    pub date: DateTime<Utc>,
    /// Billing visit at which the payment was taken, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_id: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DebtPayment {
    /// Create a payment dated now.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        amount: Money,
        method: PaymentMethod,
        debt_before: Money,
    ) -> Self {
        Self {
            id: super::new_id(),
            customer_id: customer_id.into(),
            amount,
            method,
            debt_before,
            date: Utc::now(),
            billing_id: None,
            notes: None,
        }
    }

    /// Debt left after this payment.
    #[must_use]
    pub fn debt_after(&self) -> Money {
        self.debt_before.saturating_sub(self.amount)
    }
}

/// Expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Fuel for the route.
    Fuel,
    /// Repairs and upkeep.
    Maintenance,
    /// Spare parts, cloth, cues, balls.
    Parts,
    /// Buying fichas.
    Fichas,
    /// Meals on the road.
    Food,
    /// Anything else.
    Other,
}

impl ExpenseCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 6] = [
        Self::Fuel,
        Self::Maintenance,
        Self::Parts,
        Self::Fichas,
        Self::Food,
        Self::Other,
    ];

    /// Label shown in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fuel => "Combustível",
            Self::Maintenance => "Manutenção",
            Self::Parts => "Peças",
            Self::Fichas => "Fichas",
            Self::Food => "Alimentação",
            Self::Other => "Outros",
        }
    }
}

/// An operating expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Document identifier.
    pub id: String,
    /// What was bought.
    pub description: String,
    /// Category for reports.
    pub category: ExpenseCategory,
    /// Amount spent.
    pub amount: Money,
    /// When it was spent.
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Create an expense dated now.
    #[must_use]
    pub fn new(description: impl Into<String>, category: ExpenseCategory, amount: Money) -> Self {
        Self {
            id: super::new_id(),
            description: description.into(),
            category,
            amount,
            date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debt_after() {
        let p = DebtPayment::new("c1", Money::from_units(30), PaymentMethod::Pix, Money::from_units(50));
        assert_eq!(p.debt_after(), Money::from_units(20));

        let p = DebtPayment::new("c1", Money::from_units(80), PaymentMethod::Cash, Money::from_units(50));
        assert_eq!(p.debt_after(), Money::ZERO);
    }

    #[test]
    fn test_payment_method_serialization() {
        assert_eq!(serde_json::to_value(PaymentMethod::Pix).unwrap(), "pix");
        assert_eq!(PaymentMethod::Transfer.to_string(), "transfer");
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_expense_categories() {
        assert_eq!(ExpenseCategory::ALL.len(), 6);
        assert_eq!(ExpenseCategory::Fuel.label(), "Combustível");
        let e = Expense::new("Gasolina", ExpenseCategory::Fuel, Money::from_units(100));
        assert_eq!(serde_json::to_value(&e).unwrap()["category"], "fuel");
    }
}
