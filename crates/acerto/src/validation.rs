//! Form validation rules.
//!
//! These run before a record is written, locally and offline alike.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{BillingMode, Customer, DebtPayment, Equipment, Expense};
use crate::money::{Money, Percent};

fn non_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").expect("valid regex"))
}

/// Strip everything but digits from a phone number.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    non_digit_re().replace_all(phone, "").into_owned()
}

/// Validate a customer form.
///
/// # Errors
///
/// Returns a validation error for an empty name, a malformed phone or
/// coordinates outside the globe.
pub fn validate_customer(customer: &Customer) -> Result<()> {
    if customer.name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    if let Some(phone) = &customer.phone {
        let digits = normalize_phone(phone);
        if !(10..=13).contains(&digits.len()) {
            return Err(Error::validation(
                "phone",
                format!("expected 10 to 13 digits, got {}", digits.len()),
            ));
        }
    }
    if let Some(location) = customer.location {
        if !location.is_valid() {
            return Err(Error::validation(
                "location",
                format!(
                    "({}, {}) is outside latitude -90..=90 or longitude -180..=180",
                    location.latitude, location.longitude
                ),
            ));
        }
    }
    if customer.debt.is_negative() {
        return Err(Error::validation("debt", "must not be negative"));
    }
    Ok(())
}

/// Validate an equipment form against the rest of the account's equipment.
///
/// Numbers are compared trimmed and case-insensitively; the record itself is
/// skipped so that editing keeps its own number.
///
/// # Errors
///
/// Returns [`Error::DuplicateEquipmentNumber`] if another machine uses the
/// number, or a validation error for other bad fields.
pub fn validate_equipment<'a>(
    equipment: &Equipment,
    existing: impl IntoIterator<Item = &'a Equipment>,
) -> Result<()> {
    let number = equipment.normalized_number();
    if number.is_empty() {
        return Err(Error::validation("number", "must not be empty"));
    }

    if existing
        .into_iter()
        .any(|other| other.id != equipment.id && other.normalized_number() == number)
    {
        return Err(Error::DuplicateEquipmentNumber {
            number: equipment.number.trim().to_string(),
        });
    }

    Percent::from_basis_points(equipment.customer_percent.basis_points())?;

    if let BillingMode::PerPlay { price_per_play } = equipment.mode {
        if !price_per_play.is_positive() {
            return Err(Error::validation("price_per_play", "must be greater than zero"));
        }
    }
    Ok(())
}

/// Check that a house/customer split covers exactly 100 %.
///
/// # Errors
///
/// Returns a validation error when the two shares do not add up.
pub fn validate_split(house: Percent, customer: Percent) -> Result<()> {
    let total = house.basis_points() + customer.basis_points();
    if total != Percent::FULL.basis_points() {
        return Err(Error::validation(
            "percent",
            format!("house {house} and customer {customer} must add up to 100%"),
        ));
    }
    Ok(())
}

/// Validate an expense form.
///
/// # Errors
///
/// Returns a validation error for an empty description or non-positive amount.
pub fn validate_expense(expense: &Expense) -> Result<()> {
    if expense.description.trim().is_empty() {
        return Err(Error::validation("description", "must not be empty"));
    }
    validate_positive("amount", expense.amount)
}

/// Validate a debt payment against the customer's open debt.
///
/// # Errors
///
/// Returns a validation error for a non-positive amount or one above the debt.
pub fn validate_debt_payment(payment: &DebtPayment, customer: &Customer) -> Result<()> {
    validate_positive("amount", payment.amount)?;
    if payment.amount > customer.debt {
        return Err(Error::validation(
            "amount",
            format!(
                "{} is more than the outstanding debt {}",
                payment.amount, customer.debt
            ),
        ));
    }
    Ok(())
}

fn validate_positive(field: &'static str, amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(Error::validation(field, "must be greater than zero"))
    }
}
