//! Equipment installed at customers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::{Money, Percent};

/// What kind of machine this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    /// Pool table, billed per ficha from its counter.
    PoolTable,
    /// Jukebox, coins counted from the cash box.
    Jukebox,
    /// Claw machine, coins counted from the cash box.
    ClawMachine,
    /// Anything else.
    Other,
}

impl EquipmentKind {
    /// Label printed on receipts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PoolTable => "Sinuca",
            Self::Jukebox => "Jukebox",
            Self::ClawMachine => "Grua",
            Self::Other => "Outro",
        }
    }

    /// How this kind is billed unless configured otherwise.
    #[must_use]
    pub fn default_mode(self, price_per_play: Money) -> BillingMode {
        match self {
            Self::PoolTable | Self::Other => BillingMode::PerPlay { price_per_play },
            Self::Jukebox | Self::ClawMachine => BillingMode::CashBox,
        }
    }

    /// How this kind is billed when the operator may have typed a price.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a price is given for a kind billed
    /// from its cash box.
    pub fn mode_with_price(self, price: Option<Money>, default_price: Money) -> Result<BillingMode> {
        match (self.default_mode(default_price), price) {
            (BillingMode::CashBox, Some(_)) => Err(Error::validation(
                "price",
                format!("{} machines are billed from the cash box, not per play", self.label()),
            )),
            (BillingMode::PerPlay { .. }, Some(price_per_play)) => {
                Ok(BillingMode::PerPlay { price_per_play })
            }
            (mode, None) => Ok(mode),
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolTable => write!(f, "pool_table"),
            Self::Jukebox => write!(f, "jukebox"),
            Self::ClawMachine => write!(f, "claw_machine"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// How revenue is measured at a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingMode {
    /// Meter delta times a fixed price per play.
    PerPlay {
        /// Price of one ficha.
        price_per_play: Money,
    },
    /// Cash counted from the machine's box.
    CashBox,
}

/// A machine with a counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Document identifier.
    pub id: String,
    /// Operator-assigned number painted on the machine; unique per account.
    pub number: String,
    /// Machine type.
    pub kind: EquipmentKind,
    /// How revenue is measured.
    pub mode: BillingMode,
    /// The establishment's share of net revenue.
    pub customer_percent: Percent,
    /// Customer where it is installed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Counter value at the last visit.
    #[serde(default)]
    pub last_reading: u64,
    /// Retired machines stay for history.
    #[serde(default = "default_active")]
    pub active: bool,
    /// When the equipment was registered.
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Equipment {
    /// Create new equipment in its kind's default mode.
    #[must_use]
    pub fn new(
        number: impl Into<String>,
        kind: EquipmentKind,
        price_per_play: Money,
        customer_percent: Percent,
    ) -> Self {
        Self {
            id: super::new_id(),
            number: number.into().trim().to_string(),
            kind,
            mode: kind.default_mode(price_per_play),
            customer_percent,
            customer_id: None,
            last_reading: 0,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Builder: install at a customer.
    #[must_use]
    pub fn installed_at(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Builder: set the counter.
    #[must_use]
    pub fn with_reading(mut self, reading: u64) -> Self {
        self.last_reading = reading;
        self
    }

    /// Number normalized for uniqueness checks.
    #[must_use]
    pub fn normalized_number(&self) -> String {
        normalize_number(&self.number)
    }

    /// Whether the machine is at a customer.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.customer_id.is_some()
    }

    /// The operator's share.
    #[must_use]
    pub fn house_percent(&self) -> Percent {
        self.customer_percent.complement()
    }
}

/// Trim and upper-case an equipment number.
#[must_use]
pub fn normalize_number(number: &str) -> String {
    number.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_modes() {
        let price = Money::from_cents(250);
        assert_eq!(
            EquipmentKind::PoolTable.default_mode(price),
            BillingMode::PerPlay {
                price_per_play: price
            }
        );
        assert_eq!(EquipmentKind::Jukebox.default_mode(price), BillingMode::CashBox);
        assert_eq!(EquipmentKind::ClawMachine.default_mode(price), BillingMode::CashBox);
    }

    #[test]
    fn test_mode_with_price() {
        let default = Money::from_units(2);
        let typed = Money::from_units(3);
        assert_eq!(
            EquipmentKind::PoolTable.mode_with_price(Some(typed), default).unwrap(),
            BillingMode::PerPlay {
                price_per_play: typed
            }
        );
        assert_eq!(
            EquipmentKind::PoolTable.mode_with_price(None, default).unwrap(),
            BillingMode::PerPlay {
                price_per_play: default
            }
        );
        assert_eq!(
            EquipmentKind::Jukebox.mode_with_price(None, default).unwrap(),
            BillingMode::CashBox
        );
        let err = EquipmentKind::Jukebox
            .mode_with_price(Some(typed), default)
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("cash box"));
    }

    #[test]
    fn test_new_equipment() {
        let eq = Equipment::new("  s-01 ", EquipmentKind::PoolTable, Money::from_units(2), Percent::whole(40));
        assert_eq!(eq.number, "s-01");
        assert_eq!(eq.normalized_number(), "S-01");
        assert_eq!(eq.house_percent(), Percent::whole(60));
        assert!(!eq.is_installed());
        assert!(eq.installed_at("c1").is_installed());
    }

    #[test]
    fn test_kind_display_and_label() {
        assert_eq!(EquipmentKind::ClawMachine.to_string(), "claw_machine");
        assert_eq!(EquipmentKind::ClawMachine.label(), "Grua");
        assert_eq!(EquipmentKind::PoolTable.label(), "Sinuca");
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_value(BillingMode::PerPlay {
            price_per_play: Money::from_cents(200),
        })
        .unwrap();
        assert_eq!(json["type"], "per_play");
        assert_eq!(json["price_per_play"], 200);
        let json = serde_json::to_value(BillingMode::CashBox).unwrap();
        assert_eq!(json["type"], "cash_box");
    }
}
