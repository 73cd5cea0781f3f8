//! Billing computation for a visit.
//!
//! Revenue comes either from the meter delta times the ficha price or from
//! the cash counted in the machine's box. Net revenue is split between the
//! establishment and the operator; the operator's share plus any debt carried
//! from earlier visits is what the customer owes today.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{BillingMode, Customer, Equipment};
use crate::money::{Money, Percent};

/// Where gross revenue comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevenueInput {
    /// Plays on the meter times a price.
    Plays {
        /// Price of one ficha.
        price_per_play: Money,
    },
    /// Cash counted from the box.
    Counted {
        /// Amount counted; unset until the box has been emptied and counted.
        #[serde(default)]
        amount: Option<Money>,
    },
}

/// Values entered on the billing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInput {
    /// Counter at the last visit.
    pub previous_reading: u64,
    /// Counter now.
    pub current_reading: u64,
    /// The counter was replaced or rolled over since the last visit.
    #[serde(default)]
    pub meter_reset: bool,
    /// Revenue source.
    pub revenue: RevenueInput,
    /// Deducted from gross before the split.
    #[serde(default)]
    pub discount: Money,
    /// The establishment's share.
    pub customer_percent: Percent,
    /// Debt carried from earlier visits.
    #[serde(default)]
    pub previous_debt: Money,
    /// Cash handed over now.
    #[serde(default)]
    pub amount_paid: Money,
}

/// Computed values for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingBreakdown {
    /// Plays since the last visit.
    pub plays: u64,
    /// Revenue before discount.
    pub gross: Money,
    /// Discount applied.
    pub discount: Money,
    /// Revenue after discount.
    pub net: Money,
    /// The establishment's share of net.
    pub customer_share: Money,
    /// The operator's share of net.
    pub house_share: Money,
    /// Debt carried in.
    pub previous_debt: Money,
    /// House share plus previous debt.
    pub amount_due: Money,
    /// Cash handed over.
    pub amount_paid: Money,
    /// What is still owed after this visit.
    pub new_debt: Money,
    /// Overpayment returned to the customer.
    pub change: Money,
}

impl BillingInput {
    /// Seed a form for a machine and its customer at a new reading.
    #[must_use]
    pub fn for_equipment(equipment: &Equipment, customer: &Customer, current_reading: u64) -> Self {
        let revenue = match equipment.mode {
            BillingMode::PerPlay { price_per_play } => RevenueInput::Plays { price_per_play },
            BillingMode::CashBox => RevenueInput::Counted { amount: None },
        };
        Self {
            previous_reading: equipment.last_reading,
            current_reading,
            meter_reset: false,
            revenue,
            discount: Money::ZERO,
            customer_percent: equipment.customer_percent,
            previous_debt: customer.debt.max(Money::ZERO),
            amount_paid: Money::ZERO,
        }
    }

    /// Builder: cash handed over.
    #[must_use]
    pub fn with_paid(mut self, amount: Money) -> Self {
        self.amount_paid = amount;
        self
    }

    /// Builder: discount before the split.
    #[must_use]
    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Builder: cash counted from the box. Turns the input into a counted one.
    #[must_use]
    pub fn with_counted(mut self, amount: Money) -> Self {
        self.revenue = RevenueInput::Counted {
            amount: Some(amount),
        };
        self
    }

    /// Builder: mark a meter reset.
    #[must_use]
    pub fn with_reset(mut self) -> Self {
        self.meter_reset = true;
        self
    }

    /// Plays since the last visit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NegativeMeterDelta`] when the counter went backwards
    /// without a reset.
    pub fn plays(&self) -> Result<u64> {
        if self.meter_reset {
            return Ok(self.current_reading);
        }
        self.current_reading
            .checked_sub(self.previous_reading)
            .ok_or(Error::NegativeMeterDelta {
                previous: self.previous_reading,
                current: self.current_reading,
            })
    }
}

/// Compute the breakdown for a visit.
///
/// # Errors
///
/// Returns a validation error for a backwards counter, a cash box input
/// without a counted amount, negative inputs, a discount larger than gross,
/// or an overflowing amount.
pub fn compute(input: &BillingInput) -> Result<BillingBreakdown> {
    let plays = input.plays()?;

    if input.discount.is_negative() {
        return Err(Error::validation("discount", "must not be negative"));
    }
    if input.amount_paid.is_negative() {
        return Err(Error::validation("amount_paid", "must not be negative"));
    }
    if input.previous_debt.is_negative() {
        return Err(Error::validation("previous_debt", "must not be negative"));
    }

    let gross = match input.revenue {
        RevenueInput::Plays { price_per_play } => {
            if price_per_play.is_negative() {
                return Err(Error::validation("price_per_play", "must not be negative"));
            }
            price_per_play
                .times(plays)
                .ok_or_else(|| Error::validation("current_reading", "revenue overflows"))?
        }
        RevenueInput::Counted { amount } => {
            let amount = amount
                .ok_or_else(|| Error::validation("counted", "required for cash box machines"))?;
            if amount.is_negative() {
                return Err(Error::validation("counted", "must not be negative"));
            }
            amount
        }
    };

    if input.discount > gross {
        return Err(Error::validation(
            "discount",
            format!("{} exceeds gross revenue {}", input.discount, gross),
        ));
    }

    let net = gross - input.discount;
    let customer_share = net.percent(input.customer_percent);
    let house_share = net - customer_share;
    let amount_due = house_share
        .checked_add(input.previous_debt)
        .ok_or_else(|| Error::validation("previous_debt", "amount overflows"))?;
    let new_debt = amount_due.saturating_sub(input.amount_paid);
    let change = input.amount_paid.saturating_sub(amount_due);

    debug!(
        plays,
        gross = gross.cents(),
        house = house_share.cents(),
        new_debt = new_debt.cents(),
        "computed billing"
    );

    Ok(BillingBreakdown {
        plays,
        gross,
        discount: input.discount,
        net,
        customer_share,
        house_share,
        previous_debt: input.previous_debt,
        amount_due,
        amount_paid: input.amount_paid,
        new_debt,
        change,
    })
}

/// Result of editing a past billing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Input with the original previous debt pinned.
    pub input: BillingInput,
    /// New breakdown.
    pub breakdown: BillingBreakdown,
    /// Amount to add to the customer's current debt (negative to reduce it).
    pub debt_adjustment: Money,
}

/// Recompute an edited billing.
///
/// The debt carried into the original visit is kept as it was; only the
/// difference in what this visit left owing flows to the customer's balance.
///
/// # Errors
///
/// Returns the same errors as [`compute`].
pub fn recompute_for_edit(original: &BillingBreakdown, edited: &BillingInput) -> Result<EditOutcome> {
    let mut input = edited.clone();
    input.previous_debt = original.previous_debt;
    let breakdown = compute(&input)?;
    let debt_adjustment = breakdown.new_debt - original.new_debt;
    Ok(EditOutcome {
        input,
        breakdown,
        debt_adjustment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EquipmentKind;

    fn per_play(prev: u64, cur: u64, price: i64, pct: u32) -> BillingInput {
        BillingInput {
            previous_reading: prev,
            current_reading: cur,
            meter_reset: false,
            revenue: RevenueInput::Plays {
                price_per_play: Money::from_cents(price),
            },
            discount: Money::ZERO,
            customer_percent: Percent::whole(pct),
            previous_debt: Money::ZERO,
            amount_paid: Money::ZERO,
        }
    }

    #[test]
    fn test_basic_split() {
        let input = per_play(1_000, 1_100, 200, 40).with_paid(Money::from_units(120));
        let b = compute(&input).unwrap();
        assert_eq!(b.plays, 100);
        assert_eq!(b.gross, Money::from_units(200));
        assert_eq!(b.customer_share, Money::from_units(80));
        assert_eq!(b.house_share, Money::from_units(120));
        assert_eq!(b.amount_due, Money::from_units(120));
        assert_eq!(b.new_debt, Money::ZERO);
        assert_eq!(b.change, Money::ZERO);
    }

    #[test]
    fn test_equal_readings_zero_plays() {
        let mut input = per_play(500, 500, 200, 50);
        input.previous_debt = Money::from_units(30);
        let b = compute(&input).unwrap();
        assert_eq!(b.plays, 0);
        assert_eq!(b.gross, Money::ZERO);
        assert_eq!(b.customer_share, Money::ZERO);
        assert_eq!(b.house_share, Money::ZERO);
        assert_eq!(b.amount_due, Money::from_units(30));
        assert_eq!(b.new_debt, Money::from_units(30));
    }

    #[test]
    fn test_backwards_counter_rejected() {
        let err = compute(&per_play(500, 499, 200, 50)).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeMeterDelta {
                previous: 500,
                current: 499
            }
        ));
    }

    #[test]
    fn test_meter_reset_counts_from_zero() {
        let input = per_play(9_990, 15, 100, 50).with_reset();
        let b = compute(&input).unwrap();
        assert_eq!(b.plays, 15);
        assert_eq!(b.gross, Money::from_cents(1_500));
    }

    #[test]
    fn test_shares_always_sum_to_net() {
        for pct in [0, 1, 33, 50, 67, 99, 100] {
            for plays in [0, 1, 3, 7, 101] {
                let b = compute(&per_play(0, plays, 333, pct)).unwrap();
                assert_eq!(b.customer_share + b.house_share, b.net, "pct={pct} plays={plays}");
            }
        }
    }

    #[test]
    fn test_boundary_percentages() {
        let b = compute(&per_play(0, 10, 100, 0)).unwrap();
        assert_eq!(b.customer_share, Money::ZERO);
        assert_eq!(b.house_share, Money::from_units(10));

        let b = compute(&per_play(0, 10, 100, 100)).unwrap();
        assert_eq!(b.customer_share, Money::from_units(10));
        assert_eq!(b.house_share, Money::ZERO);
    }

    #[test]
    fn test_partial_payment_creates_debt() {
        let mut input = per_play(0, 100, 100, 50).with_paid(Money::from_units(20));
        input.previous_debt = Money::from_units(15);
        let b = compute(&input).unwrap();
        assert_eq!(b.amount_due, Money::from_units(65));
        assert_eq!(b.new_debt, Money::from_units(45));
    }

    #[test]
    fn test_overpayment_gives_change() {
        let input = per_play(0, 10, 100, 50).with_paid(Money::from_units(10));
        let b = compute(&input).unwrap();
        assert_eq!(b.amount_due, Money::from_units(5));
        assert_eq!(b.new_debt, Money::ZERO);
        assert_eq!(b.change, Money::from_units(5));
    }

    #[test]
    fn test_discount_before_split() {
        let input = per_play(0, 100, 100, 50).with_discount(Money::from_units(20));
        let b = compute(&input).unwrap();
        assert_eq!(b.net, Money::from_units(80));
        assert_eq!(b.house_share, Money::from_units(40));
    }

    #[test]
    fn test_discount_above_gross_rejected() {
        let input = per_play(0, 1, 100, 50).with_discount(Money::from_units(2));
        assert!(compute(&input).unwrap_err().is_validation_error());
    }

    #[test]
    fn test_negative_payment_rejected() {
        let input = per_play(0, 1, 100, 50).with_paid(Money::from_cents(-1));
        assert!(compute(&input).is_err());
    }

    #[test]
    fn test_cash_box_uses_counted_amount() {
        let jukebox = Equipment::new("J-1", EquipmentKind::Jukebox, Money::ZERO, Percent::whole(30))
            .with_reading(40);
        let customer = Customer::new("Bar");
        let input = BillingInput::for_equipment(&jukebox, &customer, 90)
            .with_counted(Money::from_units(150));
        let b = compute(&input).unwrap();
        assert_eq!(b.plays, 50);
        assert_eq!(b.gross, Money::from_units(150));
        assert_eq!(b.customer_share, Money::from_units(45));
        assert_eq!(b.house_share, Money::from_units(105));
    }

    #[test]
    fn test_cash_box_without_count_rejected() {
        let jukebox = Equipment::new("J-1", EquipmentKind::Jukebox, Money::ZERO, Percent::whole(30))
            .with_reading(40);
        let input = BillingInput::for_equipment(&jukebox, &Customer::new("Bar"), 90);
        assert_eq!(input.revenue, RevenueInput::Counted { amount: None });

        let err = compute(&input).unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("counted"));
    }

    #[test]
    fn test_for_equipment_seeds_from_records() {
        let table = Equipment::new("S-1", EquipmentKind::PoolTable, Money::from_units(2), Percent::whole(40))
            .with_reading(1_000);
        let mut customer = Customer::new("Bar");
        customer.debt = Money::from_units(12);
        let input = BillingInput::for_equipment(&table, &customer, 1_050);
        assert_eq!(input.previous_reading, 1_000);
        assert_eq!(input.previous_debt, Money::from_units(12));
        assert_eq!(input.customer_percent, Percent::whole(40));
        assert_eq!(
            input.revenue,
            RevenueInput::Plays {
                price_per_play: Money::from_units(2)
            }
        );
    }

    #[test]
    fn test_edit_pins_previous_debt_and_reports_adjustment() {
        let mut input = per_play(0, 100, 100, 50).with_paid(Money::from_units(50));
        input.previous_debt = Money::from_units(10);
        let original = compute(&input).unwrap();
        assert_eq!(original.new_debt, Money::from_units(10));

        let mut edited = input.clone().with_paid(Money::from_units(30));
        edited.previous_debt = Money::from_units(999);
        let outcome = recompute_for_edit(&original, &edited).unwrap();
        assert_eq!(outcome.input.previous_debt, Money::from_units(10));
        assert_eq!(outcome.breakdown.new_debt, Money::from_units(30));
        assert_eq!(outcome.debt_adjustment, Money::from_units(20));
    }

    #[test]
    fn test_edit_reducing_reading_lowers_debt() {
        let input = per_play(0, 100, 100, 50);
        let original = compute(&input).unwrap();
        let mut edited = input.clone();
        edited.current_reading = 60;
        let outcome = recompute_for_edit(&original, &edited).unwrap();
        assert_eq!(outcome.debt_adjustment, Money::from_units(-20));
    }
}
