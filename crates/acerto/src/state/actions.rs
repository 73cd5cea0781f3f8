//! Business actions on [`AppState`].

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::billing::{self, BillingInput};
use crate::error::{Error, Result};
use crate::model::{Billing, Customer, DebtPayment, Equipment, Expense, PaymentMethod, Route, Warning};
use crate::money::Money;
use crate::routing::{order_stops, GeoPoint, Stop};
use crate::validation;

impl AppState {
    /// Add a customer.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad form, or the store's error.
    pub async fn add_customer(&mut self, customer: Customer) -> Result<()> {
        validation::validate_customer(&customer)?;
        self.insert(customer).await
    }

    /// Replace a customer.
    ///
    /// # Errors
    ///
    /// Returns a validation error, [`Error::NotFound`], or the store's error.
    pub async fn update_customer(&mut self, customer: Customer) -> Result<()> {
        validation::validate_customer(&customer)?;
        self.replace(customer).await
    }

    /// Delete a customer and drop it from every route.
    ///
    /// # Errors
    ///
    /// Refuses while equipment is installed at the customer.
    pub async fn delete_customer(&mut self, id: &str) -> Result<Customer> {
        let index = self.index_of::<Customer>(id)?;
        if let Some(installed) = self.equipment_at(id).next() {
            return Err(Error::validation(
                "customer",
                format!("equipment {} is still installed there", installed.number),
            ));
        }

        let routes: Vec<(usize, Vec<String>)> = self
            .data
            .routes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.customer_ids.iter().any(|c| c == id))
            .map(|(i, r)| (i, r.customer_ids.iter().filter(|c| *c != id).cloned().collect()))
            .collect();

        let mut writes = vec![self.delete_write::<Customer>(id)];
        for (i, ids) in &routes {
            writes.push(self.update_write::<Route>(&self.data.routes[*i].id, json!({ "customer_ids": ids })));
        }

        let removed = self.data.customers[index].clone();
        self.apply(writes, move |data| {
            data.customers.remove(index);
            for (i, ids) in routes {
                data.routes[i].customer_ids = ids;
            }
        })
        .await?;
        info!(customer = %removed.name, "deleted customer");
        Ok(removed)
    }

    /// Add equipment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEquipmentNumber`] or another validation
    /// error, [`Error::NotFound`] for an unknown customer, or the store's error.
    pub async fn add_equipment(&mut self, equipment: Equipment) -> Result<()> {
        validation::validate_equipment(&equipment, self.equipment())?;
        if let Some(customer_id) = &equipment.customer_id {
            self.get::<Customer>(customer_id)?;
        }
        self.insert(equipment).await
    }

    /// Replace equipment.
    ///
    /// # Errors
    ///
    /// Same as [`add_equipment`](Self::add_equipment), plus
    /// [`Error::NotFound`] for unknown equipment.
    pub async fn update_equipment(&mut self, equipment: Equipment) -> Result<()> {
        validation::validate_equipment(&equipment, self.equipment())?;
        if let Some(customer_id) = &equipment.customer_id {
            self.get::<Customer>(customer_id)?;
        }
        self.replace(equipment).await
    }

    /// Install equipment at a customer, or take it back with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown ids, or the store's error.
    pub async fn install_equipment(&mut self, equipment_id: &str, customer_id: Option<&str>) -> Result<()> {
        let index = self.index_of::<Equipment>(equipment_id)?;
        if let Some(customer_id) = customer_id {
            self.get::<Customer>(customer_id)?;
        }
        let customer_id = customer_id.map(str::to_string);
        let write = self.update_write::<Equipment>(equipment_id, json!({ "customer_id": customer_id }));
        self.apply(vec![write], move |data| data.equipment[index].customer_id = customer_id)
            .await
    }

    /// Delete equipment. Past billings keep its number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn delete_equipment(&mut self, id: &str) -> Result<Equipment> {
        self.remove(id).await
    }

    /// Settle a visit to one machine.
    ///
    /// The debt carried in is the customer's current debt. The billing, the
    /// machine's new reading and the customer's new debt go out as one batch.
    ///
    /// # Errors
    ///
    /// Returns a validation error for uninstalled equipment or bad input,
    /// [`Error::NotFound`], or the store's error.
    pub async fn record_billing(
        &mut self,
        equipment_id: &str,
        mut input: BillingInput,
        notes: Option<String>,
    ) -> Result<Billing> {
        let equipment = self.get::<Equipment>(equipment_id)?;
        let customer_id = equipment.customer_id.clone().ok_or_else(|| {
            Error::validation(
                "equipment",
                format!("{} is not installed at a customer", equipment.number),
            )
        })?;
        let customer = self.get::<Customer>(&customer_id)?;

        input.previous_debt = customer.debt.max(Money::ZERO);
        let breakdown = billing::compute(&input)?;
        let mut record = Billing::new(&customer_id, equipment_id, &equipment.number, input, breakdown);
        record.notes = notes;

        let equipment_index = self.index_of::<Equipment>(equipment_id)?;
        let customer_index = self.index_of::<Customer>(&customer_id)?;
        let reading = record.input.current_reading;
        let new_debt = breakdown.new_debt;

        let writes = vec![
            self.set_write(&record)?,
            self.update_write::<Equipment>(equipment_id, json!({ "last_reading": reading })),
            self.update_write::<Customer>(&customer_id, json!({ "debt": new_debt })),
        ];

        let saved = record.clone();
        self.apply(writes, move |data| {
            data.billings.push(record);
            data.equipment[equipment_index].last_reading = reading;
            data.customers[customer_index].debt = new_debt;
        })
        .await?;

        info!(
            equipment = %saved.equipment_number,
            plays = breakdown.plays,
            new_debt = new_debt.cents(),
            "recorded billing"
        );
        Ok(saved)
    }

    /// Correct a past billing.
    ///
    /// Only the change in what the visit left owing reaches the customer's
    /// current debt. The machine's reading follows when this is its latest
    /// billing.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, [`Error::NotFound`], or the
    /// store's error.
    pub async fn edit_billing(
        &mut self,
        billing_id: &str,
        edited: BillingInput,
        notes: Option<String>,
    ) -> Result<Billing> {
        let billing_index = self.index_of::<Billing>(billing_id)?;
        let original = self.data.billings[billing_index].clone();
        let outcome = billing::recompute_for_edit(&original.breakdown, &edited)?;

        let mut updated = original.clone();
        updated.input = outcome.input;
        updated.breakdown = outcome.breakdown;
        if notes.is_some() {
            updated.notes = notes;
        }

        let mut writes = vec![self.set_write(&updated)?];

        let customer = self.find_index::<Customer>(&original.customer_id).map(|i| {
            let debt = (self.data.customers[i].debt + outcome.debt_adjustment).max(Money::ZERO);
            (i, debt)
        });
        if let Some((_, debt)) = customer {
            writes.push(self.update_write::<Customer>(&original.customer_id, json!({ "debt": debt })));
        }

        let reading = updated.input.current_reading;
        let equipment = self
            .is_latest_billing(&original)
            .then(|| self.find_index::<Equipment>(&original.equipment_id))
            .flatten();
        if equipment.is_some() {
            writes.push(self.update_write::<Equipment>(&original.equipment_id, json!({ "last_reading": reading })));
        }

        let saved = updated.clone();
        self.apply(writes, move |data| {
            data.billings[billing_index] = updated;
            if let Some((i, debt)) = customer {
                data.customers[i].debt = debt;
            }
            if let Some(i) = equipment {
                data.equipment[i].last_reading = reading;
            }
        })
        .await?;

        info!(
            billing = billing_id,
            adjustment = outcome.debt_adjustment.cents(),
            "edited billing"
        );
        Ok(saved)
    }

    /// Delete a billing and undo its effect on the customer's debt.
    ///
    /// The machine's reading goes back to the previous one when this was its
    /// latest billing and the meter was not reset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn delete_billing(&mut self, billing_id: &str) -> Result<Billing> {
        let billing_index = self.index_of::<Billing>(billing_id)?;
        let removed = self.data.billings[billing_index].clone();
        let added = removed.breakdown.new_debt - removed.breakdown.previous_debt;

        let mut writes = vec![self.delete_write::<Billing>(billing_id)];

        let customer = self.find_index::<Customer>(&removed.customer_id).map(|i| {
            let debt = (self.data.customers[i].debt - added).max(Money::ZERO);
            (i, debt)
        });
        if let Some((_, debt)) = customer {
            writes.push(self.update_write::<Customer>(&removed.customer_id, json!({ "debt": debt })));
        }

        let reading = removed.input.previous_reading;
        let equipment = (!removed.input.meter_reset && self.is_latest_billing(&removed))
            .then(|| self.find_index::<Equipment>(&removed.equipment_id))
            .flatten();
        if equipment.is_some() {
            writes.push(self.update_write::<Equipment>(&removed.equipment_id, json!({ "last_reading": reading })));
        }

        self.apply(writes, move |data| {
            data.billings.remove(billing_index);
            if let Some((i, debt)) = customer {
                data.customers[i].debt = debt;
            }
            if let Some(i) = equipment {
                data.equipment[i].last_reading = reading;
            }
        })
        .await?;

        info!(billing = billing_id, reversed = added.cents(), "deleted billing");
        Ok(removed)
    }

    /// Take a payment against a customer's debt.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount or one above the
    /// debt, [`Error::NotFound`], or the store's error.
    pub async fn pay_debt(
        &mut self,
        customer_id: &str,
        amount: Money,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<DebtPayment> {
        let customer_index = self.index_of::<Customer>(customer_id)?;
        let customer = &self.data.customers[customer_index];
        let mut payment = DebtPayment::new(customer_id, amount, method, customer.debt);
        payment.notes = notes;
        validation::validate_debt_payment(&payment, customer)?;

        let debt = payment.debt_after();
        let writes = vec![
            self.set_write(&payment)?,
            self.update_write::<Customer>(customer_id, json!({ "debt": debt })),
        ];

        let saved = payment.clone();
        self.apply(writes, move |data| {
            data.debt_payments.push(payment);
            data.customers[customer_index].debt = debt;
        })
        .await?;

        info!(amount = amount.cents(), remaining = debt.cents(), "debt payment");
        Ok(saved)
    }

    /// Record an expense.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad form, or the store's error.
    pub async fn add_expense(&mut self, expense: Expense) -> Result<()> {
        validation::validate_expense(&expense)?;
        self.insert(expense).await
    }

    /// Delete an expense.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn delete_expense(&mut self, id: &str) -> Result<Expense> {
        self.remove(id).await
    }

    /// Raise a warning.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty message, [`Error::NotFound`]
    /// for unknown references, or the store's error.
    pub async fn add_warning(&mut self, warning: Warning) -> Result<()> {
        if warning.message.trim().is_empty() {
            return Err(Error::validation("message", "must not be empty"));
        }
        if let Some(customer_id) = &warning.customer_id {
            self.get::<Customer>(customer_id)?;
        }
        if let Some(equipment_id) = &warning.equipment_id {
            self.get::<Equipment>(equipment_id)?;
        }
        self.insert(warning).await
    }

    /// Mark a warning as dealt with. Resolving twice keeps the first date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn resolve_warning(&mut self, id: &str) -> Result<()> {
        let index = self.index_of::<Warning>(id)?;
        if self.data.warnings[index].is_resolved() {
            return Ok(());
        }
        let now = Utc::now();
        let write = self.update_write::<Warning>(id, json!({ "resolved_at": now }));
        self.apply(vec![write], move |data| data.warnings[index].resolved_at = Some(now))
            .await
    }

    /// Create or replace a route.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or repeated stop,
    /// [`Error::NotFound`] for unknown customers, or the store's error.
    pub async fn save_route(&mut self, route: Route) -> Result<()> {
        if route.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        for (i, customer_id) in route.customer_ids.iter().enumerate() {
            self.get::<Customer>(customer_id)?;
            if route.customer_ids[..i].contains(customer_id) {
                return Err(Error::validation(
                    "customer_ids",
                    format!("customer {customer_id} appears twice"),
                ));
            }
        }
        if self.find::<Route>(&route.id).is_some() {
            self.replace(route).await
        } else {
            self.insert(route).await
        }
    }

    /// Reorder a route's stops by nearest neighbour from `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn optimize_route(&mut self, route_id: &str, start: Option<GeoPoint>) -> Result<Route> {
        let index = self.index_of::<Route>(route_id)?;
        let route = &self.data.routes[index];
        let stops: Vec<Stop<'_>> = route
            .customer_ids
            .iter()
            .map(|id| Stop {
                id: id.as_str(),
                location: self.find::<Customer>(id).and_then(|c| c.location),
            })
            .collect();
        let ordered = order_stops(start, &stops);

        let mut updated = route.clone();
        updated.customer_ids = ordered;
        let write = self.update_write::<Route>(route_id, json!({ "customer_ids": updated.customer_ids }));

        let saved = updated.clone();
        self.apply(vec![write], move |data| data.routes[index] = updated)
            .await?;
        info!(route = %saved.name, stops = saved.len(), "optimized route");
        Ok(saved)
    }

    /// Delete a route. Customers stay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the store's error.
    pub async fn delete_route(&mut self, id: &str) -> Result<Route> {
        self.remove(id).await
    }

    fn find_index<R: super::Stored>(&self, id: &str) -> Option<usize> {
        R::all(&self.data).iter().position(|r| r.id() == id)
    }

    /// Whether no later billing exists for the same machine.
    fn is_latest_billing(&self, billing: &Billing) -> bool {
        !self
            .data
            .billings
            .iter()
            .any(|b| b.id != billing.id && b.equipment_id == billing.equipment_id && b.date > billing.date)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{EquipmentKind, ExpenseCategory};
    use crate::money::Percent;
    use crate::state::test_support::state_with;
    use crate::store::testing::FlakyStore;
    use crate::store::DocumentStore;

    struct Fixture {
        store: Arc<FlakyStore>,
        state: AppState,
        customer_id: String,
        equipment_id: String,
    }

    /// A bar owing R$ 10 with a pool table at reading 100, R$ 2 a play, 40 % to the bar.
    async fn fixture() -> Fixture {
        let store = Arc::new(FlakyStore::new());
        let mut state = state_with(store.clone());

        let mut customer = Customer::new("Bar do Zé");
        customer.debt = Money::from_units(10);
        let customer_id = customer.id.clone();
        state.add_customer(customer).await.unwrap();

        let table = Equipment::new(
            "S-01",
            EquipmentKind::PoolTable,
            Money::from_units(2),
            Percent::whole(40),
        )
        .installed_at(&customer_id)
        .with_reading(100);
        let equipment_id = table.id.clone();
        state.add_equipment(table).await.unwrap();

        Fixture {
            store,
            state,
            customer_id,
            equipment_id,
        }
    }

    fn input_at(f: &Fixture, reading: u64) -> BillingInput {
        BillingInput::for_equipment(
            f.state.get::<Equipment>(&f.equipment_id).unwrap(),
            f.state.get::<Customer>(&f.customer_id).unwrap(),
            reading,
        )
    }

    fn debt(f: &Fixture) -> Money {
        f.state.get::<Customer>(&f.customer_id).unwrap().debt
    }

    fn reading(f: &Fixture) -> u64 {
        f.state.get::<Equipment>(&f.equipment_id).unwrap().last_reading
    }

    #[tokio::test]
    async fn test_record_billing_updates_everything_in_one_batch() {
        let mut f = fixture().await;
        let batches = f.store.batches();
        let input = input_at(&f, 150).with_paid(Money::from_units(50));

        let billing = f
            .state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap();

        assert_eq!(billing.breakdown.plays, 50);
        assert_eq!(billing.breakdown.house_share, Money::from_units(60));
        assert_eq!(billing.breakdown.amount_due, Money::from_units(70));
        assert_eq!(billing.breakdown.new_debt, Money::from_units(20));
        assert_eq!(f.store.batches(), batches + 1);

        assert_eq!(debt(&f), Money::from_units(20));
        assert_eq!(reading(&f), 150);
        assert_eq!(f.state.billings().len(), 1);

        let doc = f
            .store
            .get("accounts/test/customers", &f.customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["debt"], 2000);
        let doc = f
            .store
            .get("accounts/test/equipment", &f.equipment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["last_reading"], 150);
    }

    #[tokio::test]
    async fn test_record_billing_uses_current_debt() {
        let mut f = fixture().await;
        let mut input = input_at(&f, 110);
        input.previous_debt = Money::ZERO;
        let billing = f
            .state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap();
        assert_eq!(billing.breakdown.previous_debt, Money::from_units(10));
    }

    #[tokio::test]
    async fn test_failed_billing_rolls_back_all_records() {
        let mut f = fixture().await;
        let input = input_at(&f, 150).with_paid(Money::from_units(50));

        f.store.set_failing(true);
        let result = f.state.record_billing(&f.equipment_id.clone(), input, None).await;
        assert!(result.is_err());
        assert!(f.state.billings().is_empty());
        assert_eq!(debt(&f), Money::from_units(10));
        assert_eq!(reading(&f), 100);
    }

    #[tokio::test]
    async fn test_backwards_counter_rejected() {
        let mut f = fixture().await;
        let input = input_at(&f, 90);
        let err = f
            .state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NegativeMeterDelta { .. }));
        assert!(f.state.billings().is_empty());
    }

    #[tokio::test]
    async fn test_cash_box_billing_requires_counted_amount() {
        let mut f = fixture().await;
        let jukebox = Equipment::new("J-01", EquipmentKind::Jukebox, Money::ZERO, Percent::whole(30))
            .installed_at(&f.customer_id)
            .with_reading(100);
        let jukebox_id = jukebox.id.clone();
        f.state.add_equipment(jukebox).await.unwrap();
        let batches = f.store.batches();

        let input = BillingInput::for_equipment(
            f.state.get::<Equipment>(&jukebox_id).unwrap(),
            f.state.get::<Customer>(&f.customer_id).unwrap(),
            400,
        );
        let err = f.state.record_billing(&jukebox_id, input, None).await.unwrap_err();

        assert!(err.is_validation_error());
        assert!(f.state.billings().is_empty());
        assert_eq!(f.state.get::<Equipment>(&jukebox_id).unwrap().last_reading, 100);
        assert_eq!(debt(&f), Money::from_units(10));
        assert_eq!(f.store.batches(), batches);
    }

    #[tokio::test]
    async fn test_uninstalled_equipment_cannot_be_billed() {
        let mut f = fixture().await;
        let id = f.equipment_id.clone();
        f.state.install_equipment(&id, None).await.unwrap();
        let input = input_at(&f, 150);
        let err = f.state.record_billing(&id, input, None).await.unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_offline_billing_queues_one_replayable_group() {
        let mut f = fixture().await;
        f.state.set_online(false).await.unwrap();
        let input = input_at(&f, 150).with_paid(Money::from_units(50));
        f.state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap();

        assert_eq!(f.state.queue().len().unwrap(), 3);
        assert_eq!(debt(&f), Money::from_units(20));

        let batches = f.store.batches();
        f.state.set_online(true).await.unwrap();
        assert_eq!(f.store.batches(), batches + 1);
        let doc = f
            .store
            .get("accounts/test/customers", &f.customer_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["debt"], 2000);
    }

    #[tokio::test]
    async fn test_edit_billing_moves_debt_by_difference() {
        let mut f = fixture().await;
        let input = input_at(&f, 150).with_paid(Money::from_units(50));
        let billing = f
            .state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap();

        let mut edited = billing.input.clone();
        edited.current_reading = 160;
        let updated = f
            .state
            .edit_billing(&billing.id, edited, Some("recontado".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.breakdown.previous_debt, Money::from_units(10));
        assert_eq!(updated.breakdown.new_debt, Money::from_units(32));
        assert_eq!(updated.notes.as_deref(), Some("recontado"));
        assert_eq!(debt(&f), Money::from_units(32));
        assert_eq!(reading(&f), 160);
    }

    #[tokio::test]
    async fn test_delete_billing_reverses_debt_and_reading() {
        let mut f = fixture().await;
        let input = input_at(&f, 150).with_paid(Money::from_units(50));
        let billing = f
            .state
            .record_billing(&f.equipment_id.clone(), input, None)
            .await
            .unwrap();

        f.state.delete_billing(&billing.id).await.unwrap();
        assert!(f.state.billings().is_empty());
        assert_eq!(debt(&f), Money::from_units(10));
        assert_eq!(reading(&f), 100);
    }

    #[tokio::test]
    async fn test_pay_debt() {
        let mut f = fixture().await;
        let id = f.customer_id.clone();
        let payment = f
            .state
            .pay_debt(&id, Money::from_units(4), PaymentMethod::Pix, None)
            .await
            .unwrap();
        assert_eq!(payment.debt_before, Money::from_units(10));
        assert_eq!(debt(&f), Money::from_units(6));
        assert_eq!(f.state.debt_payments().len(), 1);

        let err = f
            .state
            .pay_debt(&id, Money::from_units(7), PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(debt(&f), Money::from_units(6));
    }

    #[tokio::test]
    async fn test_duplicate_equipment_number_not_written() {
        let mut f = fixture().await;
        let batches = f.store.batches();
        let copy = Equipment::new(
            " s-01",
            EquipmentKind::Jukebox,
            Money::ZERO,
            Percent::whole(50),
        );
        let err = f.state.add_equipment(copy).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateEquipmentNumber { .. }));
        assert_eq!(f.state.equipment().len(), 1);
        assert_eq!(f.store.batches(), batches);
    }

    #[tokio::test]
    async fn test_customer_with_impossible_location_not_written() {
        let mut f = fixture().await;
        let batches = f.store.batches();
        let customer = Customer::new("Bar Longe").with_location(GeoPoint::new(999.0, 10.0));
        let err = f.state.add_customer(customer).await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(f.state.customers().len(), 1);
        assert_eq!(f.store.batches(), batches);
    }

    #[tokio::test]
    async fn test_customer_with_equipment_cannot_be_deleted() {
        let mut f = fixture().await;
        let customer_id = f.customer_id.clone();
        let mut route = Route::new("Segunda");
        route.customer_ids.push(customer_id.clone());
        let route_id = route.id.clone();
        f.state.save_route(route).await.unwrap();

        assert!(f.state.delete_customer(&customer_id).await.is_err());

        let equipment_id = f.equipment_id.clone();
        f.state.install_equipment(&equipment_id, None).await.unwrap();
        let removed = f.state.delete_customer(&customer_id).await.unwrap();
        assert_eq!(removed.name, "Bar do Zé");
        assert!(f.state.customers().is_empty());
        assert!(f.state.get::<Route>(&route_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_warnings() {
        let mut f = fixture().await;
        let warning = Warning::new("Taco quebrado").for_equipment(&f.equipment_id);
        let id = warning.id.clone();
        f.state.add_warning(warning).await.unwrap();
        assert!(f.state.add_warning(Warning::new("  ")).await.is_err());
        assert!(f
            .state
            .add_warning(Warning::new("x").for_customer("nobody"))
            .await
            .unwrap_err()
            .is_not_found());

        f.state.resolve_warning(&id).await.unwrap();
        let resolved_at = f.state.get::<Warning>(&id).unwrap().resolved_at;
        assert!(resolved_at.is_some());
        f.state.resolve_warning(&id).await.unwrap();
        assert_eq!(f.state.get::<Warning>(&id).unwrap().resolved_at, resolved_at);
    }

    #[tokio::test]
    async fn test_expenses() {
        let mut f = fixture().await;
        let expense = Expense::new("Pano de mesa", ExpenseCategory::Parts, Money::from_units(120));
        let id = expense.id.clone();
        f.state.add_expense(expense).await.unwrap();
        assert_eq!(f.state.expenses().len(), 1);
        f.state.delete_expense(&id).await.unwrap();
        assert!(f.state.expenses().is_empty());
        assert!(f.state.delete_expense(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_optimize_route() {
        let mut f = fixture().await;
        let mut ids = Vec::new();
        for (name, lon) in [("Longe", 3.0), ("Perto", 1.0), ("Meio", 2.0)] {
            let customer = Customer::new(name).with_location(GeoPoint::new(0.0, lon));
            ids.push(customer.id.clone());
            f.state.add_customer(customer).await.unwrap();
        }
        let mut route = Route::new("Centro");
        route.customer_ids = ids.clone();
        let route_id = route.id.clone();
        f.state.save_route(route).await.unwrap();

        let optimized = f
            .state
            .optimize_route(&route_id, Some(GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap();
        assert_eq!(optimized.customer_ids, vec![ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert_eq!(f.state.get::<Route>(&route_id).unwrap(), &optimized);
    }

    #[tokio::test]
    async fn test_route_rejects_unknown_and_repeated_customers() {
        let mut f = fixture().await;
        let mut route = Route::new("Norte");
        route.customer_ids = vec!["ghost".to_string()];
        assert!(f.state.save_route(route).await.unwrap_err().is_not_found());

        let mut route = Route::new("Norte");
        route.customer_ids = vec![f.customer_id.clone(), f.customer_id.clone()];
        assert!(f.state.save_route(route).await.unwrap_err().is_validation_error());
    }
}
