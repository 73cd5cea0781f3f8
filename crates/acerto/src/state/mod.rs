//! Application state with optimistic writes.
//!
//! Every action changes the in-memory collections first. When online the
//! matching writes go to the document store as one batch and the local change
//! is undone if the batch fails; when offline the writes are queued and the
//! local change stays.

mod actions;
mod notice;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Billing, Customer, DebtPayment, Equipment, Expense, Record, Route, Warning};
use crate::offline::{OfflineQueue, ReplayReport};
use crate::store::{collection_path, DocumentStore, Write};

pub use notice::{Notice, NoticeLevel};

/// Every record of an account, as held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    /// Customers.
    #[serde(default)]
    pub customers: Vec<Customer>,
    /// Equipment.
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    /// Billings.
    #[serde(default)]
    pub billings: Vec<Billing>,
    /// Debt payments.
    #[serde(default)]
    pub debt_payments: Vec<DebtPayment>,
    /// Expenses.
    #[serde(default)]
    pub expenses: Vec<Expense>,
    /// Warnings.
    #[serde(default)]
    pub warnings: Vec<Warning>,
    /// Routes.
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// A record type with a home in [`Collections`].
pub trait Stored: Record {
    /// The records of this type.
    fn all(data: &Collections) -> &Vec<Self>;

    /// The records of this type, mutably.
    fn all_mut(data: &mut Collections) -> &mut Vec<Self>;
}

macro_rules! impl_stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn all(data: &Collections) -> &Vec<Self> {
                &data.$field
            }

            fn all_mut(data: &mut Collections) -> &mut Vec<Self> {
                &mut data.$field
            }
        }
    };
}

impl_stored!(Customer, customers);
impl_stored!(Equipment, equipment);
impl_stored!(Billing, billings);
impl_stored!(DebtPayment, debt_payments);
impl_stored!(Expense, expenses);
impl_stored!(Warning, warnings);
impl_stored!(Route, routes);

/// In-memory view of one account, kept in step with the document store.
#[derive(Debug)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    queue: OfflineQueue,
    account: String,
    online: bool,
    data: Collections,
}

impl AppState {
    /// Create an empty, online state.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, queue: OfflineQueue, account: impl Into<String>) -> Self {
        Self {
            store,
            queue,
            account: account.into(),
            online: true,
            data: Collections::default(),
        }
    }

    /// Builder: start offline.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Account scope of document paths.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Whether writes go straight to the store.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// The offline queue.
    #[must_use]
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// All records.
    #[must_use]
    pub fn data(&self) -> &Collections {
        &self.data
    }

    /// Customers.
    #[must_use]
    pub fn customers(&self) -> &[Customer] {
        &self.data.customers
    }

    /// Equipment.
    #[must_use]
    pub fn equipment(&self) -> &[Equipment] {
        &self.data.equipment
    }

    /// Billings.
    #[must_use]
    pub fn billings(&self) -> &[Billing] {
        &self.data.billings
    }

    /// Debt payments.
    #[must_use]
    pub fn debt_payments(&self) -> &[DebtPayment] {
        &self.data.debt_payments
    }

    /// Expenses.
    #[must_use]
    pub fn expenses(&self) -> &[Expense] {
        &self.data.expenses
    }

    /// Warnings.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.data.warnings
    }

    /// Routes.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.data.routes
    }

    /// Look up a record by id.
    #[must_use]
    pub fn find<R: Stored>(&self, id: &str) -> Option<&R> {
        R::all(&self.data).iter().find(|r| r.id() == id)
    }

    /// Look up a record by id, failing with [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub fn get<R: Stored>(&self, id: &str) -> Result<&R> {
        self.find(id).ok_or_else(|| Error::not_found(R::COLLECTION, id))
    }

    /// Equipment installed at a customer.
    pub fn equipment_at<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a Equipment> {
        self.data
            .equipment
            .iter()
            .filter(move |e| e.customer_id.as_deref() == Some(customer_id))
    }

    /// Billings of a customer, newest first.
    #[must_use]
    pub fn billings_for(&self, customer_id: &str) -> Vec<&Billing> {
        let mut billings: Vec<_> = self
            .data
            .billings
            .iter()
            .filter(|b| b.customer_id == customer_id)
            .collect();
        billings.sort_by(|a, b| b.date.cmp(&a.date));
        billings
    }

    /// Fetch every collection from the store.
    ///
    /// Pending offline writes are replayed first so the fetch sees them.
    /// The result is cached locally for [`load_cached`](Self::load_cached).
    ///
    /// # Errors
    ///
    /// Returns the store's error if the replay or a fetch fails; the current
    /// data is left untouched in that case.
    pub async fn load(&mut self) -> Result<()> {
        if !self.queue.is_empty()? {
            self.queue.replay(self.store.as_ref()).await?;
        }

        let data = Collections {
            customers: self.fetch().await?,
            equipment: self.fetch().await?,
            billings: self.fetch().await?,
            debt_payments: self.fetch().await?,
            expenses: self.fetch().await?,
            warnings: self.fetch().await?,
            routes: self.fetch().await?,
        };
        info!(
            account = %self.account,
            customers = data.customers.len(),
            equipment = data.equipment.len(),
            billings = data.billings.len(),
            "loaded account"
        );
        self.data = data;
        self.online = true;
        self.save_snapshot();
        Ok(())
    }

    /// Restore the last cached snapshot.
    ///
    /// Returns whether a snapshot was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read.
    pub fn load_cached(&mut self) -> Result<bool> {
        match self.queue.local().get_json::<Collections>(&self.snapshot_key())? {
            Some(data) => {
                debug!(account = %self.account, "restored cached snapshot");
                self.data = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Switch connectivity. Going online replays the offline queue.
    ///
    /// # Errors
    ///
    /// Returns the replay error; the state then stays offline and the queue
    /// keeps its writes.
    pub async fn set_online(&mut self, online: bool) -> Result<Option<ReplayReport>> {
        if !online {
            if self.online {
                info!("working offline");
            }
            self.online = false;
            return Ok(None);
        }

        let report = self.queue.replay(self.store.as_ref()).await?;
        if !self.online {
            info!(replayed = report.replayed, "back online");
        }
        self.online = true;
        Ok(Some(report))
    }

    async fn fetch<R: Stored>(&self) -> Result<Vec<R>> {
        let docs = self.store.list(&self.path::<R>()).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match R::from_document(doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!(collection = R::COLLECTION, "skipping unreadable document: {e}"),
            }
        }
        Ok(records)
    }

    fn path<R: Record>(&self) -> String {
        collection_path(&self.account, R::COLLECTION)
    }

    fn snapshot_key(&self) -> String {
        format!("snapshot/{}", self.account)
    }

    fn save_snapshot(&self) {
        if let Err(e) = self.queue.local().put_json(&self.snapshot_key(), &self.data) {
            warn!("failed to cache snapshot: {e}");
        }
    }

    /// Write replacing a whole record.
    fn set_write<R: Record>(&self, record: &R) -> Result<Write> {
        Ok(Write::set(self.path::<R>(), record.id(), record.to_document()?))
    }

    /// Write merging `patch` into a record.
    fn update_write<R: Record>(&self, id: &str, patch: serde_json::Value) -> Write {
        Write::update(self.path::<R>(), id, patch)
    }

    /// Write removing a record.
    fn delete_write<R: Record>(&self, id: &str) -> Write {
        Write::delete(self.path::<R>(), id)
    }

    fn index_of<R: Stored>(&self, id: &str) -> Result<usize> {
        R::all(&self.data)
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::not_found(R::COLLECTION, id))
    }

    /// Apply `change` locally, then persist `writes`.
    ///
    /// Online, a failed batch restores the data as it was before `change`.
    /// Offline, the writes are queued.
    async fn apply<F>(&mut self, writes: Vec<Write>, change: F) -> Result<()>
    where
        F: FnOnce(&mut Collections),
    {
        let before = self.data.clone();
        change(&mut self.data);

        if self.online {
            if let Err(e) = self.store.commit_batch(&writes).await {
                warn!(writes = writes.len(), "write failed, rolling back: {e}");
                self.data = before;
                return Err(e);
            }
            debug!(writes = writes.len(), "write committed");
        } else if let Err(e) = self.queue.enqueue_all(writes) {
            warn!("could not queue offline write, rolling back: {e}");
            self.data = before;
            return Err(e);
        }

        self.save_snapshot();
        Ok(())
    }

    async fn insert<R: Stored>(&mut self, record: R) -> Result<()> {
        if self.find::<R>(record.id()).is_some() {
            return Err(Error::validation("id", format!("{} already exists", record.id())));
        }
        let write = self.set_write(&record)?;
        self.apply(vec![write], move |data| R::all_mut(data).push(record))
            .await
    }

    async fn replace<R: Stored>(&mut self, record: R) -> Result<()> {
        let index = self.index_of::<R>(record.id())?;
        let write = self.set_write(&record)?;
        self.apply(vec![write], move |data| R::all_mut(data)[index] = record)
            .await
    }

    async fn remove<R: Stored>(&mut self, id: &str) -> Result<R> {
        let index = self.index_of::<R>(id)?;
        let removed = R::all(&self.data)[index].clone();
        let write = self.delete_write::<R>(id);
        self.apply(vec![write], move |data| {
            R::all_mut(data).remove(index);
        })
        .await?;
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::store::testing::FlakyStore;
    use crate::store::LocalStore;

    pub(crate) fn state_with(store: Arc<FlakyStore>) -> AppState {
        let queue = OfflineQueue::open(LocalStore::open_in_memory().expect("local store"));
        AppState::new(store, queue, "test")
    }
}
