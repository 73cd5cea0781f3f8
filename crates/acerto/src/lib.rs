//! `acerto` - route collection and billing for coin and ficha machines
//!
//! This library keeps the records of an operator who places pool tables,
//! jukeboxes and claw machines in bars: customers, equipment, visits
//! ("acertos"), debt payments, expenses, warnings and routes. It computes
//! each visit's split, prints receipts and PIX codes, summarizes periods,
//! and keeps working offline by queueing writes for the document store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod billing;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod money;
pub mod offline;
pub mod pix;
pub mod receipt;
pub mod report;
pub mod routing;
pub mod state;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use money::{Locale, Money, Percent};
pub use offline::{OfflineQueue, ReplayReport};
pub use state::{AppState, Collections, Notice, NoticeLevel};
pub use store::{DocumentStore, LocalStore, SqliteDocumentStore, StoreStats};
