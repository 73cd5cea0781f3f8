//! Error types for acerto.
//!
//! This module defines all error types used throughout the acerto crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for acerto operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create a database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Domain Errors ===
    /// A form field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// Another piece of equipment already uses this number.
    #[error("equipment number '{number}' is already in use")]
    DuplicateEquipmentNumber {
        /// The conflicting number.
        number: String,
    },

    /// A monetary or numeric input could not be parsed.
    #[error("invalid amount: '{input}'")]
    InvalidAmount {
        /// The raw input.
        input: String,
    },

    /// The current meter reading is below the previous one.
    #[error("current reading {current} is below previous reading {previous}")]
    NegativeMeterDelta {
        /// Reading at the previous visit.
        previous: u64,
        /// Reading entered now.
        current: u64,
    },

    /// A percentage outside 0..=100.
    #[error("percentage out of range: {value}")]
    PercentOutOfRange {
        /// The rejected value, as entered.
        value: String,
    },

    /// A record was not found.
    #[error("{collection} '{id}' not found")]
    NotFound {
        /// Collection searched.
        collection: String,
        /// Identifier searched for.
        id: String,
    },

    // === Store Errors ===
    /// The document store rejected or failed a request.
    #[error("store error: {0}")]
    Store(String),

    /// A queue replay is already running.
    #[error("offline queue replay already in progress")]
    SyncInProgress,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for acerto operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a field validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error came from user input rather than the environment.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::DuplicateEquipmentNumber { .. }
                | Self::InvalidAmount { .. }
                | Self::NegativeMeterDelta { .. }
                | Self::PercentOutOfRange { .. }
        )
    }

    /// Check if this error is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
