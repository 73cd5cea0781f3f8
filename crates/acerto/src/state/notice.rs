use std::fmt;

use crate::error::Error;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// The action went through.
    Success,
    /// Something worth knowing, not a failure.
    Info,
    /// The action failed and was undone.
    Error,
}

/// Short message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the operator.
    pub message: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Turn a failed action into a notice.
    ///
    /// Input errors are shown as they are; anything else is reported as a
    /// failed save, since the local change has already been undone.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let message = if err.is_validation_error() || err.is_not_found() {
            err.to_string()
        } else if matches!(err, Error::SyncInProgress) {
            "sync already running, try again shortly".to_string()
        } else {
            format!("could not save changes: {err}")
        };
        Self {
            level: NoticeLevel::Error,
            message,
        }
    }

    /// Whether this reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}
