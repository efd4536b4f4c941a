// src/utils/error.rs

use crate::services::core::infrastructure::StoreError;
use crate::services::core::ledger::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type EconomyResult<T> = Result<T, EconomyError>;

/// Custom error details for additional context
pub type ErrorDetails = HashMap<String, serde_json::Value>;

/// Reply sent when a guild or member has no stored data yet.
pub const DATA_NOT_FOUND_MESSAGE: &str = "Data not found. Try $refresh";

/// Error returned by the economy service to command handlers.
///
/// `ledger` carries the typed ledger failure when there is one, so handlers
/// can branch on it; `message` is always fit to show the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyError {
    pub message: String,
    pub details: Option<Box<ErrorDetails>>,
    pub error_code: Option<String>,
    pub kind: ErrorKind,
    pub ledger: Option<LedgerError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[default]
    UnknownError,
    ValidationError,
    NotFoundError,
    ConflictError,
    RateLimitError,
    ConfigurationError,
    SerializationError,
    StorageError,
    Internal,
}

impl fmt::Display for EconomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EconomyError {}

impl EconomyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            error_code: None,
            kind,
            ledger: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(Box::new(details));
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// The ledger failure behind this error, if any.
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        self.ledger.as_ref()
    }

    /// Expected outcomes of user input, as opposed to storage or config faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValidationError
                | ErrorKind::NotFoundError
                | ErrorKind::ConflictError
                | ErrorKind::RateLimitError
        )
    }

    // Convenience constructors for common error types
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message).with_code("VALIDATION_ERROR")
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::NotFoundError, message).with_code("NOT_FOUND")
    }

    pub fn data_not_found() -> Self {
        Self::not_found(DATA_NOT_FOUND_MESSAGE).with_code("DATA_NOT_FOUND")
    }

    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictError, message).with_code("CONFLICT")
    }

    pub fn rate_limit_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::RateLimitError, message).with_code("COOLDOWN")
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationError, message).with_code("CONFIG_ERROR")
    }

    pub fn serialization_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::SerializationError, message).with_code("SERIALIZATION_ERROR")
    }

    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageError, message).with_code("STORAGE_ERROR")
    }

    pub fn internal_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Internal, message).with_code("INTERNAL_ERROR")
    }
}

impl From<LedgerError> for EconomyError {
    fn from(err: LedgerError) -> Self {
        let base = match &err {
            LedgerError::MemberNotFound(member_id) => {
                EconomyError::data_not_found().with_detail("member_id", *member_id)
            }
            LedgerError::MemberExists(member_id) => {
                EconomyError::conflict_error(err.to_string()).with_detail("member_id", *member_id)
            }
            LedgerError::OnCooldown { remaining_minutes } => {
                EconomyError::rate_limit_error(err.to_string())
                    .with_detail("remaining_minutes", *remaining_minutes)
            }
            LedgerError::NoSharedHistory { .. } => EconomyError::not_found(err.to_string()),
            LedgerError::InsufficientFunds { balance, .. } => {
                EconomyError::validation_error(err.to_string()).with_detail("balance", *balance)
            }
            LedgerError::InvalidAmount
            | LedgerError::InvalidName
            | LedgerError::InvalidOpponent
            | LedgerError::InvalidReceiver
            | LedgerError::InvalidPair => EconomyError::validation_error(err.to_string()),
        };
        EconomyError {
            ledger: Some(err),
            ..base
        }
    }
}

impl From<StoreError> for EconomyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(guild_id) => {
                EconomyError::data_not_found().with_detail("guild_id", guild_id)
            }
            StoreError::Io(e) => EconomyError::storage_error(format!("Record storage failed: {}", e)),
            StoreError::Serialization(e) => {
                EconomyError::serialization_error(format!("Stored record is not valid JSON: {}", e))
            }
            StoreError::Mismatch { expected, found } => EconomyError::internal_error(format!(
                "Record for guild {} cannot be stored under guild {}",
                found, expected
            )),
            StoreError::MemberKeyMismatch { guild_id, key, found } => {
                EconomyError::serialization_error(format!(
                    "Stored record for guild {} files member {} under key {:?}",
                    guild_id, found, key
                ))
                .with_detail("guild_id", guild_id)
            }
        }
    }
}

// Helper macro for creating errors with context
#[macro_export]
macro_rules! economy_error {
    ($kind:expr, $msg:expr) => {
        $crate::utils::error::EconomyError::new($kind, $msg)
    };
    ($kind:expr, $msg:expr, $($key:expr => $value:expr),+) => {{
        let mut details = std::collections::HashMap::new();
        $(
            details.insert($key.to_string(), serde_json::json!($value));
        )+
        $crate::utils::error::EconomyError::new($kind, $msg).with_details(details)
    }};
}
