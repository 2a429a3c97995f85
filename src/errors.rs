//! Unified error types and result handling.
//!
//! Every core operation returns [`Result`]; the `Display` impl of each
//! variant is the user-facing message the caller surfaces. Storage errors
//! pass through as [`Error::Database`] except unique-constraint violations,
//! which the identity module maps to [`Error::CredentialsTaken`].

use thiserror::Error;

/// Unified error type for all core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input failed validation (malformed strings, out-of-range values).
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("User '{username}' not found")]
    UserNotFound { username: String },

    #[error("Invitation {id} not found or already resolved")]
    InvitationNotFound { id: i64 },

    #[error("Couple {id} not found")]
    CoupleNotFound { id: i64 },

    #[error("Category '{name}' not found")]
    CategoryNotFound { name: String },

    #[error("Transaction {id} not found")]
    TransactionNotFound { id: i64 },

    #[error("Recurring transaction {id} not found")]
    RecurringNotFound { id: i64 },

    #[error("Cannot send a pairing invitation to yourself")]
    SelfPairing,

    #[error("Already paired with this user")]
    AlreadyPaired,

    #[error("A pending invitation already exists between these users")]
    DuplicateInvitation,

    #[error("Username or email already exists")]
    CredentialsTaken,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Not permitted: {message}")]
    Unauthorized { message: String },

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Shorthand for an [`Error::Unauthorized`] with a formatted message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Error::Unauthorized {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
