//! Banking error model.
//!
//! The `Display` output of every recoverable variant is the exact text a client
//! receives on the wire, so workers reply with `err.to_string()`.

use thiserror::Error;

use crate::{AccountName, Amount};

/// Result type used across the banking crates.
pub type BankResult<T> = Result<T, BankError>;

/// A command that is illegal in the current session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `create` while serving an account.
    #[error("Error: can't create account in service session!")]
    CreateInSession,

    /// `serve` while already serving an account.
    #[error("Error: you're already in service session!")]
    AlreadyInSession,

    /// A session-only command (`deposit`, `withdraw`, `query`, `end`) while idle.
    #[error("Error: {command} command is available in service session!")]
    NotInSession { command: &'static str },
}

/// Banking failure taxonomy.
///
/// Everything except [`BankError::ConnectionClosed`] is recovered inside the
/// connection worker and turned into a reply to the same client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Malformed or out-of-range command argument.
    #[error("Error: {0}")]
    Validation(String),

    /// Command not legal in the current session state.
    #[error(transparent)]
    State(#[from] StateError),

    #[error("Error: can't find account [{name}]")]
    NotFound { name: AccountName },

    #[error("[{name}] already exists!")]
    AlreadyExists { name: AccountName },

    #[error("Error: account [{name}] is already in use!!")]
    AlreadyInUse { name: AccountName },

    /// Withdrawal exceeds the current balance (balance left untouched).
    #[error("Error: balance is insufficient! balance: [{balance}]")]
    Insufficient { balance: Amount },

    #[error("Error: unknown command!")]
    UnknownCommand,

    /// Peer disconnected or the transport failed.
    #[error("connection closed")]
    ConnectionClosed,
}

impl BankError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(name: &AccountName) -> Self {
        Self::NotFound { name: name.clone() }
    }

    pub fn already_exists(name: &AccountName) -> Self {
        Self::AlreadyExists { name: name.clone() }
    }

    pub fn already_in_use(name: &AccountName) -> Self {
        Self::AlreadyInUse { name: name.clone() }
    }

    /// True for failures that end the connection rather than produce a reply.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}
