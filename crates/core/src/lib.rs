//! `bankd-core` — banking domain building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no sockets, no locks).

pub mod amount;
pub mod error;
pub mod id;
pub mod name;

pub use amount::Amount;
pub use error::{BankError, BankResult, StateError};
pub use id::ConnectionId;
pub use name::AccountName;
