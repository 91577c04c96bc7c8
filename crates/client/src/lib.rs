//! Thin client for the banking server.
//!
//! Formats commands, validates arguments before they leave the process, and
//! reads replies. All banking rules live on the server.

pub mod client;
pub mod input;

pub use client::{BankClient, ClientError};
pub use input::validate;
