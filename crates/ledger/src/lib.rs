//! Shared account ledger.
//!
//! One coarse lock serializes every operation; callers never see the lock.

pub mod ledger;

pub use ledger::{Account, AccountSnapshot, Ledger};
