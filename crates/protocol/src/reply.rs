//! Success replies and server notices.
//!
//! Failure replies are the `Display` text of `bankd_core::BankError`.

use bankd_core::{AccountName, Amount};

/// Acknowledgement of `quit`; also the last message of a server-initiated close.
pub const QUIT: &str = "quit";

/// Sent to every connected client when the server starts shutting down.
pub const SHUTDOWN_NOTICE: &str = "now server shutdown!!";

pub const SESSION_END: &str = "ok: service session end!!";

/// Prefix of every successful session reply.
pub const OK_PREFIX: &str = "ok:";

/// Prefix of every failure reply except `create`'s duplicate-name reply.
pub const ERROR_PREFIX: &str = "Error:";

pub fn created(name: &AccountName) -> String {
    format!("account [{name}] created!")
}

pub fn serving(name: &AccountName) -> String {
    format!("ok: you're in service session! [{name}]")
}

pub fn deposited(amount: Amount, name: &AccountName) -> String {
    format!("ok: success deposit [{amount}] to account [{name}]")
}

pub fn withdrew(amount: Amount, name: &AccountName, balance: Amount) -> String {
    format!("ok: success withdraw [{amount}] to account [{name}], balance: [{balance}]")
}

pub fn balance(name: &AccountName, balance: Amount) -> String {
    format!("ok: balance of [{name}] is [{balance}]")
}
