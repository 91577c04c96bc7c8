//! Per-connection session state machine.
//!
//! Command legality depends only on the session state and is checked before any
//! argument is validated or the ledger is touched.

use std::sync::Arc;

use tracing::{debug, info};

use bankd_core::{AccountName, Amount, BankResult, StateError};
use bankd_ledger::Ledger;
use bankd_protocol::{Request, Verb, reply};

/// Which account, if any, this connection currently serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InService(AccountName),
}

/// What the worker does after writing the reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Close,
}

/// Reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: String,
    pub disposition: Disposition,
}

impl Outcome {
    fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            disposition: Disposition::Continue,
        }
    }

    fn close(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            disposition: Disposition::Close,
        }
    }
}

/// Session of one connection.
///
/// Holds a claim on at most one account (by name; the account itself lives in
/// the ledger). The claim is released on `end`, on `quit`, and when the session
/// is dropped, so every way a worker can exit clears `in_session`.
#[derive(Debug)]
pub struct Session {
    ledger: Arc<Ledger>,
    state: SessionState,
}

impl Session {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_account(&self) -> Option<&AccountName> {
        match &self.state {
            SessionState::InService(name) => Some(name),
            SessionState::Idle => None,
        }
    }

    /// Handle one message and produce exactly one reply.
    pub fn handle(&mut self, message: &str) -> Outcome {
        match self.dispatch(message) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, "command rejected");
                Outcome::reply(err.to_string())
            }
        }
    }

    fn dispatch(&mut self, message: &str) -> BankResult<Outcome> {
        let request = Request::parse(message)?;
        debug!(command = %request.verb, "command received");

        match request.verb {
            Verb::Create => {
                self.ensure_idle(StateError::CreateInSession)?;
                let name: AccountName = request.required_argument()?.parse()?;
                self.ledger.create(&name)?;
                info!(account = %name, "account created");
                Ok(Outcome::reply(reply::created(&name)))
            }
            Verb::Serve => {
                self.ensure_idle(StateError::AlreadyInSession)?;
                let name: AccountName = request.required_argument()?.parse()?;
                self.ledger.begin_session(&name)?;
                info!(account = %name, "service session started");
                let out = reply::serving(&name);
                self.state = SessionState::InService(name);
                Ok(Outcome::reply(out))
            }
            Verb::Deposit => {
                let name = self.serving(request.verb)?;
                let amount = Amount::parse_positive(request.required_argument()?)?;
                self.ledger.deposit(name, amount)?;
                Ok(Outcome::reply(reply::deposited(amount, name)))
            }
            Verb::Withdraw => {
                let name = self.serving(request.verb)?;
                let amount = Amount::parse_positive(request.required_argument()?)?;
                let balance = self.ledger.withdraw(name, amount)?;
                Ok(Outcome::reply(reply::withdrew(amount, name, balance)))
            }
            Verb::Query => {
                let name = self.serving(request.verb)?;
                request.expect_no_argument()?;
                let balance = self.ledger.query(name)?;
                Ok(Outcome::reply(reply::balance(name, balance)))
            }
            Verb::End => {
                self.serving(request.verb)?;
                request.expect_no_argument()?;
                self.release();
                Ok(Outcome::reply(reply::SESSION_END))
            }
            Verb::Quit => {
                self.release();
                Ok(Outcome::close(reply::QUIT))
            }
        }
    }

    fn ensure_idle(&self, violation: StateError) -> Result<(), StateError> {
        match self.state {
            SessionState::Idle => Ok(()),
            SessionState::InService(_) => Err(violation),
        }
    }

    fn serving(&self, verb: Verb) -> Result<&AccountName, StateError> {
        self.active_account().ok_or(StateError::NotInSession {
            command: verb.as_str(),
        })
    }

    /// Give the served account back to the ledger. No-op when idle.
    pub fn release(&mut self) {
        if let SessionState::InService(name) =
            std::mem::replace(&mut self.state, SessionState::Idle)
        {
            self.ledger.end_session(&name);
            info!(account = %name, "service session ended");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}
