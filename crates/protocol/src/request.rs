//! Command decoding.

use core::fmt;

use bankd_core::{BankError, BankResult};

/// Command keyword.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Serve,
    Deposit,
    Withdraw,
    Query,
    End,
    Quit,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::Create,
        Verb::Serve,
        Verb::Deposit,
        Verb::Withdraw,
        Verb::Query,
        Verb::End,
        Verb::Quit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Serve => "serve",
            Verb::Deposit => "deposit",
            Verb::Withdraw => "withdraw",
            Verb::Query => "query",
            Verb::End => "end",
            Verb::Quit => "quit",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Verb> {
        Verb::ALL.into_iter().find(|v| v.as_str() == keyword)
    }

    /// Whether the verb carries exactly one argument.
    pub fn takes_argument(self) -> bool {
        matches!(
            self,
            Verb::Create | Verb::Serve | Verb::Deposit | Verb::Withdraw
        )
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded command: keyword plus its raw, still unvalidated argument.
///
/// Arguments are typed only after the session has checked that the verb is
/// legal in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub verb: Verb,
    pub argument: &'a str,
}

impl<'a> Request<'a> {
    /// Split a message into keyword and argument.
    ///
    /// Unknown keywords (including empty messages) are `UnknownCommand`.
    pub fn parse(message: &'a str) -> BankResult<Request<'a>> {
        let message = message.trim();
        let (keyword, argument) = match message.split_once(char::is_whitespace) {
            Some((k, rest)) => (k, rest.trim()),
            None => (message, ""),
        };

        let verb = Verb::from_keyword(keyword).ok_or(BankError::UnknownCommand)?;
        Ok(Request { verb, argument })
    }

    /// The argument of a one-argument verb; rejects a missing one.
    pub fn required_argument(&self) -> BankResult<&'a str> {
        if self.argument.is_empty() {
            return Err(BankError::validation(format!(
                "{} requires an argument",
                self.verb
            )));
        }
        Ok(self.argument)
    }

    /// Rejects arguments on verbs that take none.
    pub fn expect_no_argument(&self) -> BankResult<()> {
        if !self.argument.is_empty() {
            return Err(BankError::validation(format!(
                "{} takes no arguments",
                self.verb
            )));
        }
        Ok(())
    }
}
