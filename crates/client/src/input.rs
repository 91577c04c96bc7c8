//! Client-side command validation.

use bankd_core::{AccountName, Amount, BankResult};
use bankd_protocol::{Request, Verb};

/// Check a typed command before sending it.
///
/// Same argument rules as the server: names must be valid account names and
/// amounts positive decimals. Session-state rules are left to the server.
pub fn validate(line: &str) -> BankResult<Request<'_>> {
    let request = Request::parse(line)?;
    if !request.verb.takes_argument() {
        request.expect_no_argument()?;
        return Ok(request);
    }

    let argument = request.required_argument()?;
    match request.verb {
        Verb::Deposit | Verb::Withdraw => {
            Amount::parse_positive(argument)?;
        }
        _ => {
            argument.parse::<AccountName>()?;
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankd_core::BankError;

    #[test]
    fn accepts_well_formed_commands() {
        for line in ["create alice", "serve alice", "deposit 10.5", "withdraw 1", "query", "end", "quit"] {
            assert!(validate(line).is_ok(), "{line}");
        }
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for line in ["deposit 0", "deposit -1", "withdraw abc", "withdraw"] {
            assert!(matches!(validate(line), Err(BankError::Validation(_))), "{line}");
        }
    }

    #[test]
    fn rejects_unknown_commands() {
        assert_eq!(validate("balance").unwrap_err(), BankError::UnknownCommand);
    }

    #[test]
    fn rejects_arguments_on_bare_verbs() {
        for line in ["query alice", "end now", "quit please"] {
            assert!(matches!(validate(line), Err(BankError::Validation(_))), "{line}");
        }
    }

    #[test]
    fn rejects_missing_names() {
        assert!(validate("create").is_err());
        assert!(validate("serve   ").is_err());
    }
}
