//! Account name value object.

use core::borrow::Borrow;
use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::error::BankError;

/// Unique key of an account: trimmed, non-empty, at most
/// [`AccountName::MAX_LEN`] bytes, no control characters, no U+FFFD (so two
/// different undecodable names never collapse onto one account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    pub const MAX_LEN: usize = 255;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountName {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(BankError::validation("account name is required"));
        }
        if name.len() > Self::MAX_LEN {
            return Err(BankError::validation(format!(
                "account name exceeds {} bytes",
                Self::MAX_LEN
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(BankError::validation(
                "account name contains control characters",
            ));
        }
        if name.contains(char::REPLACEMENT_CHARACTER) {
            return Err(BankError::validation("account name is not valid UTF-8"));
        }
        Ok(Self(name.to_owned()))
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AccountName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let name: AccountName = "  alice \t".parse().unwrap();
        assert_eq!(name.as_str(), "alice");
    }

    #[test]
    fn keeps_inner_spaces() {
        let name: AccountName = "alice smith".parse().unwrap();
        assert_eq!(name.to_string(), "alice smith");
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!("".parse::<AccountName>().is_err());
        assert!("   ".parse::<AccountName>().is_err());
        assert!("a".repeat(AccountName::MAX_LEN).parse::<AccountName>().is_ok());
        assert!("a".repeat(AccountName::MAX_LEN + 1).parse::<AccountName>().is_err());
    }

    #[test]
    fn rejects_control_characters() {
        assert!("bad\u{0}name".parse::<AccountName>().is_err());
        assert!("bad\nname".parse::<AccountName>().is_err());
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(matches!(
            "al\u{fffd}ce".parse::<AccountName>(),
            Err(BankError::Validation(_))
        ));
    }
}
