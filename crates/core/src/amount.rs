//! Fixed-point decimal money amount.

use core::fmt;
use core::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{BankError, BankResult};

/// Number of fractional digits carried by an [`Amount`].
pub const SCALE_DIGITS: u32 = 6;

const SCALE: i64 = 10i64.pow(SCALE_DIGITS);

/// Signed decimal amount stored as millionths.
///
/// Rendering matches C's `%f`: always six fractional digits (`100.000000`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest amount a single `deposit`/`withdraw` may carry.
    pub const MAX_TRANSFER: Amount = Amount(1_000_000_000_000 * SCALE);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Parse a transfer argument: a positive decimal no larger than
    /// [`Amount::MAX_TRANSFER`].
    pub fn parse_positive(raw: &str) -> BankResult<Amount> {
        let amount: Amount = raw.parse()?;
        if !amount.is_positive() {
            return Err(BankError::validation(format!(
                "amount must be positive [{}]",
                raw.trim()
            )));
        }
        if amount > Self::MAX_TRANSFER {
            return Err(BankError::validation(format!(
                "amount exceeds the transfer limit [{}]",
                raw.trim()
            )));
        }
        Ok(amount)
    }
}

impl FromStr for Amount {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || BankError::validation(format!("invalid amount [{raw}]"));

        let (negative, digits) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() > SCALE_DIGITS as usize {
            return Err(BankError::validation(format!(
                "amount has more than {SCALE_DIGITS} decimal places [{raw}]"
            )));
        }

        let mut micros: i64 = 0;
        for b in int_part.bytes() {
            micros = micros
                .checked_mul(10)
                .and_then(|m| m.checked_add(i64::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        micros = micros.checked_mul(SCALE).ok_or_else(invalid)?;

        let mut frac: i64 = 0;
        for b in frac_part.bytes() {
            frac = frac * 10 + i64::from(b - b'0');
        }
        frac *= 10i64.pow(SCALE_DIGITS - frac_part.len() as u32);
        micros = micros.checked_add(frac).ok_or_else(invalid)?;

        Ok(Amount(if negative { -micros } else { micros }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = SCALE as u64;
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / scale,
            abs % scale,
            width = SCALE_DIGITS as usize
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_like_printf_f() {
        assert_eq!(Amount::ZERO.to_string(), "0.000000");
        assert_eq!("100".parse::<Amount>().unwrap().to_string(), "100.000000");
        assert_eq!("12.5".parse::<Amount>().unwrap().to_string(), "12.500000");
        assert_eq!("-0.25".parse::<Amount>().unwrap().to_string(), "-0.250000");
        assert_eq!(".5".parse::<Amount>().unwrap().to_string(), "0.500000");
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "abc", "1.2.3", "1e3", "--1", ".", "12,5", "1 000"] {
            assert!(raw.parse::<Amount>().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn rejects_excess_precision() {
        let err = "0.0000001".parse::<Amount>().unwrap_err();
        assert!(matches!(err, BankError::Validation(msg) if msg.contains("decimal places")));
    }

    #[test]
    fn parse_positive_enforces_bounds() {
        assert!(Amount::parse_positive("0").is_err());
        assert!(Amount::parse_positive("-5").is_err());
        assert!(Amount::parse_positive("1000000000001").is_err());
        assert_eq!(
            Amount::parse_positive(" 42.000001 ").unwrap(),
            Amount::from_micros(42_000_001)
        );
    }

    #[test]
    fn overflow_is_a_validation_error() {
        assert!("99999999999999999999".parse::<Amount>().is_err());
    }

    proptest! {
        /// Property: rendering then re-parsing yields the same amount.
        #[test]
        fn display_is_parseable(micros in -1_000_000_000_000_000i64..1_000_000_000_000_000i64) {
            let amount = Amount::from_micros(micros);
            prop_assert_eq!(amount.to_string().parse::<Amount>().unwrap(), amount);
        }
    }
}
