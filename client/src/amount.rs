//! Token amounts as 6-decimal fixed point (the USDC convention).
//!
//! Conversion happens exactly once per request, on the way in: user-facing
//! decimal strings become [`TokenAmount`] base units before anything is
//! signed, and base units render back without losing value.

use std::fmt;

use crate::errors::{ClientError, Result};

/// Fractional digits carried by the token contract.
pub const DECIMALS: u32 = 6;

const SCALE: u128 = 1_000_000;

/// An amount in base units (1 token = 10^6 base units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn from_base_units(units: u128) -> Self {
        TokenAmount(units)
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse a display-decimal string (`"10.50"`) into base units.
    ///
    /// At most [`DECIMALS`] fraction digits are accepted; anything finer
    /// would be silently truncated by the chain, so it is rejected here
    /// instead.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ClientError::Validation(format!("Invalid amount: {s}"));

        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_part.len() > DECIMALS as usize {
            return Err(ClientError::Validation(format!(
                "Amount has more than {DECIMALS} decimal places: {s}"
            )));
        }

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            // Right-pad to 6 digits: "5" in the fraction slot means 500000.
            let padded = format!("{frac_part:0<6}");
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .map(TokenAmount)
            .ok_or_else(|| ClientError::Validation(format!("Amount too large: {s}")))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:06}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}
