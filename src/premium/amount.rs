//! Fixed-point premium amounts
//!
//! A [`Premiebeloep`] always carries exactly two fractional digits. Rates are
//! rounded to four fractional digits of the fraction (100% = 1.0000) before
//! they are applied, so any rate at or below 0.005% yields kr 0.00.
//!
//! All rounding is half-to-even.

use crate::domain::{Kroner, Percentage};
use crate::error::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;
const AMOUNT_DIGITS: u32 = 2;
const RATE_DIGITS: u32 = 4;

/// Premium amount in kroner, two fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Premiebeloep(Decimal);

impl Premiebeloep {
    pub fn zero() -> Self {
        Premiebeloep(Decimal::new(0, AMOUNT_DIGITS))
    }

    pub fn from_integer(kroner: i64) -> Self {
        // Any i64 times 100 fits in the 96-bit mantissa
        Premiebeloep(Decimal::from_i128_with_scale(i128::from(kroner) * 100, AMOUNT_DIGITS))
    }

    /// Rounds `value` to two digits. Values too large to carry two
    /// fractional digits are rejected.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        round_amount(value).map(Premiebeloep)
    }

    pub fn from_kroner(value: Kroner) -> Result<Self> {
        Self::from_decimal(value.value())
    }

    /// Parses `"kr 1 000,50"`, `"1000.50 kr"`, `"12"` and similar
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn multiply_by_rate(&self, rate: Percentage) -> Result<Premiebeloep> {
        let rate = rate.as_fraction().round_dp_with_strategy(RATE_DIGITS, ROUNDING);
        let product = self
            .0
            .checked_mul(rate)
            .ok_or_else(|| Error::InvalidArgument(format!("{} × {} overflows", self, rate)))?;
        Self::from_decimal(product)
    }

    pub fn checked_add(&self, rhs: Premiebeloep) -> Result<Premiebeloep> {
        let sum = self
            .0
            .checked_add(rhs.0)
            .ok_or_else(|| Error::InvalidArgument(format!("{} + {} overflows", self, rhs)))?;
        Self::from_decimal(sum)
    }
}

fn round_amount(value: Decimal) -> Result<Decimal> {
    let mut rounded = value.round_dp_with_strategy(AMOUNT_DIGITS, ROUNDING);
    rounded.rescale(AMOUNT_DIGITS);
    if rounded.scale() != AMOUNT_DIGITS {
        return Err(Error::InvalidArgument(format!(
            "amount {} cannot be held with {} fractional digits",
            value, AMOUNT_DIGITS
        )));
    }
    Ok(rounded)
}

fn strip_kr_prefix(text: &str) -> Option<&str> {
    let head = text.get(..2)?;
    head.eq_ignore_ascii_case("kr").then(|| &text[2..])
}

fn strip_kr_suffix(text: &str) -> Option<&str> {
    let split = text.len().checked_sub(2)?;
    let tail = text.get(split..)?;
    tail.eq_ignore_ascii_case("kr").then(|| &text[..split])
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Premiebeloep {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidFormat(text.to_string());

        let mut body = text.trim();
        if let Some(rest) = strip_kr_prefix(body) {
            body = rest;
        } else if let Some(rest) = strip_kr_suffix(body) {
            body = rest;
        }

        let cleaned: String = body
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        let unsigned = cleaned.strip_prefix('-').unwrap_or(&cleaned);
        let well_formed = match unsigned.split_once('.') {
            Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
            None => is_digits(unsigned),
        };
        if !well_formed {
            return Err(invalid());
        }

        let value = Decimal::from_str(&cleaned).map_err(|_| invalid())?;
        Premiebeloep::from_decimal(value).map_err(|_| invalid())
    }
}

impl TryFrom<Decimal> for Premiebeloep {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Premiebeloep::from_decimal(value)
    }
}

impl From<Premiebeloep> for Decimal {
    fn from(value: Premiebeloep) -> Self {
        value.0
    }
}

impl Default for Premiebeloep {
    fn default() -> Self {
        Premiebeloep::zero()
    }
}

impl fmt::Display for Premiebeloep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kr {}", self.0)
    }
}
