//! Small value types shared across the pipeline

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one employment position (stillingsforhold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.0)
    }
}

/// Identifier of an employer's pension agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgreementId(pub u32);

impl fmt::Display for AgreementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agreement {}", self.0)
    }
}

/// Premium status code carried by a position (e.g. "AAO-01")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PremiumStatus(pub String);

impl fmt::Display for PremiumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar year marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Year(pub i32);

impl Year {
    pub fn of(date: NaiveDate) -> Self {
        Year(date.year())
    }

    pub fn first_day(&self) -> NaiveDate {
        ymd(self.0, 1, 1)
    }

    pub fn last_day(&self) -> NaiveDate {
        ymd(self.0, 12, 31)
    }

    /// Last calendar day of `month` (1-12) in this year
    pub fn month_end(&self, month: u32) -> NaiveDate {
        if month >= 12 {
            return self.last_day();
        }
        ymd(self.0, month + 1, 1).pred_opt().unwrap_or_else(|| self.last_day())
    }

    pub fn days(&self) -> i64 {
        days_inclusive(self.first_day(), self.last_day())
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a date from components already known to be valid.
///
/// Callers only pass month/day pairs that exist in every year (the 1st of a
/// month, December 31st), so the fallback is unreachable.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Number of days in `[from, to]`, both ends included
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days() + 1
}

/// Whether `[a_from, a_to]` and `[b_from, b_to]` share at least one day.
/// An absent upper bound is open-ended.
pub fn overlaps(
    a_from: NaiveDate,
    a_to: Option<NaiveDate>,
    b_from: NaiveDate,
    b_to: Option<NaiveDate>,
) -> bool {
    a_to.map_or(true, |a_to| a_to >= b_from) && b_to.map_or(true, |b_to| b_to >= a_from)
}

/// A fraction where 1.0 means 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Percentage(pub Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);
    pub const FULL: Percentage = Percentage(Decimal::ONE);

    /// From a percent figure, `percent(20)` is 20%
    pub fn percent(value: impl Into<Decimal>) -> Self {
        let value: Decimal = value.into();
        Percentage(value / Decimal::ONE_HUNDRED)
    }

    pub fn as_fraction(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

/// Unrounded kroner amount, used for salaries and the machine basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Kroner(pub Decimal);

impl Kroner {
    pub const ZERO: Kroner = Kroner(Decimal::ZERO);

    pub fn new(value: impl Into<Decimal>) -> Self {
        Kroner(value.into())
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(&self, rhs: Kroner) -> Result<Kroner> {
        self.0
            .checked_add(rhs.0)
            .map(Kroner)
            .ok_or_else(|| Error::InvalidArgument(format!("{} + {} overflows", self, rhs)))
    }
}

impl fmt::Display for Kroner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kr {}", self.0.round_dp(2))
    }
}
