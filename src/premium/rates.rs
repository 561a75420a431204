//! Insurance products and the rate tables agreements carry for them

use super::amount::Premiebeloep;
use crate::domain::Percentage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insurance product an agreement can include
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    /// Retirement pension
    Pension,
    /// Disability pension
    Disability,
    /// Supplementary pension
    SupplementaryPension,
    /// Group life insurance
    GroupLife,
    /// Occupational injury insurance
    OccupationalInjury,
}

impl Product {
    pub const ALL: [Product; 5] = [
        Product::Pension,
        Product::Disability,
        Product::SupplementaryPension,
        Product::GroupLife,
        Product::OccupationalInjury,
    ];

    /// Product code used in output files
    pub fn code(&self) -> &'static str {
        match self {
            Product::Pension => "PEN",
            Product::Disability => "UFO",
            Product::SupplementaryPension => "TIP",
            Product::GroupLife => "GRU",
            Product::OccupationalInjury => "YSK",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Percentage rates applied to the machine basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PercentRates {
    /// Employer share of the machine basis
    pub employer: Percentage,
    /// Member share, withheld from salary
    pub member: Percentage,
    /// Administration fee on top of the premium
    pub admin_fee: Percentage,
}

/// Flat yearly kroner rates per eligible position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountRates {
    /// Yearly amount paid by the employer
    pub employer: Premiebeloep,
    /// Yearly amount paid by the member
    pub member: Premiebeloep,
    /// Yearly administration fee
    pub admin_fee: Premiebeloep,
}

/// Rate table for one product on one agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateTable {
    Percent(PercentRates),
    Amount(AmountRates),
}

impl RateTable {
    pub fn percent(&self) -> Option<&PercentRates> {
        match self {
            RateTable::Percent(rates) => Some(rates),
            RateTable::Amount(_) => None,
        }
    }

    pub fn amount(&self) -> Option<&AmountRates> {
        match self {
            RateTable::Amount(rates) => Some(rates),
            RateTable::Percent(_) => None,
        }
    }
}
