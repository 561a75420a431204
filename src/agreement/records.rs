//! Agreement records that periodization couples to basis periods

use crate::domain::{overlaps, AgreementId};
use crate::premium::{Product, RateTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One version of an agreement's terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementVersion {
    pub agreement: AgreementId,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub version: u32,
}

/// A product included in an agreement, with its rates for the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementProduct {
    pub agreement: AgreementId,
    pub product: Product,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub rates: RateTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementRecord {
    Version(AgreementVersion),
    Product(AgreementProduct),
}

impl AgreementRecord {
    pub fn agreement(&self) -> AgreementId {
        match self {
            AgreementRecord::Version(v) => v.agreement,
            AgreementRecord::Product(p) => p.agreement,
        }
    }

    pub fn from(&self) -> NaiveDate {
        match self {
            AgreementRecord::Version(v) => v.from,
            AgreementRecord::Product(p) => p.from,
        }
    }

    pub fn to(&self) -> Option<NaiveDate> {
        match self {
            AgreementRecord::Version(v) => v.to,
            AgreementRecord::Product(p) => p.to,
        }
    }

    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        overlaps(self.from(), self.to(), from, to)
    }

    pub fn as_version(&self) -> Option<&AgreementVersion> {
        match self {
            AgreementRecord::Version(v) => Some(v),
            AgreementRecord::Product(_) => None,
        }
    }

    pub fn as_product(&self) -> Option<&AgreementProduct> {
        match self {
            AgreementRecord::Product(p) => Some(p),
            AgreementRecord::Version(_) => None,
        }
    }
}

impl fmt::Display for AgreementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to = self.to().map(|d| d.to_string()).unwrap_or_else(|| "..".to_string());
        match self {
            AgreementRecord::Version(v) => {
                write!(f, "{} version {} [{}, {}]", v.agreement, v.version, v.from, to)
            }
            AgreementRecord::Product(p) => {
                write!(f, "{} product {} [{}, {}]", p.agreement, p.product, p.from, to)
            }
        }
    }
}
