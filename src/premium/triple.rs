//! The employer / member / administration premium triple

use super::amount::Premiebeloep;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Premium owed for one product, split by payer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Premium {
    pub employer: Premiebeloep,
    pub member: Premiebeloep,
    pub admin_fee: Premiebeloep,
}

impl Premium {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(employer: Premiebeloep, member: Premiebeloep, admin_fee: Premiebeloep) -> Self {
        Self {
            employer,
            member,
            admin_fee,
        }
    }

    pub fn total(&self) -> Result<Premiebeloep> {
        self.employer.checked_add(self.member)?.checked_add(self.admin_fee)
    }

    pub fn is_zero(&self) -> bool {
        self.employer.is_zero() && self.member.is_zero() && self.admin_fee.is_zero()
    }

    /// Component-wise sum
    pub fn checked_add(&self, rhs: &Premium) -> Result<Premium> {
        Ok(Premium {
            employer: self.employer.checked_add(rhs.employer)?,
            member: self.member.checked_add(rhs.member)?,
            admin_fee: self.admin_fee.checked_add(rhs.admin_fee)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_components_default_to_zero() {
        let premium = Premium {
            employer: Premiebeloep::from_integer(100),
            ..Default::default()
        };
        assert_eq!(premium.member, Premiebeloep::zero());
        assert_eq!(premium.admin_fee, Premiebeloep::zero());
        assert_eq!(premium.total().unwrap(), Premiebeloep::from_integer(100));
        assert!(Premium::zero().is_zero());
    }

    #[test]
    fn test_total_and_sum() {
        let a = Premium::new(
            Premiebeloep::parse("10.10").unwrap(),
            Premiebeloep::parse("2.02").unwrap(),
            Premiebeloep::parse("0.33").unwrap(),
        );
        assert_eq!(a.total().unwrap(), Premiebeloep::parse("12.45").unwrap());
        assert_eq!(a.checked_add(&a).unwrap().total().unwrap(), Premiebeloep::parse("24.90").unwrap());
    }
}
