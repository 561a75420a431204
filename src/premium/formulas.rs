//! Per-product premium rules
//!
//! Two formula shapes exist:
//! - rate of basis: machine basis × the agreement's percentage rates
//! - rate of eligible share: a validated eligibility fraction × the
//!   agreement's flat kroner rates
//!
//! Group life and occupational injury are wired to [`ZeroPremium`] in the
//! standard rule set until the business decides how they are to be billed.
//! Every product still gets a rule so every period yields a premium triple
//! for every product.

use super::amount::Premiebeloep;
use super::rates::Product;
use super::triple::Premium;
use crate::basis::{BasisPeriod, Rule};
use crate::domain::{Kroner, Percentage};
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tolerance for eligibility fractions, four decimal digits
const SHARE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Computes one product's premium for one period
pub trait PremiumRule: Send + Sync {
    fn product(&self) -> Product;

    fn premium(&self, period: &BasisPeriod, machine_basis: Kroner) -> Result<Premium>;
}

/// Machine basis × the agreement's percentage rates for the product.
/// An agreement without a percentage table for the product owes nothing.
#[derive(Debug, Clone, Copy)]
pub struct RateOfBasisPremium {
    product: Product,
}

impl RateOfBasisPremium {
    pub fn new(product: Product) -> Self {
        Self { product }
    }
}

impl PremiumRule for RateOfBasisPremium {
    fn product(&self) -> Product {
        self.product
    }

    fn premium(&self, period: &BasisPeriod, machine_basis: Kroner) -> Result<Premium> {
        let rates = match period
            .agreement_product(self.product)?
            .and_then(|p| p.rates.percent())
        {
            Some(rates) => *rates,
            None => return Ok(Premium::zero()),
        };

        let basis = Premiebeloep::from_kroner(machine_basis)?;
        Ok(Premium::new(
            basis.multiply_by_rate(rates.employer)?,
            basis.multiply_by_rate(rates.member)?,
            basis.multiply_by_rate(rates.admin_fee)?,
        ))
    }
}

/// Always zero. Placeholder for products whose billing is not yet decided.
#[derive(Debug, Clone, Copy)]
pub struct ZeroPremium {
    product: Product,
}

impl ZeroPremium {
    pub fn new(product: Product) -> Self {
        Self { product }
    }
}

impl PremiumRule for ZeroPremium {
    fn product(&self) -> Product {
        self.product
    }

    fn premium(&self, _period: &BasisPeriod, _machine_basis: Kroner) -> Result<Premium> {
        Ok(Premium::zero())
    }
}

/// Domain of an eligibility fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibleShareFormula {
    /// Exactly 0% or 100%
    ZeroOrFull,
    /// Anything in [0%, 100%]
    Continuous,
}

impl EligibleShareFormula {
    pub fn validate(&self, product: Product, share: Percentage) -> Result<Percentage> {
        let fraction = share.as_fraction();
        let near = |target: Decimal| (fraction - target).abs() <= SHARE_TOLERANCE;
        let valid = match self {
            EligibleShareFormula::ZeroOrFull => near(Decimal::ZERO) || near(Decimal::ONE),
            EligibleShareFormula::Continuous => {
                fraction >= -SHARE_TOLERANCE && fraction <= Decimal::ONE + SHARE_TOLERANCE
            }
        };
        if !valid {
            let expected = match self {
                EligibleShareFormula::ZeroOrFull => "0% or 100%",
                EligibleShareFormula::Continuous => "between 0% and 100%",
            };
            return Err(Error::InvalidArgument(format!(
                "eligible share for {} must be {}, was {}",
                product, expected, share
            )));
        }
        Ok(share)
    }
}

fn eligible_share_premium(
    period: &BasisPeriod,
    product: Product,
    formula: EligibleShareFormula,
    share: Percentage,
) -> Result<Premium> {
    let share = formula.validate(product, share)?;
    let rates = match period.agreement_product(product)?.and_then(|p| p.rates.amount()) {
        Some(rates) => *rates,
        None => return Ok(Premium::zero()),
    };
    Ok(Premium::new(
        rates.employer.multiply_by_rate(share)?,
        rates.member.multiply_by_rate(share)?,
        rates.admin_fee.multiply_by_rate(share)?,
    ))
}

/// Yearly billing share for group life, 0% or 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLifeShare(pub Percentage);

/// Yearly billing share for occupational injury, 0% to 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjuryShare(pub Percentage);

/// Group life premium from flat rates. Not part of the standard rule set.
#[derive(Clone)]
pub struct GroupLifePremium {
    eligibility: Arc<dyn Rule<Output = GroupLifeShare>>,
}

impl GroupLifePremium {
    pub fn new(eligibility: Arc<dyn Rule<Output = GroupLifeShare>>) -> Self {
        Self { eligibility }
    }
}

impl PremiumRule for GroupLifePremium {
    fn product(&self) -> Product {
        Product::GroupLife
    }

    fn premium(&self, period: &BasisPeriod, _machine_basis: Kroner) -> Result<Premium> {
        let GroupLifeShare(share) = period.evaluate(self.eligibility.as_ref())?;
        eligible_share_premium(period, Product::GroupLife, EligibleShareFormula::ZeroOrFull, share)
    }
}

/// Occupational injury premium from flat rates. Not part of the standard rule set.
#[derive(Clone)]
pub struct InjuryPremium {
    eligibility: Arc<dyn Rule<Output = InjuryShare>>,
}

impl InjuryPremium {
    pub fn new(eligibility: Arc<dyn Rule<Output = InjuryShare>>) -> Self {
        Self { eligibility }
    }
}

impl PremiumRule for InjuryPremium {
    fn product(&self) -> Product {
        Product::OccupationalInjury
    }

    fn premium(&self, period: &BasisPeriod, _machine_basis: Kroner) -> Result<Premium> {
        let InjuryShare(share) = period.evaluate(self.eligibility.as_ref())?;
        eligible_share_premium(
            period,
            Product::OccupationalInjury,
            EligibleShareFormula::Continuous,
            share,
        )
    }
}

/// Exactly one premium rule per product
#[derive(Clone)]
pub struct PremiumRuleSet {
    rules: BTreeMap<Product, Arc<dyn PremiumRule>>,
}

impl PremiumRuleSet {
    pub fn new(rules: Vec<Arc<dyn PremiumRule>>) -> Result<Self> {
        let mut by_product: BTreeMap<Product, Arc<dyn PremiumRule>> = BTreeMap::new();
        for rule in rules {
            let product = rule.product();
            if by_product.insert(product, rule).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "more than one premium rule for {}",
                    product
                )));
            }
        }
        if let Some(missing) = Product::ALL.iter().find(|p| !by_product.contains_key(*p)) {
            return Err(Error::InvalidArgument(format!(
                "no premium rule for {}",
                missing
            )));
        }
        Ok(Self { rules: by_product })
    }

    /// The production wiring: percentage products computed, flat-rate
    /// products zero
    pub fn standard() -> Self {
        let mut rules: BTreeMap<Product, Arc<dyn PremiumRule>> = BTreeMap::new();
        for product in [Product::Pension, Product::Disability, Product::SupplementaryPension] {
            rules.insert(product, Arc::new(RateOfBasisPremium::new(product)));
        }
        for product in [Product::GroupLife, Product::OccupationalInjury] {
            rules.insert(product, Arc::new(ZeroPremium::new(product)));
        }
        Self { rules }
    }

    /// Premium for every product in `period`
    pub fn premiums(&self, period: &BasisPeriod, machine_basis: Kroner) -> Result<BTreeMap<Product, Premium>> {
        self.rules
            .iter()
            .map(|(product, rule)| Ok((*product, rule.premium(period, machine_basis)?)))
            .collect()
    }
}

impl Default for PremiumRuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
