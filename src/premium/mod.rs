//! Premium amounts, rate tables and the per-product premium rules

mod amount;
mod formulas;
mod rates;
mod triple;

pub use amount::Premiebeloep;
pub use formulas::{
    EligibleShareFormula, GroupLifePremium, GroupLifeShare, InjuryPremium, InjuryShare,
    PremiumRule, PremiumRuleSet, RateOfBasisPremium, ZeroPremium,
};
pub use rates::{AmountRates, PercentRates, Product, RateTable};
pub use triple::Premium;
