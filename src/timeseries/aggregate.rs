//! Observation results and their aggregation by agreement

use crate::domain::{AgreementId, Kroner, PositionId, PremiumStatus};
use crate::error::{Error, Result};
use crate::premium::{Premiebeloep, Premium, Product};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Measures and premiums of one position under one agreement, as observed on
/// one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Position observed
    pub position: PositionId,
    /// Agreement the measures and premiums belong to
    pub agreement: AgreementId,
    /// Month end the observation is made on
    pub observation_date: NaiveDate,
    /// Premium status of the position, if known
    pub premium_status: Option<PremiumStatus>,
    /// Sum of period machine bases for the year, unrounded
    pub machine_basis: Kroner,
    /// Sum of period man-years for the year
    pub man_years: f64,
    /// Premium per product
    pub premiums: BTreeMap<Product, Premium>,
}

impl Observation {
    pub fn key(&self) -> (PositionId, AgreementId, NaiveDate) {
        (self.position, self.agreement, self.observation_date)
    }

    pub fn premium(&self, product: Product) -> Premium {
        self.premiums.get(&product).copied().unwrap_or_default()
    }

    pub fn total_premium(&self) -> Result<Premiebeloep> {
        self.premiums
            .values()
            .try_fold(Premiebeloep::zero(), |acc, premium| acc.checked_add(premium.total()?))
    }

    /// Adds `other`'s measures and premiums into `self`
    pub fn merge(&mut self, other: &Observation) -> Result<()> {
        if self.key() != other.key() {
            return Err(Error::InvalidState(format!(
                "cannot merge observation of {} {} on {} into {} {} on {}",
                other.position,
                other.agreement,
                other.observation_date,
                self.position,
                self.agreement,
                self.observation_date
            )));
        }
        self.machine_basis = self.machine_basis.checked_add(other.machine_basis)?;
        self.man_years += other.man_years;
        for (product, premium) in &other.premiums {
            let sum = self.premium(*product).checked_add(premium)?;
            self.premiums.insert(*product, sum);
        }
        Ok(())
    }
}

/// Sums observations sharing an agreement, keeping first-appearance order.
/// All inputs must come from the same position and observation date.
pub fn aggregate_by_agreement(observations: Vec<Observation>) -> Result<Vec<Observation>> {
    let mut aggregated: Vec<Observation> = Vec::new();
    for observation in observations {
        match aggregated.iter_mut().find(|o| o.agreement == observation.agreement) {
            Some(existing) => existing.merge(&observation)?,
            None => {
                if let Some(first) = aggregated.first() {
                    if (first.position, first.observation_date) != (observation.position, observation.observation_date) {
                        return Err(Error::InvalidState(format!(
                            "observations of {} on {} mixed with {} on {}",
                            observation.position, observation.observation_date, first.position, first.observation_date
                        )));
                    }
                }
                aggregated.push(observation);
            }
        }
    }
    Ok(aggregated)
}
