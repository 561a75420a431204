//! Month-by-month "as observed on" bases for one annual basis
//!
//! For each month the observation date is the month's last day. A period is
//! visible when it ends on or before that date (open-ended periods are always
//! visible). While the position is still running at the observation date, a
//! fictional period copying the last visible period is appended to carry the
//! known state forward to the end of the year.

use crate::basis::{Basis, BasisPeriod};
use crate::domain::Year;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Observation bases for months 1 to 12 of `annual`'s year, skipping months
/// before the position started
pub fn observation_bases(annual: &Basis) -> Result<Vec<Basis>> {
    let year = single_year(annual)?;
    let mut bases = Vec::with_capacity(12);
    for month in 1..=12 {
        if let Some(observed) = observe(annual, year, year.month_end(month))? {
            bases.push(observed);
        }
    }
    Ok(bases)
}

fn single_year(annual: &Basis) -> Result<Year> {
    let mut years = BTreeSet::new();
    for period in annual {
        years.insert(period.year()?);
    }
    let mut iter = years.iter();
    match (iter.next(), iter.next()) {
        (Some(year), None) => Ok(*year),
        (None, _) => Err(Error::InvalidState(
            "annual basis has no periods carrying a year".to_string(),
        )),
        (Some(_), Some(_)) => Err(Error::InvalidState(format!(
            "annual basis spans several years: {:?}",
            years.iter().map(|y| y.0).collect::<Vec<_>>()
        ))),
    }
}

fn observe(annual: &Basis, year: Year, date: NaiveDate) -> Result<Option<Basis>> {
    let mut observed = annual.restrict(|p| p.to().map_or(true, |to| to <= date));
    if observed.is_empty() {
        return Ok(None);
    }
    observed.facts.year = Some(year);
    observed.facts.observation_date = Some(date);

    if let Some(fictional) = forward_period(&observed, year, date)? {
        observed.push(fictional)?;
    }
    Ok(Some(observed))
}

/// The fictional `[last.to + 1, Dec 31]` period, unless the observation is
/// at year end or the last visible period ended before the observation date
fn forward_period(visible: &Basis, year: Year, date: NaiveDate) -> Result<Option<BasisPeriod>> {
    if date >= year.last_day() {
        return Ok(None);
    }
    let Some(last) = visible.last() else {
        return Ok(None);
    };
    let Some(to) = last.to() else {
        return Ok(None);
    };
    if to < date {
        return Ok(None);
    }

    let from = to
        .succ_opt()
        .ok_or_else(|| Error::InvalidState(format!("no day follows period {}", last)))?;
    let mut facts = last.facts.clone();
    facts.fictional = true;
    facts.terminal = false;

    let period = BasisPeriod::new(from, Some(year.last_day()))?
        .with_facts(facts)
        .with_couplings(last.couplings.clone());
    Ok(Some(period))
}
