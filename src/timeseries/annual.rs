//! Annual partitioning of a position basis

use crate::basis::Basis;
use crate::domain::Year;
use crate::error::Result;

/// Splits a position basis into one basis per year fact, in order of first
/// appearance. Each output is annotated with its year and keeps the input's
/// whole-basis facts.
pub fn annual_bases(basis: &Basis) -> Result<Vec<Basis>> {
    let mut years: Vec<Year> = Vec::new();
    for period in basis {
        let year = period.year()?;
        if !years.contains(&year) {
            years.push(year);
        }
    }

    Ok(years
        .into_iter()
        .map(|year| {
            let mut annual = basis.restrict(|p| p.facts.year == Some(year));
            annual.facts.year = Some(year);
            annual
        })
        .collect())
}
