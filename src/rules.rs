//! Reference measure rules: machine basis and man-years per period

use crate::basis::{BasisPeriod, Rule};
use crate::domain::{days_inclusive, Kroner};
use crate::error::{Error, Result};
use crate::wages::salary_for_grade;
use rust_decimal::Decimal;
use serde::Serialize;

/// Salary basis a period contributes to premium calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MachineBasis(pub Kroner);

/// Full-time-equivalent years a period contributes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ManYears(pub f64);

/// Days of `period` and days of its year. Open-ended periods run to year end.
fn period_days(period: &BasisPeriod) -> Result<(i64, i64)> {
    let year = period.year()?;
    let to = period.to().unwrap_or_else(|| year.last_day());
    Ok((days_inclusive(period.from(), to), year.days()))
}

/// Annual salary × employment percentage × share of the year covered.
///
/// The salary is the period's own fact when present, otherwise the salary of
/// its pay grade in the coupled wage grade grouping. Neither gives zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalaryMachineBasis;

impl Rule for SalaryMachineBasis {
    type Output = MachineBasis;

    fn compute(&self, period: &BasisPeriod) -> Result<MachineBasis> {
        let employment = period.employment_percentage()?;
        let salary = match (period.facts.annual_salary, period.facts.pay_grade) {
            (Some(salary), _) => salary,
            (None, Some(grade)) => salary_for_grade(period, grade)?.unwrap_or(Kroner::ZERO),
            (None, None) => Kroner::ZERO,
        };
        let (days, year_days) = period_days(period)?;

        let scaled = salary
            .value()
            .checked_mul(employment.as_fraction())
            .and_then(|v| v.checked_mul(Decimal::from(days)))
            .and_then(|v| v.checked_div(Decimal::from(year_days)))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "machine basis of {} at {} from {} overflows",
                    salary,
                    employment,
                    period.from()
                ))
            })?;
        Ok(MachineBasis(Kroner(scaled)))
    }
}

/// Employment percentage × share of the year covered
#[derive(Debug, Clone, Copy, Default)]
pub struct EmploymentManYears;

impl Rule for EmploymentManYears {
    type Output = ManYears;

    fn compute(&self, period: &BasisPeriod) -> Result<ManYears> {
        let employment = period.employment_percentage()?;
        let (days, year_days) = period_days(period)?;
        Ok(ManYears(employment.to_f64() * days as f64 / year_days as f64))
    }
}
