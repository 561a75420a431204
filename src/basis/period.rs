//! Basis periods: a date interval with facts, couplings and a rule memo

use super::facts::PeriodFacts;
use super::rule::Rule;
use crate::agreement::{AgreementProduct, AgreementRecord, AgreementVersion};
use crate::domain::{days_inclusive, overlaps, AgreementId, Percentage, Year};
use crate::error::{Error, Result};
use crate::periodize::PositionRecord;
use crate::premium::Product;
use crate::wages::WageGradeGrouping;
use chrono::NaiveDate;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Links to the source records a period overlaps. The records are shared,
/// never owned by the period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Couplings {
    /// Position records covering the period
    pub positions: Vec<Arc<PositionRecord>>,
    /// Agreement versions and products in force during the period
    pub agreements: Vec<Arc<AgreementRecord>>,
    /// Wage grade groupings valid during the period
    pub wage_grades: Vec<Arc<WageGradeGrouping>>,
}

/// One interval `[from, to]` of a basis. An absent `to` is open-ended.
pub struct BasisPeriod {
    from: NaiveDate,
    to: Option<NaiveDate>,
    pub facts: PeriodFacts,
    pub couplings: Couplings,
    memo: RefCell<HashMap<TypeId, Box<dyn Any + Send>>>,
}

impl BasisPeriod {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self> {
        if let Some(to) = to {
            if to < from {
                return Err(Error::InvalidState(format!(
                    "period ends {} before it starts {}",
                    to, from
                )));
            }
        }
        Ok(Self {
            from,
            to,
            facts: PeriodFacts::default(),
            couplings: Couplings::default(),
            memo: RefCell::new(HashMap::new()),
        })
    }

    pub fn with_facts(mut self, facts: PeriodFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn with_couplings(mut self, couplings: Couplings) -> Self {
        self.couplings = couplings;
        self
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    /// Number of days covered, `None` when open-ended
    pub fn days(&self) -> Option<i64> {
        self.to.map(|to| days_inclusive(self.from, to))
    }

    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        overlaps(self.from, self.to, from, to)
    }

    pub fn is_fictional(&self) -> bool {
        self.facts.fictional
    }

    pub fn is_terminal(&self) -> bool {
        self.facts.terminal
    }

    pub fn year(&self) -> Result<Year> {
        self.facts.year.ok_or_else(|| Error::missing_fact("year", self))
    }

    pub fn agreement(&self) -> Result<AgreementId> {
        self.facts
            .agreement
            .ok_or_else(|| Error::missing_fact("agreement", self))
    }

    pub fn employment_percentage(&self) -> Result<Percentage> {
        self.facts
            .employment_percentage
            .ok_or_else(|| Error::missing_fact("employment_percentage", self))
    }

    /// Evaluates `rule` against this period, memoized per result type
    pub fn evaluate<R: Rule + ?Sized>(&self, rule: &R) -> Result<R::Output> {
        let key = TypeId::of::<R::Output>();
        if let Some(cached) = self.memo.borrow().get(&key) {
            if let Some(value) = cached.downcast_ref::<R::Output>() {
                return Ok(value.clone());
            }
        }

        // The memo is not borrowed while the rule runs; rules may evaluate
        // other rules on the same period.
        let value = rule.compute(self)?;
        self.memo.borrow_mut().insert(key, Box::new(value.clone()));
        Ok(value)
    }

    /// The agreement product for `product` coupled to this period, checked
    /// for duplicates
    pub fn agreement_product(&self, product: Product) -> Result<Option<&AgreementProduct>> {
        let agreement = self.agreement()?;
        let matches: Vec<&AgreementProduct> = self
            .couplings
            .agreements
            .iter()
            .filter_map(|record| record.as_product())
            .filter(|p| p.agreement == agreement && p.product == product)
            .filter(|p| self.overlaps(p.from, p.to))
            .collect();
        single_coupling(self, &format!("{} product {}", agreement, product), matches)
    }

    /// The agreement version coupled to this period, checked for duplicates
    pub fn agreement_version(&self) -> Result<Option<&AgreementVersion>> {
        let agreement = self.agreement()?;
        let matches: Vec<&AgreementVersion> = self
            .couplings
            .agreements
            .iter()
            .filter_map(|record| record.as_version())
            .filter(|v| v.agreement == agreement)
            .filter(|v| self.overlaps(v.from, v.to))
            .collect();
        single_coupling(self, &format!("{} version", agreement), matches)
    }
}

fn single_coupling<'a, T: fmt::Debug>(
    period: &BasisPeriod,
    what: &str,
    matches: Vec<&'a T>,
) -> Result<Option<&'a T>> {
    match matches.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        all => Err(Error::DataInconsistency(format!(
            "period {} is coupled to {} records of {}: {:?}",
            period,
            all.len(),
            what,
            all
        ))),
    }
}

impl Clone for BasisPeriod {
    /// Copies interval, facts and couplings. The rule memo starts empty.
    fn clone(&self) -> Self {
        Self {
            from: self.from,
            to: self.to,
            facts: self.facts.clone(),
            couplings: self.couplings.clone(),
            memo: RefCell::new(HashMap::new()),
        }
    }
}

impl PartialEq for BasisPeriod {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.facts == other.facts
            && self.couplings == other.couplings
    }
}

impl fmt::Debug for BasisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasisPeriod")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("facts", &self.facts)
            .field("couplings", &self.couplings)
            .finish()
    }
}

impl fmt::Display for BasisPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "[{}, {}]", self.from, to),
            None => write!(f, "[{}, ..]", self.from),
        }
    }
}
