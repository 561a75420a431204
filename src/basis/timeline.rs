//! A basis: ordered, non-overlapping periods plus whole-basis facts

use super::facts::BasisFacts;
use super::period::BasisPeriod;
use crate::domain::PositionId;
use crate::error::{Error, Result};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Basis {
    periods: Vec<BasisPeriod>,
    pub facts: BasisFacts,
}

impl Basis {
    /// Builds a basis, rejecting unsorted or overlapping periods
    pub fn new(periods: Vec<BasisPeriod>) -> Result<Self> {
        for pair in periods.windows(2) {
            check_follows(&pair[0], &pair[1])?;
        }
        Ok(Self {
            periods,
            facts: BasisFacts::default(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_facts(mut self, facts: BasisFacts) -> Self {
        self.facts = facts;
        self
    }

    /// Appends a period after the current last one
    pub fn push(&mut self, period: BasisPeriod) -> Result<()> {
        if let Some(last) = self.periods.last() {
            check_follows(last, &period)?;
        }
        self.periods.push(period);
        Ok(())
    }

    pub fn periods(&self) -> &[BasisPeriod] {
        &self.periods
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BasisPeriod> {
        self.periods.iter()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn first(&self) -> Option<&BasisPeriod> {
        self.periods.first()
    }

    pub fn last(&self) -> Option<&BasisPeriod> {
        self.periods.last()
    }

    /// Copy of this basis holding only the periods matching `predicate`.
    /// Whole-basis facts are kept.
    pub fn restrict<P>(&self, predicate: P) -> Basis
    where
        P: Fn(&BasisPeriod) -> bool,
    {
        Basis {
            periods: self.periods.iter().filter(|p| predicate(p)).cloned().collect(),
            facts: self.facts.clone(),
        }
    }

    pub fn position(&self) -> Result<PositionId> {
        self.facts
            .position
            .ok_or_else(|| Error::missing_fact("position", "basis"))
    }

    pub fn observation_date(&self) -> Result<NaiveDate> {
        self.facts
            .observation_date
            .ok_or_else(|| Error::missing_fact("observation_date", "basis"))
    }
}

impl<'a> IntoIterator for &'a Basis {
    type Item = &'a BasisPeriod;
    type IntoIter = std::slice::Iter<'a, BasisPeriod>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

fn check_follows(previous: &BasisPeriod, next: &BasisPeriod) -> Result<()> {
    match previous.to() {
        Some(to) if to < next.from() => Ok(()),
        _ => Err(Error::InvalidState(format!(
            "period {} does not end before period {} starts",
            previous, next
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ymd, Year};

    fn period(from: (u32, u32), to: (u32, u32)) -> BasisPeriod {
        BasisPeriod::new(ymd(2012, from.0, from.1), Some(ymd(2012, to.0, to.1))).unwrap()
    }

    #[test]
    fn test_rejects_overlap_and_disorder() {
        let overlapping = vec![period((1, 1), (1, 31)), period((1, 31), (2, 29))];
        assert!(matches!(Basis::new(overlapping), Err(Error::InvalidState(_))));

        let unsorted = vec![period((2, 1), (2, 29)), period((1, 1), (1, 31))];
        assert!(Basis::new(unsorted).is_err());

        let open_then_more = vec![
            BasisPeriod::new(ymd(2012, 1, 1), None).unwrap(),
            period((2, 1), (2, 29)),
        ];
        assert!(Basis::new(open_then_more).is_err());
    }

    #[test]
    fn test_gaps_are_allowed() {
        let basis = Basis::new(vec![period((1, 1), (1, 31)), period((3, 1), (3, 31))]).unwrap();
        assert_eq!(basis.len(), 2);
    }

    #[test]
    fn test_push_checks_order() {
        let mut basis = Basis::new(vec![period((1, 1), (1, 31))]).unwrap();
        assert!(basis.push(period((2, 1), (2, 29))).is_ok());
        assert!(basis.push(period((2, 15), (3, 31))).is_err());
        assert_eq!(basis.len(), 2);
    }

    #[test]
    fn test_restrict_keeps_whole_basis_facts() {
        let mut march = period((3, 1), (3, 31));
        march.facts.year = Some(Year(2012));
        let basis = Basis::new(vec![period((1, 1), (1, 31)), march])
            .unwrap()
            .with_facts(BasisFacts {
                position: Some(PositionId(5)),
                ..Default::default()
            });

        let restricted = basis.restrict(|p| p.facts.year.is_some());
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted.first().map(|p| p.from()), Some(ymd(2012, 3, 1)));
        assert_eq!(restricted.position().unwrap(), PositionId(5));
        assert!(restricted.observation_date().is_err());
    }
}
