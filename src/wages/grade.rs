//! Wage-grade tables and the consistency-checked salary lookup

use crate::basis::BasisPeriod;
use crate::domain::{overlaps, Kroner};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Pay grade (lønnstrinn) on the public wage scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayGrade(pub u16);

impl fmt::Display for PayGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pay grade {}", self.0)
    }
}

/// One grade's yearly salary, valid for a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageGradeRecord {
    pub grade: PayGrade,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub annual_salary: Kroner,
}

/// All grade records sharing one identical effective date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WageGradeGrouping {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    salaries: BTreeMap<PayGrade, Kroner>,
}

impl WageGradeGrouping {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Self {
        Self {
            from,
            to,
            salaries: BTreeMap::new(),
        }
    }

    pub fn with_grade(mut self, grade: PayGrade, annual_salary: Kroner) -> Self {
        self.salaries.insert(grade, annual_salary);
        self
    }

    pub fn salary(&self, grade: PayGrade) -> Option<Kroner> {
        self.salaries.get(&grade).copied()
    }

    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        overlaps(self.from, self.to, from, to)
    }

    pub fn grades(&self) -> usize {
        self.salaries.len()
    }
}

impl fmt::Display for WageGradeGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "wage grades [{}, {}]", self.from, to),
            None => write!(f, "wage grades [{}, ..]", self.from),
        }
    }
}

/// Every wage-grade grouping known to a run, built once before processing
#[derive(Debug, Clone, Default)]
pub struct WageGradeTable {
    groupings: Vec<Arc<WageGradeGrouping>>,
}

impl WageGradeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups records by identical `[from, to]` range
    pub fn from_records<I: IntoIterator<Item = WageGradeRecord>>(records: I) -> Self {
        let mut grouped: BTreeMap<(NaiveDate, Option<NaiveDate>), WageGradeGrouping> = BTreeMap::new();
        for record in records {
            let grouping = grouped
                .entry((record.from, record.to))
                .or_insert_with(|| WageGradeGrouping::new(record.from, record.to));
            grouping.salaries.insert(record.grade, record.annual_salary);
        }
        Self {
            groupings: grouped.into_values().map(Arc::new).collect(),
        }
    }

    pub fn groupings(&self) -> &[Arc<WageGradeGrouping>] {
        &self.groupings
    }

    pub fn overlapping(&self, from: NaiveDate, to: Option<NaiveDate>) -> Vec<Arc<WageGradeGrouping>> {
        self.groupings
            .iter()
            .filter(|g| g.overlaps(from, to))
            .cloned()
            .collect()
    }
}

/// Yearly salary for `grade` in `period`.
///
/// Only groupings coupled to the period, active in it and holding the grade
/// count. None of them is a legitimate "no wage configured" answer; more
/// than one is inconsistent reference data.
pub fn salary_for_grade(period: &BasisPeriod, grade: PayGrade) -> Result<Option<Kroner>> {
    let candidates: Vec<&WageGradeGrouping> = period
        .couplings
        .wage_grades
        .iter()
        .map(|g| g.as_ref())
        .filter(|g| g.overlaps(period.from(), period.to()))
        .filter(|g| g.salary(grade).is_some())
        .collect();

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(only.salary(grade)),
        all => {
            let listed: Vec<String> = all
                .iter()
                .map(|g| format!("{} ({})", g, g.salary(grade).unwrap_or_default()))
                .collect();
            Err(Error::DataInconsistency(format!(
                "{} has {} active wage-grade groupings in period {}: {}",
                grade,
                all.len(),
                period,
                listed.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ymd;

    fn record(grade: u16, from: NaiveDate, to: Option<NaiveDate>, salary: i64) -> WageGradeRecord {
        WageGradeRecord {
            grade: PayGrade(grade),
            from,
            to,
            annual_salary: Kroner::new(salary),
        }
    }

    fn coupled(period: (NaiveDate, NaiveDate), table: &WageGradeTable) -> BasisPeriod {
        let mut p = BasisPeriod::new(period.0, Some(period.1)).unwrap();
        p.couplings.wage_grades = table.overlapping(p.from(), p.to());
        p
    }

    #[test]
    fn test_from_records_groups_identical_ranges() {
        let table = WageGradeTable::from_records(vec![
            record(30, ymd(2011, 5, 1), Some(ymd(2012, 4, 30)), 300_000),
            record(31, ymd(2011, 5, 1), Some(ymd(2012, 4, 30)), 310_000),
            record(30, ymd(2012, 5, 1), None, 320_000),
        ]);
        assert_eq!(table.groupings().len(), 2);
        assert_eq!(table.groupings()[0].grades(), 2);
        assert_eq!(table.groupings()[1].grades(), 1);
    }

    #[test]
    fn test_lookup_at_any_date_returns_at_most_one() {
        let table = WageGradeTable::from_records(vec![
            record(30, ymd(2011, 5, 1), Some(ymd(2012, 4, 30)), 300_000),
            record(30, ymd(2012, 5, 1), Some(ymd(2013, 4, 30)), 320_000),
            record(31, ymd(2012, 5, 1), Some(ymd(2013, 4, 30)), 330_000),
        ]);

        let april = coupled((ymd(2012, 4, 1), ymd(2012, 4, 30)), &table);
        assert_eq!(salary_for_grade(&april, PayGrade(30)).unwrap(), Some(Kroner::new(300_000)));
        assert_eq!(salary_for_grade(&april, PayGrade(31)).unwrap(), None);

        let may = coupled((ymd(2012, 5, 1), ymd(2012, 5, 31)), &table);
        assert_eq!(salary_for_grade(&may, PayGrade(30)).unwrap(), Some(Kroner::new(320_000)));
        assert_eq!(salary_for_grade(&may, PayGrade(31)).unwrap(), Some(Kroner::new(330_000)));
    }

    #[test]
    fn test_unconfigured_grade_is_absent_not_an_error() {
        let table = WageGradeTable::from_records(vec![record(30, ymd(2012, 1, 1), None, 300_000)]);
        let june = coupled((ymd(2012, 6, 1), ymd(2012, 6, 30)), &table);
        assert_eq!(salary_for_grade(&june, PayGrade(99)).unwrap(), None);

        let uncoupled = BasisPeriod::new(ymd(2012, 6, 1), Some(ymd(2012, 6, 30))).unwrap();
        assert_eq!(salary_for_grade(&uncoupled, PayGrade(30)).unwrap(), None);
    }

    #[test]
    fn test_overlapping_groupings_are_inconsistent() {
        let table = WageGradeTable::from_records(vec![
            record(30, ymd(2012, 1, 1), Some(ymd(2012, 12, 31)), 300_000),
            record(30, ymd(2012, 5, 1), None, 320_000),
            // Overlaps too, but lacks the grade
            record(45, ymd(2012, 3, 1), None, 450_000),
        ]);
        let june = coupled((ymd(2012, 6, 1), ymd(2012, 6, 30)), &table);

        let err = salary_for_grade(&june, PayGrade(30)).unwrap_err();
        let message = match err {
            Error::DataInconsistency(message) => message,
            other => panic!("unexpected error {:?}", other),
        };
        assert!(message.contains("pay grade 30"));
        assert!(message.contains("[2012-06-01, 2012-06-30]"));
        assert!(message.contains("wage grades [2012-01-01, 2012-12-31]"));
        assert!(message.contains("wage grades [2012-05-01, ..]"));
        assert!(!message.contains("2012-03-01"));
    }

    #[test]
    fn test_grouping_not_active_in_period_is_ignored() {
        let stale = Arc::new(
            WageGradeGrouping::new(ymd(2010, 1, 1), Some(ymd(2010, 12, 31)))
                .with_grade(PayGrade(30), Kroner::new(250_000)),
        );
        let current = Arc::new(
            WageGradeGrouping::new(ymd(2012, 1, 1), None).with_grade(PayGrade(30), Kroner::new(300_000)),
        );
        let mut june = BasisPeriod::new(ymd(2012, 6, 1), Some(ymd(2012, 6, 30))).unwrap();
        june.couplings.wage_grades = vec![stale, current];
        assert_eq!(salary_for_grade(&june, PayGrade(30)).unwrap(), Some(Kroner::new(300_000)));
    }
}
