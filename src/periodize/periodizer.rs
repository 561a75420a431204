//! Splits a position history into a basis of month-bounded periods
//!
//! Periods are cut at every month start inside the observation window and at
//! every boundary of the position records, the agreement records and the
//! wage-grade groupings. Each period carries the year fact the annual
//! partitioner relies on.

use super::history::{PositionHistory, PositionRecord};
use crate::agreement::{AgreementLookup, AgreementRecord};
use crate::basis::{Basis, BasisFacts, BasisPeriod, Couplings, PeriodFacts};
use crate::domain::{ymd, AgreementId, Year};
use crate::error::{Error, Result};
use crate::wages::{WageGradeGrouping, WageGradeTable};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Builds position bases for an observation window of whole years
#[derive(Clone)]
pub struct Periodizer {
    first_year: Year,
    last_year: Year,
    wage_grades: Arc<WageGradeTable>,
    agreements: Arc<dyn AgreementLookup>,
}

impl Periodizer {
    pub fn new(
        first_year: Year,
        last_year: Year,
        wage_grades: Arc<WageGradeTable>,
        agreements: Arc<dyn AgreementLookup>,
    ) -> Result<Self> {
        if first_year > last_year {
            return Err(Error::InvalidArgument(format!(
                "observation window starts in {} after it ends in {}",
                first_year, last_year
            )));
        }
        Ok(Self {
            first_year,
            last_year,
            wage_grades,
            agreements,
        })
    }

    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.first_year.first_day(), self.last_year.last_day())
    }

    pub fn periodize(&self, history: &PositionHistory) -> Result<Basis> {
        let (start, end) = self.window();
        let records = sorted_records(history)?;

        let mut agreement_ids: Vec<AgreementId> = records.iter().map(|r| r.agreement).collect();
        agreement_ids.sort();
        agreement_ids.dedup();
        let agreement_records: Vec<Arc<AgreementRecord>> = agreement_ids
            .into_iter()
            .flat_map(|id| self.agreements.records(id))
            .collect();
        let groupings = self.wage_grades.overlapping(start, Some(end));

        let mut cuts = BTreeSet::new();
        cuts.insert(start);
        for year in self.first_year.0..=self.last_year.0 {
            for month in 1..=12 {
                cuts.insert(ymd(year, month, 1));
            }
        }
        let bounds = records
            .iter()
            .map(|r| (r.from, r.to))
            .chain(agreement_records.iter().map(|r| (r.from(), r.to())))
            .chain(groupings.iter().map(|g| (g.from, g.to)));
        for (from, to) in bounds {
            cuts.insert(from);
            if let Some(next) = to.and_then(|to| to.succ_opt()) {
                cuts.insert(next);
            }
        }
        let cuts: Vec<NaiveDate> = cuts.into_iter().filter(|d| *d >= start && *d <= end).collect();

        let terminal_date = records.last().and_then(|r| r.to);
        let mut periods = Vec::new();
        for (i, from) in cuts.iter().enumerate() {
            let to = match cuts.get(i + 1) {
                Some(next) => next.pred_opt().unwrap_or(*from),
                None => end,
            };
            let Some(record) = records.iter().find(|r| r.overlaps(*from, Some(to))) else {
                continue;
            };

            let period = BasisPeriod::new(*from, Some(to))?
                .with_facts(PeriodFacts {
                    year: Some(Year::of(*from)),
                    agreement: Some(record.agreement),
                    employment_percentage: Some(record.employment_percentage),
                    pay_grade: record.pay_grade,
                    annual_salary: record.annual_salary,
                    fictional: false,
                    terminal: terminal_date == Some(to),
                })
                .with_couplings(Couplings {
                    positions: vec![Arc::clone(record)],
                    agreements: coupled(&agreement_records, record.agreement, *from, to),
                    wage_grades: groupings
                        .iter()
                        .filter(|g| g.overlaps(*from, Some(to)))
                        .cloned()
                        .collect::<Vec<Arc<WageGradeGrouping>>>(),
                });
            period.agreement_version()?;
            periods.push(period);
        }

        let basis = Basis::new(periods)?.with_facts(BasisFacts {
            position: Some(history.position),
            premium_status: history.premium_status.clone(),
            ..Default::default()
        });
        debug!("{}: periodized into {} periods", history.position, basis.len());
        Ok(basis)
    }
}

fn sorted_records(history: &PositionHistory) -> Result<Vec<Arc<PositionRecord>>> {
    let mut records: Vec<Arc<PositionRecord>> = history.records.iter().cloned().map(Arc::new).collect();
    records.sort_by_key(|r| r.from);

    for record in &records {
        if record.to.map_or(false, |to| to < record.from) {
            return Err(Error::InvalidState(format!(
                "{} has a record ending before it starts: {}",
                history.position, record
            )));
        }
    }
    for pair in records.windows(2) {
        if pair[0].overlaps(pair[1].from, pair[1].to) {
            return Err(Error::DataInconsistency(format!(
                "{} has overlapping records {} and {}",
                history.position, pair[0], pair[1]
            )));
        }
    }
    Ok(records)
}

fn coupled(
    records: &[Arc<AgreementRecord>],
    agreement: AgreementId,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<Arc<AgreementRecord>> {
    records
        .iter()
        .filter(|r| r.agreement() == agreement && r.overlaps(from, Some(to)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::{AgreementRegistry, AgreementVersion, NoAgreementLookup};
    use crate::domain::{Kroner, Percentage, PositionId};
    use crate::wages::{PayGrade, WageGradeRecord};

    fn periodizer(first: i32, last: i32) -> Periodizer {
        Periodizer::new(
            Year(first),
            Year(last),
            Arc::new(WageGradeTable::new()),
            Arc::new(NoAgreementLookup),
        )
        .unwrap()
    }

    fn record(from: NaiveDate, to: Option<NaiveDate>, agreement: u32) -> PositionRecord {
        PositionRecord::new(from, to, AgreementId(agreement), Percentage::FULL)
    }

    #[test]
    fn test_rejects_inverted_window() {
        let result = Periodizer::new(
            Year(2013),
            Year(2012),
            Arc::new(WageGradeTable::new()),
            Arc::new(NoAgreementLookup),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_terminated_position_gets_monthly_periods() {
        let history = PositionHistory::new(
            PositionId(1),
            vec![record(ymd(2012, 1, 1), Some(ymd(2012, 5, 31)), 100)],
        );
        let basis = periodizer(2012, 2012).periodize(&history).unwrap();

        assert_eq!(basis.len(), 5);
        assert_eq!(basis.position().unwrap(), PositionId(1));
        let last = basis.last().unwrap();
        assert_eq!(last.from(), ymd(2012, 5, 1));
        assert_eq!(last.to(), Some(ymd(2012, 5, 31)));
        assert!(last.is_terminal());
        assert_eq!(basis.iter().filter(|p| p.is_terminal()).count(), 1);
        assert!(basis.iter().all(|p| p.facts.year == Some(Year(2012))));
        assert!(basis.iter().all(|p| p.couplings.positions.len() == 1));
    }

    #[test]
    fn test_open_position_is_clipped_to_window() {
        let history = PositionHistory::new(PositionId(2), vec![record(ymd(2011, 7, 1), None, 100)]);
        let basis = periodizer(2012, 2013).periodize(&history).unwrap();

        assert_eq!(basis.len(), 24);
        assert_eq!(basis.first().unwrap().from(), ymd(2012, 1, 1));
        assert_eq!(basis.last().unwrap().to(), Some(ymd(2013, 12, 31)));
        assert!(basis.iter().all(|p| !p.is_terminal()));
        assert_eq!(basis.iter().filter(|p| p.facts.year == Some(Year(2013))).count(), 12);
    }

    #[test]
    fn test_mid_month_change_splits_the_month() {
        let history = PositionHistory::new(
            PositionId(3),
            vec![
                record(ymd(2012, 1, 1), Some(ymd(2012, 3, 15)), 100),
                PositionRecord::new(ymd(2012, 3, 16), None, AgreementId(100), Percentage::percent(50)),
            ],
        );
        let basis = periodizer(2012, 2012).periodize(&history).unwrap();

        assert_eq!(basis.len(), 13);
        let march: Vec<&BasisPeriod> = basis.iter().filter(|p| p.from().format("%m").to_string() == "03").collect();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].to(), Some(ymd(2012, 3, 15)));
        assert_eq!(march[1].facts.employment_percentage, Some(Percentage::percent(50)));
        // A change of record is not the end of the position's history
        assert!(basis.iter().all(|p| !p.is_terminal()));
    }

    #[test]
    fn test_gaps_between_records_are_left_out() {
        let history = PositionHistory::new(
            PositionId(4),
            vec![
                record(ymd(2012, 1, 1), Some(ymd(2012, 2, 29)), 100),
                record(ymd(2012, 10, 1), Some(ymd(2012, 12, 31)), 100),
            ],
        );
        let basis = periodizer(2012, 2012).periodize(&history).unwrap();
        assert_eq!(basis.len(), 5);
        assert!(basis.last().unwrap().is_terminal());
    }

    #[test]
    fn test_overlapping_records_are_inconsistent() {
        let history = PositionHistory::new(
            PositionId(5),
            vec![
                record(ymd(2012, 1, 1), Some(ymd(2012, 6, 30)), 100),
                record(ymd(2012, 6, 1), None, 200),
            ],
        );
        let result = periodizer(2012, 2012).periodize(&history);
        assert!(matches!(result, Err(Error::DataInconsistency(_))));
    }

    #[test]
    fn test_reference_boundaries_split_periods() {
        let wage_grades = WageGradeTable::from_records(vec![WageGradeRecord {
            grade: PayGrade(40),
            from: ymd(2012, 4, 15),
            to: None,
            annual_salary: Kroner::new(400_000),
        }]);
        let agreements = AgreementRegistry::from_records(vec![
            AgreementRecord::Version(AgreementVersion {
                agreement: AgreementId(100),
                from: ymd(2000, 1, 1),
                to: Some(ymd(2012, 8, 9)),
                version: 1,
            }),
            AgreementRecord::Version(AgreementVersion {
                agreement: AgreementId(100),
                from: ymd(2012, 8, 10),
                to: None,
                version: 2,
            }),
        ]);
        let periodizer = Periodizer::new(Year(2012), Year(2012), Arc::new(wage_grades), Arc::new(agreements)).unwrap();
        let history = PositionHistory::new(PositionId(6), vec![record(ymd(2012, 1, 1), None, 100)]);
        let basis = periodizer.periodize(&history).unwrap();

        assert_eq!(basis.len(), 14);
        let april_second_half = basis.iter().find(|p| p.from() == ymd(2012, 4, 15)).unwrap();
        assert_eq!(april_second_half.couplings.wage_grades.len(), 1);
        let april_first_half = basis.iter().find(|p| p.from() == ymd(2012, 4, 1)).unwrap();
        assert!(april_first_half.couplings.wage_grades.is_empty());

        let august_end = basis.iter().find(|p| p.from() == ymd(2012, 8, 10)).unwrap();
        assert_eq!(august_end.agreement_version().unwrap().map(|v| v.version), Some(2));
    }

    #[test]
    fn test_overlapping_agreement_versions_are_inconsistent() {
        let agreements = AgreementRegistry::from_records(vec![
            AgreementRecord::Version(AgreementVersion {
                agreement: AgreementId(100),
                from: ymd(2000, 1, 1),
                to: None,
                version: 1,
            }),
            AgreementRecord::Version(AgreementVersion {
                agreement: AgreementId(100),
                from: ymd(2012, 6, 1),
                to: None,
                version: 2,
            }),
        ]);
        let periodizer = Periodizer::new(
            Year(2012),
            Year(2012),
            Arc::new(WageGradeTable::new()),
            Arc::new(agreements),
        )
        .unwrap();
        let history = PositionHistory::new(PositionId(7), vec![record(ymd(2012, 1, 1), None, 100)]);
        assert!(matches!(periodizer.periodize(&history), Err(Error::DataInconsistency(_))));
    }

    #[test]
    fn test_history_outside_window_is_empty() {
        let history = PositionHistory::new(
            PositionId(8),
            vec![record(ymd(2005, 1, 1), Some(ymd(2006, 12, 31)), 100)],
        );
        let basis = periodizer(2012, 2012).periodize(&history).unwrap();
        assert!(basis.is_empty());
        assert_eq!(basis.position().unwrap(), PositionId(8));
    }
}
