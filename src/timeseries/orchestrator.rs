//! Time-series orchestration
//!
//! Drives one position basis through annual partitioning, monthly observation
//! bases, per-period rule evaluation and per-agreement aggregation, then hands
//! the results to the publisher. A failing position is reported to the
//! failure handler and the remaining positions are still processed.

use super::aggregate::{aggregate_by_agreement, Observation};
use super::annual::annual_bases;
use super::collaborators::{DiscardObservations, FailureHandler, IgnoreFailures, Publisher};
use super::observation::observation_bases;
use crate::basis::{Basis, BasisPeriod, Rule};
use crate::domain::PositionId;
use crate::error::Result;
use crate::premium::PremiumRuleSet;
use crate::rules::{EmploymentManYears, MachineBasis, ManYears, SalaryMachineBasis};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// The rules evaluated for every period of an observation basis
#[derive(Clone)]
pub struct MeasureRules {
    pub machine_basis: Arc<dyn Rule<Output = MachineBasis>>,
    pub man_years: Arc<dyn Rule<Output = ManYears>>,
    pub premiums: PremiumRuleSet,
}

impl Default for MeasureRules {
    fn default() -> Self {
        Self {
            machine_basis: Arc::new(SalaryMachineBasis),
            man_years: Arc::new(EmploymentManYears),
            premiums: PremiumRuleSet::standard(),
        }
    }
}

/// What happened to one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOutcome {
    Published { observations: usize, publish_failures: usize },
    Failed,
}

/// Counts over a batch of positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub positions: usize,
    pub failed: usize,
    pub observations: usize,
    pub publish_failures: usize,
}

impl RunSummary {
    pub fn record(mut self, outcome: PositionOutcome) -> Self {
        self.positions += 1;
        match outcome {
            PositionOutcome::Published {
                observations,
                publish_failures,
            } => {
                self.observations += observations;
                self.publish_failures += publish_failures;
            }
            PositionOutcome::Failed => self.failed += 1,
        }
        self
    }

    pub fn merge(self, other: RunSummary) -> Self {
        Self {
            positions: self.positions + other.positions,
            failed: self.failed + other.failed,
            observations: self.observations + other.observations,
            publish_failures: self.publish_failures + other.publish_failures,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.positions - self.failed
    }
}

#[derive(Clone)]
pub struct TimeSeriesOrchestrator {
    rules: MeasureRules,
    publisher: Arc<dyn Publisher>,
    failures: Arc<dyn FailureHandler>,
}

impl TimeSeriesOrchestrator {
    pub fn new(rules: MeasureRules, publisher: Arc<dyn Publisher>, failures: Arc<dyn FailureHandler>) -> Self {
        Self {
            rules,
            publisher,
            failures,
        }
    }

    pub fn failure_handler(&self) -> &Arc<dyn FailureHandler> {
        &self.failures
    }

    /// Every observation of one position basis, in basis-then-month order
    pub fn observe(&self, basis: &Basis) -> Result<Vec<Observation>> {
        let annuals = annual_bases(basis)?;
        let mut observations = Vec::new();
        if annuals.is_empty() {
            return Ok(observations);
        }
        let position = basis.position()?;
        for annual in annuals {
            let monthly = observation_bases(&annual)?;
            debug!(
                "{}: {} observation bases for {}",
                position,
                monthly.len(),
                annual.facts.year.map(|y| y.to_string()).unwrap_or_default()
            );
            for observed in monthly {
                let per_period = observed
                    .iter()
                    .map(|period| self.observe_period(position, &observed, period))
                    .collect::<Result<Vec<_>>>()?;
                observations.extend(aggregate_by_agreement(per_period)?);
            }
        }
        Ok(observations)
    }

    fn observe_period(&self, position: PositionId, observed: &Basis, period: &BasisPeriod) -> Result<Observation> {
        let MachineBasis(machine_basis) = period.evaluate(self.rules.machine_basis.as_ref())?;
        let ManYears(man_years) = period.evaluate(self.rules.man_years.as_ref())?;
        let premiums = self.rules.premiums.premiums(period, machine_basis)?;

        Ok(Observation {
            position,
            agreement: period.agreement()?,
            observation_date: observed.observation_date()?,
            premium_status: observed.facts.premium_status.clone(),
            machine_basis,
            man_years,
            premiums,
        })
    }

    /// Observes and publishes one position. Nothing is published for a
    /// position that fails.
    pub fn process(&self, position: PositionId, basis: &Basis) -> PositionOutcome {
        let observations = match self.observe(basis) {
            Ok(observations) => observations,
            Err(error) => {
                warn!("{} failed: {}", position, error);
                self.failures.handle(position, basis, &error);
                return PositionOutcome::Failed;
            }
        };

        let count = observations.len();
        let mut publish_failures = 0;
        for observation in observations {
            if let Err(error) = self.publisher.publish(observation) {
                warn!("{}: publishing failed: {}", position, error);
                publish_failures += 1;
            }
        }
        PositionOutcome::Published {
            observations: count,
            publish_failures,
        }
    }

    pub fn process_all<I>(&self, bases: I) -> RunSummary
    where
        I: IntoIterator<Item = (PositionId, Basis)>,
    {
        let summary = bases
            .into_iter()
            .fold(RunSummary::default(), |summary, (position, basis)| {
                summary.record(self.process(position, &basis))
            });
        info!(
            "processed {} positions: {} failed, {} observations",
            summary.positions, summary.failed, summary.observations
        );
        summary
    }

    /// Same as [`process_all`](Self::process_all) with positions spread over
    /// the rayon pool. Publication order across positions is unspecified.
    pub fn process_parallel(&self, bases: Vec<(PositionId, Basis)>) -> RunSummary {
        let summary = bases
            .into_par_iter()
            .map(|(position, basis)| RunSummary::default().record(self.process(position, &basis)))
            .reduce(RunSummary::default, RunSummary::merge);
        info!(
            "processed {} positions in parallel: {} failed, {} observations",
            summary.positions, summary.failed, summary.observations
        );
        summary
    }
}

impl Default for TimeSeriesOrchestrator {
    fn default() -> Self {
        Self::new(
            MeasureRules::default(),
            Arc::new(DiscardObservations),
            Arc::new(IgnoreFailures),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::{AgreementProduct, AgreementRecord, AgreementRegistry};
    use crate::basis::{BasisFacts, PeriodFacts};
    use crate::domain::{ymd, AgreementId, Kroner, Percentage, PremiumStatus, Year};
    use crate::error::Error;
    use crate::periodize::{PositionHistory, PositionRecord, Periodizer};
    use crate::premium::{PercentRates, Premiebeloep, Product, RateTable};
    use rust_decimal::Decimal;
    use crate::wages::WageGradeTable;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        published: Mutex<Vec<Observation>>,
        failed: Mutex<Vec<(PositionId, String)>>,
    }

    impl Publisher for Recorder {
        fn publish(&self, observation: Observation) -> Result<()> {
            self.published.lock().unwrap().push(observation);
            Ok(())
        }
    }

    impl FailureHandler for Recorder {
        fn handle(&self, position: PositionId, _basis: &Basis, error: &Error) {
            self.failed.lock().unwrap().push((position, error.to_string()));
        }
    }

    struct Refusing;

    impl Publisher for Refusing {
        fn publish(&self, _observation: Observation) -> Result<()> {
            Err(Error::InvalidState("publisher closed".to_string()))
        }
    }

    fn pension(agreement: u32, employer: u32) -> AgreementRecord {
        AgreementRecord::Product(AgreementProduct {
            agreement: AgreementId(agreement),
            product: Product::Pension,
            from: ymd(2000, 1, 1),
            to: None,
            rates: RateTable::Percent(PercentRates {
                employer: Percentage::percent(employer),
                member: Percentage::percent(5),
                admin_fee: Percentage::ZERO,
            }),
        })
    }

    fn periodizer() -> Periodizer {
        let agreements = AgreementRegistry::from_records(vec![pension(100, 20), pension(200, 10)]);
        Periodizer::new(Year(2012), Year(2012), Arc::new(WageGradeTable::new()), Arc::new(agreements)).unwrap()
    }

    /// Agreement 100 for the first half of 2012, agreement 200 from July
    fn two_agreement_history() -> PositionHistory {
        let salary = Kroner::new(366_000);
        PositionHistory::new(
            PositionId(7),
            vec![
                PositionRecord::new(ymd(2012, 1, 1), Some(ymd(2012, 6, 30)), AgreementId(100), Percentage::FULL)
                    .with_salary(salary),
                PositionRecord::new(ymd(2012, 7, 1), None, AgreementId(200), Percentage::FULL).with_salary(salary),
            ],
        )
    }

    fn orchestrator(recorder: &Arc<Recorder>) -> TimeSeriesOrchestrator {
        TimeSeriesOrchestrator::new(MeasureRules::default(), recorder.clone(), recorder.clone())
    }

    #[test]
    fn test_two_agreements_in_one_year() {
        let basis = periodizer().periodize(&two_agreement_history()).unwrap();
        let observations = TimeSeriesOrchestrator::default().observe(&basis).unwrap();

        // One per month for January to June, two from July on
        assert_eq!(observations.len(), 18);

        let december: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.observation_date == ymd(2012, 12, 31))
            .collect();
        assert_eq!(december.len(), 2);
        assert_eq!(december[0].agreement, AgreementId(100));
        assert_eq!(december[1].agreement, AgreementId(200));

        assert_eq!(Premiebeloep::from_kroner(december[0].machine_basis).unwrap(), Premiebeloep::from_integer(182_000));
        assert_eq!(Premiebeloep::from_kroner(december[1].machine_basis).unwrap(), Premiebeloep::from_integer(184_000));
        assert_relative_eq!(december[0].man_years + december[1].man_years, 1.0, epsilon = 1e-9);
        assert_eq!(december[0].premium(Product::Pension).employer, Premiebeloep::from_integer(36_400));
        assert_eq!(december[1].premium(Product::Pension).employer, Premiebeloep::from_integer(18_400));
        assert_eq!(december[1].premium(Product::Disability).total().unwrap(), Premiebeloep::zero());
    }

    #[test]
    fn test_running_position_is_projected_to_year_end() {
        let basis = periodizer().periodize(&two_agreement_history()).unwrap();
        let observations = TimeSeriesOrchestrator::default().observe(&basis).unwrap();

        for observation in observations.iter().take(6) {
            assert_eq!(observation.agreement, AgreementId(100));
            assert_eq!(Premiebeloep::from_kroner(observation.machine_basis).unwrap(), Premiebeloep::from_integer(366_000));
            assert_eq!(observation.premium(Product::Pension).employer, Premiebeloep::from_integer(73_200));
            assert_relative_eq!(observation.man_years, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_process_publishes_in_order() {
        let recorder = Arc::new(Recorder::default());
        let basis = periodizer().periodize(&two_agreement_history()).unwrap();

        let outcome = orchestrator(&recorder).process(PositionId(7), &basis);
        assert_eq!(
            outcome,
            PositionOutcome::Published {
                observations: 18,
                publish_failures: 0
            }
        );

        let published = recorder.published.lock().unwrap();
        assert_eq!(published.len(), 18);
        assert!(published.windows(2).all(|w| w[0].observation_date <= w[1].observation_date));
        assert!(recorder.failed.lock().unwrap().is_empty());
    }

    fn broken_basis(position: u64) -> Basis {
        let good = BasisPeriod::new(ymd(2012, 1, 1), Some(ymd(2012, 1, 31)))
            .unwrap()
            .with_facts(PeriodFacts {
                year: Some(Year(2012)),
                agreement: Some(AgreementId(100)),
                employment_percentage: Some(Percentage::FULL),
                ..Default::default()
            });
        let mut facts = good.facts.clone();
        facts.year = Some(Year(2013));
        facts.agreement = None;
        let missing = BasisPeriod::new(ymd(2013, 1, 1), Some(ymd(2013, 1, 31)))
            .unwrap()
            .with_facts(facts);
        Basis::new(vec![good, missing]).unwrap().with_facts(BasisFacts {
            position: Some(PositionId(position)),
            ..Default::default()
        })
    }

    #[test]
    fn test_failing_position_publishes_nothing() {
        let recorder = Arc::new(Recorder::default());
        let outcome = orchestrator(&recorder).process(PositionId(3), &broken_basis(3));

        assert_eq!(outcome, PositionOutcome::Failed);
        assert!(recorder.published.lock().unwrap().is_empty());
        let failed = recorder.failed.lock().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, PositionId(3));
        assert!(failed[0].1.contains("agreement"));
    }

    #[test]
    fn test_failure_does_not_stop_the_batch() {
        let recorder = Arc::new(Recorder::default());
        let good = periodizer().periodize(&two_agreement_history()).unwrap();
        let batch = vec![(PositionId(3), broken_basis(3)), (PositionId(7), good)];

        let summary = orchestrator(&recorder).process_all(batch);
        assert_eq!(summary.positions, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.observations, 18);
        assert_eq!(recorder.published.lock().unwrap().len(), 18);
    }

    #[test]
    fn test_overflowing_position_fails_alone() {
        let recorder = Arc::new(Recorder::default());
        let periodizer = periodizer();
        let mut overflowing = two_agreement_history();
        overflowing.position = PositionId(8);
        for record in &mut overflowing.records {
            record.annual_salary = Some(Kroner(Decimal::MAX));
        }
        let batch = vec![
            (PositionId(8), periodizer.periodize(&overflowing).unwrap()),
            (PositionId(7), periodizer.periodize(&two_agreement_history()).unwrap()),
        ];

        let summary = orchestrator(&recorder).process_all(batch);
        assert_eq!(summary.positions, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.observations, 18);

        let failed = recorder.failed.lock().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, PositionId(8));
        assert!(failed[0].1.contains("overflows"));
        let published = recorder.published.lock().unwrap();
        assert!(published.iter().all(|o| o.position == PositionId(7)));
    }

    #[test]
    fn test_premium_status_reaches_every_observation() {
        let recorder = Arc::new(Recorder::default());
        let status = PremiumStatus("active".to_string());
        let history = two_agreement_history().with_premium_status(status.clone());
        let basis = periodizer().periodize(&history).unwrap();

        // January sees a fictional period for the rest of the year
        let annual = annual_bases(&basis).unwrap().remove(0);
        let january = observation_bases(&annual).unwrap().remove(0);
        assert!(january.iter().any(BasisPeriod::is_fictional));

        orchestrator(&recorder).process(PositionId(7), &basis);
        let published = recorder.published.lock().unwrap();
        assert_eq!(published.len(), 18);
        assert!(published.iter().all(|o| o.premium_status.as_ref() == Some(&status)));
        assert!(published.iter().any(|o| o.observation_date == ymd(2012, 1, 31)));
        assert!(published.iter().any(|o| o.observation_date == ymd(2012, 12, 31)));

        let without = periodizer().periodize(&two_agreement_history()).unwrap();
        let observations = TimeSeriesOrchestrator::default().observe(&without).unwrap();
        assert!(observations.iter().all(|o| o.premium_status.is_none()));
    }

    #[test]
    fn test_publisher_errors_are_counted_and_ignored() {
        let orchestrator =
            TimeSeriesOrchestrator::new(MeasureRules::default(), Arc::new(Refusing), Arc::new(IgnoreFailures));
        let basis = periodizer().periodize(&two_agreement_history()).unwrap();
        let summary = orchestrator.process_all(vec![(PositionId(7), basis)]);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.publish_failures, 18);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let periodizer = periodizer();
        let batch = || -> Vec<(PositionId, Basis)> {
            (0..8)
                .map(|i| {
                    let mut history = two_agreement_history();
                    history.position = PositionId(i);
                    (history.position, periodizer.periodize(&history).unwrap())
                })
                .chain(std::iter::once((PositionId(99), broken_basis(99))))
                .collect()
        };

        let serial = Arc::new(Recorder::default());
        let parallel = Arc::new(Recorder::default());
        let serial_summary = orchestrator(&serial).process_all(batch());
        let parallel_summary = orchestrator(&parallel).process_parallel(batch());

        assert_eq!(serial_summary, parallel_summary);
        assert_eq!(parallel_summary.positions, 9);
        assert_eq!(parallel_summary.failed, 1);

        let key = |o: &Observation| (o.position, o.observation_date, o.agreement);
        let mut a = serial.published.lock().unwrap().clone();
        let mut b = parallel.published.lock().unwrap().clone();
        a.sort_by_key(key);
        b.sort_by_key(key);
        assert_eq!(a, b);
    }
}
