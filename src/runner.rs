//! Batch runner: periodize and orchestrate many positions
//!
//! Reference data is loaded once into the periodizer, then every position
//! history is turned into a basis and handed to the orchestrator.

use crate::agreement::AgreementLookup;
use crate::basis::{Basis, BasisFacts};
use crate::config::PipelineConfig;
use crate::domain::PositionId;
use crate::error::Result;
use crate::periodize::{PositionHistory, Periodizer};
use crate::timeseries::{RunSummary, TimeSeriesOrchestrator};
use crate::wages::WageGradeTable;
use log::{info, warn};
use rayon::prelude::*;
use std::sync::Arc;

/// Pre-loaded runner for batches of positions
///
/// # Example
/// ```ignore
/// let runner = TimeSeriesRunner::new(config, wage_grades, agreements, orchestrator)?;
/// let summary = runner.run(&histories);
/// ```
#[derive(Clone)]
pub struct TimeSeriesRunner {
    config: PipelineConfig,
    periodizer: Periodizer,
    orchestrator: TimeSeriesOrchestrator,
}

impl TimeSeriesRunner {
    pub fn new(
        config: PipelineConfig,
        wage_grades: Arc<WageGradeTable>,
        agreements: Arc<dyn AgreementLookup>,
        orchestrator: TimeSeriesOrchestrator,
    ) -> Result<Self> {
        config.validate()?;
        let (first_year, last_year) = config.window();
        let periodizer = Periodizer::new(first_year, last_year, wage_grades, agreements)?;
        Ok(Self {
            config,
            periodizer,
            orchestrator,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Periodizes and processes every history, serially or on the rayon pool
    /// per config
    pub fn run(&self, histories: &[PositionHistory]) -> RunSummary {
        info!(
            "running {} positions over {}-{}{}",
            histories.len(),
            self.config.first_year,
            self.config.last_year,
            if self.config.parallel { " in parallel" } else { "" }
        );

        let summary = if self.config.parallel {
            histories
                .par_iter()
                .map(|history| self.run_position(history))
                .reduce(RunSummary::default, RunSummary::merge)
        } else {
            histories
                .iter()
                .map(|history| self.run_position(history))
                .fold(RunSummary::default(), RunSummary::merge)
        };

        info!(
            "finished: {} positions, {} failed, {} observations, {} publish failures",
            summary.positions, summary.failed, summary.observations, summary.publish_failures
        );
        summary
    }

    fn run_position(&self, history: &PositionHistory) -> RunSummary {
        match self.periodizer.periodize(history) {
            Ok(basis) => RunSummary::default().record(self.orchestrator.process(history.position, &basis)),
            Err(error) => {
                warn!("{} could not be periodized: {}", history.position, error);
                let scoped = position_only(history.position);
                self.orchestrator.failure_handler().handle(history.position, &scoped, &error);
                RunSummary {
                    positions: 1,
                    failed: 1,
                    ..Default::default()
                }
            }
        }
    }
}

fn position_only(position: PositionId) -> Basis {
    Basis::empty().with_facts(BasisFacts {
        position: Some(position),
        ..Default::default()
    })
}
