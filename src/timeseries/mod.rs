//! Premium time series: per-position observations month by month
//!
//! A position basis is split per year, each year is observed at every month
//! end, and every observation basis yields one [`Observation`] per agreement.

mod aggregate;
mod annual;
mod collaborators;
mod observation;
mod orchestrator;

pub use aggregate::{aggregate_by_agreement, Observation};
pub use annual::annual_bases;
pub use collaborators::{DiscardObservations, FailureHandler, IgnoreFailures, Publisher};
pub use observation::observation_bases;
pub use orchestrator::{MeasureRules, PositionOutcome, RunSummary, TimeSeriesOrchestrator};
