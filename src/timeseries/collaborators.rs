//! Outward seams of the orchestrator

use super::aggregate::Observation;
use crate::basis::Basis;
use crate::domain::PositionId;
use crate::error::{Error, Result};

/// Receives every observation the orchestrator produces
pub trait Publisher: Send + Sync {
    fn publish(&self, observation: Observation) -> Result<()>;
}

/// Told about each position whose processing failed
pub trait FailureHandler: Send + Sync {
    fn handle(&self, position: PositionId, basis: &Basis, error: &Error);
}

/// Drops every observation
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardObservations;

impl Publisher for DiscardObservations {
    fn publish(&self, _observation: Observation) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreFailures;

impl FailureHandler for IgnoreFailures {
    fn handle(&self, _position: PositionId, _basis: &Basis, _error: &Error) {}
}
