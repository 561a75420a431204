//! Premium Time Series - month-by-month pension premium observations
//!
//! This library provides:
//! - Periodization of position histories into month-bounded bases
//! - Annual partitioning and "as observed on" month-end bases with forward projection
//! - Premium arithmetic in kroner and per-product premium formulas
//! - Aggregation of observations per agreement and pluggable publishing
//! - A batch runner over many positions, serial or parallel

pub mod domain;
pub mod error;
pub mod basis;
pub mod agreement;
pub mod wages;
pub mod premium;
pub mod periodize;
pub mod rules;
pub mod timeseries;
pub mod publish;
pub mod config;
pub mod runner;

// Re-export commonly used types
pub use basis::{Basis, BasisPeriod, Rule};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use periodize::{PositionHistory, PositionRecord, Periodizer};
pub use premium::{Premiebeloep, Premium, PremiumRuleSet, Product};
pub use runner::TimeSeriesRunner;
pub use timeseries::{Observation, RunSummary, TimeSeriesOrchestrator};
