//! Concrete publishers and failure handlers

use crate::basis::Basis;
use crate::domain::PositionId;
use crate::error::{Error, Result};
use crate::premium::{Premiebeloep, Product};
use crate::timeseries::{FailureHandler, Observation, Publisher};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

/// Keeps every published observation in memory
#[derive(Debug, Default)]
pub struct CollectingPublisher {
    observations: Mutex<Vec<Observation>>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the observations collected so far
    pub fn drain(&self) -> Vec<Observation> {
        match self.observations.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Publisher for CollectingPublisher {
    fn publish(&self, observation: Observation) -> Result<()> {
        self.observations
            .lock()
            .map_err(|_| Error::InvalidState("observation store poisoned".to_string()))?
            .push(observation);
        Ok(())
    }
}

/// One CSV line per observation and product
#[derive(Debug, Serialize)]
struct ObservationRow {
    position: u64,
    agreement: u32,
    observation_date: NaiveDate,
    premium_status: String,
    machine_basis: Decimal,
    man_years: f64,
    product: &'static str,
    employer: Premiebeloep,
    member: Premiebeloep,
    admin_fee: Premiebeloep,
}

fn rows(observation: &Observation) -> Vec<ObservationRow> {
    Product::ALL
        .iter()
        .map(|&product| {
            let premium = observation.premium(product);
            ObservationRow {
                position: observation.position.0,
                agreement: observation.agreement.0,
                observation_date: observation.observation_date,
                premium_status: observation
                    .premium_status
                    .as_ref()
                    .map(|s| s.0.clone())
                    .unwrap_or_default(),
                machine_basis: observation.machine_basis.value().round_dp(2),
                man_years: observation.man_years,
                product: product.code(),
                employer: premium.employer,
                member: premium.member,
                admin_fee: premium.admin_fee,
            }
        })
        .collect()
}

/// Writes observations as CSV rows, one per product
pub struct CsvPublisher<W: Write + Send> {
    writer: Mutex<csv::Writer<W>>,
}

impl<W: Write + Send> CsvPublisher<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Mutex::new(csv::Writer::from_writer(inner)),
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::InvalidState("csv writer poisoned".to_string()))?;
        writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        let writer = self
            .writer
            .into_inner()
            .map_err(|_| Error::InvalidState("csv writer poisoned".to_string()))?;
        writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: Write + Send> Publisher for CsvPublisher<W> {
    fn publish(&self, observation: Observation) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::InvalidState("csv writer poisoned".to_string()))?;
        for row in rows(&observation) {
            writer.serialize(row)?;
        }
        debug!(
            "wrote {} {} on {}",
            observation.position, observation.agreement, observation.observation_date
        );
        Ok(())
    }
}

/// Logs each failed position with its error
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailures;

impl FailureHandler for LogFailures {
    fn handle(&self, position: PositionId, basis: &Basis, error: &Error) {
        warn!("{} ({} periods) not processed: {}", position, basis.len(), error);
    }
}
