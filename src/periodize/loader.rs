//! Load position histories from CSV
//!
//! One row per position record:
//! `position,from,to,agreement,employment_percent,pay_grade,annual_salary,premium_status`
//! where `to`, `pay_grade`, `annual_salary` and `premium_status` may be empty.

use super::history::{PositionHistory, PositionRecord};
use crate::domain::{AgreementId, Kroner, Percentage, PositionId, PremiumStatus};
use crate::error::{Error, Result};
use crate::wages::PayGrade;
use chrono::NaiveDate;
use csv::Reader;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    position: u64,
    from: NaiveDate,
    to: Option<NaiveDate>,
    agreement: u32,
    employment_percent: String,
    pay_grade: Option<u16>,
    annual_salary: Option<String>,
    premium_status: Option<String>,
}

fn decimal(field: &str, text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim()).map_err(|e| Error::InvalidFormat(format!("{} {:?}: {}", field, text, e)))
}

impl CsvRow {
    fn to_record(&self) -> Result<PositionRecord> {
        let mut record = PositionRecord::new(
            self.from,
            self.to,
            AgreementId(self.agreement),
            Percentage::percent(decimal("employment_percent", &self.employment_percent)?),
        );
        if let Some(grade) = self.pay_grade {
            record = record.with_pay_grade(PayGrade(grade));
        }
        if let Some(salary) = self.annual_salary.as_deref().filter(|s| !s.trim().is_empty()) {
            record = record.with_salary(Kroner(decimal("annual_salary", salary)?));
        }
        Ok(record)
    }
}

/// Reads histories from any CSV source, grouped by position in order of
/// first appearance
pub fn load_positions_from_reader<R: Read>(source: R) -> Result<Vec<PositionHistory>> {
    let mut reader = Reader::from_reader(source);
    let mut histories: Vec<PositionHistory> = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let position = PositionId(row.position);
        let record = row.to_record()?;
        let status = row
            .premium_status
            .filter(|s| !s.trim().is_empty())
            .map(PremiumStatus);

        let index = match histories.iter().position(|h| h.position == position) {
            Some(index) => index,
            None => {
                histories.push(PositionHistory::new(position, Vec::new()));
                histories.len() - 1
            }
        };
        let history = &mut histories[index];
        history.records.push(record);
        if history.premium_status.is_none() {
            history.premium_status = status;
        }
    }

    Ok(histories)
}

pub fn load_positions(path: &Path) -> Result<Vec<PositionHistory>> {
    load_positions_from_reader(std::fs::File::open(path)?)
}
