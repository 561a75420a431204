//! Position history: the already-translated input records for one position

use crate::domain::{overlaps, AgreementId, Kroner, Percentage, PositionId, PremiumStatus};
use crate::wages::PayGrade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of a position from `from` until `to` (absent while ongoing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub agreement: AgreementId,
    pub employment_percentage: Percentage,
    #[serde(default)]
    pub pay_grade: Option<PayGrade>,
    #[serde(default)]
    pub annual_salary: Option<Kroner>,
}

impl PositionRecord {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>, agreement: AgreementId, employment_percentage: Percentage) -> Self {
        Self {
            from,
            to,
            agreement,
            employment_percentage,
            pay_grade: None,
            annual_salary: None,
        }
    }

    pub fn with_salary(mut self, annual_salary: Kroner) -> Self {
        self.annual_salary = Some(annual_salary);
        self
    }

    pub fn with_pay_grade(mut self, grade: PayGrade) -> Self {
        self.pay_grade = Some(grade);
        self
    }

    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        overlaps(self.from, self.to, from, to)
    }
}

impl fmt::Display for PositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "[{}, {}] {}", self.from, to, self.agreement),
            None => write!(f, "[{}, ..] {}", self.from, self.agreement),
        }
    }
}

/// Every record known for one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionHistory {
    pub position: PositionId,
    #[serde(default)]
    pub premium_status: Option<PremiumStatus>,
    pub records: Vec<PositionRecord>,
}

impl PositionHistory {
    pub fn new(position: PositionId, records: Vec<PositionRecord>) -> Self {
        Self {
            position,
            premium_status: None,
            records,
        }
    }

    pub fn with_premium_status(mut self, status: PremiumStatus) -> Self {
        self.premium_status = Some(status);
        self
    }
}
