//! The fact vocabulary carried by periods and whole bases

use crate::domain::{AgreementId, Kroner, Percentage, PositionId, PremiumStatus, Year};
use crate::wages::PayGrade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single-valued facts about one basis period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFacts {
    pub year: Option<Year>,
    pub agreement: Option<AgreementId>,
    pub employment_percentage: Option<Percentage>,
    pub pay_grade: Option<PayGrade>,
    pub annual_salary: Option<Kroner>,

    /// Synthetic period projecting the last known state to year end
    pub fictional: bool,

    /// Last period of the position's real history
    pub terminal: bool,
}

/// Facts annotated on a basis as a whole
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisFacts {
    pub position: Option<PositionId>,
    pub year: Option<Year>,
    pub observation_date: Option<NaiveDate>,
    pub premium_status: Option<PremiumStatus>,
}
