//! Wage-grade reference data and salary lookup

mod grade;

pub use grade::{salary_for_grade, PayGrade, WageGradeGrouping, WageGradeRecord, WageGradeTable};
