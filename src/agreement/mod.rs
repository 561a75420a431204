//! Time-scoped agreement information and the lookup seam that supplies it

mod lookup;
mod records;

pub use lookup::{AgreementLookup, AgreementRegistry, NoAgreementLookup};
pub use records::{AgreementProduct, AgreementRecord, AgreementVersion};
