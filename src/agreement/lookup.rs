//! Agreement information lookup

use super::records::AgreementRecord;
use crate::domain::AgreementId;
use std::collections::HashMap;
use std::sync::Arc;

/// Supplies every time-scoped record known about an agreement.
///
/// Implementations may be backed by anything; the pipeline only consumes the
/// returned records as periodization input.
pub trait AgreementLookup: Send + Sync {
    fn records(&self, agreement: AgreementId) -> Vec<Arc<AgreementRecord>>;
}

/// Lookup that knows no agreements. The default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAgreementLookup;

impl AgreementLookup for NoAgreementLookup {
    fn records(&self, _agreement: AgreementId) -> Vec<Arc<AgreementRecord>> {
        Vec::new()
    }
}

/// In-memory agreement records, loaded once before processing starts
#[derive(Debug, Clone, Default)]
pub struct AgreementRegistry {
    by_agreement: HashMap<AgreementId, Vec<Arc<AgreementRecord>>>,
}

impl AgreementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = AgreementRecord>>(records: I) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.add(record);
        }
        registry
    }

    pub fn add(&mut self, record: AgreementRecord) {
        self.by_agreement
            .entry(record.agreement())
            .or_default()
            .push(Arc::new(record));
    }

    pub fn len(&self) -> usize {
        self.by_agreement.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_agreement.is_empty()
    }
}

impl AgreementLookup for AgreementRegistry {
    fn records(&self, agreement: AgreementId) -> Vec<Arc<AgreementRecord>> {
        self.by_agreement.get(&agreement).cloned().unwrap_or_default()
    }
}
