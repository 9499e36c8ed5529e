use crate::StoreError;
use serde::Serialize;

/// Outcome of checking a batch of archives against their recorded checksums.
#[derive(Debug, Default, Serialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub passed: usize,
    pub failed: Vec<IntegrityFailure>,
}

#[derive(Debug, Serialize)]
pub struct IntegrityFailure {
    /// What was checked, e.g. `package ntp-4.2.8p2`.
    pub subject: String,
    pub reason: String,
}

impl IntegrityReport {
    /// Count one check and keep its failure, if any.
    pub fn record(&mut self, subject: impl Into<String>, outcome: Result<(), StoreError>) {
        self.checked += 1;
        match outcome {
            Ok(()) => self.passed += 1,
            Err(StoreError::Sha1Mismatch {
                expected, actual, ..
            }) => self.failed.push(IntegrityFailure {
                subject: subject.into(),
                reason: format!("sha1 mismatch: expected {expected}, got {actual}"),
            }),
            Err(e) => self.failed.push(IntegrityFailure {
                subject: subject.into(),
                reason: format!("read error: {e}"),
            }),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
