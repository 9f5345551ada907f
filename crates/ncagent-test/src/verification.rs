//! Verification helpers for reconciliation replies
//!
//! Provides assertion helpers over a [`GoalStateOperationReply`]

use ncagent_types::{
    GoalStateOperationReply, OperationStatus, OperationType, ResourceOperationStatus, ResourceType,
};
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Expected one status record for '{id}', found {actual}")]
    RecordCountMismatch { id: String, actual: usize },

    #[error("Status mismatch for '{id}': expected {expected:?}, got {actual:?}")]
    StatusMismatch {
        id: String,
        expected: OperationStatus,
        actual: OperationStatus,
    },

    #[error("Kind mismatch for '{id}': expected {expected}, got {actual}")]
    KindMismatch {
        id: String,
        expected: ResourceType,
        actual: ResourceType,
    },

    #[error("Operation mismatch for '{id}': expected {expected}, got {actual}")]
    OperationMismatch {
        id: String,
        expected: OperationType,
        actual: OperationType,
    },

    #[error("Expected {expected} {kind} records, found {actual}")]
    KindCountMismatch {
        kind: ResourceType,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} status records, found {actual}")]
    TotalCountMismatch { expected: usize, actual: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Reply verification helper
pub struct ReplyVerifier<'a> {
    reply: &'a GoalStateOperationReply,
}

impl<'a> ReplyVerifier<'a> {
    pub fn new(reply: &'a GoalStateOperationReply) -> Self {
        Self { reply }
    }

    /// The only status record for `id`.
    pub fn single_record(&self, id: &str) -> VerifyResult<&'a ResourceOperationStatus> {
        let records: Vec<&'a ResourceOperationStatus> = self
            .reply
            .operation_statuses
            .iter()
            .filter(|r| r.resource_id == id)
            .collect();
        match records.as_slice() {
            [record] => Ok(*record),
            _ => Err(VerificationError::RecordCountMismatch {
                id: id.to_string(),
                actual: records.len(),
            }),
        }
    }

    /// Verify that `id` has exactly one record with the given status
    pub fn assert_status(&self, id: &str, expected: OperationStatus) -> VerifyResult<()> {
        let record = self.single_record(id)?;
        if record.operation_status != expected {
            return Err(VerificationError::StatusMismatch {
                id: id.to_string(),
                expected,
                actual: record.operation_status,
            });
        }
        Ok(())
    }

    /// Verify kind, operation and status of the single record for `id`
    pub fn assert_record(
        &self,
        id: &str,
        kind: ResourceType,
        operation: OperationType,
        status: OperationStatus,
    ) -> VerifyResult<()> {
        self.assert_status(id, status)?;
        let record = self.single_record(id)?;

        if record.resource_type != kind {
            return Err(VerificationError::KindMismatch {
                id: id.to_string(),
                expected: kind,
                actual: record.resource_type,
            });
        }
        if record.operation_type != operation {
            return Err(VerificationError::OperationMismatch {
                id: id.to_string(),
                expected: operation,
                actual: record.operation_type,
            });
        }
        Ok(())
    }

    pub fn assert_no_record(&self, id: &str) -> VerifyResult<()> {
        match self.reply.statuses_for(id).count() {
            0 => Ok(()),
            actual => Err(VerificationError::RecordCountMismatch {
                id: id.to_string(),
                actual,
            }),
        }
    }

    pub fn assert_kind_count(&self, kind: ResourceType, expected: usize) -> VerifyResult<()> {
        let actual = self.reply.count_kind(kind);
        if actual != expected {
            return Err(VerificationError::KindCountMismatch { kind, expected, actual });
        }
        Ok(())
    }

    pub fn assert_total(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.reply.len();
        if actual != expected {
            return Err(VerificationError::TotalCountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Every record, keyed and sorted by resource ID, without timings.
    ///
    /// Used to compare replies whose record order or timings differ.
    pub fn normalized(&self) -> Vec<(String, ResourceType, OperationType, OperationStatus)> {
        let mut records: Vec<_> = self
            .reply
            .operation_statuses
            .iter()
            .map(|r| {
                (
                    r.resource_id.clone(),
                    r.resource_type,
                    r.operation_type,
                    r.operation_status,
                )
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
        records
    }
}
