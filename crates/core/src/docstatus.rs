//! Document lifecycle state shared by every submittable document.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Submittable document state (draft → submitted → cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl DocStatus {
    /// Numeric code as stored by the host (`0`, `1`, `2`).
    pub fn code(self) -> u8 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }

    pub fn is_submitted(self) -> bool {
        self == DocStatus::Submitted
    }

    /// Draft → Submitted.
    pub fn submit(self) -> DomainResult<DocStatus> {
        match self {
            DocStatus::Draft => Ok(DocStatus::Submitted),
            other => Err(DomainError::invalid_transition(format!(
                "cannot submit a document in state {other:?}"
            ))),
        }
    }

    /// Submitted → Cancelled.
    pub fn cancel(self) -> DomainResult<DocStatus> {
        match self {
            DocStatus::Submitted => Ok(DocStatus::Cancelled),
            other => Err(DomainError::invalid_transition(format!(
                "cannot cancel a document in state {other:?}"
            ))),
        }
    }
}
