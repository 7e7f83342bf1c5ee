//! Outcome model: what a handler reports after executing a task.
//!
//! The worker only needs to know whether to route the task to the output
//! queue or to the failed queue; everything else about the work stays inside
//! the handler.

use serde::{Deserialize, Serialize};

/// Result of executing one task.
///
/// Serialized as a `kind` tag (`SUCCESS` / `FAILURE`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure { reason: String },
}

impl Outcome {
    pub fn success() -> Self {
        Self::Success
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
