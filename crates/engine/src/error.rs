//! Error taxonomy for workflow runs.

use teller_types::{Amount, AmountError};
use thiserror::Error;

use crate::workflow::state::RunStatus;

/// Fatal errors raised while executing a workflow.
///
/// Invalid credentials are not represented here: a failed validation is an
/// ordinary logged outcome and the run continues along the condition graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("step '{step_id}' requests unknown action '{action}'")]
    InvalidAction { step_id: String, action: String },

    #[error("insufficient balance on step '{step_id}': requested {requested}, available {available}")]
    InsufficientBalance {
        step_id: String,
        requested: Amount,
        available: Amount,
    },

    #[error("precondition failed on step '{step_id}': {reason}")]
    PreconditionFailed { step_id: String, reason: String },

    #[error("malformed workflow definition: {reason}")]
    MalformedDefinition { reason: String },

    #[error("step '{step_id}' is missing required parameter '{param}'")]
    MissingParameter { step_id: String, param: String },

    #[error("step '{step_id}' has invalid parameter '{param}': {reason}")]
    InvalidParameter { step_id: String, param: String, reason: String },

    #[error("amount error: {0}")]
    Amount(#[from] AmountError),
}

impl WorkflowError {
    pub fn invalid_action(step_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self::InvalidAction {
            step_id: step_id.into(),
            action: action.into(),
        }
    }

    pub fn insufficient_balance(step_id: impl Into<String>, requested: Amount, available: Amount) -> Self {
        Self::InsufficientBalance {
            step_id: step_id.into(),
            requested,
            available,
        }
    }

    pub fn precondition_failed(step_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            step_id: step_id.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDefinition { reason: reason.into() }
    }

    pub fn missing_parameter(step_id: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingParameter {
            step_id: step_id.into(),
            param: param.into(),
        }
    }

    pub fn invalid_parameter(step_id: impl Into<String>, param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            step_id: step_id.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Status a run ends in when this error propagates out of it.
    pub fn terminal_status(&self) -> RunStatus {
        match self {
            WorkflowError::InsufficientBalance { .. } => RunStatus::Aborted,
            _ => RunStatus::Failed,
        }
    }
}
