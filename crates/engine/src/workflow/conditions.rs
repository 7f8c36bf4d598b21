//! Transition guard evaluation.
//!
//! A guard is a list of comparisons against output fields of steps that already
//! ran. The execution log is the only source of truth: when the referenced step has
//! no log entry (not reached, skipped, or failed) the comparison does not hold.

use std::cmp::Ordering;

use serde_json::Value;
use teller_types::{Amount, LogEntry, OutputValue, WorkflowCondition};
use tracing::trace;

use crate::error::WorkflowError;

/// Evaluates transition conditions against a snapshot of the execution log.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'log> {
    logs: &'log [LogEntry],
}

impl<'log> ConditionEvaluator<'log> {
    pub fn new(logs: &'log [LogEntry]) -> Self {
        Self { logs }
    }

    /// Returns true when every condition holds; an empty list is vacuously true.
    ///
    /// All conditions are evaluated so a type mismatch is reported even when an
    /// earlier comparison already failed.
    pub fn evaluate(&self, conditions: &[WorkflowCondition]) -> Result<bool, WorkflowError> {
        let mut all_hold = true;
        for condition in conditions {
            all_hold &= self.evaluate_condition(condition)?;
        }
        Ok(all_hold)
    }

    pub fn evaluate_condition(&self, condition: &WorkflowCondition) -> Result<bool, WorkflowError> {
        let Some(entry) = self.logs.iter().find(|entry| entry.id == condition.from_id) else {
            trace!(from_id = %condition.from_id, "condition references a step that has not run");
            return Ok(false);
        };
        let Some(observed) = entry.output_field(&condition.field_id) else {
            trace!(from_id = %condition.from_id, field_id = %condition.field_id, "condition field is absent");
            return Ok(false);
        };

        let ordering = compare(observed, &condition.value).map_err(|reason| {
            WorkflowError::malformed(format!(
                "condition '{}.{} {} {}' {}",
                condition.from_id, condition.field_id, condition.operator, condition.value, reason
            ))
        })?;

        Ok(condition.operator.holds(ordering))
    }
}

fn compare(observed: &OutputValue, expected: &Value) -> Result<Ordering, String> {
    match (observed, expected) {
        (OutputValue::Bool(observed), Value::Bool(expected)) => Ok(observed.cmp(expected)),
        (OutputValue::Amount(observed), Value::Number(_) | Value::String(_)) => Amount::from_json(expected)
            .map(|expected| observed.cmp(&expected))
            .map_err(|error| format!("compares an amount with a non-amount value: {error}")),
        (OutputValue::Text(observed), Value::String(expected)) => Ok(observed.as_str().cmp(expected.as_str())),
        (observed, expected) => Err(format!(
            "compares {} with incompatible value {expected}",
            describe(observed)
        )),
    }
}

fn describe(value: &OutputValue) -> &'static str {
    match value {
        OutputValue::Null => "null",
        OutputValue::Bool(_) => "a boolean",
        OutputValue::Amount(_) => "an amount",
        OutputValue::Text(_) => "text",
    }
}
