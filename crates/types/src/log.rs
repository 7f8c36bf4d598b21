//! Execution log records.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::Amount;

/// Output fields produced by an action, keyed in the order the action emits them.
pub type StepOutput = IndexMap<String, OutputValue>;

/// A single typed output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    Null,
    Bool(bool),
    Amount(Amount),
    Text(String),
}

impl OutputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OutputValue::Null)
    }
}

impl From<bool> for OutputValue {
    fn from(value: bool) -> Self {
        OutputValue::Bool(value)
    }
}

impl From<Amount> for OutputValue {
    fn from(value: Amount) -> Self {
        OutputValue::Amount(value)
    }
}

impl From<Option<Amount>> for OutputValue {
    fn from(value: Option<Amount>) -> Self {
        value.map_or(OutputValue::Null, OutputValue::Amount)
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        OutputValue::Text(value)
    }
}

/// Append-only audit record of one executed step.
///
/// `params` holds the resolved parameters with secret fields already masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub action: String,
    pub params: IndexMap<String, JsonValue>,
    pub output: StepOutput,
}

impl LogEntry {
    /// Returns an output field, treating explicit nulls as absent.
    pub fn output_field(&self, field_id: &str) -> Option<&OutputValue> {
        self.output.get(field_id).filter(|value| !value.is_null())
    }
}
