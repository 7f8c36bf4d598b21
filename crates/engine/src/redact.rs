//! Masking of secret parameters before they reach the execution log.

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redactor {
    secret_params: Vec<String>,
    mask: String,
}

impl Redactor {
    pub fn new(secret_params: Vec<String>, mask: impl Into<String>) -> Self {
        Self {
            secret_params,
            mask: mask.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.secret_params.clone(), config.redaction_mask.clone())
    }

    pub fn is_secret(&self, name: &str) -> bool {
        self.secret_params.iter().any(|secret| secret == name)
    }

    /// Returns a copy of `params` with every secret value replaced by the mask.
    pub fn redact(&self, params: &IndexMap<String, Value>) -> IndexMap<String, Value> {
        params
            .iter()
            .map(|(name, value)| {
                let value = if self.is_secret(name) {
                    Value::String(self.mask.clone())
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }
}
