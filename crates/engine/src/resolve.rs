//! # Parameter Resolution
//!
//! Steps declare where each parameter comes from. A source is either a literal, a
//! reference to a trigger parameter (`from_id: "start"`), or a reference to another
//! step's *declaration* of that parameter. References into other steps are followed
//! until they land on a literal or on the trigger:
//!
//! ```text
//! withdraw.user_id -> balance.user_id -> start.user_id -> "12345"
//! ```
//!
//! Missing steps or parameter names resolve to an absent value rather than an error.
//! Chains longer than the configured indirection limit are reported as a
//! [`WorkflowError::MalformedDefinition`], which is how cycles surface.

use indexmap::IndexMap;
use serde_json::Value;
use teller_types::{Amount, ParamReference, ParamSource, WorkflowDefinition, WorkflowStep};

use crate::error::WorkflowError;

/// Resolves step parameter declarations against an immutable definition.
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'definition> {
    definition: &'definition WorkflowDefinition,
    max_indirection_depth: usize,
}

impl<'definition> ParameterResolver<'definition> {
    pub fn new(definition: &'definition WorkflowDefinition, max_indirection_depth: usize) -> Self {
        Self {
            definition,
            max_indirection_depth,
        }
    }

    /// Resolves every declared parameter of `step` into a fresh, immutable map.
    ///
    /// Absent values are kept as `null` so the execution log shows which parameters
    /// the author declared.
    pub fn resolve(&self, step: &WorkflowStep) -> Result<ResolvedParams, WorkflowError> {
        let mut values = IndexMap::with_capacity(step.params.len());
        for (name, source) in &step.params {
            let value = self.resolve_source(source, 0)?.unwrap_or(Value::Null);
            values.insert(name.clone(), value);
        }
        Ok(ResolvedParams {
            step_id: step.id.clone(),
            values,
        })
    }

    /// Resolves a single source, returning `None` when the chain ends at a missing node.
    pub fn resolve_source(&self, source: &ParamSource, depth: usize) -> Result<Option<Value>, WorkflowError> {
        match source {
            ParamSource::Literal(value) => Ok(Some(value.clone())),
            ParamSource::Reference(reference) => self.resolve_reference(reference, depth),
        }
    }

    fn resolve_reference(&self, reference: &ParamReference, depth: usize) -> Result<Option<Value>, WorkflowError> {
        if depth >= self.max_indirection_depth {
            return Err(WorkflowError::malformed(format!(
                "parameter indirection through '{}.{}' exceeds {} hops; the reference chain is cyclic",
                reference.from_id, reference.param_id, self.max_indirection_depth
            )));
        }

        if reference.targets_trigger() {
            return Ok(self.definition.trigger.param(&reference.param_id).cloned());
        }

        let Some(source) = self
            .definition
            .step(&reference.from_id)
            .and_then(|step| step.params.get(&reference.param_id))
        else {
            return Ok(None);
        };

        self.resolve_source(source, depth + 1)
    }
}

/// Concrete parameter values for one step invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    step_id: String,
    values: IndexMap<String, Value>,
}

impl ResolvedParams {
    pub fn new(step_id: impl Into<String>, values: IndexMap<String, Value>) -> Self {
        Self {
            step_id: step_id.into(),
            values,
        }
    }

    /// Identifier of the step these parameters were resolved for.
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Returns a parameter value, treating `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn require(&self, name: &str) -> Result<&Value, WorkflowError> {
        self.get(name)
            .ok_or_else(|| WorkflowError::missing_parameter(&self.step_id, name))
    }

    /// Reads a textual parameter; numbers are accepted in their canonical decimal form.
    ///
    /// The rejection message names the JSON type only, since the value may be a secret.
    pub fn require_text(&self, name: &str) -> Result<String, WorkflowError> {
        match self.require(name)? {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(WorkflowError::invalid_parameter(
                &self.step_id,
                name,
                format!("expected text, found {}", json_kind(other)),
            )),
        }
    }

    /// Reads a non-negative exact amount.
    pub fn require_amount(&self, name: &str) -> Result<Amount, WorkflowError> {
        let amount = Amount::from_json(self.require(name)?)
            .map_err(|error| WorkflowError::invalid_parameter(&self.step_id, name, error.to_string()))?;
        if amount.is_negative() {
            return Err(WorkflowError::invalid_parameter(&self.step_id, name, "amount cannot be negative"));
        }
        Ok(amount)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(value: Value) -> WorkflowDefinition {
        serde_json::from_value(value).expect("parse definition")
    }

    fn chained_definition() -> WorkflowDefinition {
        serde_json::from_str(
            r#"{
            "trigger": {"params": {"user_id": "12345", "pin": 1234}, "transitions": []},
            "steps": [
                {
                    "id": "validate",
                    "action": "validate_account",
                    "params": {
                        "user_id": {"from_id": "start", "param_id": "user_id"},
                        "pin": {"from_id": "start", "param_id": "pin"}
                    }
                },
                {
                    "id": "balance",
                    "action": "get_account_balance",
                    "params": {"user_id": {"from_id": "validate", "param_id": "user_id"}}
                },
                {
                    "id": "withdraw",
                    "action": "withdraw_in_dollars",
                    "params": {
                        "user_id": {"from_id": "balance", "param_id": "user_id"},
                        "money": {"from_id": null, "value": 30},
                        "memo": "rent",
                        "ghost": {"from_id": "nowhere", "param_id": "user_id"},
                        "unset": {"from_id": "start", "param_id": "missing"}
                    }
                }
            ]
        }"#,
        )
        .expect("parse definition")
    }

    #[test]
    fn follows_chains_through_other_step_declarations() {
        let definition = chained_definition();
        let resolver = ParameterResolver::new(&definition, 8);

        let params = resolver.resolve(definition.step("withdraw").unwrap()).expect("resolve params");

        assert_eq!(params.step_id(), "withdraw");
        assert_eq!(params.values()["user_id"], json!("12345"));
        assert_eq!(params.values()["money"], json!(30));
        assert_eq!(params.values()["memo"], json!("rent"));
        assert_eq!(params.values()["ghost"], Value::Null);
        assert_eq!(params.values()["unset"], Value::Null);
        let names: Vec<_> = params.values().keys().map(String::as_str).collect();
        assert_eq!(names, ["user_id", "money", "memo", "ghost", "unset"]);
    }

    #[test]
    fn reports_cyclic_indirection_as_malformed() {
        let definition = definition(json!({
            "trigger": {"params": {}, "transitions": []},
            "steps": [
                {"id": "a", "action": "get_account_balance", "params": {"user_id": {"from_id": "b", "param_id": "user_id"}}},
                {"id": "b", "action": "get_account_balance", "params": {"user_id": {"from_id": "a", "param_id": "user_id"}}}
            ]
        }));
        let resolver = ParameterResolver::new(&definition, 16);

        let error = resolver.resolve(definition.step("a").unwrap()).expect_err("cycle must be rejected");
        assert!(matches!(error, WorkflowError::MalformedDefinition { .. }));
        assert!(error.to_string().contains("exceeds 16 hops"));
    }

    #[test]
    fn typed_accessors_validate_values() {
        let mut values = IndexMap::new();
        values.insert("user_id".to_string(), json!(12345));
        values.insert("money".to_string(), json!("30.25"));
        values.insert("negative".to_string(), json!(-5));
        values.insert("flag".to_string(), json!(true));
        values.insert("absent".to_string(), Value::Null);
        let params = ResolvedParams::new("deposit", values);

        assert_eq!(params.require_text("user_id").unwrap(), "12345");
        assert_eq!(params.require_amount("money").unwrap(), Amount::from_minor_units(3_025));
        assert!(matches!(
            params.require_amount("negative"),
            Err(WorkflowError::InvalidParameter { .. })
        ));
        assert_eq!(
            params.require_text("flag"),
            Err(WorkflowError::invalid_parameter("deposit", "flag", "expected text, found a boolean"))
        );
        assert_eq!(
            params.require_amount("absent"),
            Err(WorkflowError::missing_parameter("deposit", "absent"))
        );
    }

    #[test]
    fn rejected_text_never_echoes_the_value() {
        let mut values = IndexMap::new();
        values.insert("pin".to_string(), json!([9876]));
        values.insert("user_id".to_string(), json!({"secret": "9876"}));
        let params = ResolvedParams::new("validate", values);

        for name in ["pin", "user_id"] {
            let message = params.require_text(name).expect_err("non-text value").to_string();
            assert!(!message.contains("9876"), "{message}");
        }
        assert_eq!(
            params.require_text("pin").unwrap_err().to_string(),
            "step 'validate' has invalid parameter 'pin': expected text, found an array"
        );
    }
}
