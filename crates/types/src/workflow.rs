//! Strongly typed workflow schema definitions shared by the engine and the CLI.
//!
//! A workflow document is a synthetic `trigger` node carrying the external request
//! parameters plus an unordered set of `steps`. Steps are looked up by identifier,
//! never by position. Parameter and output maps preserve authoring order (via
//! `IndexMap`) so serialized execution logs are stable from run to run.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

mod validation;

pub use validation::{DefinitionIssue, IssueSeverity, lint_definition};

/// Identifier that parameter references use to point at the trigger parameters.
pub const TRIGGER_ID: &str = "start";

/// Complete workflow document consumed by the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDefinition {
    /// Optional human-readable name used in reports and tracing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    /// Entry node carrying the request parameters.
    pub trigger: WorkflowTrigger,
    /// Steps keyed by their `id`; declaration order carries no meaning.
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Returns the first step declared with `step_id`, if any.
    pub fn step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }
}

/// Synthetic entry node of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTrigger {
    /// Literal request parameters (for example `user_id` and `pin`).
    #[serde(default)]
    pub params: IndexMap<String, JsonValue>,
    /// Outgoing transitions evaluated when the run starts.
    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowTrigger {
    pub fn param(&self, name: &str) -> Option<&JsonValue> {
        self.params.get(name)
    }
}

/// A named node performing one action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    /// Unique identifier within the definition.
    pub id: String,
    /// Registered action name, for example `withdraw_in_dollars`.
    #[serde(default)]
    pub action: String,
    /// Declared parameter sources keyed by parameter name.
    #[serde(default)]
    pub params: IndexMap<String, ParamSource>,
    /// Outgoing transitions, evaluated in declaration order.
    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowStep {
    /// Steps without an action only forward control to their transitions.
    ///
    /// Only an empty name counts as "no action"; whitespace is dispatched as written.
    pub fn has_action(&self) -> bool {
        !self.action.is_empty()
    }
}

/// Declares where a step parameter gets its value.
///
/// Authors may write a bare literal, an inline literal (`{"from_id": null, "value": 30}`),
/// or a reference (`{"from_id": "start", "param_id": "user_id"}`). A reference to another
/// step points at that step's *declaration* of the same parameter, not at its output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub enum ParamSource {
    Literal(JsonValue),
    Reference(ParamReference),
}

/// Indirection into the trigger parameters or another step's parameter declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamReference {
    pub from_id: String,
    pub param_id: String,
}

impl ParamReference {
    pub fn targets_trigger(&self) -> bool {
        self.from_id == TRIGGER_ID
    }
}

impl TryFrom<JsonValue> for ParamSource {
    type Error = String;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let JsonValue::Object(map) = &value else {
            return Ok(ParamSource::Literal(value));
        };
        let Some(from_id) = map.get("from_id") else {
            return Ok(ParamSource::Literal(value));
        };

        match from_id {
            JsonValue::Null => Ok(ParamSource::Literal(map.get("value").cloned().unwrap_or(JsonValue::Null))),
            JsonValue::String(from_id) => {
                let param_id = map
                    .get("param_id")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| format!("parameter reference to '{from_id}' is missing a 'param_id'"))?;
                Ok(ParamSource::Reference(ParamReference {
                    from_id: from_id.clone(),
                    param_id: param_id.to_string(),
                }))
            }
            other => Err(format!("'from_id' must be a node identifier or null, found {other}")),
        }
    }
}

impl Serialize for ParamSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamSource::Literal(value) => value.serialize(serializer),
            ParamSource::Reference(reference) => reference.serialize(serializer),
        }
    }
}

/// Directed edge guarded by a set of conditions that must all hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTransition {
    /// Identifier of the step entered when the guard passes.
    pub target: String,
    /// Conditions combined with AND; an empty list always passes.
    #[serde(default)]
    pub condition: Vec<WorkflowCondition>,
}

/// Comparison against an output field of a previously executed step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowCondition {
    pub from_id: String,
    pub field_id: String,
    pub operator: ComparisonOperator,
    pub value: JsonValue,
}

/// Closed set of comparison operators understood by conditions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOperator {
    /// Applies the operator to the ordering of `observed` relative to `expected`.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Eq => ordering.is_eq(),
            ComparisonOperator::Gt => ordering.is_gt(),
            ComparisonOperator::Gte => !ordering.is_lt(),
            ComparisonOperator::Lt => ordering.is_lt(),
            ComparisonOperator::Lte => !ordering.is_gt(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_param_source_shapes() {
        let step: WorkflowStep = serde_json::from_str(
            r#"{
            "id": "withdraw",
            "action": "withdraw_in_dollars",
            "params": {
                "user_id": {"from_id": "start", "param_id": "user_id"},
                "money": {"from_id": null, "value": 30},
                "note": "literal"
            },
            "transitions": []
        }"#,
        )
        .expect("parse step");

        assert_eq!(
            step.params["user_id"],
            ParamSource::Reference(ParamReference {
                from_id: "start".into(),
                param_id: "user_id".into(),
            })
        );
        assert_eq!(step.params["money"], ParamSource::Literal(json!(30)));
        assert_eq!(step.params["note"], ParamSource::Literal(json!("literal")));
        let keys: Vec<_> = step.params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["user_id", "money", "note"]);
    }

    #[test]
    fn rejects_reference_without_param_id() {
        let result = serde_json::from_value::<ParamSource>(json!({"from_id": "start"}));
        let error = result.expect_err("expected missing param_id error");
        assert!(error.to_string().contains("missing a 'param_id'"));
    }

    #[test]
    fn rejects_unknown_operators() {
        let result = serde_json::from_value::<WorkflowCondition>(json!({
            "from_id": "validate",
            "field_id": "is_valid",
            "operator": "ne",
            "value": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn operators_follow_orderings() {
        use ComparisonOperator::*;
        assert!(Gte.holds(Ordering::Equal) && Gte.holds(Ordering::Greater) && !Gte.holds(Ordering::Less));
        assert!(Lte.holds(Ordering::Equal) && Lte.holds(Ordering::Less) && !Lte.holds(Ordering::Greater));
        assert!(Eq.holds(Ordering::Equal) && !Eq.holds(Ordering::Less));
        assert!(Gt.holds(Ordering::Greater) && !Gt.holds(Ordering::Equal));
        assert!(Lt.holds(Ordering::Less) && !Lt.holds(Ordering::Equal));
    }

    #[test]
    fn only_empty_action_names_are_pass_through() {
        let step = |action: &str| WorkflowStep {
            id: "router".into(),
            action: action.into(),
            params: IndexMap::new(),
            transitions: Vec::new(),
        };
        assert!(!step("").has_action());
        assert!(step("  ").has_action());
        assert!(step("get_account_balance").has_action());
    }

    #[test]
    fn yaml_documents_share_the_schema() {
        let definition: WorkflowDefinition = serde_yaml::from_str(
            r#"
trigger:
  params:
    user_id: "12345"
    pin: 1234
  transitions:
    - target: validate
steps:
  - id: validate
    action: validate_account
    params:
      user_id: { from_id: start, param_id: user_id }
"#,
        )
        .expect("parse yaml definition");

        assert_eq!(definition.trigger.param("pin"), Some(&json!(1234)));
        assert!(definition.trigger.transitions[0].condition.is_empty());
        assert!(definition.step("validate").is_some_and(WorkflowStep::has_action));
        assert!(definition.step("missing").is_none());
    }
}
