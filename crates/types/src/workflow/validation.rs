//! Advisory checks over workflow definitions.
//!
//! The engine tolerates dangling references (they resolve to "no such step"), so
//! these routines never block a run. They exist so authors can catch typos in step
//! identifiers before a document is executed against real accounts.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use super::{ParamSource, TRIGGER_ID, WorkflowDefinition, WorkflowTransition};

/// How serious a reported issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The document is ambiguous for the engine (for example duplicate ids).
    Error,
    /// The document runs, but part of it can never take effect.
    Warning,
}

/// A single finding produced by [`lint_definition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    pub severity: IssueSeverity,
    /// Node the issue was found on (`start` for the trigger).
    pub location: String,
    pub message: String,
}

impl DefinitionIssue {
    fn error(location: &str, message: String) -> Self {
        Self {
            severity: IssueSeverity::Error,
            location: location.to_string(),
            message,
        }
    }

    fn warning(location: &str, message: String) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            location: location.to_string(),
            message,
        }
    }
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        write!(f, "{label} [{}]: {}", self.location, self.message)
    }
}

/// Lints a definition for duplicate ids, dangling references, and unreachable steps.
pub fn lint_definition(definition: &WorkflowDefinition) -> Vec<DefinitionIssue> {
    let mut issues = Vec::new();
    let mut known_ids = HashSet::new();

    for step in &definition.steps {
        if !known_ids.insert(step.id.as_str()) {
            issues.push(DefinitionIssue::error(
                &step.id,
                format!("duplicate step id '{}'; only the first declaration is reachable", step.id),
            ));
        }
    }

    lint_transitions(TRIGGER_ID, &definition.trigger.transitions, &known_ids, &mut issues);

    for step in &definition.steps {
        lint_transitions(&step.id, &step.transitions, &known_ids, &mut issues);

        for (param_name, source) in &step.params {
            let ParamSource::Reference(reference) = source else {
                continue;
            };
            if reference.targets_trigger() {
                if definition.trigger.param(&reference.param_id).is_none() {
                    issues.push(DefinitionIssue::warning(
                        &step.id,
                        format!(
                            "parameter '{param_name}' reads trigger parameter '{}' which is not declared",
                            reference.param_id
                        ),
                    ));
                }
            } else if !known_ids.contains(reference.from_id.as_str()) {
                issues.push(DefinitionIssue::warning(
                    &step.id,
                    format!("parameter '{param_name}' references unknown step '{}'", reference.from_id),
                ));
            }
        }
    }

    let reachable = reachable_step_ids(definition);
    for step in &definition.steps {
        if !reachable.contains(step.id.as_str()) {
            issues.push(DefinitionIssue::warning(
                &step.id,
                "step is not reachable from the trigger".to_string(),
            ));
        }
    }

    issues
}

fn lint_transitions(location: &str, transitions: &[WorkflowTransition], known_ids: &HashSet<&str>, issues: &mut Vec<DefinitionIssue>) {
    for transition in transitions {
        if !known_ids.contains(transition.target.as_str()) {
            issues.push(DefinitionIssue::warning(
                location,
                format!("transition targets unknown step '{}'", transition.target),
            ));
        }
        for condition in &transition.condition {
            if !known_ids.contains(condition.from_id.as_str()) {
                issues.push(DefinitionIssue::warning(
                    location,
                    format!(
                        "condition on '{}' reads unknown step '{}' and can never pass",
                        condition.field_id, condition.from_id
                    ),
                ));
            }
        }
    }
}

fn reachable_step_ids(definition: &WorkflowDefinition) -> HashSet<&str> {
    let mut reachable = HashSet::new();
    let mut queue: VecDeque<&str> = definition
        .trigger
        .transitions
        .iter()
        .map(|transition| transition.target.as_str())
        .collect();

    while let Some(step_id) = queue.pop_front() {
        let Some(step) = definition.step(step_id) else {
            continue;
        };
        if !reachable.insert(step.id.as_str()) {
            continue;
        }
        queue.extend(step.transitions.iter().map(|transition| transition.target.as_str()));
    }

    reachable
}
