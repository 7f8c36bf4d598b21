//! # Teller Engine
//!
//! The Teller engine interprets declarative financial micro-workflows: a trigger
//! carrying request parameters, and a graph of steps that validate an account,
//! read its balance, deposit, or withdraw.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use teller_engine::{AccountDirectory, WorkflowEngine, parse_workflow_str};
//!
//! let accounts: AccountDirectory = serde_yaml::from_str(r#"
//! accounts:
//!   - user_id: "12345"
//!     pin: 1234
//!     balance: 100
//! "#)?;
//! let definition = parse_workflow_str(r#"
//! trigger:
//!   params: { user_id: "12345", pin: 1234 }
//!   transitions: [{ target: validate }]
//! steps:
//!   - id: validate
//!     action: validate_account
//!     params:
//!       user_id: { from_id: start, param_id: user_id }
//!       pin: { from_id: start, param_id: pin }
//! "#)?;
//!
//! let report = WorkflowEngine::with_authenticator(Arc::new(accounts)).execute(&definition);
//! assert!(report.is_success());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: turns a step's parameter declarations into concrete values
//! - **`workflow::conditions`**: decides which transitions fire
//! - **`actions`**: action registry and the built-in banking actions
//! - **`auth`**: authenticator capability and the in-memory account directory
//! - **`executor`**: the [`WorkflowEngine`] that walks the graph
//! - **`workflow::report`**: run summaries and balance settlement

use std::{fs, path::Path};

use anyhow::{Context, Result};
use teller_types::WorkflowDefinition;

pub mod actions;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod redact;
pub mod resolve;
pub mod workflow;

pub use actions::{Action, ActionRegistry};
pub use auth::{AccountDirectory, AccountError, AccountRecord, AuthOutcome, Authenticator, Credentials};
pub use config::{EngineConfig, load_config, load_config_from_path};
pub use error::WorkflowError;
pub use executor::WorkflowEngine;
pub use redact::Redactor;
pub use resolve::{ParameterResolver, ResolvedParams};
pub use workflow::conditions::ConditionEvaluator;
pub use workflow::report::{RunReport, settle};
pub use workflow::state::{ExecutionState, RunStatus};

/// Loads a workflow definition from a YAML or JSON file.
///
/// JSON is a subset of YAML, so a single parser handles both formats.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a workflow
/// (`trigger` plus `steps`).
pub fn parse_workflow_file(file_path: impl AsRef<Path>) -> Result<WorkflowDefinition> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read workflow file: {}", file_path.display()))?;
    parse_workflow_str(&content).with_context(|| format!("Failed to parse workflow file: {}", file_path.display()))
}

/// Parses a workflow definition from YAML or JSON text.
pub fn parse_workflow_str(content: &str) -> Result<WorkflowDefinition> {
    serde_yaml::from_str(content).context("Unsupported workflow document format. Expected 'trigger' and 'steps' fields")
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_types::ParamSource;

    #[test]
    fn test_parse_workflow_file_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workflow_path = temp_dir.path().join("workflow.yaml");

        let workflow_content = r#"
workflow: "payout"
trigger:
  params:
    user_id: "12345"
    pin: 1234
  transitions:
    - target: "validate"
steps:
  - id: "validate"
    action: "validate_account"
    params:
      user_id: { from_id: "start", param_id: "user_id" }
      pin: { from_id: "start", param_id: "pin" }
"#;
        fs::write(&workflow_path, workflow_content).unwrap();

        let definition = parse_workflow_file(&workflow_path).expect("parse yaml workflow");
        assert_eq!(definition.workflow.as_deref(), Some("payout"));
        assert_eq!(definition.steps.len(), 1);
        assert!(matches!(definition.steps[0].params["pin"], ParamSource::Reference(_)));
    }

    #[test]
    fn test_parse_workflow_file_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workflow_path = temp_dir.path().join("workflow.json");
        fs::write(
            &workflow_path,
            r#"{"trigger": {"params": {}, "transitions": []}, "steps": [{"id": "a", "action": "get_account_balance"}]}"#,
        )
        .unwrap();

        let definition = parse_workflow_file(&workflow_path).expect("parse json workflow");
        assert_eq!(definition.workflow, None);
        assert!(definition.step("a").is_some());
    }

    #[test]
    fn test_parse_workflow_file_reports_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workflow_path = temp_dir.path().join("broken.yaml");
        fs::write(&workflow_path, "steps: []\n").unwrap();

        let error = parse_workflow_file(&workflow_path).expect_err("trigger is required");
        assert!(format!("{error:#}").contains("broken.yaml"));
    }
}
