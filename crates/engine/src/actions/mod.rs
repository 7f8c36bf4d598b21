//! Action registry and dispatch.
//!
//! Every step names an action. The registry maps those names to [`Action`]
//! implementations; the engine never looks handlers up any other way. The built-in
//! banking actions live in [`builtin`], and callers may register additional actions
//! (or replace built-ins) before handing the registry to the engine.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use teller_types::StepOutput;

use crate::{auth::Authenticator, error::WorkflowError, resolve::ResolvedParams, workflow::state::ExecutionState};

pub mod builtin;

pub use builtin::{
    DEPOSIT_MONEY, DepositMoney, GET_ACCOUNT_BALANCE, GetAccountBalance, VALIDATE_ACCOUNT, ValidateAccount, WITHDRAW_IN_DOLLARS,
    WithdrawInDollars,
};

/// Executes one named capability.
///
/// Implementations read and mutate the run's [`ExecutionState`] and return the
/// output fields recorded in the execution log. Returning an error aborts the run.
pub trait Action: Send + Sync {
    fn execute(&self, state: &mut ExecutionState, params: &ResolvedParams) -> Result<StepOutput, WorkflowError>;
}

impl<F> Action for F
where
    F: Fn(&mut ExecutionState, &ResolvedParams) -> Result<StepOutput, WorkflowError> + Send + Sync,
{
    fn execute(&self, state: &mut ExecutionState, params: &ResolvedParams) -> Result<StepOutput, WorkflowError> {
        self(state, params)
    }
}

/// Name-keyed set of actions available to a run.
#[derive(Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the four built-in banking actions.
    pub fn with_builtins(authenticator: Arc<dyn Authenticator>) -> Self {
        let mut registry = Self::new();
        registry.register(VALIDATE_ACCOUNT, ValidateAccount::new(authenticator));
        registry.register(DEPOSIT_MONEY, DepositMoney);
        registry.register(WITHDRAW_IN_DOLLARS, WithdrawInDollars);
        registry.register(GET_ACCOUNT_BALANCE, GetAccountBalance);
        registry
    }

    /// Registers `action` under `name`, returning the action it replaced.
    pub fn register(&mut self, name: impl Into<String>, action: impl Action + 'static) -> Option<Box<dyn Action>> {
        self.actions.insert(name.into(), Box::new(action))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Runs the action registered as `action_name`.
    pub fn dispatch(
        &self,
        action_name: &str,
        state: &mut ExecutionState,
        params: &ResolvedParams,
    ) -> Result<StepOutput, WorkflowError> {
        let action = self
            .actions
            .get(action_name)
            .ok_or_else(|| WorkflowError::invalid_action(params.step_id(), action_name))?;
        action.execute(state, params)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccountDirectory;
    use indexmap::IndexMap;
    use teller_types::OutputValue;

    fn params(step_id: &str) -> ResolvedParams {
        ResolvedParams::new(step_id, IndexMap::new())
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = ActionRegistry::with_builtins(Arc::new(AccountDirectory::default()));
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            [VALIDATE_ACCOUNT, DEPOSIT_MONEY, WITHDRAW_IN_DOLLARS, GET_ACCOUNT_BALANCE]
        );
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let registry = ActionRegistry::new();
        let mut state = ExecutionState::new();

        let error = registry
            .dispatch("transfer", &mut state, &params("s1"))
            .expect_err("unknown action");
        assert_eq!(error, WorkflowError::invalid_action("s1", "transfer"));
    }

    #[test]
    fn closures_can_be_registered_and_replace_entries() {
        let mut registry = ActionRegistry::new();
        let first = |_: &mut ExecutionState, _: &ResolvedParams| -> Result<StepOutput, WorkflowError> { Ok(StepOutput::new()) };
        assert!(registry.register("noop", first).is_none());

        let second = |_: &mut ExecutionState, params: &ResolvedParams| -> Result<StepOutput, WorkflowError> {
            let mut output = StepOutput::new();
            output.insert("step".into(), OutputValue::Text(params.step_id().to_string()));
            Ok(output)
        };
        assert!(registry.register("noop", second).is_some());
        assert!(registry.contains("noop"));

        let mut state = ExecutionState::new();
        let output = registry.dispatch("noop", &mut state, &params("echo")).unwrap();
        assert_eq!(output["step"], OutputValue::Text("echo".into()));
    }
}
