//! Built-in banking actions.

use std::sync::Arc;

use teller_types::{Amount, OutputValue, StepOutput};
use tracing::{debug, warn};

use super::Action;
use crate::{
    auth::{Authenticator, Credentials},
    error::WorkflowError,
    resolve::ResolvedParams,
    workflow::state::ExecutionState,
};

pub const VALIDATE_ACCOUNT: &str = "validate_account";
pub const DEPOSIT_MONEY: &str = "deposit_money";
pub const WITHDRAW_IN_DOLLARS: &str = "withdraw_in_dollars";
pub const GET_ACCOUNT_BALANCE: &str = "get_account_balance";

/// Checks `user_id`/`pin` and establishes the run's balances.
///
/// Output: `{is_valid, balance}`. Rejected credentials are a normal outcome.
pub struct ValidateAccount {
    authenticator: Arc<dyn Authenticator>,
}

impl ValidateAccount {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl Action for ValidateAccount {
    fn execute(&self, state: &mut ExecutionState, params: &ResolvedParams) -> Result<StepOutput, WorkflowError> {
        let credentials = Credentials {
            user_id: params.require_text("user_id")?,
            pin: params.require_text("pin")?,
        };

        let outcome = self.authenticator.authenticate(&credentials);
        debug!(
            step_id = params.step_id(),
            user_id = %credentials.user_id,
            is_valid = outcome.is_valid,
            "account validation finished"
        );
        state.apply_authentication(&outcome);

        Ok(balance_output(Some(("is_valid", outcome.is_valid)), state.initial_balance()))
    }
}

/// Adds `money` to the established balance. Output: `{balance}`.
pub struct DepositMoney;

impl Action for DepositMoney {
    fn execute(&self, state: &mut ExecutionState, params: &ResolvedParams) -> Result<StepOutput, WorkflowError> {
        let money = params.require_amount("money")?;
        let balance = established_balance(state, params)?;

        let updated = balance.checked_add(money)?;
        state.set_current_balance(Some(updated));
        Ok(balance_output(None, Some(updated)))
    }
}

/// Subtracts `money` from the established balance. Output: `{balance}`.
///
/// Overdrawing clears the running balance and aborts the whole run.
pub struct WithdrawInDollars;

impl Action for WithdrawInDollars {
    fn execute(&self, state: &mut ExecutionState, params: &ResolvedParams) -> Result<StepOutput, WorkflowError> {
        let money = params.require_amount("money")?;
        let balance = established_balance(state, params)?;

        if money > balance {
            warn!(step_id = params.step_id(), requested = %money, available = %balance, "withdrawal exceeds balance");
            state.set_current_balance(None);
            return Err(WorkflowError::insufficient_balance(params.step_id(), money, balance));
        }

        let updated = balance.checked_sub(money)?;
        state.set_current_balance(Some(updated));
        Ok(balance_output(None, Some(updated)))
    }
}

/// Reports the running balance without changing it. Output: `{balance}`.
pub struct GetAccountBalance;

impl Action for GetAccountBalance {
    fn execute(&self, state: &mut ExecutionState, _params: &ResolvedParams) -> Result<StepOutput, WorkflowError> {
        Ok(balance_output(None, state.current_balance()))
    }
}

fn established_balance(state: &ExecutionState, params: &ResolvedParams) -> Result<Amount, WorkflowError> {
    state.current_balance().ok_or_else(|| {
        WorkflowError::precondition_failed(
            params.step_id(),
            "no balance is established; run a successful validate_account first",
        )
    })
}

fn balance_output(flag: Option<(&str, bool)>, balance: Option<Amount>) -> StepOutput {
    let mut output = StepOutput::new();
    if let Some((name, value)) = flag {
        output.insert(name.to_string(), OutputValue::Bool(value));
    }
    output.insert("balance".to_string(), balance.into());
    output
}
