//! Run summaries handed back to the caller and balance settlement.

use chrono::{DateTime, Utc};
use serde::Serialize;
use teller_types::{Amount, LogEntry};
use tracing::{debug, info};

use crate::{
    auth::{AccountDirectory, AccountError},
    error::WorkflowError,
    workflow::state::{ExecutionState, RunStatus},
};

/// Outcome of one workflow run.
///
/// A report is produced for every run, including failed ones; the accumulated log
/// is always kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    pub status: RunStatus,
    pub success: bool,
    pub initial_balance: Option<Amount>,
    pub new_balance: Option<Amount>,
    pub authenticated_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub logs: Vec<LogEntry>,
}

impl RunReport {
    pub(crate) fn from_state(
        workflow: Option<String>,
        state: ExecutionState,
        error: Option<&WorkflowError>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let status = state.status();
        let new_balance = state.new_balance();
        Self {
            workflow,
            status,
            success: status == RunStatus::Completed && new_balance.is_some(),
            initial_balance: state.initial_balance(),
            new_balance,
            authenticated_user_id: state.authenticated_user_id().map(str::to_string),
            error: error.map(ToString::to_string),
            started_at,
            finished_at: Utc::now(),
            logs: state.into_logs(),
        }
    }

    /// True when the run completed and left a balance to commit.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Commits a successful run's `new_balance` to the authenticated user's account.
///
/// Returns `Ok(false)` when there is nothing to apply. A zero balance is applied.
pub fn settle(report: &RunReport, directory: &mut AccountDirectory) -> Result<bool, AccountError> {
    let (true, Some(user_id), Some(balance)) = (
        report.is_success(),
        report.authenticated_user_id.as_deref(),
        report.new_balance,
    ) else {
        debug!(status = ?report.status, "run left no balance to settle");
        return Ok(false);
    };

    directory.set_balance(user_id, balance)?;
    info!(user_id, balance = %balance, "settled account balance");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccountRecord, AuthOutcome};

    fn directory(balance: Amount) -> AccountDirectory {
        AccountDirectory::new(vec![AccountRecord {
            user_id: "12345".into(),
            pin: 1234,
            balance,
        }])
    }

    fn report_for(status: RunStatus, balance: Option<Amount>) -> RunReport {
        let mut state = ExecutionState::new();
        state.apply_authentication(&AuthOutcome::valid("12345", Amount::from_minor_units(10_000)));
        state.set_current_balance(balance);
        state.set_status(status);
        RunReport::from_state(Some("payout".into()), state, None, Utc::now())
    }

    #[test]
    fn success_requires_completion_and_a_balance() {
        assert!(report_for(RunStatus::Completed, Some(Amount::ZERO)).is_success());
        assert!(!report_for(RunStatus::Completed, None).is_success());
        assert!(!report_for(RunStatus::Aborted, Some(Amount::ZERO)).is_success());
    }

    #[test]
    fn settles_zero_balances() {
        let mut accounts = directory(Amount::from_minor_units(10_000));
        let report = report_for(RunStatus::Completed, Some(Amount::ZERO));

        assert_eq!(settle(&report, &mut accounts), Ok(true));
        assert_eq!(accounts.account("12345").map(|account| account.balance), Some(Amount::ZERO));
    }

    #[test]
    fn leaves_accounts_untouched_after_failed_runs() {
        let mut accounts = directory(Amount::from_minor_units(10_000));
        let report = report_for(RunStatus::Aborted, None);

        assert_eq!(settle(&report, &mut accounts), Ok(false));
        assert_eq!(
            accounts.account("12345").map(|account| account.balance),
            Some(Amount::from_minor_units(10_000))
        );
    }

    #[test]
    fn serializes_errors_and_statuses() {
        let mut state = ExecutionState::new();
        state.set_status(RunStatus::Failed);
        let error = WorkflowError::invalid_action("s1", "transfer");
        let report = RunReport::from_state(None, state, Some(&error), Utc::now());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "step 's1' requests unknown action 'transfer'");
        assert!(json.get("workflow").is_none());
    }
}
