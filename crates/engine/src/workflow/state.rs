//! Workflow runtime state management.
//!
//! One [`ExecutionState`] belongs to exactly one run. It carries the balances the
//! built-in actions read and mutate, the authenticated user, the run status, and the
//! append-only execution log that condition lookups consult.

use serde::Serialize;
use teller_types::{Amount, LogEntry};

use crate::auth::AuthOutcome;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created but not yet started.
    #[default]
    Pending,
    /// Walking the step graph.
    Running,
    /// Every reachable step ran and no further transitions fired.
    Completed,
    /// An action failed fatally (for example, insufficient balance).
    Aborted,
    /// A structural error stopped the run (unknown action, malformed definition).
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Aborted | RunStatus::Failed)
    }
}

/// Mutable context of one workflow run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    status: RunStatus,
    initial_balance: Option<Amount>,
    current_balance: Option<Amount>,
    authenticated_user_id: Option<String>,
    logs: Vec<LogEntry>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Balance reported by the authenticator when the account was validated.
    pub fn initial_balance(&self) -> Option<Amount> {
        self.initial_balance
    }

    /// Running balance; `None` means "unknown account" or "aborted withdrawal".
    pub fn current_balance(&self) -> Option<Amount> {
        self.current_balance
    }

    /// Balance the caller should commit once the run ends.
    pub fn new_balance(&self) -> Option<Amount> {
        self.current_balance
    }

    pub fn authenticated_user_id(&self) -> Option<&str> {
        self.authenticated_user_id.as_deref()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<LogEntry> {
        self.logs
    }

    /// Replaces both balances with the authenticator's answer.
    ///
    /// A rejected validation clears the balances and the authenticated user.
    pub fn apply_authentication(&mut self, outcome: &AuthOutcome) {
        let balance = if outcome.is_valid { outcome.balance } else { None };
        self.initial_balance = balance;
        self.current_balance = balance;
        self.authenticated_user_id = if outcome.is_valid { outcome.user_id.clone() } else { None };
    }

    pub fn set_current_balance(&mut self, balance: Option<Amount>) {
        self.current_balance = balance;
    }

    pub(crate) fn set_status(&mut self, status: RunStatus) {
        self.status = status;
    }

    pub(crate) fn append_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }
}
