//! Account authentication.
//!
//! The `validate_account` action delegates credential checks to an
//! [`Authenticator`]. Unknown users and wrong PINs are never errors: they come back
//! as an [`AuthOutcome`] with `is_valid: false` so the workflow can branch on them.
//!
//! [`AccountDirectory`] is the in-memory implementation used by the CLI and the
//! tests. It is loaded from a YAML or JSON document:
//!
//! ```yaml
//! accounts:
//!   - user_id: "105398891"
//!     pin: 2090
//!     balance: 150000
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use teller_types::Amount;
use thiserror::Error;
use tracing::debug;

/// Credentials presented by a workflow trigger.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub pin: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("pin", &"<redacted>")
            .finish()
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub is_valid: bool,
    pub balance: Option<Amount>,
    pub user_id: Option<String>,
}

impl AuthOutcome {
    pub fn valid(user_id: impl Into<String>, balance: Amount) -> Self {
        Self {
            is_valid: true,
            balance: Some(balance),
            user_id: Some(user_id.into()),
        }
    }

    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            balance: None,
            user_id: None,
        }
    }
}

/// Verifies credentials and reports the account's current balance.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> AuthOutcome;
}

/// A single account known to an [`AccountDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub user_id: String,
    pub pin: u32,
    #[serde(default)]
    pub balance: Amount,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("no account is registered for user '{user_id}'")]
    UnknownAccount { user_id: String },

    #[error("balance for user '{user_id}' cannot be negative ({balance})")]
    NegativeBalance { user_id: String, balance: Amount },
}

/// In-memory account store backed by a YAML or JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDirectory {
    #[serde(default)]
    accounts: Vec<AccountRecord>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<AccountRecord>) -> Self {
        Self { accounts }
    }

    /// Loads a directory from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read accounts file: {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("failed to parse accounts file: {}", path.display()))
    }

    /// Writes the directory back to disk, as JSON for `.json` paths and YAML otherwise.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let is_json = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        let content = if is_json {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content).with_context(|| format!("failed to write accounts file: {}", path.display()))
    }

    pub fn accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }

    pub fn account(&self, user_id: &str) -> Option<&AccountRecord> {
        self.accounts.iter().find(|account| account.user_id == user_id)
    }

    pub fn set_balance(&mut self, user_id: &str, balance: Amount) -> Result<(), AccountError> {
        if balance.is_negative() {
            return Err(AccountError::NegativeBalance {
                user_id: user_id.to_string(),
                balance,
            });
        }
        let account = self
            .accounts
            .iter_mut()
            .find(|account| account.user_id == user_id)
            .ok_or_else(|| AccountError::UnknownAccount {
                user_id: user_id.to_string(),
            })?;
        account.balance = balance;
        Ok(())
    }
}

impl Authenticator for AccountDirectory {
    fn authenticate(&self, credentials: &Credentials) -> AuthOutcome {
        let Ok(pin) = credentials.pin.trim().parse::<u32>() else {
            debug!(user_id = %credentials.user_id, "rejecting non-numeric pin");
            return AuthOutcome::invalid();
        };

        match self.account(&credentials.user_id) {
            Some(account) if account.pin == pin => AuthOutcome::valid(&account.user_id, account.balance),
            _ => {
                debug!(user_id = %credentials.user_id, "credentials did not match an account");
                AuthOutcome::invalid()
            }
        }
    }
}
