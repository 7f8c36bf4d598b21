//! Shared data model for Teller workflows.
//!
//! The types here describe the declarative step graph (trigger, steps, parameter
//! sources, transitions, conditions), the exact [`Amount`] used for balances, and the
//! [`LogEntry`] records a run produces.

pub mod amount;
pub mod log;
pub mod workflow;

pub use amount::{AMOUNT_SCALE, Amount, AmountError};
pub use log::{LogEntry, OutputValue, StepOutput};
pub use workflow::{
    ComparisonOperator, DefinitionIssue, IssueSeverity, ParamReference, ParamSource, TRIGGER_ID, WorkflowCondition, WorkflowDefinition,
    WorkflowStep, WorkflowTransition, WorkflowTrigger, lint_definition,
};
