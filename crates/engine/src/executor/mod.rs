//! Execution engine: walks a workflow's step graph from the trigger.
//!
//! - The trigger only contributes transitions; it is never logged
//! - Each step with an action resolves its parameters, dispatches, and appends a
//!   redacted [`LogEntry`]
//! - Every transition whose conditions hold is followed, depth first, in
//!   declaration order
//! - The first fatal error unwinds the whole run; the log gathered so far is kept
//!
//! The walk is bounded by [`EngineConfig::max_depth`] and [`EngineConfig::max_steps`]
//! so cyclic graphs end in [`WorkflowError::MalformedDefinition`].

use std::sync::Arc;

use chrono::Utc;
use teller_types::{LogEntry, TRIGGER_ID, WorkflowDefinition, WorkflowStep, WorkflowTransition};
use tracing::{debug, info, trace, warn};

use crate::{
    actions::ActionRegistry,
    auth::Authenticator,
    config::{EngineConfig, MAX_RECURSION_LIMIT},
    error::WorkflowError,
    redact::Redactor,
    resolve::ParameterResolver,
    workflow::{
        conditions::ConditionEvaluator,
        report::RunReport,
        state::{ExecutionState, RunStatus},
    },
};

/// Interprets workflow definitions against a fixed action registry.
///
/// The engine holds no per-run state and can execute any number of runs, each
/// with its own [`ExecutionState`].
#[derive(Debug)]
pub struct WorkflowEngine {
    registry: ActionRegistry,
    config: EngineConfig,
    redactor: Redactor,
}

impl WorkflowEngine {
    /// Builds an engine; recursive limits above [`MAX_RECURSION_LIMIT`] are lowered to it.
    pub fn new(registry: ActionRegistry, mut config: EngineConfig) -> Self {
        for (field, limit) in [
            ("max_depth", &mut config.max_depth),
            ("max_indirection_depth", &mut config.max_indirection_depth),
        ] {
            if *limit > MAX_RECURSION_LIMIT {
                warn!(field, requested = *limit, max = MAX_RECURSION_LIMIT, "clamping recursion limit");
                *limit = MAX_RECURSION_LIMIT;
            }
        }
        let redactor = Redactor::from_config(&config);
        Self {
            registry,
            config,
            redactor,
        }
    }

    /// Engine with the built-in banking actions and default limits.
    pub fn with_authenticator(authenticator: Arc<dyn Authenticator>) -> Self {
        Self::new(ActionRegistry::with_builtins(authenticator), EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Runs `definition` into a caller-provided, unused state.
    ///
    /// On return the state holds the final status, balances and log, whether or not
    /// the run succeeded.
    pub fn run_trigger(&self, definition: &WorkflowDefinition, state: &mut ExecutionState) -> Result<(), WorkflowError> {
        if state.status() != RunStatus::Pending {
            return Err(WorkflowError::precondition_failed(
                TRIGGER_ID,
                format!("execution state was already used (status {:?})", state.status()),
            ));
        }

        let workflow = definition.workflow.as_deref().unwrap_or("unnamed");
        info!(workflow, step_count = definition.steps.len(), "workflow run started");
        state.set_status(RunStatus::Running);

        let mut traversal = Traversal::new(self, definition);
        let outcome = traversal.follow_transitions(state, TRIGGER_ID, &definition.trigger.transitions, 0);

        match &outcome {
            Ok(()) => {
                state.set_status(RunStatus::Completed);
                info!(
                    workflow,
                    executed = state.logs().len(),
                    visited = traversal.visited,
                    "workflow run completed"
                );
            }
            Err(error) => {
                let status = error.terminal_status();
                state.set_status(status);
                warn!(
                    workflow,
                    status = ?status,
                    executed = state.logs().len(),
                    error = %error,
                    "workflow run stopped"
                );
            }
        }
        outcome
    }

    /// Runs `definition` in a fresh state and summarizes the outcome.
    pub fn execute(&self, definition: &WorkflowDefinition) -> RunReport {
        let started_at = Utc::now();
        let mut state = ExecutionState::new();
        let outcome = self.run_trigger(definition, &mut state);
        RunReport::from_state(definition.workflow.clone(), state, outcome.err().as_ref(), started_at)
    }
}

/// Bookkeeping for a single depth-first walk.
struct Traversal<'run> {
    engine: &'run WorkflowEngine,
    definition: &'run WorkflowDefinition,
    resolver: ParameterResolver<'run>,
    visited: usize,
}

impl<'run> Traversal<'run> {
    fn new(engine: &'run WorkflowEngine, definition: &'run WorkflowDefinition) -> Self {
        Self {
            engine,
            definition,
            resolver: ParameterResolver::new(definition, engine.config.max_indirection_depth),
            visited: 0,
        }
    }

    fn process_step(&mut self, state: &mut ExecutionState, step: &'run WorkflowStep, depth: usize) -> Result<(), WorkflowError> {
        let limits = &self.engine.config;
        if depth > limits.max_depth {
            return Err(WorkflowError::malformed(format!(
                "transition path reached '{}' deeper than {} steps; the step graph is cyclic",
                step.id, limits.max_depth
            )));
        }
        self.visited += 1;
        if self.visited > limits.max_steps {
            return Err(WorkflowError::malformed(format!(
                "run visited more than {} steps (last '{}'); the step graph is cyclic",
                limits.max_steps, step.id
            )));
        }

        if step.has_action() {
            let params = self.resolver.resolve(step)?;
            debug!(step_id = %step.id, action = %step.action, depth, "dispatching action");
            let output = self.engine.registry.dispatch(&step.action, state, &params)?;
            state.append_log(LogEntry {
                id: step.id.clone(),
                action: step.action.clone(),
                params: self.engine.redactor.redact(params.values()),
                output,
            });
        } else {
            trace!(step_id = %step.id, depth, "step has no action; following transitions");
        }

        self.follow_transitions(state, &step.id, &step.transitions, depth)
    }

    fn follow_transitions(
        &mut self,
        state: &mut ExecutionState,
        from_id: &str,
        transitions: &'run [WorkflowTransition],
        depth: usize,
    ) -> Result<(), WorkflowError> {
        for transition in transitions {
            let fires = ConditionEvaluator::new(state.logs()).evaluate(&transition.condition)?;
            if !fires {
                debug!(from_id, target = %transition.target, "transition guard did not hold");
                continue;
            }

            let Some(next) = self.definition.step(&transition.target) else {
                warn!(from_id, target = %transition.target, "transition target does not exist; skipping");
                continue;
            };
            debug!(from_id, target = %transition.target, depth = depth + 1, "following transition");
            self.process_step(state, next, depth + 1)?;
        }
        Ok(())
    }
}
