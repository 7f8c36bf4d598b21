//! Per-run pieces of workflow execution.
//!
//! `state` owns the mutable context of a single run, `conditions` decides which
//! transitions fire, and `report` summarizes a finished run for the caller.

pub mod conditions;
pub mod report;
pub mod state;
