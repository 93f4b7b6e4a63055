// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (§7).
//!
//! Each downstream crate defines its own `thiserror` enum for the errors it
//! can raise and wraps this crate's errors with `#[from]`, the way
//! `ExecuteError` wraps `WalError` in a layered daemon. [`KernelError`] is
//! the composed view used at the Agent Kernel's entry points, where a
//! caller needs to know which HTTP-mappable kind it got without reaching
//! into every crate's own error type.

use thiserror::Error;

/// A caller error (§7 "Caller errors (4xx)"): the request was invalid given
/// the current state. Never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallerError {
    #[error("path escapes project root: {path}")]
    PathEscape { path: String },
    #[error("path already exists: {path}")]
    AlreadyExists { path: String },
    #[error("not found: {what}")]
    NotFound { what: String },
    #[error("stale optimistic lock on {path}")]
    StaleOptimisticLock { path: String },
    #[error("step budget exceeded: {detail}")]
    StepBudgetExceeded { detail: String },
    #[error("staged path violates correction constraint: {path}")]
    CorrectionConstraintViolation { path: String },
    #[error("execution config mismatch")]
    ExecutionConfigMismatch { diff: Vec<crate::model::ConfigDriftField> },
    #[error("project {project_id} is locked by an active run")]
    BranchLockedByActiveRun { project_id: String },
    #[error("run {run_id} is still active")]
    RunStillActive { run_id: String },
    #[error("run {run_id} already has an active job")]
    DuplicateActiveJob { run_id: String },
    #[error("commit would be empty")]
    EmptyCommit,
}

/// A transient infrastructure error (§7 "Transient infrastructure
/// (retryable)"). The run-job queue releases the job with `retryable=true`
/// rather than failing the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransientError {
    #[error("lease lost for job {job_id}")]
    LeaseLost { job_id: String },
    #[error("workspace locked: {path}")]
    WorkspaceLocked { path: String },
    #[error("store conflict on {key}")]
    StoreConflict { key: String },
}

/// A fatal error (§7 "Fatal (5xx)"). Marks the current step failed; the run
/// transitions to `failed` once the correction budget is exhausted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("planner failed: {detail}")]
    PlannerFailed { detail: String },
    #[error("validation pipeline crashed: {detail}")]
    ValidationPipelineCrashed { detail: String },
    #[error("step interrupted: {step_id}")]
    InterruptedStep { step_id: String },
}

/// The composed error surface at the kernel's entry points. Downstream
/// crates each define their own enum grounded in the equivalent teacher
/// layering (`WalError` → `ExecuteError` → `RuntimeError`) and convert into
/// this one with `#[from]` at their outermost boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error(transparent)]
    Caller(#[from] CallerError),
    #[error(transparent)]
    Transient(#[from] TransientError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl KernelError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, KernelError::Transient(_))
    }
}
