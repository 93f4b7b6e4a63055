// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File Session errors (§4.2).

use agentkernel_workspace::WorkspaceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a step is already open on this session")]
    StepAlreadyOpen,
    #[error("no step is open on this session")]
    NoOpenStep,
    #[error("step already validated")]
    AlreadyValidated,
    #[error("step must be validated before changes are applied")]
    NotValidated,
    #[error("step must be applied before it can be committed")]
    NotApplied,
    #[error("path already exists: {0}")]
    AlreadyExists(String),
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("stale optimistic lock on {0}")]
    StaleOptimisticLock(String),
    #[error("step budget exceeded: {0}")]
    StepBudgetExceeded(String),
    #[error("write to env file not allowed: {0}")]
    EnvMutationNotAllowed(String),
    #[error("staged path {0} is outside the allowed correction-constraint prefixes")]
    CorrectionConstraintViolation(String),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
