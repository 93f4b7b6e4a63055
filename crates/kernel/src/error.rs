// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composed error surface for the kernel's entry points and execute loop
//! (§7). Mirrors the layering in `agentkernel_core::error::KernelError`,
//! widened with the concrete errors every collaborator crate can raise.

use agentkernel_contract::ContractError;
use agentkernel_core::error::{CallerError, FatalError, TransientError};
use agentkernel_core::planner::PlannerError;
use agentkernel_session::SessionError;
use agentkernel_store::StoreError;
use agentkernel_workspace::WorkspaceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Caller(#[from] CallerError),
    #[error(transparent)]
    Transient(#[from] TransientError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error("tool invocation failed: {0}")]
    Tool(String),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl KernelError {
    /// Whether the run-job queue should release this job with
    /// `retryable=true` rather than failing the run outright (§7).
    pub fn is_retryable(&self) -> bool {
        match self {
            KernelError::Transient(_) => true,
            KernelError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
