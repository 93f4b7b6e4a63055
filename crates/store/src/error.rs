// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content store errors. Wraps [`crate::wal::WalError`] the way a layered
//! daemon wraps its WAL error into an executor error, and re-exposes the
//! caller-facing kinds from `agentkernel_core::error` that this crate is
//! responsible for raising.

use crate::wal::WalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("not found: {what}")]
    NotFound { what: String },
    #[error("run {run_id} already has an active job")]
    DuplicateActiveJob { run_id: String },
    #[error("project {project_id} is locked by an active run")]
    BranchLockedByActiveRun { project_id: String },
    #[error("lease lost for job {job_id}")]
    LeaseLost { job_id: String },
    #[error("store conflict on {key}")]
    StoreConflict { key: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::LeaseLost { .. } | StoreError::StoreConflict { .. })
    }
}
