// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the project workspace (§4.1).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("path escapes workspace root: {0}")]
    PathEscape(String),
    #[error("branch not found: {0}")]
    BranchNotFound(String),
    #[error("commit not found: {0}")]
    CommitNotFound(String),
    #[error("commit would be empty: no staged changes against parent")]
    EmptyCommit,
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
