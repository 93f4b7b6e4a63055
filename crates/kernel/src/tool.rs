// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool invocation interface (§4.5.2c "Invoke tool"). Just like
//! [`agentkernel_core::planner::Planner`], the kernel only ever holds a `dyn
//! ToolRunner`: materializing a planned step's change proposals (calling an
//! LLM, shelling out, whatever the tool needs) lives outside this crate, and
//! the kernel's job is only to stage and commit what comes back.

use agentkernel_core::planner::PlannedStep;
use agentkernel_session::StagedChange;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool '{tool}' failed: {detail}")]
    Failed { tool: String, detail: String },
}

/// Invokes one planned step against a run's worktree and returns the file
/// changes to stage. Never touches the workspace directly: the kernel
/// stages, validates, applies and commits everything this returns through
/// the `FileSession` (§4.2).
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn invoke(
        &self,
        run_id: &str,
        step: &PlannedStep,
        worktree: &Path,
    ) -> Result<Vec<StagedChange>, ToolError>;
}
