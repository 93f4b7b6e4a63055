// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure interface the validation pipeline consumes (§4.6). `typecheck`,
//! `build`, `tests`, and the optional runtime-boot check shell out to the
//! scaffolded project's own toolchain; those implementations live outside
//! this crate the same way `agentkernel_core::planner::Planner` keeps LLM
//! calls out of the kernel. `architecture` is the one check this crate
//! implements directly, since it's pure static analysis over the worktree.

use agentkernel_core::model::ValidationCheckResult;
use async_trait::async_trait;
use std::path::Path;

/// One check in the validation pipeline (§4.6).
#[async_trait]
pub trait Check: Send + Sync {
    fn id(&self) -> &'static str;

    async fn run(&self, workspace: &Path) -> ValidationCheckResult;
}
