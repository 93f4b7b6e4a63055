// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input/output types for the kernel's entry points (§4.5 "Entry points
//! exposed to external collaborators").

use agentkernel_contract::{ConfigOverrides, FrozenContract};
use agentkernel_core::model::{
    AgentRun, AgentRunId, AgentStep, AgentStepId, CorrectionPolicyRecord, ExecutionProfile,
    ProjectId, RunJob, ValidationReport, V1ReadyReport,
};

#[derive(Debug, Clone)]
pub struct QueueRunInput {
    pub project_id: ProjectId,
    pub org_id: String,
    pub workspace_id: String,
    pub created_by: String,
    pub goal: String,
    pub provider_id: String,
    pub model: String,
    pub profile: ExecutionProfile,
    pub overrides: ConfigOverrides,
    pub randomness_seed: String,
}

pub struct QueueRunOutput {
    pub run: AgentRun,
    pub queued_job: RunJob,
    pub contract: FrozenContract,
}

/// `executionConfig?` is modeled as an optional set of per-field overrides
/// applied to the same profile the run was originally queued under (read
/// back from `RunMetadata.extra["execution_profile"]`). See DESIGN.md for
/// why a raw `ExecutionConfig` isn't accepted directly.
#[derive(Debug, Clone, Default)]
pub struct QueueResumeRunInput {
    pub run_id: AgentRunId,
    pub overrides: Option<ConfigOverrides>,
    pub override_execution_config: bool,
    pub fork: bool,
}

pub enum QueueResumeRunOutput {
    Resumed { run: AgentRun, queued_job: RunJob },
    Forked { run: AgentRun, queued_job: RunJob, contract: FrozenContract },
}

pub struct ForkRunOutput {
    pub run: AgentRun,
    pub queued_job: RunJob,
    pub contract: FrozenContract,
}

pub struct RunWithSteps {
    pub run: AgentRun,
    pub steps: Vec<AgentStep>,
    pub telemetry: Vec<CorrectionPolicyRecord>,
    pub stub_debt: Vec<String>,
}

pub struct ValidateRunOutputResult {
    pub run: AgentRun,
    pub validation: ValidationReport,
    pub v1_ready: Option<V1ReadyReport>,
    pub target_path: String,
}

/// Re-exported so callers constructing a `forkRun` request don't need to
/// reach into `agentkernel_core` directly for the step id type.
pub type ForkStepId = AgentStepId;
