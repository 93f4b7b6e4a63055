// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Planner interface (§4's "Planner Interface" row, §6, §9).
//!
//! The planner is pure from the kernel's point of view: it turns a goal (or
//! a failure) into a sequence of steps and has no side effects of its own.
//! Its implementation — the LLM calls — lives outside this crate; the
//! kernel only ever holds a `dyn Planner`.

use crate::model::{correction::CorrectionConstraint, correction::CorrectionProfile, AgentStepId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The statically enumerated tool set (§9 "Runtime-only reflection for tool
/// dispatch"). Each variant is a concrete handler with typed inputs;
/// nothing is dispatched by runtime reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    WriteFile,
    ReadFile,
    ListFiles,
    RunCommand,
    FetchRuntimeLogs,
    AiMutation,
    ManualFileWrite,
}

crate::simple_display! {
    Tool {
        WriteFile => "write_file",
        ReadFile => "read_file",
        ListFiles => "list_files",
        RunCommand => "run_command",
        FetchRuntimeLogs => "fetch_runtime_logs",
        AiMutation => "ai_mutation",
        ManualFileWrite => "manual_file_write",
    }
}

impl Tool {
    /// Whether invoking this tool can stage file changes. Gates whether
    /// `run.lastValidCommitHash` is eligible to advance on the step's
    /// commit (§4.5.2.d).
    pub fn mutates(self) -> bool {
        matches!(self, Tool::WriteFile | Tool::AiMutation | Tool::ManualFileWrite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedStepType {
    Analyze,
    Modify,
    Verify,
}

crate::simple_display! {
    PlannedStepType {
        Analyze => "analyze",
        Modify => "modify",
        Verify => "verify",
    }
}

/// One step proposed by the planner, not yet executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PlannedStepType,
    pub tool: Tool,
    pub input: serde_json::Value,
    pub mutates: bool,
    /// Present only on corrective steps; mirrors the inputs that produced
    /// this step exactly (§4.7).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_correction: Option<crate::model::DeepCorrectionEnvelope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlannedStep>,
}

#[derive(Debug, Clone)]
pub struct PlanContext {
    pub run_id: String,
    pub project_id: String,
    pub goal: String,
    pub provider_id: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct CorrectionPlanContext {
    pub run_id: String,
    pub failed_step_id: AgentStepId,
    pub profile: CorrectionProfile,
    pub constraint: CorrectionConstraint,
    pub attempt: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("planner timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("planner failed: {detail}")]
    Failed { detail: String },
}

/// The pure interface the kernel consumes (§6 "Planner API"). Implementations
/// live outside this crate (LLM adapters); the kernel never calls an LLM
/// directly.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, ctx: PlanContext) -> Result<Plan, PlannerError>;

    async fn plan_correction(&self, ctx: CorrectionPlanContext) -> Result<Vec<PlannedStep>, PlannerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mutating_tools_report_mutates() {
        assert!(Tool::AiMutation.mutates());
        assert!(Tool::ManualFileWrite.mutates());
        assert!(!Tool::ReadFile.mutates());
        assert!(!Tool::RunCommand.mutates());
    }
}
