// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentRun entity and its status state machine (§3, §4.5).

use super::ids::{AgentRunId, AgentStepId, ProjectId};
use crate::model::validation::ValidationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run lifecycle state. Transitions are enforced by `agentkernel-kernel`;
/// this type only encodes the reachable set and which states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Correcting,
    Optimizing,
    Validating,
    Complete,
    Failed,
    Cancelled,
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Running => "running",
        Correcting => "correcting",
        Optimizing => "optimizing",
        Validating => "validating",
        Complete => "complete",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Failed | RunStatus::Cancelled)
    }

    /// "Active" per the branch-lock invariant (§4.4).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RunStatus::Queued
                | RunStatus::Running
                | RunStatus::Correcting
                | RunStatus::Optimizing
                | RunStatus::Validating
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Failed,
}

/// Execution-contract bookkeeping frozen into `AgentRun.metadata` at run
/// creation. Immutable afterward unless the run is forked (§4.3 P6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub execution_config: serde_json::Value,
    pub execution_contract_hash: String,
    pub execution_contract_material: serde_json::Value,
    #[serde(default)]
    pub execution_contract_fallback_used: bool,
    #[serde(default)]
    pub execution_contract_fallback_fields: Vec<String>,
    #[serde(default)]
    pub forked_from_run_id: Option<AgentRunId>,
    #[serde(default)]
    pub cancel_requested: bool,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub id: AgentRunId,
    pub project_id: ProjectId,
    pub org_id: String,
    pub workspace_id: String,
    pub created_by: String,
    pub goal: String,
    pub provider_id: String,
    pub model: String,
    pub status: RunStatus,
    pub current_step_index: usize,
    pub last_step_id: Option<AgentStepId>,
    /// The plan as returned by the Planner; `None` until the first planning
    /// call completes.
    pub plan: Option<serde_json::Value>,
    pub base_commit_hash: String,
    pub current_commit_hash: String,
    pub last_valid_commit_hash: String,
    pub run_branch: String,
    pub worktree_path: Option<String>,
    pub validation_status: Option<ValidationStatus>,
    pub validation_result: Option<ValidationReport>,
    pub validated_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub metadata: RunMetadata,
}

impl AgentRun {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
