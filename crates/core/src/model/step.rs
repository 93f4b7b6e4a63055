// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentStep entity (§3, §4.5).

use super::ids::{AgentRunId, AgentStepId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Analyze,
    Modify,
    Verify,
}

crate::simple_display! {
    StepType {
        Analyze => "analyze",
        Modify => "modify",
        Verify => "verify",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    StepStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Recorded when a step is a synthesized corrective step (§4.5e, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepCorrectionEnvelope {
    pub phase: String,
    pub attempt: u32,
    pub failed_step_id: AgentStepId,
    pub classification: serde_json::Value,
    pub constraint: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Outcome of evaluating the correction policy rules (§4.7) against one
/// corrective step attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionPolicyRecord {
    pub rule_id: String,
    pub severity: RuleSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    Warning,
    Blocking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    pub id: AgentStepId,
    pub run_id: AgentRunId,
    pub project_id: ProjectId,
    pub step_index: usize,
    pub attempt: u32,
    /// Opaque step identifier from the plan (distinct from `id`, which is
    /// this record's own storage key).
    pub step_id: String,
    pub kind: StepType,
    pub tool: String,
    pub status: StepStatus,
    pub input_payload: serde_json::Value,
    pub output_payload: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub commit_hash: Option<String>,
    pub runtime_status: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_telemetry: Option<DeepCorrectionEnvelope>,
    #[serde(default)]
    pub correction_policy: Vec<CorrectionPolicyRecord>,
}

impl AgentStep {
    /// The key used for the `(runId, stepIndex, attempt)` uniqueness
    /// invariant and for idempotent re-entry (§4.5 Idempotency).
    pub fn key(&self) -> (AgentRunId, usize, u32) {
        (self.run_id, self.step_index, self.attempt)
    }
}
