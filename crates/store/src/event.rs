// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The WAL's fact vocabulary. Every durable state change is first recorded
//! as an `Event`, then folded into [`crate::state::MaterializedState`] by
//! [`crate::state::MaterializedState::apply_event`]. Handlers MUST be
//! idempotent: applying the same event twice produces the same state as
//! applying it once, because replay after a crash re-applies from the last
//! snapshot's cursor.

use agentkernel_core::model::{
    AgentRun, AgentStep, Project, ReasonCode, RunJob, RunJobStatus, RunStatus, WorkerNode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ProjectCreated {
        project: Box<Project>,
    },
    ProjectHeadUpdated {
        project_id: String,
        commit_hash: String,
    },
    ProjectHistoryPushed {
        project_id: String,
        entry: agentkernel_core::model::HistoryEntry,
    },

    RunCreated {
        run: Box<AgentRun>,
    },
    RunStatusChanged {
        run_id: String,
        status: RunStatus,
        error_message: Option<String>,
    },
    RunStepAdvanced {
        run_id: String,
        current_step_index: usize,
        last_step_id: Option<String>,
        current_commit_hash: String,
        last_valid_commit_hash: String,
    },
    RunPlanSet {
        run_id: String,
        plan: serde_json::Value,
    },
    RunValidationRecorded {
        run_id: String,
        validation_status: agentkernel_core::model::ValidationStatus,
        validation_result: Box<agentkernel_core::model::ValidationReport>,
        validated_at: chrono::DateTime<chrono::Utc>,
    },
    RunCancelRequested {
        run_id: String,
    },
    RunTimestamped {
        run_id: String,
        started_at: Option<chrono::DateTime<chrono::Utc>>,
        finished_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    StepAppended {
        step: Box<AgentStep>,
    },
    StepStatusChanged {
        step_id: String,
        status: agentkernel_core::model::StepStatus,
        commit_hash: Option<String>,
        error_message: Option<String>,
        output_payload: Option<serde_json::Value>,
        finished_at: Option<chrono::DateTime<chrono::Utc>>,
    },

    JobEnqueued {
        job: Box<RunJob>,
    },
    JobClaimed {
        job_id: String,
        node_id: String,
        lease_expires_at: chrono::DateTime<chrono::Utc>,
        attempt: u32,
    },
    JobHeartbeat {
        job_id: String,
        lease_expires_at: chrono::DateTime<chrono::Utc>,
    },
    JobCompleted {
        job_id: String,
        status: RunJobStatus,
        last_error: Option<String>,
    },
    JobReleased {
        job_id: String,
        status: RunJobStatus,
    },

    WorkerUpserted {
        node: Box<WorkerNode>,
    },
    WorkerHeartbeat {
        node_id: String,
        at: chrono::DateTime<chrono::Utc>,
    },

    RateLimitConsumed {
        key: String,
        window_start: i64,
        count: u64,
    },

    GovernanceDecided {
        run_id: String,
        decision_hash: String,
        reason_codes: Vec<ReasonCode>,
    },
}
