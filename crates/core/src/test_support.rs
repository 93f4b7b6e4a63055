// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only factory functions for entity types whose field count makes the
//! [`crate::builder!`] macro unwieldy. Every returned value is fully
//! populated with deterministic test data; callers override individual
//! fields with struct-update syntax (`Thing { field: x, ..test_thing() }`).

#![cfg(any(test, feature = "test-support"))]

use crate::model::{
    contract::{ExecutionConfig, ExecutionContractMaterial, ExecutionProfile},
    ids::{AgentRunId, AgentStepId, ProjectId, RunJobId, WorkerNodeId},
    job::{RunJob, RunJobKind},
    project::Project,
    run::{AgentRun, RunMetadata, RunStatus},
    step::{AgentStep, StepStatus, StepType},
    worker::WorkerNode,
};
use chrono::{DateTime, Utc};

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid fixed epoch")
}

pub fn test_project() -> Project {
    Project::new(
        ProjectId::new(),
        "org-test",
        "ws-test",
        "test-project",
        "template-default",
        "user-test",
        epoch(),
    )
}

pub fn test_execution_config() -> ExecutionConfig {
    ExecutionConfig::for_profile(ExecutionProfile::Ci)
}

pub fn test_run(project_id: ProjectId) -> AgentRun {
    let material = ExecutionContractMaterial::current("seed-test");
    let contract_hash = crate::canonical::canonical_hash(&material).expect("hashable material");
    AgentRun {
        id: AgentRunId::new(),
        project_id,
        org_id: "org-test".into(),
        workspace_id: "ws-test".into(),
        created_by: "user-test".into(),
        goal: "noop".into(),
        provider_id: "provider-test".into(),
        model: "model-test".into(),
        status: RunStatus::Queued,
        current_step_index: 0,
        last_step_id: None,
        plan: None,
        base_commit_hash: "0".repeat(40),
        current_commit_hash: "0".repeat(40),
        last_valid_commit_hash: "0".repeat(40),
        run_branch: "run/test".into(),
        worktree_path: None,
        validation_status: None,
        validation_result: None,
        validated_at: None,
        error_message: None,
        started_at: None,
        finished_at: None,
        metadata: RunMetadata {
            execution_config: serde_json::to_value(test_execution_config()).expect("serializable"),
            execution_contract_hash: contract_hash,
            execution_contract_material: serde_json::to_value(&material).expect("serializable"),
            execution_contract_fallback_used: false,
            execution_contract_fallback_fields: Vec::new(),
            forked_from_run_id: None,
            cancel_requested: false,
            extra: serde_json::Map::new(),
        },
    }
}

pub fn test_step(run_id: AgentRunId, project_id: ProjectId, step_index: usize) -> AgentStep {
    AgentStep {
        id: AgentStepId::new(),
        run_id,
        project_id,
        step_index,
        attempt: 0,
        step_id: format!("step-{step_index}"),
        kind: StepType::Modify,
        tool: "ai_mutation".into(),
        status: StepStatus::Pending,
        input_payload: serde_json::Value::Null,
        output_payload: None,
        error_message: None,
        commit_hash: None,
        runtime_status: None,
        started_at: epoch(),
        finished_at: None,
        created_at: epoch(),
        correction_telemetry: None,
        correction_policy: Vec::new(),
    }
}

pub fn test_job(run_id: AgentRunId, project_id: ProjectId) -> RunJob {
    RunJob::new(
        RunJobId::new(),
        run_id,
        project_id,
        RunJobKind::Start,
        "compute",
        serde_json::Value::Null,
        3,
        epoch(),
    )
}

pub fn test_worker() -> WorkerNode {
    WorkerNode::new(WorkerNodeId::new(), "compute", vec!["docker".into()], epoch())
}
