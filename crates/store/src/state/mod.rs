// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built by folding [`crate::event::Event`]s over an
//! empty start state. This is the single source of truth the content store
//! serves reads from; the WAL is its durability log.

mod jobs;
mod projects;
mod rate_limit;
mod runs;
mod steps;
mod workers;

pub(crate) use rate_limit::bucket_key;

use crate::event::Event;
use agentkernel_core::model::{AgentRun, AgentStep, Project, RunJob, WorkerNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub projects: HashMap<String, Project>,
    pub runs: HashMap<String, AgentRun>,
    pub steps: HashMap<String, AgentStep>,
    pub jobs: HashMap<String, RunJob>,
    pub workers: HashMap<String, WorkerNode>,
    #[serde(default)]
    pub rate_limit_buckets: HashMap<String, u64>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, deriving the resulting state change. Every handler
    /// below MUST be idempotent: re-applying the same event (as happens on
    /// WAL replay after a crash) must not change the outcome.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::ProjectCreated { .. }
            | Event::ProjectHeadUpdated { .. }
            | Event::ProjectHistoryPushed { .. } => projects::apply(self, event),

            Event::RunCreated { .. }
            | Event::RunStatusChanged { .. }
            | Event::RunStepAdvanced { .. }
            | Event::RunPlanSet { .. }
            | Event::RunValidationRecorded { .. }
            | Event::RunCancelRequested { .. }
            | Event::RunTimestamped { .. } => runs::apply(self, event),

            Event::StepAppended { .. } | Event::StepStatusChanged { .. } => steps::apply(self, event),

            Event::JobEnqueued { .. }
            | Event::JobClaimed { .. }
            | Event::JobHeartbeat { .. }
            | Event::JobCompleted { .. }
            | Event::JobReleased { .. } => jobs::apply(self, event),

            Event::WorkerUpserted { .. } | Event::WorkerHeartbeat { .. } => workers::apply(self, event),

            Event::RateLimitConsumed { .. } => rate_limit::apply(self, event),

            // Recorded in the WAL for audit purposes only; governance
            // decisions are computed on demand and are not themselves
            // materialized state.
            Event::GovernanceDecided { .. } => {}
        }
    }

    pub fn steps_for_run(&self, run_id: &str) -> Vec<&AgentStep> {
        let mut steps: Vec<&AgentStep> = self.steps.values().filter(|s| s.run_id.as_str() == run_id).collect();
        // (stepIndex ASC, attempt ASC, createdAt ASC) per §5 ordering guarantee.
        steps.sort_by(|a, b| {
            a.step_index
                .cmp(&b.step_index)
                .then(a.attempt.cmp(&b.attempt))
                .then(a.created_at.cmp(&b.created_at))
        });
        steps
    }

    pub fn has_active_run(&self, project_id: &str) -> bool {
        self.runs.values().any(|run| run.project_id.as_str() == project_id && run.status.is_active())
    }

    pub fn active_job_for_run(&self, run_id: &str) -> Option<&RunJob> {
        self.jobs.values().find(|job| job.run_id.as_str() == run_id && !job.status.is_terminal())
    }
}
