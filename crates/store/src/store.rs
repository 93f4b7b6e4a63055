// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The content store: durable key-value persistence for every entity in
//! the data model (§3), atomic multi-row updates via the WAL, row-level
//! lease acquisition for the run-job queue (§4.4), and the process-wide
//! rate-limit bucket (§5).

use crate::error::StoreError;
use crate::event::Event;
use crate::state::MaterializedState;
use crate::wal::Wal;
use agentkernel_core::model::{
    AgentRun, AgentStep, HistoryEntry, Project, ReasonCode, RunJob, RunJobStatus, RunStatus,
    StepStatus, ValidationReport, ValidationStatus, WorkerNode,
};
use agentkernel_core::Clock;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Outcome of [`ContentStore::consume_rate_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub count: u64,
    pub limit: u64,
}

/// Shared, cloneable handle onto one WAL-backed [`MaterializedState`].
///
/// Every mutation is (1) appended to the WAL, (2) folded into the
/// in-memory state, in that order, under a single lock acquisition so
/// readers never observe a state change without the corresponding WAL
/// entry already durable on disk (modulo the entry's own flush, which the
/// caller controls via [`ContentStore::flush`]).
#[derive(Clone)]
pub struct ContentStore<C: Clock> {
    state: Arc<Mutex<MaterializedState>>,
    wal: Arc<Mutex<Wal>>,
    clock: C,
}

impl<C: Clock> ContentStore<C> {
    pub fn open(wal_path: impl AsRef<Path>, clock: C) -> Result<Self, StoreError> {
        let mut wal = Wal::open(wal_path, 0)?;
        let mut state = MaterializedState::new();
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            wal: Arc::new(Mutex::new(wal)),
            clock,
        })
    }

    fn commit(&self, event: Event) -> Result<(), StoreError> {
        let mut wal = self.wal.lock();
        let seq = wal.append(&event)?;
        wal.flush()?;
        drop(wal);
        self.state.lock().apply_event(&event);
        self.wal.lock().mark_processed(seq);
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        Ok(self.wal.lock().flush()?)
    }

    pub fn snapshot(&self) -> MaterializedState {
        self.state.lock().clone()
    }

    // -- Projects --------------------------------------------------------

    pub fn create_project(&self, project: Project) -> Result<(), StoreError> {
        self.commit(Event::ProjectCreated { project: Box::new(project) })
    }

    pub fn get_project(&self, project_id: &str) -> Option<Project> {
        self.state.lock().projects.get(project_id).cloned()
    }

    pub fn update_project_head(&self, project_id: &str, commit_hash: impl Into<String>) -> Result<(), StoreError> {
        self.commit(Event::ProjectHeadUpdated {
            project_id: project_id.to_string(),
            commit_hash: commit_hash.into(),
        })
    }

    pub fn push_project_history(&self, project_id: &str, entry: HistoryEntry) -> Result<(), StoreError> {
        self.commit(Event::ProjectHistoryPushed { project_id: project_id.to_string(), entry })
    }

    // -- Runs --------------------------------------------------------------

    /// Create a run. Fails `BranchLockedByActiveRun` if another run is
    /// already active on the project (§4.4 branch lock).
    pub fn create_run(&self, run: AgentRun) -> Result<(), StoreError> {
        let project_id = run.project_id.to_string();
        let state = self.state.lock();
        if state.has_active_run(&project_id) {
            return Err(StoreError::BranchLockedByActiveRun { project_id });
        }
        drop(state);
        self.commit(Event::RunCreated { run: Box::new(run) })
    }

    pub fn get_run(&self, run_id: &str) -> Option<AgentRun> {
        self.state.lock().runs.get(run_id).cloned()
    }

    pub fn has_active_run(&self, project_id: &str) -> bool {
        self.state.lock().has_active_run(project_id)
    }

    pub fn set_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        self.commit(Event::RunStatusChanged {
            run_id: run_id.to_string(),
            status,
            error_message,
        })
    }

    pub fn advance_run_step(
        &self,
        run_id: &str,
        current_step_index: usize,
        last_step_id: Option<String>,
        current_commit_hash: impl Into<String>,
        last_valid_commit_hash: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.commit(Event::RunStepAdvanced {
            run_id: run_id.to_string(),
            current_step_index,
            last_step_id,
            current_commit_hash: current_commit_hash.into(),
            last_valid_commit_hash: last_valid_commit_hash.into(),
        })
    }

    pub fn set_run_plan(&self, run_id: &str, plan: serde_json::Value) -> Result<(), StoreError> {
        self.commit(Event::RunPlanSet { run_id: run_id.to_string(), plan })
    }

    pub fn record_validation(
        &self,
        run_id: &str,
        validation_status: ValidationStatus,
        validation_result: ValidationReport,
    ) -> Result<(), StoreError> {
        self.commit(Event::RunValidationRecorded {
            run_id: run_id.to_string(),
            validation_status,
            validation_result: Box::new(validation_result),
            validated_at: self.clock.now(),
        })
    }

    pub fn request_cancel(&self, run_id: &str) -> Result<(), StoreError> {
        self.commit(Event::RunCancelRequested { run_id: run_id.to_string() })
    }

    pub fn mark_run_started(&self, run_id: &str) -> Result<(), StoreError> {
        self.commit(Event::RunTimestamped {
            run_id: run_id.to_string(),
            started_at: Some(self.clock.now()),
            finished_at: None,
        })
    }

    pub fn mark_run_finished(&self, run_id: &str) -> Result<(), StoreError> {
        self.commit(Event::RunTimestamped {
            run_id: run_id.to_string(),
            started_at: None,
            finished_at: Some(self.clock.now()),
        })
    }

    // -- Steps ---------------------------------------------------------------

    pub fn append_step(&self, step: AgentStep) -> Result<(), StoreError> {
        self.commit(Event::StepAppended { step: Box::new(step) })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_step_status(
        &self,
        step_id: &str,
        status: StepStatus,
        commit_hash: Option<String>,
        error_message: Option<String>,
        output_payload: Option<serde_json::Value>,
        finished: bool,
    ) -> Result<(), StoreError> {
        self.commit(Event::StepStatusChanged {
            step_id: step_id.to_string(),
            status,
            commit_hash,
            error_message,
            output_payload,
            finished_at: finished.then(|| self.clock.now()),
        })
    }

    pub fn steps_for_run(&self, run_id: &str) -> Vec<AgentStep> {
        self.state.lock().steps_for_run(run_id).into_iter().cloned().collect()
    }

    // -- Run-job queue (§4.4) ------------------------------------------------

    pub fn enqueue_run_job(&self, job: RunJob) -> Result<(), StoreError> {
        let run_id = job.run_id.to_string();
        let state = self.state.lock();
        if state.active_job_for_run(&run_id).is_some() {
            return Err(StoreError::DuplicateActiveJob { run_id });
        }
        drop(state);
        self.commit(Event::JobEnqueued { job: Box::new(job) })
    }

    /// Select semantics per §4.4: among queued jobs or leased jobs whose
    /// lease has expired, matching `target_role` and whose
    /// `required_capabilities` the caller's `capabilities` are a superset
    /// of, claim the oldest by `created_at`.
    pub fn claim_next_run_job(
        &self,
        node_id: &str,
        target_role: &str,
        capabilities: &[String],
        lease_seconds: i64,
    ) -> Result<Option<RunJob>, StoreError> {
        let now = self.clock.now();
        let job_id = {
            let state = self.state.lock();
            let mut candidates: Vec<&RunJob> = state
                .jobs
                .values()
                .filter(|j| {
                    j.target_role == target_role
                        && j.is_claimable(now)
                        && j.required_capabilities.iter().all(|rc| capabilities.iter().any(|c| c == rc))
                })
                .collect();
            candidates.sort_by_key(|j| j.created_at);
            candidates.first().map(|j| j.id.to_string())
        };
        let Some(job_id) = job_id else { return Ok(None) };

        let attempt = {
            let state = self.state.lock();
            state.jobs.get(&job_id).map(|j| j.attempt + 1).unwrap_or(1)
        };
        self.commit(Event::JobClaimed {
            job_id: job_id.clone(),
            node_id: node_id.to_string(),
            lease_expires_at: now + chrono::Duration::seconds(lease_seconds),
            attempt,
        })?;
        Ok(self.state.lock().jobs.get(&job_id).cloned())
    }

    pub fn heartbeat_job(&self, job_id: &str, node_id: &str, lease_seconds: i64) -> Result<(), StoreError> {
        let state = self.state.lock();
        let job = state.jobs.get(job_id).ok_or_else(|| StoreError::NotFound { what: job_id.to_string() })?;
        let assigned = job.assigned_node.as_ref().map(|n| n.as_str());
        if job.status != RunJobStatus::Leased || assigned != Some(node_id) {
            return Err(StoreError::LeaseLost { job_id: job_id.to_string() });
        }
        drop(state);
        self.commit(Event::JobHeartbeat {
            job_id: job_id.to_string(),
            lease_expires_at: self.clock.now() + chrono::Duration::seconds(lease_seconds),
        })
    }

    pub fn complete_job(
        &self,
        job_id: &str,
        outcome: RunJobStatus,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        self.commit(Event::JobCompleted { job_id: job_id.to_string(), status: outcome, last_error })
    }

    pub fn release_job(&self, job_id: &str, retryable: bool) -> Result<(), StoreError> {
        let status = if retryable { RunJobStatus::Queued } else { RunJobStatus::Failed };
        self.commit(Event::JobReleased { job_id: job_id.to_string(), status })
    }

    // -- Workers -----------------------------------------------------------

    pub fn upsert_worker_node(&self, node: WorkerNode) -> Result<(), StoreError> {
        self.commit(Event::WorkerUpserted { node: Box::new(node) })
    }

    pub fn worker_heartbeat(&self, node_id: &str) -> Result<(), StoreError> {
        self.commit(Event::WorkerHeartbeat { node_id: node_id.to_string(), at: self.clock.now() })
    }

    pub fn get_worker(&self, node_id: &str) -> Option<WorkerNode> {
        self.state.lock().workers.get(node_id).cloned()
    }

    // -- Rate limiting (§5) --------------------------------------------------

    /// Atomic fixed-window counter: `windowStart = now / windowSec *
    /// windowSec`. Returns whether the increment stayed within `limit`.
    pub fn consume_rate_limit(&self, key: &str, limit: u64, window_sec: i64) -> Result<RateLimitOutcome, StoreError> {
        let now = self.clock.now();
        let window_start = (now.timestamp() / window_sec) * window_sec;
        let bucket = crate::state::bucket_key(key, window_start);
        let count = {
            let state = self.state.lock();
            state.rate_limit_buckets.get(&bucket).copied().unwrap_or(0) + 1
        };
        self.commit(Event::RateLimitConsumed { key: key.to_string(), window_start, count })?;
        Ok(RateLimitOutcome { allowed: count <= limit, count, limit })
    }

    // -- Governance audit trail ----------------------------------------------

    pub fn record_governance_decision(
        &self,
        run_id: &str,
        decision_hash: impl Into<String>,
        reason_codes: Vec<ReasonCode>,
    ) -> Result<(), StoreError> {
        self.commit(Event::GovernanceDecided {
            run_id: run_id.to_string(),
            decision_hash: decision_hash.into(),
            reason_codes,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

pub type SystemContentStore = ContentStore<agentkernel_core::SystemClock>;
