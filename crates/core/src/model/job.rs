// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-job queue entry (§3, §4.4 "Run-Job Queue").

use super::ids::{AgentRunId, ProjectId, RunJobId, WorkerNodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunJobKind {
    Start,
    Resume,
}

crate::simple_display! {
    RunJobKind {
        Start => "start",
        Resume => "resume",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunJobStatus {
    Queued,
    Leased,
    Complete,
    Failed,
}

crate::simple_display! {
    RunJobStatus {
        Queued => "queued",
        Leased => "leased",
        Complete => "complete",
        Failed => "failed",
    }
}

impl RunJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunJobStatus::Complete | RunJobStatus::Failed)
    }
}

/// A single entry in the run-job queue. Dispatched to exactly one worker at
/// a time via a lease (§4.4); the lease is what makes redelivery after a
/// crashed worker safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJob {
    pub id: RunJobId,
    pub run_id: AgentRunId,
    pub project_id: ProjectId,
    pub kind: RunJobKind,
    pub target_role: String,
    pub payload: serde_json::Value,
    pub status: RunJobStatus,
    pub attempt: u32,
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_node: Option<WorkerNodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Capabilities a claiming node's own `capabilities` must be a superset
    /// of (§4.4 `claimNextRunJob`). `enqueueRunJob` names no way to set this
    /// yet, so every job enqueued by this crate requires none.
    #[serde(default)]
    pub required_capabilities: Vec<String>,
}

impl RunJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RunJobId,
        run_id: AgentRunId,
        project_id: ProjectId,
        kind: RunJobKind,
        target_role: impl Into<String>,
        payload: serde_json::Value,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            run_id,
            project_id,
            kind,
            target_role: target_role.into(),
            payload,
            status: RunJobStatus::Queued,
            attempt: 0,
            max_attempts,
            assigned_node: None,
            lease_expires_at: None,
            created_at: now,
            updated_at: now,
            last_error: None,
            required_capabilities: Vec::new(),
        }
    }

    /// Whether the current lease (if any) has expired as of `now`. An
    /// expired lease makes the job eligible for re-claim by another worker
    /// (§4.4 crash-recovery invariant).
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        match self.lease_expires_at {
            Some(expiry) => now >= expiry,
            None => true,
        }
    }

    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            RunJobStatus::Queued => true,
            RunJobStatus::Leased => self.lease_expired(now),
            RunJobStatus::Complete | RunJobStatus::Failed => false,
        }
    }

    pub fn exhausted_retries(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{AgentRunId, ProjectId, RunJobId};

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn job() -> RunJob {
        RunJob::new(
            RunJobId::new(),
            AgentRunId::new(),
            ProjectId::new(),
            RunJobKind::Start,
            "worker",
            serde_json::Value::Null,
            3,
            epoch(),
        )
    }

    #[test]
    fn queued_job_is_always_claimable() {
        assert!(job().is_claimable(epoch()));
    }

    #[test]
    fn leased_job_is_claimable_only_after_lease_expiry() {
        let mut job = job();
        job.status = RunJobStatus::Leased;
        job.lease_expires_at = Some(epoch() + chrono::Duration::seconds(30));
        assert!(!job.is_claimable(epoch() + chrono::Duration::seconds(10)));
        assert!(job.is_claimable(epoch() + chrono::Duration::seconds(30)));
    }

    #[test]
    fn terminal_jobs_are_never_claimable() {
        let mut job = job();
        job.status = RunJobStatus::Complete;
        assert!(!job.is_claimable(epoch() + chrono::Duration::days(1)));
    }
}
