// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RunJob event handlers (§4.4).

use super::MaterializedState;
use crate::event::Event;
use agentkernel_core::model::RunJobStatus;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobEnqueued { job } => {
            state.jobs.entry(job.id.to_string()).or_insert_with(|| (**job).clone());
        }
        Event::JobClaimed { job_id, node_id, lease_expires_at, attempt } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = RunJobStatus::Leased;
                job.assigned_node = Some(node_id.as_str().into());
                job.lease_expires_at = Some(*lease_expires_at);
                // Idempotent re-application of the same claim must not
                // bump attempt twice; only advance if we haven't already
                // recorded this attempt number.
                if job.attempt < *attempt {
                    job.attempt = *attempt;
                }
            }
        }
        Event::JobHeartbeat { job_id, lease_expires_at } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                if job.status == RunJobStatus::Leased {
                    job.lease_expires_at = Some(*lease_expires_at);
                }
            }
        }
        Event::JobCompleted { job_id, status, last_error } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = *status;
                job.last_error = last_error.clone();
                job.lease_expires_at = None;
            }
        }
        Event::JobReleased { job_id, status } => {
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = *status;
                if *status == RunJobStatus::Queued {
                    job.assigned_node = None;
                    job.lease_expires_at = None;
                }
            }
        }
        _ => {}
    }
}
