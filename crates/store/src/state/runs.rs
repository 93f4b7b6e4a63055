// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentRun event handlers.

use super::MaterializedState;
use crate::event::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::RunCreated { run } => {
            state.runs.entry(run.id.to_string()).or_insert_with(|| (**run).clone());
        }
        Event::RunStatusChanged { run_id, status, error_message } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                run.status = *status;
                if error_message.is_some() {
                    run.error_message = error_message.clone();
                }
            }
        }
        Event::RunStepAdvanced {
            run_id,
            current_step_index,
            last_step_id,
            current_commit_hash,
            last_valid_commit_hash,
        } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                run.current_step_index = *current_step_index;
                run.last_step_id = last_step_id.as_deref().map(Into::into);
                run.current_commit_hash = current_commit_hash.clone();
                run.last_valid_commit_hash = last_valid_commit_hash.clone();
            }
        }
        Event::RunPlanSet { run_id, plan } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                run.plan = Some(plan.clone());
            }
        }
        Event::RunValidationRecorded { run_id, validation_status, validation_result, validated_at } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                run.validation_status = Some(*validation_status);
                run.validation_result = Some((**validation_result).clone());
                run.validated_at = Some(*validated_at);
            }
        }
        Event::RunCancelRequested { run_id } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                run.metadata.cancel_requested = true;
            }
        }
        Event::RunTimestamped { run_id, started_at, finished_at } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                if let Some(started_at) = started_at {
                    run.started_at.get_or_insert(*started_at);
                }
                if let Some(finished_at) = finished_at {
                    run.finished_at = Some(*finished_at);
                }
            }
        }
        _ => {}
    }
}
