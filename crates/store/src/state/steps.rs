// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentStep event handlers. Steps are append-only (§3): once written, a
//! step record is only ever transitioned in place by
//! [`Event::StepStatusChanged`], never removed or replaced.

use super::MaterializedState;
use crate::event::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::StepAppended { step } => {
            state.steps.entry(step.id.to_string()).or_insert_with(|| (**step).clone());
        }
        Event::StepStatusChanged {
            step_id,
            status,
            commit_hash,
            error_message,
            output_payload,
            finished_at,
        } => {
            if let Some(step) = state.steps.get_mut(step_id) {
                step.status = *status;
                if commit_hash.is_some() {
                    step.commit_hash = commit_hash.clone();
                }
                if error_message.is_some() {
                    step.error_message = error_message.clone();
                }
                if output_payload.is_some() {
                    step.output_payload = output_payload.clone();
                }
                if finished_at.is_some() {
                    step.finished_at = *finished_at;
                }
            }
        }
        _ => {}
    }
}
