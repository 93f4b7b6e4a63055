// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project event handlers.

use super::MaterializedState;
use crate::event::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ProjectCreated { project } => {
            state.projects.entry(project.id.to_string()).or_insert_with(|| (**project).clone());
        }
        Event::ProjectHeadUpdated { project_id, commit_hash } => {
            if let Some(project) = state.projects.get_mut(project_id) {
                project.workspace_head = Some(commit_hash.clone());
            }
        }
        Event::ProjectHistoryPushed { project_id, entry } => {
            if let Some(project) = state.projects.get_mut(project_id) {
                project.push_history(entry.clone());
            }
        }
        _ => {}
    }
}
