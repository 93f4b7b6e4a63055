// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WorkerNode event handlers.

use super::MaterializedState;
use crate::event::Event;
use agentkernel_core::model::WorkerStatus;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::WorkerUpserted { node } => {
            state.workers.insert(node.node_id.to_string(), (**node).clone());
        }
        Event::WorkerHeartbeat { node_id, at } => {
            if let Some(worker) = state.workers.get_mut(node_id) {
                worker.last_heartbeat_at = *at;
                worker.status = WorkerStatus::Online;
            }
        }
        _ => {}
    }
}
