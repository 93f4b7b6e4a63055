// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker node registration (§3, §4.4 "Worker contract").

use super::ids::WorkerNodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Online,
    Offline,
}

crate::simple_display! {
    WorkerStatus {
        Online => "online",
        Offline => "offline",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerNode {
    pub node_id: WorkerNodeId,
    pub role: String,
    pub capabilities: Vec<String>,
    pub status: WorkerStatus,
    pub last_heartbeat_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
}

impl WorkerNode {
    pub fn new(
        node_id: WorkerNodeId,
        role: impl Into<String>,
        capabilities: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            node_id,
            role: role.into(),
            capabilities,
            status: WorkerStatus::Online,
            last_heartbeat_at: now,
            started_at: now,
        }
    }

    pub fn satisfies(&self, target_role: &str, required_capabilities: &[String]) -> bool {
        self.role == target_role
            && required_capabilities
                .iter()
                .all(|cap| self.capabilities.iter().any(|have| have == cap))
    }

    /// A worker is considered dead once its heartbeat is older than
    /// `timeout` relative to `now`, regardless of its reported status
    /// (§5 orphan-run recovery: 3x heartbeat interval).
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now - self.last_heartbeat_at > timeout
    }
}
