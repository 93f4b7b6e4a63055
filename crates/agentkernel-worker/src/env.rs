// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker binary (§6). The
//! `AGENT_FS_*`/`AGENT_*_VALIDATION_MODE` knobs in §6's environment table
//! feed `ConfigOverrides` at `queueRun` time (the HTTP service's job, not
//! this process's); only the worker's own dispatch knobs live here.

use std::path::PathBuf;
use std::time::Duration;

fn var_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

/// Where run-job state (WAL) and project worktrees live.
pub fn state_dir() -> PathBuf {
    std::env::var("AGENT_STATE_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./agent-kernel-state"))
}

pub fn node_id() -> String {
    std::env::var("NODE_ID").unwrap_or_else(|_| format!("node-{}", nanoid::nanoid!(8)))
}

pub fn node_role() -> String {
    std::env::var("NODE_ROLE").unwrap_or_else(|_| "agent-kernel".to_string())
}

/// Comma-separated capability tags this node registers and claims with
/// (§4.4 `upsertWorkerNode`/`claimNextRunJob`). Empty by default, matching
/// `enqueueRunJob`'s lack of a way to require any.
pub fn node_capabilities() -> Vec<String> {
    std::env::var("NODE_CAPABILITIES")
        .ok()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

pub fn worker_heartbeat_interval() -> Duration {
    Duration::from_millis(var_u64("WORKER_HEARTBEAT_MS").unwrap_or(10_000))
}

pub fn worker_poll_interval() -> Duration {
    Duration::from_millis(var_u64("WORKER_POLL_MS").unwrap_or(1_000))
}

pub fn lease_seconds() -> i64 {
    var_u64("WORKER_LEASE_SECONDS").unwrap_or(60) as i64
}
