// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-by-field diff between a persisted and a requested [`ExecutionConfig`]
//! (§4.3 "Resume/fork drift").

use agentkernel_core::model::contract::{ConfigDriftField, ExecutionConfig};
use serde_json::json;

macro_rules! diff_field {
    ($out:expr, $persisted:expr, $requested:expr, $field:ident) => {
        if $persisted.$field != $requested.$field {
            $out.push(ConfigDriftField {
                field: stringify!($field).to_string(),
                persisted: json!($persisted.$field),
                requested: json!($requested.$field),
            });
        }
    };
}

/// Every field where `persisted` and `requested` disagree, in table order.
pub fn diff(persisted: &ExecutionConfig, requested: &ExecutionConfig) -> Vec<ConfigDriftField> {
    let mut out = Vec::new();
    diff_field!(out, persisted, requested, light_validation_mode);
    diff_field!(out, persisted, requested, heavy_validation_mode);
    diff_field!(out, persisted, requested, max_runtime_correction_attempts);
    diff_field!(out, persisted, requested, max_heavy_correction_attempts);
    diff_field!(out, persisted, requested, correction_policy_mode);
    diff_field!(out, persisted, requested, correction_convergence_mode);
    diff_field!(out, persisted, requested, planner_timeout_ms);
    diff_field!(out, persisted, requested, max_files_per_step);
    diff_field!(out, persisted, requested, max_total_diff_bytes);
    diff_field!(out, persisted, requested, max_file_bytes);
    diff_field!(out, persisted, requested, allow_env_mutation);
    out
}
