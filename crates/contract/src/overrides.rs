// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-field overrides applied on top of a profile's defaults (§4.3 table).
//!
//! An override outside its field's documented range is never applied: the
//! profile default is kept and the field name is recorded as a fallback, to
//! be surfaced in governance rather than silently accepted or rejected.

use agentkernel_core::model::contract::{ExecutionConfig, ValidationMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub light_validation_mode: Option<ValidationMode>,
    pub heavy_validation_mode: Option<ValidationMode>,
    pub max_runtime_correction_attempts: Option<u32>,
    pub max_heavy_correction_attempts: Option<u32>,
    pub correction_policy_mode: Option<ValidationMode>,
    pub correction_convergence_mode: Option<ValidationMode>,
    pub planner_timeout_ms: Option<u64>,
    pub max_files_per_step: Option<u32>,
    pub max_total_diff_bytes: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub allow_env_mutation: Option<bool>,
}

/// Applies `overrides` onto `base` (a profile's defaults), validating each
/// field's range from the §4.3 table. Returns the resulting config plus the
/// sorted, unique names of any override rejected and replaced by its
/// profile default.
pub fn apply_overrides(base: ExecutionConfig, overrides: &ConfigOverrides) -> (ExecutionConfig, Vec<String>) {
    let mut config = base;
    let mut fallback = Vec::new();

    if let Some(mode) = overrides.light_validation_mode {
        config.light_validation_mode = mode;
    }
    if let Some(mode) = overrides.heavy_validation_mode {
        config.heavy_validation_mode = mode;
    }
    if let Some(value) = overrides.max_runtime_correction_attempts {
        if (0..=5).contains(&value) {
            config.max_runtime_correction_attempts = value;
        } else {
            fallback.push("max_runtime_correction_attempts".to_string());
        }
    }
    if let Some(value) = overrides.max_heavy_correction_attempts {
        if (0..=3).contains(&value) {
            config.max_heavy_correction_attempts = value;
        } else {
            fallback.push("max_heavy_correction_attempts".to_string());
        }
    }
    if let Some(mode) = overrides.correction_policy_mode {
        config.correction_policy_mode = mode;
    }
    if let Some(mode) = overrides.correction_convergence_mode {
        config.correction_convergence_mode = mode;
    }
    if let Some(value) = overrides.planner_timeout_ms {
        if value >= 1000 {
            config.planner_timeout_ms = value;
        } else {
            fallback.push("planner_timeout_ms".to_string());
        }
    }
    if let Some(value) = overrides.max_files_per_step {
        if value >= 1 {
            config.max_files_per_step = value;
        } else {
            fallback.push("max_files_per_step".to_string());
        }
    }
    if let Some(value) = overrides.max_total_diff_bytes {
        if value >= 1 {
            config.max_total_diff_bytes = value;
        } else {
            fallback.push("max_total_diff_bytes".to_string());
        }
    }
    if let Some(value) = overrides.max_file_bytes {
        if value >= 1 {
            config.max_file_bytes = value;
        } else {
            fallback.push("max_file_bytes".to_string());
        }
    }
    if let Some(value) = overrides.allow_env_mutation {
        config.allow_env_mutation = value;
    }

    fallback.sort();
    (config, fallback)
}
