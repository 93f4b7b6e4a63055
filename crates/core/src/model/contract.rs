// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution contract data types (§3, §4.3).

use serde::{Deserialize, Serialize};

/// Compile-time policy version constants. Bumping one of these means the
/// engine has a new understanding of that policy dimension; persisted
/// contracts carrying a higher version than the engine supports are
/// `UNSUPPORTED_CONTRACT`, never silently downgraded.
pub const EXECUTION_CONTRACT_SCHEMA_VERSION: u32 = 1;
pub const DETERMINISM_POLICY_VERSION: u32 = 1;
pub const PLANNER_POLICY_VERSION: u32 = 1;
pub const CORRECTION_RECIPE_VERSION: u32 = 1;
pub const VALIDATION_POLICY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Off,
    Warn,
    Enforce,
}

crate::simple_display! {
    ValidationMode {
        Off => "off",
        Warn => "warn",
        Enforce => "enforce",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionProfile {
    Full,
    Ci,
    Smoke,
}

crate::simple_display! {
    ExecutionProfile {
        Full => "full",
        Ci => "ci",
        Smoke => "smoke",
    }
}

/// The hash material for an execution contract (§4.3). Hashed via
/// [`crate::canonical::canonical_hash`] over this struct directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContractMaterial {
    pub execution_contract_schema_version: u32,
    pub determinism_policy_version: u32,
    pub planner_policy_version: u32,
    pub correction_recipe_version: u32,
    pub validation_policy_version: u32,
    pub randomness_seed: String,
}

impl ExecutionContractMaterial {
    pub fn current(randomness_seed: impl Into<String>) -> Self {
        Self {
            execution_contract_schema_version: EXECUTION_CONTRACT_SCHEMA_VERSION,
            determinism_policy_version: DETERMINISM_POLICY_VERSION,
            planner_policy_version: PLANNER_POLICY_VERSION,
            correction_recipe_version: CORRECTION_RECIPE_VERSION,
            validation_policy_version: VALIDATION_POLICY_VERSION,
            randomness_seed: randomness_seed.into(),
        }
    }

    /// Whether any policy version in this material exceeds what the
    /// engine currently understands (§4.3 "Unknown material").
    pub fn exceeds_supported(&self) -> bool {
        self.execution_contract_schema_version > EXECUTION_CONTRACT_SCHEMA_VERSION
            || self.determinism_policy_version > DETERMINISM_POLICY_VERSION
            || self.planner_policy_version > PLANNER_POLICY_VERSION
            || self.correction_recipe_version > CORRECTION_RECIPE_VERSION
            || self.validation_policy_version > VALIDATION_POLICY_VERSION
    }
}

/// The effective, per-run configuration produced by a profile plus
/// per-field overrides (§4.3 table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub light_validation_mode: ValidationMode,
    pub heavy_validation_mode: ValidationMode,
    pub max_runtime_correction_attempts: u32,
    pub max_heavy_correction_attempts: u32,
    pub correction_policy_mode: ValidationMode,
    pub correction_convergence_mode: ValidationMode,
    pub planner_timeout_ms: u64,
    pub max_files_per_step: u32,
    pub max_total_diff_bytes: u64,
    pub max_file_bytes: u64,
    pub allow_env_mutation: bool,
}

impl ExecutionConfig {
    pub fn for_profile(profile: ExecutionProfile) -> Self {
        match profile {
            ExecutionProfile::Full => Self {
                light_validation_mode: ValidationMode::Enforce,
                heavy_validation_mode: ValidationMode::Enforce,
                max_runtime_correction_attempts: 5,
                max_heavy_correction_attempts: 3,
                correction_policy_mode: ValidationMode::Enforce,
                correction_convergence_mode: ValidationMode::Enforce,
                planner_timeout_ms: 120_000,
                max_files_per_step: 15,
                max_total_diff_bytes: 400_000,
                max_file_bytes: 1_500_000,
                allow_env_mutation: false,
            },
            ExecutionProfile::Ci => Self {
                light_validation_mode: ValidationMode::Off,
                heavy_validation_mode: ValidationMode::Off,
                max_runtime_correction_attempts: 0,
                max_heavy_correction_attempts: 0,
                correction_policy_mode: ValidationMode::Warn,
                correction_convergence_mode: ValidationMode::Warn,
                planner_timeout_ms: 5_000,
                max_files_per_step: 15,
                max_total_diff_bytes: 400_000,
                max_file_bytes: 1_500_000,
                allow_env_mutation: false,
            },
            ExecutionProfile::Smoke => Self {
                light_validation_mode: ValidationMode::Off,
                heavy_validation_mode: ValidationMode::Off,
                max_runtime_correction_attempts: 0,
                max_heavy_correction_attempts: 0,
                correction_policy_mode: ValidationMode::Warn,
                correction_convergence_mode: ValidationMode::Warn,
                planner_timeout_ms: 5_000,
                max_files_per_step: 15,
                max_total_diff_bytes: 400_000,
                max_file_bytes: 1_500_000,
                allow_env_mutation: false,
            },
        }
    }
}

/// One field of drift between a persisted and a requested [`ExecutionConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDriftField {
    pub field: String,
    pub persisted: serde_json::Value,
    pub requested: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ci_profile_disables_correction_budget() {
        let config = ExecutionConfig::for_profile(ExecutionProfile::Ci);
        assert_eq!(config.max_runtime_correction_attempts, 0);
        assert_eq!(config.max_heavy_correction_attempts, 0);
    }

    #[test]
    fn material_flags_versions_beyond_engine_support() {
        let mut material = ExecutionContractMaterial::current("seed");
        assert!(!material.exceeds_supported());
        material.planner_policy_version = PLANNER_POLICY_VERSION + 1;
        assert!(material.exceeds_supported());
    }
}
