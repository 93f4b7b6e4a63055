// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution contract freezing and resume/fork compatibility checking
//! (§4.3).

use agentkernel_core::canonical::canonical_hash;
use agentkernel_core::error::CallerError;
use agentkernel_core::model::contract::{ExecutionConfig, ExecutionContractMaterial, ExecutionProfile};

use crate::diff::diff;
use crate::error::ContractError;
use crate::overrides::{apply_overrides, ConfigOverrides};

/// The frozen, persisted view of a run's execution contract: the material
/// that gets hashed, the effective config derived from it, and which (if
/// any) requested overrides fell back to their profile default.
#[derive(Debug, Clone)]
pub struct FrozenContract {
    pub material: ExecutionContractMaterial,
    pub config: ExecutionConfig,
    pub fallback_fields: Vec<String>,
    pub hash: String,
}

/// Computes the effective configuration for `profile` with `overrides`
/// applied, and freezes it alongside the current policy-version material
/// under `randomness_seed` (§4.3 "Hash material").
pub fn freeze(
    profile: ExecutionProfile,
    overrides: &ConfigOverrides,
    randomness_seed: impl Into<String>,
) -> Result<FrozenContract, serde_json::Error> {
    let base = ExecutionConfig::for_profile(profile);
    let (config, fallback_fields) = apply_overrides(base, overrides);
    let material = ExecutionContractMaterial::current(randomness_seed);
    let hash = canonical_hash(&material)?;
    Ok(FrozenContract { material, config, fallback_fields, hash })
}

/// Validates a resume/fork request's effective configuration against the
/// one persisted on the run (§4.3 "Resume/fork drift"). A mismatch is
/// tolerated only when the caller explicitly asked to fork or to override
/// the persisted contract in place.
pub fn check_resume_compatibility(
    persisted: &ExecutionConfig,
    requested: &ExecutionConfig,
    fork: bool,
    override_execution_config: bool,
) -> Result<(), ContractError> {
    let drift = diff(persisted, requested);
    if drift.is_empty() || fork || override_execution_config {
        return Ok(());
    }
    tracing::warn!(fields = drift.len(), "execution config drift on resume without fork/override");
    Err(ContractError::Caller(CallerError::ExecutionConfigMismatch { diff: drift }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::model::contract::ValidationMode;

    #[test]
    fn freeze_applies_overrides_and_computes_a_stable_hash() {
        let overrides = ConfigOverrides { allow_env_mutation: Some(true), ..Default::default() };
        let a = freeze(ExecutionProfile::Full, &overrides, "seed-1").unwrap();
        let b = freeze(ExecutionProfile::Full, &overrides, "seed-1").unwrap();
        assert_eq!(a.hash, b.hash);
        assert!(a.config.allow_env_mutation);
        assert!(a.fallback_fields.is_empty());
    }

    #[test]
    fn different_randomness_seed_changes_the_hash() {
        let overrides = ConfigOverrides::default();
        let a = freeze(ExecutionProfile::Full, &overrides, "seed-1").unwrap();
        let b = freeze(ExecutionProfile::Full, &overrides, "seed-2").unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn identical_effective_config_is_always_compatible() {
        let config = ExecutionConfig::for_profile(ExecutionProfile::Ci);
        assert!(check_resume_compatibility(&config, &config, false, false).is_ok());
    }

    #[test]
    fn drift_without_fork_or_override_is_rejected() {
        let persisted = ExecutionConfig::for_profile(ExecutionProfile::Full);
        let mut requested = persisted.clone();
        requested.light_validation_mode = ValidationMode::Off;
        let err = check_resume_compatibility(&persisted, &requested, false, false).unwrap_err();
        let ContractError::Caller(CallerError::ExecutionConfigMismatch { diff }) = err else {
            panic!("expected ExecutionConfigMismatch, got {err:?}");
        };
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn drift_is_tolerated_when_forking() {
        let persisted = ExecutionConfig::for_profile(ExecutionProfile::Full);
        let mut requested = persisted.clone();
        requested.max_files_per_step = 1;
        assert!(check_resume_compatibility(&persisted, &requested, true, false).is_ok());
    }

    #[test]
    fn drift_is_tolerated_when_overriding_in_place() {
        let persisted = ExecutionConfig::for_profile(ExecutionProfile::Full);
        let mut requested = persisted.clone();
        requested.max_files_per_step = 1;
        assert!(check_resume_compatibility(&persisted, &requested, false, true).is_ok());
    }
}
