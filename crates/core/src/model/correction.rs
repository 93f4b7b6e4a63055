// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correction classifier and constraint types (§3, §4.7).

use serde::{Deserialize, Serialize};

/// The closed cluster catalog (§3 "Correction Profile (derived)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    ArchitectureContract,
    DependencyCycle,
    RuntimeMiddlewareApi,
    LayerBoundaryViolation,
    ImportResolutionError,
    TestContractGap,
    TypecheckFailure,
    BuildFailure,
    TestFailure,
}

crate::simple_display! {
    ClusterKind {
        ArchitectureContract => "architecture_contract",
        DependencyCycle => "dependency_cycle",
        RuntimeMiddlewareApi => "runtime_middleware_api",
        LayerBoundaryViolation => "layer_boundary_violation",
        ImportResolutionError => "import_resolution_error",
        TestContractGap => "test_contract_gap",
        TypecheckFailure => "typecheck_failure",
        BuildFailure => "build_failure",
        TestFailure => "test_failure",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Architecture,
    Typecheck,
    Build,
}

crate::simple_display! {
    FailureReason {
        Architecture => "architecture",
        Typecheck => "typecheck",
        Build => "build",
    }
}

/// One cluster emitted by the classifier, with the evidence it was derived
/// from (§4.7 rules).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub kind: ClusterKind,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// The classifier's output over one [`super::validation::ValidationReport`]
/// (§3 "Correction Profile (derived)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionProfile {
    pub should_auto_correct: bool,
    pub clusters: Vec<Cluster>,
    pub architecture_collapse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_mode_override: Option<String>,
    #[serde(default)]
    pub debt_targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    pub blocking_count: u32,
    #[serde(default)]
    pub architecture_modules: Vec<String>,
}

impl CorrectionProfile {
    /// Byte-equality over the fields that the convergence rule (§4.7 rule
    /// 4 / §8 P8) compares: same clusters, same failed checks (rolled up
    /// as `blocking_count`), same modules.
    pub fn converges_with(&self, other: &CorrectionProfile) -> bool {
        cluster_kinds(&self.clusters) == cluster_kinds(&other.clusters)
            && self.architecture_modules == other.architecture_modules
            && self.blocking_count == other.blocking_count
    }
}

fn cluster_kinds(clusters: &[Cluster]) -> Vec<ClusterKind> {
    let mut kinds: Vec<ClusterKind> = clusters.iter().map(|c| c.kind).collect();
    kinds.sort_by_key(|k| k.to_string());
    kinds
}

/// The intent that determines which constraint row a corrective step is
/// bounded by (§4.7 constraint table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionIntent {
    RuntimeBoot,
    ImportResolve,
    ArchReconstruct,
    TypecheckFix,
}

crate::simple_display! {
    CorrectionIntent {
        RuntimeBoot => "runtime_boot",
        ImportResolve => "import_resolve",
        ArchReconstruct => "arch_reconstruct",
        TypecheckFix => "typecheck_fix",
    }
}

/// Bounds placed on a corrective step, synthesized from a [`CorrectionProfile`]
/// (§4.7 constraint table). `max_files`/`max_total_diff_bytes` of `None` means
/// "unlimited within the run's own step budgets" (the `arch_reconstruct` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConstraint {
    pub intent: CorrectionIntent,
    pub max_files: Option<u32>,
    pub max_total_diff_bytes: Option<u64>,
    pub allowed_path_prefixes: Vec<String>,
    pub guidance: String,
}

impl CorrectionConstraint {
    pub fn for_intent(intent: CorrectionIntent, allowed_path_prefixes: Vec<String>, run_max_diff_bytes: u64) -> Self {
        match intent {
            CorrectionIntent::RuntimeBoot => Self {
                intent,
                max_files: Some(6),
                max_total_diff_bytes: Some(120_000),
                allowed_path_prefixes,
                guidance: "Fix startup only.".into(),
            },
            CorrectionIntent::ImportResolve => Self {
                intent,
                max_files: Some(8),
                max_total_diff_bytes: Some(150_000),
                allowed_path_prefixes,
                guidance: "Add missing exports or fix paths.".into(),
            },
            CorrectionIntent::ArchReconstruct => Self {
                intent,
                max_files: None,
                max_total_diff_bytes: Some(run_max_diff_bytes),
                allowed_path_prefixes,
                guidance: "Recreate missing layers.".into(),
            },
            CorrectionIntent::TypecheckFix => Self {
                intent,
                max_files: Some(8),
                max_total_diff_bytes: Some(200_000),
                allowed_path_prefixes,
                guidance: "Minimal type fixes.".into(),
            },
        }
    }

    pub fn path_allowed(&self, path: &str) -> bool {
        self.allowed_path_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}
