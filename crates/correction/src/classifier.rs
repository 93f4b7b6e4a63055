// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies a [`ValidationReport`] (plus optional runtime logs) into a
//! [`CorrectionProfile`] per the cluster catalog (§4.7).

use crate::runtime_logs::{find_import_resolution_errors, find_middleware_api_symptoms};
use agentkernel_core::model::{Cluster, ClusterKind, CorrectionProfile, FailureReason, ValidationCheckResult, ValidationReport};
use std::collections::BTreeSet;

/// Architecture-collapse scoring weights (§4.7): four booleans, each worth
/// one point, `>= 3` trips collapse mode.
struct ArchitectureCounts {
    missing_layers: u32,
    unknown_layer_files: u32,
    cycles: u32,
    arch_blocking: u32,
}

impl ArchitectureCounts {
    fn score(&self) -> u32 {
        u32::from(self.missing_layers >= 2)
            + u32::from(self.unknown_layer_files >= 2)
            + u32::from(self.cycles > 0)
            + u32::from(self.arch_blocking >= 8)
    }
}

pub fn classify(report: &ValidationReport, runtime_logs: Option<&str>) -> CorrectionProfile {
    let mut clusters = Vec::new();
    let mut architecture_modules = BTreeSet::new();
    let mut debt_targets = BTreeSet::new();
    let mut reason = None;

    if let Some(check) = report.checks.iter().find(|c| c.id == "architecture") {
        classify_architecture(check, &mut clusters, &mut architecture_modules, &mut debt_targets);
        if !clusters.is_empty() {
            reason = Some(FailureReason::Architecture);
        }
    }

    for check in &report.checks {
        match check.id.as_str() {
            "typecheck" if is_fail(check) => {
                clusters.push(cluster_from_check(ClusterKind::TypecheckFailure, check));
                reason.get_or_insert(FailureReason::Typecheck);
            }
            "build" if is_fail(check) => {
                clusters.push(cluster_from_check(ClusterKind::BuildFailure, check));
                reason.get_or_insert(FailureReason::Build);
            }
            "tests" if is_fail(check) => {
                clusters.push(cluster_from_check(ClusterKind::TestFailure, check));
            }
            _ => {}
        }
    }

    if let Some(logs) = runtime_logs {
        if find_middleware_api_symptoms(logs) {
            clusters.push(Cluster {
                kind: ClusterKind::RuntimeMiddlewareApi,
                modules: vec![],
                files: vec![],
                details: serde_json::json!({ "matched": "middleware_api_pattern" }),
            });
        }
        let (files, imports) = find_import_resolution_errors(logs);
        if !imports.is_empty() {
            clusters.push(Cluster {
                kind: ClusterKind::ImportResolutionError,
                modules: vec![],
                files: files.clone(),
                details: serde_json::json!({ "imports": imports }),
            });
            debt_targets.extend(files);
        }
    }

    let architecture_modules: Vec<String> = architecture_modules.into_iter().collect();
    let architecture_collapse = architecture_modules_collapsed(report);

    let profile = CorrectionProfile {
        should_auto_correct: !clusters.is_empty(),
        clusters,
        architecture_collapse,
        planner_mode_override: if architecture_collapse { Some("architecture_reconstruction".to_string()) } else { None },
        debt_targets: debt_targets.into_iter().collect(),
        reason,
        blocking_count: report.blocking_count,
        architecture_modules,
    };

    tracing::info!(
        clusters = profile.clusters.len(),
        collapse = architecture_collapse,
        "correction classifier produced profile"
    );
    profile
}

fn is_fail(check: &ValidationCheckResult) -> bool {
    check.is_blocking_failure()
}

fn cluster_from_check(kind: ClusterKind, check: &ValidationCheckResult) -> Cluster {
    Cluster { kind, modules: vec![], files: vec![], details: serde_json::json!({ "message": check.message }) }
}

fn classify_architecture(
    check: &ValidationCheckResult,
    clusters: &mut Vec<Cluster>,
    architecture_modules: &mut BTreeSet<String>,
    debt_targets: &mut BTreeSet<String>,
) {
    let Some(violations) = check.details.as_ref().and_then(|d| d.get("violations")).and_then(|v| v.as_array()) else {
        return;
    };
    if violations.is_empty() {
        return;
    }

    let mut files = Vec::new();
    let mut layer_pairs = Vec::new();
    let mut counts = ArchitectureCounts { missing_layers: 0, unknown_layer_files: 0, cycles: 0, arch_blocking: 0 };

    for violation in violations {
        let rule_id = violation.get("rule_id").and_then(|v| v.as_str()).unwrap_or_default();
        let path = violation.get("path").and_then(|v| v.as_str());
        if let Some(path) = path {
            files.push(path.to_string());
            if let Some(module) = path.split('/').nth(1) {
                architecture_modules.insert(module.to_string());
            }
        }

        match rule_id {
            "STRUCTURE.MISSING_LAYER" => counts.missing_layers += 1,
            "IMPORT.MISSING_TARGET" => counts.unknown_layer_files += 1,
            "GRAPH.CYCLE" => {
                counts.cycles += 1;
                clusters.push(Cluster {
                    kind: ClusterKind::DependencyCycle,
                    modules: vec![],
                    files: vec![],
                    details: violation.clone(),
                });
            }
            "ARCH.LAYER_VIOLATION" => {
                counts.arch_blocking += 1;
                layer_pairs.push(violation.clone());
            }
            id if id.starts_with("TEST.CONTRACT_") => {
                clusters.push(Cluster {
                    kind: ClusterKind::TestContractGap,
                    modules: vec![],
                    files: vec![],
                    details: violation.clone(),
                });
            }
            _ => {}
        }
    }

    if !layer_pairs.is_empty() {
        for pair in &layer_pairs {
            if let Some(path) = pair.get("path").and_then(|v| v.as_str()) {
                debt_targets.insert(path.to_string());
            }
        }
        clusters.push(Cluster {
            kind: ClusterKind::LayerBoundaryViolation,
            modules: architecture_modules.iter().cloned().collect(),
            files: files.clone(),
            details: serde_json::json!({ "violations": layer_pairs }),
        });
    }

    clusters.push(Cluster {
        kind: ClusterKind::ArchitectureContract,
        modules: architecture_modules.iter().cloned().collect(),
        files,
        details: serde_json::json!({
            "missing_layers": counts.missing_layers,
            "unknown_layer_files": counts.unknown_layer_files,
            "cycles": counts.cycles,
            "arch_blocking": counts.arch_blocking,
            "score": counts.score(),
        }),
    });
}

fn architecture_modules_collapsed(report: &ValidationReport) -> bool {
    let Some(check) = report.checks.iter().find(|c| c.id == "architecture") else { return false };
    let Some(violations) = check.details.as_ref().and_then(|d| d.get("violations")).and_then(|v| v.as_array()) else {
        return false;
    };
    let mut counts = ArchitectureCounts { missing_layers: 0, unknown_layer_files: 0, cycles: 0, arch_blocking: 0 };
    for violation in violations {
        match violation.get("rule_id").and_then(|v| v.as_str()).unwrap_or_default() {
            "STRUCTURE.MISSING_LAYER" => counts.missing_layers += 1,
            "IMPORT.MISSING_TARGET" => counts.unknown_layer_files += 1,
            "GRAPH.CYCLE" => counts.cycles += 1,
            "ARCH.LAYER_VIOLATION" => counts.arch_blocking += 1,
            _ => {}
        }
    }
    counts.score() >= 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::model::CheckStatus;

    fn architecture_check(violations: serde_json::Value) -> ValidationCheckResult {
        ValidationCheckResult {
            id: "architecture".to_string(),
            status: CheckStatus::Fail,
            message: "violations found".to_string(),
            details: Some(serde_json::json!({ "violations": violations })),
        }
    }

    #[test]
    fn layer_violation_emits_both_clusters() {
        let check = architecture_check(serde_json::json!([
            { "rule_id": "ARCH.LAYER_VIOLATION", "message": "bad dep", "path": "src/domain/user.ts" }
        ]));
        let report = ValidationReport::from_checks(vec![check]);
        let profile = classify(&report, None);
        let kinds: Vec<ClusterKind> = profile.clusters.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&ClusterKind::ArchitectureContract));
        assert!(kinds.contains(&ClusterKind::LayerBoundaryViolation));
        assert!(!profile.architecture_collapse);
    }

    #[test]
    fn architecture_collapse_trips_at_score_three() {
        let mut violations = Vec::new();
        for _ in 0..2 {
            violations.push(serde_json::json!({ "rule_id": "STRUCTURE.MISSING_LAYER", "path": "src/domain" }));
        }
        for _ in 0..2 {
            violations.push(serde_json::json!({ "rule_id": "IMPORT.MISSING_TARGET", "path": "src/domain/a.ts" }));
        }
        violations.push(serde_json::json!({ "rule_id": "GRAPH.CYCLE" }));
        let check = architecture_check(serde_json::Value::Array(violations));
        let report = ValidationReport::from_checks(vec![check]);
        let profile = classify(&report, None);
        assert!(profile.architecture_collapse);
        assert_eq!(profile.planner_mode_override.as_deref(), Some("architecture_reconstruction"));
    }

    #[test]
    fn runtime_logs_surface_import_resolution_cluster() {
        let report = ValidationReport::from_checks(vec![]);
        let logs = "Error: Cannot find module './missing-util'\n    at Object.<anonymous> (/app/src/index.js:3:18)";
        let profile = classify(&report, Some(logs));
        let kinds: Vec<ClusterKind> = profile.clusters.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&ClusterKind::ImportResolutionError));
    }
}
