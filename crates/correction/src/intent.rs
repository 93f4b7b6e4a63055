// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a classified [`CorrectionProfile`] to the [`CorrectionIntent`] whose
//! constraint row (§4.7 table) bounds the corrective step. Priority order
//! follows severity: a collapsing architecture always wins, since nothing
//! smaller can fix a project whose layer structure no longer holds.

use agentkernel_core::model::{ClusterKind, CorrectionIntent, CorrectionProfile};

pub fn select_intent(profile: &CorrectionProfile) -> CorrectionIntent {
    if profile.architecture_collapse {
        return CorrectionIntent::ArchReconstruct;
    }
    let kinds: Vec<ClusterKind> = profile.clusters.iter().map(|c| c.kind).collect();
    if kinds.contains(&ClusterKind::RuntimeMiddlewareApi) {
        return CorrectionIntent::RuntimeBoot;
    }
    if kinds.contains(&ClusterKind::ImportResolutionError) {
        return CorrectionIntent::ImportResolve;
    }
    if kinds.iter().any(|k| matches!(k, ClusterKind::ArchitectureContract | ClusterKind::DependencyCycle | ClusterKind::LayerBoundaryViolation)) {
        return CorrectionIntent::ArchReconstruct;
    }
    CorrectionIntent::TypecheckFix
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::model::Cluster;

    fn profile(clusters: Vec<Cluster>, collapse: bool) -> CorrectionProfile {
        CorrectionProfile {
            should_auto_correct: true,
            clusters,
            architecture_collapse: collapse,
            planner_mode_override: None,
            debt_targets: vec![],
            reason: None,
            blocking_count: 1,
            architecture_modules: vec![],
        }
    }

    fn cluster(kind: ClusterKind) -> Cluster {
        Cluster { kind, modules: vec![], files: vec![], details: serde_json::Value::Null }
    }

    #[test]
    fn collapse_always_wins() {
        let p = profile(vec![cluster(ClusterKind::ImportResolutionError)], true);
        assert_eq!(select_intent(&p), CorrectionIntent::ArchReconstruct);
    }

    #[test]
    fn import_resolution_maps_to_import_resolve() {
        let p = profile(vec![cluster(ClusterKind::ImportResolutionError)], false);
        assert_eq!(select_intent(&p), CorrectionIntent::ImportResolve);
    }

    #[test]
    fn no_recognized_cluster_falls_back_to_typecheck_fix() {
        let p = profile(vec![cluster(ClusterKind::TestFailure)], false);
        assert_eq!(select_intent(&p), CorrectionIntent::TypecheckFix);
    }
}
