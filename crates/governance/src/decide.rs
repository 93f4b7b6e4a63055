// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Governance decisioning (§4.8): folds a terminal run, its persisted
//! execution contract, and the context the kernel can't derive from the run
//! alone (branch lock state, workspace HEAD, an optional V1-ready report)
//! into a single hash-identified verdict.

use agentkernel_core::canonical::canonical_hash;
use agentkernel_core::model::contract::ExecutionContractMaterial;
use agentkernel_core::model::governance::{
    ArtifactKind, ArtifactRef, ContractSummary, Decision, GovernanceDecision, GovernanceDecisionHashInput, Reason,
    ReasonCode, DECISION_SCHEMA_VERSION,
};
use agentkernel_core::model::run::{AgentRun, RunStatus, ValidationStatus};
use agentkernel_core::model::V1ReadyReport;

use crate::error::GovernanceError;

/// Everything `decide` needs beyond the run itself: nothing here is
/// derivable from `AgentRun` alone, so callers must assemble it from the
/// project and the optional strict V1-ready pass (§4.8, §6 `decide`).
pub struct GovernanceContext<'a> {
    pub run: &'a AgentRun,
    /// The project's workspace HEAD, when known. `None` skips the commit
    /// drift check rather than forcing a reason code off missing data.
    pub project_workspace_head: Option<&'a str>,
    /// Whether another run currently holds the project's branch lock.
    pub branch_lock_active: bool,
    pub strict_v1_ready: bool,
    pub v1_ready: Option<&'a V1ReadyReport>,
    /// Where the validation pipeline ran against (§4.6); surfaced as the
    /// `validation_target` artifact on PASS since `AgentRun` doesn't persist
    /// it itself.
    pub validation_target_path: &'a str,
}

/// Evaluate the closed reason-code set in spec order (§4.8) and fold into a
/// hash-identified [`GovernanceDecision`].
pub fn decide(ctx: &GovernanceContext<'_>) -> Result<GovernanceDecision, GovernanceError> {
    let run = ctx.run;

    let material: ExecutionContractMaterial = serde_json::from_value(run.metadata.execution_contract_material.clone())
        .map_err(GovernanceError::MalformedContractMaterial)?;

    let mut reasons = Vec::new();
    let mut push = |code: ReasonCode, details: Option<serde_json::Value>| reasons.push(Reason { code, details });

    if !run.is_terminal() {
        push(ReasonCode::RunNotTerminal, Some(serde_json::json!({ "status": run.status.to_string() })));
    }
    if run.status == RunStatus::Failed {
        push(ReasonCode::RunFailed, run.error_message.clone().map(|m| serde_json::json!({ "message": m })));
    }
    if run.status == RunStatus::Cancelled {
        push(ReasonCode::RunCancelled, None);
    }
    if run.validation_status.is_none() {
        push(ReasonCode::RunNotValidated, None);
    }
    if run.validation_status == Some(ValidationStatus::Failed) {
        push(ReasonCode::RunValidationFailed, None);
    }
    if ctx.strict_v1_ready {
        let ready = ctx.v1_ready.is_some_and(|report| report.ok);
        if !ready {
            push(ReasonCode::RunV1ReadyFailed, None);
        }
    }
    if run.current_commit_hash.is_empty() {
        push(ReasonCode::RunCommitMissing, None);
    } else if let Some(head) = ctx.project_workspace_head {
        if head != run.current_commit_hash {
            push(
                ReasonCode::RunCommitDrift,
                Some(serde_json::json!({ "projectHead": head, "runCommit": run.current_commit_hash })),
            );
        }
    }
    if run.metadata.execution_contract_fallback_used || material.exceeds_supported() {
        push(ReasonCode::UnsupportedContract, None);
    }
    if ctx.branch_lock_active {
        push(ReasonCode::BranchLockMismatch, None);
    }

    let decision = if reasons.is_empty() { Decision::Pass } else { Decision::Fail };
    let mut reason_codes: Vec<ReasonCode> = reasons.iter().map(|r| r.code).collect();
    reason_codes.sort();
    reason_codes.dedup();

    let artifact_refs = if decision == Decision::Pass {
        vec![ArtifactRef { kind: ArtifactKind::ValidationTarget, path: ctx.validation_target_path.to_string() }]
    } else {
        Vec::new()
    };

    let contract = ContractSummary {
        schema_version: material.execution_contract_schema_version,
        hash: run.metadata.execution_contract_hash.clone(),
        material: run.metadata.execution_contract_material.clone(),
        fallback_used: run.metadata.execution_contract_fallback_used,
        fallback_fields: run.metadata.execution_contract_fallback_fields.clone(),
    };

    let hash_input = GovernanceDecisionHashInput {
        decision_schema_version: DECISION_SCHEMA_VERSION,
        decision,
        run_id: run.id.as_str(),
        contract: &contract,
        reason_codes: &reason_codes,
        reasons: &reasons,
        artifact_refs: &artifact_refs,
    };
    let decision_hash = canonical_hash(&hash_input).map_err(GovernanceError::Hashing)?;

    Ok(GovernanceDecision {
        decision_schema_version: DECISION_SCHEMA_VERSION,
        decision_hash,
        decision,
        run_id: run.id.as_str().to_string(),
        contract,
        reason_codes,
        reasons,
        artifact_refs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::model::contract::{ExecutionContractMaterial, EXECUTION_CONTRACT_SCHEMA_VERSION};
    use agentkernel_core::model::run::RunMetadata;
    use agentkernel_core::model::{AgentRunId, ProjectId, ValidationReport};
    use chrono::Utc;

    fn base_run() -> AgentRun {
        let material = ExecutionContractMaterial::current("seed-1");
        AgentRun {
            id: AgentRunId::new(),
            project_id: ProjectId::new(),
            org_id: "org-1".into(),
            workspace_id: "ws-1".into(),
            created_by: "user-1".into(),
            goal: "add a feature".into(),
            provider_id: "anthropic".into(),
            model: "claude".into(),
            status: RunStatus::Complete,
            current_step_index: 3,
            last_step_id: None,
            plan: None,
            base_commit_hash: "deadbeef".into(),
            current_commit_hash: "cafef00d".into(),
            last_valid_commit_hash: "cafef00d".into(),
            run_branch: "agent/run-1".into(),
            worktree_path: None,
            validation_status: Some(ValidationStatus::Passed),
            validation_result: Some(ValidationReport::from_checks(vec![])),
            validated_at: Some(Utc::now()),
            error_message: None,
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
            metadata: RunMetadata {
                execution_config: serde_json::json!({}),
                execution_contract_hash: canonical_hash(&material).unwrap(),
                execution_contract_material: serde_json::to_value(&material).unwrap(),
                execution_contract_fallback_used: false,
                execution_contract_fallback_fields: Vec::new(),
                forked_from_run_id: None,
                cancel_requested: false,
                extra: serde_json::Map::new(),
            },
        }
    }

    fn passing_ctx(run: &AgentRun) -> GovernanceContext<'_> {
        GovernanceContext {
            run,
            project_workspace_head: Some(run.current_commit_hash.as_str()),
            branch_lock_active: false,
            strict_v1_ready: false,
            v1_ready: None,
            validation_target_path: "src/lib.rs",
        }
    }

    #[test]
    fn a_clean_complete_run_passes_with_a_validation_target_artifact() {
        let run = base_run();
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.decision, Decision::Pass);
        assert!(decision.reason_codes.is_empty());
        assert!(decision.reasons.is_empty());
        assert_eq!(decision.artifact_refs.len(), 1);
        assert_eq!(decision.artifact_refs[0].kind, ArtifactKind::ValidationTarget);
        assert_eq!(decision.artifact_refs[0].path, "src/lib.rs");
    }

    #[test]
    fn decision_hash_is_stable_and_order_independent_of_reason_insertion() {
        let run = base_run();
        let a = decide(&passing_ctx(&run)).unwrap();
        let b = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(a.decision_hash, b.decision_hash);
    }

    #[test]
    fn a_non_terminal_run_fails_with_run_not_terminal() {
        let mut run = base_run();
        run.status = RunStatus::Running;
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.decision, Decision::Fail);
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunNotTerminal]);
        assert!(decision.artifact_refs.is_empty());
    }

    #[test]
    fn a_failed_run_reports_run_failed() {
        let mut run = base_run();
        run.status = RunStatus::Failed;
        run.error_message = Some("boom".into());
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunFailed]);
    }

    #[test]
    fn a_cancelled_run_reports_run_cancelled() {
        let mut run = base_run();
        run.status = RunStatus::Cancelled;
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunCancelled]);
    }

    #[test]
    fn a_run_missing_a_validation_status_is_not_validated() {
        let mut run = base_run();
        run.validation_status = None;
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunNotValidated]);
    }

    #[test]
    fn a_run_with_failed_validation_reports_run_validation_failed() {
        let mut run = base_run();
        run.validation_status = Some(ValidationStatus::Failed);
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunValidationFailed]);
    }

    #[test]
    fn strict_v1_ready_is_only_checked_when_requested() {
        let run = base_run();
        let mut ctx = passing_ctx(&run);
        ctx.strict_v1_ready = true;
        ctx.v1_ready = None;
        let decision = decide(&ctx).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunV1ReadyFailed]);
    }

    #[test]
    fn strict_v1_ready_passes_when_the_report_is_ok() {
        let run = base_run();
        let mut ctx = passing_ctx(&run);
        ctx.strict_v1_ready = true;
        let report = V1ReadyReport {
            ok: true,
            verdict: agentkernel_core::model::V1Verdict::Ready,
            checks: Vec::new(),
            generated_at: Utc::now(),
        };
        ctx.v1_ready = Some(&report);
        let decision = decide(&ctx).unwrap();
        assert_eq!(decision.decision, Decision::Pass);
    }

    #[test]
    fn a_missing_commit_hash_reports_run_commit_missing() {
        let mut run = base_run();
        run.current_commit_hash = String::new();
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunCommitMissing]);
    }

    #[test]
    fn project_head_diverging_from_the_run_commit_reports_drift() {
        let run = base_run();
        let mut ctx = passing_ctx(&run);
        ctx.project_workspace_head = Some("some-other-commit");
        let decision = decide(&ctx).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunCommitDrift]);
    }

    #[test]
    fn an_unknown_project_head_skips_the_drift_check() {
        let run = base_run();
        let mut ctx = passing_ctx(&run);
        ctx.project_workspace_head = None;
        let decision = decide(&ctx).unwrap();
        assert_eq!(decision.decision, Decision::Pass);
    }

    #[test]
    fn fallback_used_reports_unsupported_contract() {
        let mut run = base_run();
        run.metadata.execution_contract_fallback_used = true;
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::UnsupportedContract]);
    }

    #[test]
    fn a_material_version_beyond_engine_support_reports_unsupported_contract() {
        let mut run = base_run();
        let mut material: ExecutionContractMaterial =
            serde_json::from_value(run.metadata.execution_contract_material.clone()).unwrap();
        material.execution_contract_schema_version = EXECUTION_CONTRACT_SCHEMA_VERSION + 1;
        run.metadata.execution_contract_material = serde_json::to_value(&material).unwrap();
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::UnsupportedContract]);
    }

    #[test]
    fn an_active_branch_lock_reports_branch_lock_mismatch() {
        let run = base_run();
        let mut ctx = passing_ctx(&run);
        ctx.branch_lock_active = true;
        let decision = decide(&ctx).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::BranchLockMismatch]);
    }

    #[test]
    fn multiple_reasons_are_sorted_by_spec_order_and_deduplicated() {
        let mut run = base_run();
        run.status = RunStatus::Failed;
        run.validation_status = None;
        let decision = decide(&passing_ctx(&run)).unwrap();
        assert_eq!(decision.reason_codes, vec![ReasonCode::RunFailed, ReasonCode::RunNotValidated]);
    }
}
