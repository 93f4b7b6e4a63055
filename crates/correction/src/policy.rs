// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correction policy rules (§4.7), evaluated after each corrective step
//! attempt. `correctionPolicyMode` gates rules 1-3; `correctionConvergenceMode`
//! gates rule 4 independently, since a project may want convergence
//! enforced even while individual constraint nits are only warned about.

use agentkernel_core::model::contract::ValidationMode;
use agentkernel_core::model::{CorrectionConstraint, CorrectionPolicyRecord, CorrectionProfile, DeepCorrectionEnvelope, RuleSeverity};

pub struct PolicyEvaluation {
    pub records: Vec<CorrectionPolicyRecord>,
    /// True iff any enforced rule fired — the kernel aborts the corrective
    /// attempt when this is set.
    pub blocking: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    step_id: &str,
    envelope: &DeepCorrectionEnvelope,
    staged_paths: &[String],
    constraint: &CorrectionConstraint,
    policy_mode: ValidationMode,
    convergence_mode: ValidationMode,
    previous_profile: Option<&CorrectionProfile>,
    current_profile: &CorrectionProfile,
) -> PolicyEvaluation {
    let mut records = Vec::new();
    let mut blocking = false;

    record_if(&mut records, &mut blocking, policy_mode, correction_attempt_suffix_match(step_id, envelope));
    record_if(&mut records, &mut blocking, policy_mode, correction_constraint_respected(staged_paths, constraint));
    record_if(&mut records, &mut blocking, policy_mode, correction_phase_valid(&envelope.phase));
    record_if(&mut records, &mut blocking, convergence_mode, correction_convergence(previous_profile, current_profile));

    PolicyEvaluation { records, blocking }
}

fn record_if(
    records: &mut Vec<CorrectionPolicyRecord>,
    blocking: &mut bool,
    mode: ValidationMode,
    violation: Option<(&'static str, String, Option<serde_json::Value>)>,
) {
    let Some((rule_id, message, details)) = violation else { return };
    match mode {
        ValidationMode::Off => {}
        ValidationMode::Warn => {
            records.push(CorrectionPolicyRecord { rule_id: rule_id.to_string(), severity: RuleSeverity::Warning, message, details });
        }
        ValidationMode::Enforce => {
            *blocking = true;
            records.push(CorrectionPolicyRecord { rule_id: rule_id.to_string(), severity: RuleSeverity::Blocking, message, details });
        }
    }
}

fn correction_attempt_suffix_match(step_id: &str, envelope: &DeepCorrectionEnvelope) -> Option<(&'static str, String, Option<serde_json::Value>)> {
    let expected_suffix = format!("-{}", envelope.attempt);
    if step_id.ends_with(&expected_suffix) {
        None
    } else {
        Some((
            "correction_attempt_suffix_match",
            format!("step id '{step_id}' does not end in '{expected_suffix}'"),
            None,
        ))
    }
}

fn correction_constraint_respected(staged_paths: &[String], constraint: &CorrectionConstraint) -> Option<(&'static str, String, Option<serde_json::Value>)> {
    let offending: Vec<&String> = staged_paths.iter().filter(|p| !constraint.path_allowed(p)).collect();
    if offending.is_empty() {
        None
    } else {
        Some((
            "correction_constraint_respected",
            format!("{} staged path(s) outside allowed prefixes", offending.len()),
            Some(serde_json::json!({ "paths": offending })),
        ))
    }
}

fn correction_phase_valid(phase: &str) -> Option<(&'static str, String, Option<serde_json::Value>)> {
    if matches!(phase, "goal" | "optimization") {
        None
    } else {
        Some(("correction_phase_valid", format!("phase '{phase}' is not one of goal, optimization"), None))
    }
}

fn correction_convergence(
    previous_profile: Option<&CorrectionProfile>,
    current_profile: &CorrectionProfile,
) -> Option<(&'static str, String, Option<serde_json::Value>)> {
    let previous = previous_profile?;
    if previous.converges_with(current_profile) {
        Some((
            "correction_convergence",
            "two consecutive corrective attempts produced byte-equal classifier output".to_string(),
            None,
        ))
    } else {
        None
    }
}
