// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Governance decision types (§4.8).

use serde::{Deserialize, Serialize};

pub const DECISION_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    Fail,
}

crate::simple_display! {
    Decision {
        Pass => "PASS",
        Fail => "FAIL",
    }
}

/// The closed reason-code set (§4.8), evaluated in this order. Any one
/// present forces `decision=FAIL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    RunNotTerminal,
    RunFailed,
    RunCancelled,
    RunNotValidated,
    RunValidationFailed,
    RunV1ReadyFailed,
    RunCommitMissing,
    RunCommitDrift,
    UnsupportedContract,
    BranchLockMismatch,
}

crate::simple_display! {
    ReasonCode {
        RunNotTerminal => "RUN_NOT_TERMINAL",
        RunFailed => "RUN_FAILED",
        RunCancelled => "RUN_CANCELLED",
        RunNotValidated => "RUN_NOT_VALIDATED",
        RunValidationFailed => "RUN_VALIDATION_FAILED",
        RunV1ReadyFailed => "RUN_V1_READY_FAILED",
        RunCommitMissing => "RUN_COMMIT_MISSING",
        RunCommitDrift => "RUN_COMMIT_DRIFT",
        UnsupportedContract => "UNSUPPORTED_CONTRACT",
        BranchLockMismatch => "BRANCH_LOCK_MISMATCH",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    pub code: ReasonCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    ValidationTarget,
}

crate::simple_display! {
    ArtifactKind {
        ValidationTarget => "validation_target",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSummary {
    pub schema_version: u32,
    pub hash: String,
    pub material: serde_json::Value,
    pub fallback_used: bool,
    pub fallback_fields: Vec<String>,
}

/// The hash-identified, deterministic verdict over a terminal run (§4.8).
/// Everything except `decision_hash` itself is covered by the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub decision_schema_version: u32,
    pub decision_hash: String,
    pub decision: Decision,
    pub run_id: String,
    pub contract: ContractSummary,
    /// Sorted, unique.
    pub reason_codes: Vec<ReasonCode>,
    pub reasons: Vec<Reason>,
    pub artifact_refs: Vec<ArtifactRef>,
}

/// Fields used to compute `decision_hash`: every [`GovernanceDecision`]
/// field except the hash itself.
#[derive(Debug, Clone, Serialize)]
pub struct GovernanceDecisionHashInput<'a> {
    pub decision_schema_version: u32,
    pub decision: Decision,
    pub run_id: &'a str,
    pub contract: &'a ContractSummary,
    pub reason_codes: &'a [ReasonCode],
    pub reasons: &'a [Reason],
    pub artifact_refs: &'a [ArtifactRef],
}
