// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity and value types shared across the kernel (§3).

pub mod contract;
pub mod correction;
pub mod governance;
pub mod ids;
pub mod job;
pub mod project;
pub mod run;
pub mod step;
pub mod validation;
pub mod worker;

pub use contract::{
    ConfigDriftField, ExecutionConfig, ExecutionContractMaterial, ExecutionProfile, ValidationMode,
};
pub use correction::{
    Cluster, ClusterKind, CorrectionConstraint, CorrectionIntent, CorrectionProfile, FailureReason,
};
pub use governance::{
    ArtifactKind, ArtifactRef, ContractSummary, Decision, GovernanceDecision,
    GovernanceDecisionHashInput, Reason, ReasonCode, DECISION_SCHEMA_VERSION,
};
pub use ids::{AgentRunId, AgentStepId, ProjectId, RunJobId, WorkerNodeId};
pub use job::{RunJob, RunJobKind, RunJobStatus};
pub use project::{HistoryEntry, HistoryKind, Project, HISTORY_LIMIT};
pub use run::{AgentRun, RunMetadata, RunStatus, ValidationStatus};
pub use step::{
    AgentStep, CorrectionPolicyRecord, DeepCorrectionEnvelope, RuleSeverity, StepStatus, StepType,
};
pub use validation::{CheckStatus, V1ReadyReport, V1Verdict, ValidationCheckResult, ValidationReport};
pub use worker::{WorkerNode, WorkerStatus};
