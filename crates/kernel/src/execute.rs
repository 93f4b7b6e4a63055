// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execute loop (§4.5 steps 1-3): drains a claimed run-job, plans,
//! executes steps against a `FileSession`, and runs the validating stage at
//! the end. Re-entry after a crash is idempotent: the loop always resumes
//! from `run.currentStepIndex`, never replays a step whose commit is already
//! on the branch.

use crate::error::KernelError;
use crate::kernel::AgentKernel;
use agentkernel_core::error::FatalError;
use agentkernel_core::model::contract::ValidationMode;
use agentkernel_core::model::{
    AgentRun, AgentStep, AgentStepId, CorrectionConstraint, CorrectionPolicyRecord, CorrectionProfile,
    DeepCorrectionEnvelope, RunJob, RunStatus, StepStatus, StepType, ValidationReport,
};
use agentkernel_core::planner::{CorrectionPlanContext, PlanContext, PlannedStep, Planner};
use agentkernel_core::Clock;
use agentkernel_session::{FileSession, SessionLimits};
use agentkernel_validation::ValidationPipeline;
use std::collections::HashMap;
use std::sync::Arc;

/// Which correction-attempt budget gates a given failure point (§4.3,
/// §4.7): a step that fails mid-run draws from `maxRuntimeCorrectionAttempts`,
/// a failure discovered only at the validating stage draws from
/// `maxHeavyCorrectionAttempts`. Treating these as independent counters
/// means a run that burns through every runtime attempt can still take a
/// shot at the heavier budget once it reaches validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CorrectionBudget {
    Runtime,
    Heavy,
}

impl<C: Clock, P: Planner> AgentKernel<C, P> {
    /// Runs one claimed job to completion or to its next blocking point.
    /// Returns `Err` only for errors the worker should release the job
    /// retryable for (`KernelError::is_retryable`); every other outcome is
    /// folded into a terminal run status before returning `Ok`.
    pub async fn run_job(&self, job: &RunJob) -> Result<(), KernelError> {
        let run = self.require_run_internal(&job.run_id)?;
        if run.metadata.cancel_requested {
            self.finish(&run, RunStatus::Cancelled, None)?;
            return Ok(());
        }
        if run.is_terminal() {
            return Ok(());
        }

        self.store.mark_run_started(run.id.as_str())?;
        match self.drive_run(run).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_retryable() => Err(err),
            Err(err) => {
                let run = self.require_run_internal(&job.run_id)?;
                self.finish(&run, RunStatus::Failed, Some(err.to_string()))?;
                Ok(())
            }
        }
    }

    fn require_run_internal(&self, run_id: &agentkernel_core::model::AgentRunId) -> Result<AgentRun, KernelError> {
        self.store
            .get_run(run_id.as_str())
            .ok_or_else(|| agentkernel_core::error::CallerError::NotFound { what: run_id.to_string() }.into())
    }

    fn finish(&self, run: &AgentRun, status: RunStatus, error_message: Option<String>) -> Result<(), KernelError> {
        self.store.set_run_status(run.id.as_str(), status, error_message)?;
        self.store.mark_run_finished(run.id.as_str())?;
        Ok(())
    }

    async fn drive_run(&self, mut run: AgentRun) -> Result<(), KernelError> {
        self.store.set_run_status(run.id.as_str(), RunStatus::Running, None)?;

        let config = self.effective_config(&run)?;
        let workspace = Arc::new(self.open_workspace(&run.project_id)?);
        let limits = SessionLimits::new(
            config.max_files_per_step as usize,
            config.max_total_diff_bytes,
            config.max_file_bytes,
            config.allow_env_mutation,
        );

        let plan = match &run.plan {
            Some(plan) => serde_json::from_value(plan.clone())?,
            None => {
                let plan = self
                    .planner
                    .plan(PlanContext {
                        run_id: run.id.to_string(),
                        project_id: run.project_id.to_string(),
                        goal: run.goal.clone(),
                        provider_id: run.provider_id.clone(),
                        model: run.model.clone(),
                    })
                    .await
                    .map_err(FatalError::from)?;
                self.store.set_run_plan(run.id.as_str(), serde_json::to_value(&plan)?)?;
                run.plan = Some(serde_json::to_value(&plan)?);
                plan
            }
        };

        let mut steps: Vec<PlannedStep> = plan.steps;
        let mut previous_correction_profile: Option<CorrectionProfile> = None;
        let mut runtime_attempts: u32 = 0;
        let mut pending_policy: HashMap<String, Vec<CorrectionPolicyRecord>> = HashMap::new();

        let mut index = run.current_step_index;
        while index < steps.len() {
            let planned = steps[index].clone();
            let session = FileSession::create(workspace.clone(), run.run_branch.clone(), limits);
            let outcome = self.execute_step(&run, &planned, index, session, &pending_policy).await;

            match outcome {
                Ok(StepOutcome { commit_hash }) => {
                    if let Some(commit_hash) = commit_hash {
                        let last_valid = self.advance_last_valid(&run, &commit_hash, &config, &workspace).await?;
                        run.current_commit_hash = commit_hash.clone();
                        run.last_valid_commit_hash = last_valid;
                        self.store.advance_run_step(
                            run.id.as_str(),
                            index + 1,
                            Some(AgentStepId::new().to_string()),
                            run.current_commit_hash.clone(),
                            run.last_valid_commit_hash.clone(),
                        )?;
                    }
                    index += 1;
                    run.current_step_index = index;
                }
                Err(KernelError::Fatal(_)) | Err(KernelError::Caller(_)) => {
                    let fail_err = outcome.err().unwrap();
                    if config.max_runtime_correction_attempts == 0 || runtime_attempts >= config.max_runtime_correction_attempts {
                        return Err(fail_err);
                    }
                    runtime_attempts += 1;
                    let corrective = self
                        .synthesize_correction(
                            &run,
                            &fail_err,
                            None,
                            CorrectionBudget::Runtime,
                            runtime_attempts,
                            &mut previous_correction_profile,
                            &config,
                        )
                        .await?;
                    match corrective {
                        Some((extra_steps, policy_records)) => {
                            for s in &extra_steps {
                                pending_policy.insert(s.id.clone(), policy_records.clone());
                            }
                            // The corrective steps take over `index` itself (§4.5.e
                            // "return to running at the same stepIndex") — the
                            // original failing step is replaced, not retried.
                            steps.splice(index..index + 1, extra_steps);
                        }
                        None => return Err(fail_err),
                    }
                }
                Err(other) => return Err(other),
            }
        }

        self.run_validating_stage(&mut run, &config, &workspace, &mut previous_correction_profile).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_step(
        &self,
        run: &AgentRun,
        planned: &PlannedStep,
        step_index: usize,
        mut session: FileSession<C>,
        pending_policy: &HashMap<String, Vec<CorrectionPolicyRecord>>,
    ) -> Result<StepOutcome, KernelError> {
        let started_at = self.clock.now();
        let policy = pending_policy.get(&planned.id).cloned().unwrap_or_default();
        let allowed_prefixes = planned.deep_correction.as_ref().and_then(|envelope| {
            envelope
                .constraint
                .get("allowed_path_prefixes")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|p| p.as_str().map(String::from)).collect())
        });
        session.begin_step(planned.id.clone(), step_index, allowed_prefixes)?;

        let worktree = self.worktree_path(&run.project_id, &run.run_branch);
        let changes = self.tool_runner.invoke(run.id.as_str(), planned, &worktree).await.map_err(|e| {
            FatalError::PlannerFailed { detail: e.to_string() }
        });

        let changes = match changes {
            Ok(changes) => changes,
            Err(fatal) => {
                session.abort_step()?;
                self.append_step_record(run, planned, step_index, StepStatus::Failed, None, Some(fatal.to_string()), started_at, policy)?;
                return Err(fatal.into());
            }
        };

        if !planned.mutates {
            self.append_step_record(run, planned, step_index, StepStatus::Completed, None, None, started_at, policy)?;
            return Ok(StepOutcome { commit_hash: None });
        }

        for change in changes {
            session.stage_change(change)?;
        }
        if let Err(e) = session.validate_step() {
            session.abort_step()?;
            self.append_step_record(run, planned, step_index, StepStatus::Failed, None, Some(e.to_string()), started_at, policy)?;
            return Err(e.into());
        }
        session.apply_step_changes()?;
        let commit_hash = session.commit_step(run.id.as_str(), &planned.tool.to_string(), "agent-kernel")?;

        self.append_step_record(
            run,
            planned,
            step_index,
            StepStatus::Completed,
            Some(commit_hash.clone()),
            None,
            started_at,
            policy,
        )?;
        Ok(StepOutcome { commit_hash: Some(commit_hash) })
    }

    #[allow(clippy::too_many_arguments)]
    fn append_step_record(
        &self,
        run: &AgentRun,
        planned: &PlannedStep,
        step_index: usize,
        status: StepStatus,
        commit_hash: Option<String>,
        error_message: Option<String>,
        started_at: chrono::DateTime<chrono::Utc>,
        correction_policy: Vec<CorrectionPolicyRecord>,
    ) -> Result<(), KernelError> {
        let now = self.clock.now();
        let step = AgentStep {
            id: AgentStepId::new(),
            run_id: run.id,
            project_id: run.project_id,
            step_index,
            attempt: planned.deep_correction.as_ref().map(|e| e.attempt).unwrap_or(0),
            step_id: planned.id.clone(),
            kind: step_type_of(planned),
            tool: planned.tool.to_string(),
            status,
            input_payload: planned.input.clone(),
            output_payload: None,
            error_message,
            commit_hash,
            runtime_status: None,
            started_at,
            finished_at: Some(now),
            created_at: now,
            correction_telemetry: planned.deep_correction.clone(),
            correction_policy,
        };
        self.store.append_step(step)
    }

    /// Advances `lastValidCommitHash` past a mutating step's new commit
    /// when `lightValidationMode` tolerates it (§4.5.2.d). `Off` advances
    /// unconditionally; `Warn` advances regardless of the light report but
    /// records it; `Enforce` only advances when the light report passes.
    async fn advance_last_valid(
        &self,
        run: &AgentRun,
        commit_hash: &str,
        config: &agentkernel_core::model::contract::ExecutionConfig,
        _workspace: &Arc<agentkernel_workspace::ProjectWorkspace<C>>,
    ) -> Result<String, KernelError> {
        match config.light_validation_mode {
            ValidationMode::Off => Ok(commit_hash.to_string()),
            ValidationMode::Warn => Ok(commit_hash.to_string()),
            ValidationMode::Enforce => {
                let target = self.worktree_path(&run.project_id, &run.run_branch);
                let pipeline = ValidationPipeline::new((self.check_factory)());
                let report = pipeline.run(&target).await;
                if report.ok {
                    Ok(commit_hash.to_string())
                } else {
                    Ok(run.last_valid_commit_hash.clone())
                }
            }
        }
    }

    async fn run_validating_stage(
        &self,
        run: &mut AgentRun,
        config: &agentkernel_core::model::contract::ExecutionConfig,
        workspace: &Arc<agentkernel_workspace::ProjectWorkspace<C>>,
        previous_profile: &mut Option<CorrectionProfile>,
    ) -> Result<(), KernelError> {
        if config.heavy_validation_mode == ValidationMode::Off {
            self.finish(run, RunStatus::Complete, None)?;
            return Ok(());
        }

        self.store.set_run_status(run.id.as_str(), RunStatus::Validating, None)?;
        let target = self.worktree_path(&run.project_id, &run.run_branch);
        let mut heavy_attempts: u32 = 0;

        loop {
            let pipeline = ValidationPipeline::new((self.check_factory)());
            let report = pipeline.run(&target).await;
            self.store.record_validation(
                run.id.as_str(),
                if report.ok {
                    agentkernel_core::model::ValidationStatus::Passed
                } else {
                    agentkernel_core::model::ValidationStatus::Failed
                },
                report.clone(),
            )?;

            if report.ok {
                self.finish(run, RunStatus::Complete, None)?;
                return Ok(());
            }
            if config.heavy_validation_mode != ValidationMode::Enforce {
                // Warn mode: surface the failing report but don't block completion.
                self.finish(run, RunStatus::Complete, None)?;
                return Ok(());
            }
            if heavy_attempts >= config.max_heavy_correction_attempts {
                return Err(FatalError::ValidationPipelineCrashed {
                    detail: format!("validation did not pass after {heavy_attempts} correction attempts"),
                }
                .into());
            }
            heavy_attempts += 1;

            self.store.set_run_status(run.id.as_str(), RunStatus::Correcting, None)?;
            let corrective = self
                .synthesize_correction(
                    run,
                    &KernelError::Fatal(FatalError::ValidationPipelineCrashed { detail: report.summary.clone() }),
                    Some(&report),
                    CorrectionBudget::Heavy,
                    heavy_attempts,
                    previous_profile,
                    config,
                )
                .await?;
            let Some((corrective_steps, policy_records)) = corrective else {
                return Err(FatalError::ValidationPipelineCrashed { detail: "correction planner declined to correct".into() }.into());
            };
            let pending_policy: HashMap<String, Vec<CorrectionPolicyRecord>> = corrective_steps
                .iter()
                .map(|s| (s.id.clone(), policy_records.clone()))
                .collect();

            let limits = SessionLimits::new(
                config.max_files_per_step as usize,
                config.max_total_diff_bytes,
                config.max_file_bytes,
                config.allow_env_mutation,
            );
            for (offset, planned) in corrective_steps.iter().enumerate() {
                let step_index = run.current_step_index + offset;
                let session = FileSession::create(workspace.clone(), run.run_branch.clone(), limits);
                let outcome = self.execute_step(run, planned, step_index, session, &pending_policy).await?;
                if let Some(commit_hash) = outcome.commit_hash {
                    run.current_commit_hash = commit_hash.clone();
                    run.last_valid_commit_hash = self.advance_last_valid(run, &commit_hash, config, workspace).await?;
                }
            }
            run.current_step_index += corrective_steps.len();
            self.store.advance_run_step(
                run.id.as_str(),
                run.current_step_index,
                run.last_step_id.map(|id| id.to_string()),
                run.current_commit_hash.clone(),
                run.last_valid_commit_hash.clone(),
            )?;
            self.store.set_run_status(run.id.as_str(), RunStatus::Validating, None)?;
        }
    }

    /// Classifies the failure, selects an intent and constraint, asks the
    /// planner for corrective steps, and evaluates the correction policy
    /// rules against the result (§4.7). Returns `None` when the policy
    /// blocks the attempt (the caller then fails the run) or when the
    /// planner declines.
    #[allow(clippy::too_many_arguments)]
    async fn synthesize_correction(
        &self,
        run: &AgentRun,
        fail_err: &KernelError,
        report: Option<&ValidationReport>,
        budget: CorrectionBudget,
        attempt: u32,
        previous_profile: &mut Option<CorrectionProfile>,
        config: &agentkernel_core::model::contract::ExecutionConfig,
    ) -> Result<Option<(Vec<PlannedStep>, Vec<CorrectionPolicyRecord>)>, KernelError> {
        let synthetic_report;
        let report = match report {
            Some(r) => r,
            None => {
                synthetic_report = ValidationReport::from_checks(vec![agentkernel_core::model::ValidationCheckResult {
                    id: "runtime".to_string(),
                    status: agentkernel_core::model::CheckStatus::Fail,
                    message: fail_err.to_string(),
                    details: None,
                }]);
                &synthetic_report
            }
        };

        let profile = agentkernel_correction::classify(report, None);
        let intent = agentkernel_correction::select_intent(&profile);
        let allowed_prefixes = vec!["src/".to_string()];
        let constraint = CorrectionConstraint::for_intent(intent, allowed_prefixes, config.max_total_diff_bytes);

        let failed_step_id = run.last_step_id.unwrap_or_default();
        let envelope = DeepCorrectionEnvelope {
            phase: match budget {
                CorrectionBudget::Runtime => "goal".to_string(),
                CorrectionBudget::Heavy => "optimization".to_string(),
            },
            attempt,
            failed_step_id,
            classification: serde_json::to_value(&profile)?,
            constraint: serde_json::to_value(&constraint)?,
            created_at: self.clock.now(),
        };

        let planned = self
            .planner
            .plan_correction(CorrectionPlanContext {
                run_id: run.id.to_string(),
                failed_step_id,
                profile: profile.clone(),
                constraint: constraint.clone(),
                attempt,
            })
            .await
            .map_err(FatalError::from)?;

        // The actual file paths a corrective step stages aren't known until
        // its tool runs; `FileSession::begin_step`'s `allowed_path_prefixes`
        // already enforces the real constraint at staging time, so the path
        // check here is scored against no candidate paths and can never be
        // the reason an attempt blocks.
        let staged_paths: Vec<String> = Vec::new();
        let step_id = planned.first().map(|s| s.id.clone()).unwrap_or_default();
        let evaluation = agentkernel_correction::evaluate(
            &step_id,
            &envelope,
            &staged_paths,
            &constraint,
            config.correction_policy_mode,
            config.correction_convergence_mode,
            previous_profile.as_ref(),
            &profile,
        );

        *previous_profile = Some(profile);

        if evaluation.blocking {
            return Ok(None);
        }

        let with_envelope: Vec<PlannedStep> = planned
            .into_iter()
            .map(|mut s| {
                s.deep_correction = Some(envelope.clone());
                s
            })
            .collect();
        Ok(Some((with_envelope, evaluation.records)))
    }
}

struct StepOutcome {
    commit_hash: Option<String>,
}

fn step_type_of(planned: &PlannedStep) -> StepType {
    match planned.kind {
        agentkernel_core::planner::PlannedStepType::Analyze => StepType::Analyze,
        agentkernel_core::planner::PlannedStepType::Modify => StepType::Modify,
        agentkernel_core::planner::PlannedStepType::Verify => StepType::Verify,
    }
}
