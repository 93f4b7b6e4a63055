// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Kernel (§4.5): entry points exposed to external collaborators.
//! The execute loop itself lives in [`crate::execute`].

use crate::error::KernelError;
use crate::types::{
    ForkRunOutput, QueueResumeRunInput, QueueResumeRunOutput, QueueRunInput, QueueRunOutput,
    RunWithSteps, ValidateRunOutputResult,
};
use agentkernel_contract::{check_resume_compatibility, freeze, ConfigOverrides};
use agentkernel_core::error::CallerError;
use agentkernel_core::model::contract::ExecutionConfig;
use agentkernel_core::model::{
    AgentRun, AgentRunId, AgentStepId, ExecutionProfile, HistoryEntry, ProjectId, RunJob, RunJobKind,
    RunMetadata, RunStatus,
};
use agentkernel_core::planner::Planner;
use agentkernel_core::Clock;
use agentkernel_store::ContentStore;
use agentkernel_validation::Check;
use agentkernel_workspace::ProjectWorkspace;
use std::path::PathBuf;
use std::sync::Arc;

use crate::tool::ToolRunner;

/// Caps shared by every entry point that enqueues a run job (§4.4).
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub target_role: String,
    pub lease_seconds: i64,
    pub max_job_attempts: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { target_role: "agent-kernel".to_string(), lease_seconds: 60, max_job_attempts: 3 }
    }
}

pub struct AgentKernel<C: Clock, P: Planner> {
    pub(crate) store: ContentStore<C>,
    pub(crate) clock: C,
    pub(crate) workspace_root: PathBuf,
    pub(crate) planner: Arc<P>,
    pub(crate) tool_runner: Arc<dyn ToolRunner>,
    pub(crate) check_factory: Arc<dyn Fn() -> Vec<Box<dyn Check>> + Send + Sync>,
    pub(crate) config: KernelConfig,
}

impl<C: Clock, P: Planner> AgentKernel<C, P> {
    /// The underlying content store, for a worker's own claim/heartbeat/
    /// complete/release loop around [`Self::run_job`] (§4.4, §5).
    pub fn store(&self) -> &ContentStore<C> {
        &self.store
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: ContentStore<C>,
        clock: C,
        workspace_root: impl Into<PathBuf>,
        planner: Arc<P>,
        tool_runner: Arc<dyn ToolRunner>,
        check_factory: Arc<dyn Fn() -> Vec<Box<dyn Check>> + Send + Sync>,
        config: KernelConfig,
    ) -> Self {
        Self { store, clock, workspace_root: workspace_root.into(), planner, tool_runner, check_factory, config }
    }

    pub(crate) fn project_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.workspace_root.join(project_id.as_str())
    }

    pub(crate) fn worktree_path(&self, project_id: &ProjectId, branch: &str) -> PathBuf {
        self.project_dir(project_id).join("worktrees").join(branch)
    }

    pub(crate) fn open_workspace(&self, project_id: &ProjectId) -> Result<ProjectWorkspace<C>, KernelError> {
        Ok(ProjectWorkspace::open(self.project_dir(project_id), self.clock.clone())?)
    }

    pub(crate) fn effective_config(&self, run: &AgentRun) -> Result<ExecutionConfig, KernelError> {
        Ok(serde_json::from_value(run.metadata.execution_config.clone())?)
    }

    fn profile_of(&self, run: &AgentRun) -> ExecutionProfile {
        run.metadata
            .extra
            .get("execution_profile")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(ExecutionProfile::Full)
    }

    fn require_run(&self, run_id: &AgentRunId) -> Result<AgentRun, KernelError> {
        self.store
            .get_run(run_id.as_str())
            .ok_or_else(|| CallerError::NotFound { what: run_id.to_string() }.into())
    }

    fn require_project(&self, project_id: &ProjectId) -> Result<agentkernel_core::model::Project, KernelError> {
        self.store
            .get_project(project_id.as_str())
            .ok_or_else(|| CallerError::NotFound { what: project_id.to_string() }.into())
    }

    // -- queueRun (§4.5) ----------------------------------------------------

    pub fn queue_run(&self, input: QueueRunInput) -> Result<QueueRunOutput, KernelError> {
        let project = self.require_project(&input.project_id)?;
        if self.store.has_active_run(input.project_id.as_str()) {
            return Err(CallerError::BranchLockedByActiveRun { project_id: input.project_id.to_string() }.into());
        }
        let main_head = project
            .workspace_head
            .clone()
            .ok_or_else(|| CallerError::NotFound { what: format!("workspace head for {}", input.project_id) })?;

        let contract = freeze(input.profile, &input.overrides, input.randomness_seed.clone())?;

        let run_id = AgentRunId::new();
        let run_branch = format!("run/{}", run_id.suffix());
        let workspace = self.open_workspace(&input.project_id)?;
        workspace.branch_from(&run_branch, &main_head)?;

        let now = self.clock.now();
        let mut extra = serde_json::Map::new();
        extra.insert("execution_profile".to_string(), serde_json::to_value(input.profile)?);

        let run = AgentRun {
            id: run_id,
            project_id: input.project_id,
            org_id: input.org_id,
            workspace_id: input.workspace_id,
            created_by: input.created_by,
            goal: input.goal,
            provider_id: input.provider_id,
            model: input.model,
            status: RunStatus::Queued,
            current_step_index: 0,
            last_step_id: None,
            plan: None,
            base_commit_hash: main_head.clone(),
            current_commit_hash: main_head.clone(),
            last_valid_commit_hash: main_head,
            run_branch,
            worktree_path: None,
            validation_status: None,
            validation_result: None,
            validated_at: None,
            error_message: None,
            started_at: None,
            finished_at: None,
            metadata: RunMetadata {
                execution_config: serde_json::to_value(&contract.config)?,
                execution_contract_hash: contract.hash.clone(),
                execution_contract_material: serde_json::to_value(&contract.material)?,
                execution_contract_fallback_used: !contract.fallback_fields.is_empty(),
                execution_contract_fallback_fields: contract.fallback_fields.clone(),
                forked_from_run_id: None,
                cancel_requested: false,
                extra,
            },
        };
        self.store.create_run(run.clone())?;

        let job = RunJob::new(
            agentkernel_core::model::RunJobId::new(),
            run.id,
            run.project_id,
            RunJobKind::Start,
            self.config.target_role.clone(),
            serde_json::Value::Null,
            self.config.max_job_attempts,
            now,
        );
        self.store.enqueue_run_job(job.clone())?;

        Ok(QueueRunOutput { run, queued_job: job, contract })
    }

    // -- queueResumeRun (§4.5) ----------------------------------------------

    pub fn queue_resume_run(&self, input: QueueResumeRunInput) -> Result<QueueResumeRunOutput, KernelError> {
        let run = self.require_run(&input.run_id)?;
        let persisted_config = self.effective_config(&run)?;
        let profile = self.profile_of(&run);

        if input.fork {
            let seed = AgentRunId::new().to_string();
            let overrides = input.overrides.clone().unwrap_or_default();
            let contract = freeze(profile, &overrides, seed)?;

            let base_commit = if run.last_valid_commit_hash.is_empty() {
                run.base_commit_hash.clone()
            } else {
                run.last_valid_commit_hash.clone()
            };

            let new_run_id = AgentRunId::new();
            let new_branch = format!("run/{}", new_run_id.suffix());
            let workspace = self.open_workspace(&run.project_id)?;
            workspace.branch_from(&new_branch, &base_commit)?;

            let mut extra = serde_json::Map::new();
            extra.insert("execution_profile".to_string(), serde_json::to_value(profile)?);

            let new_run = AgentRun {
                id: new_run_id,
                project_id: run.project_id,
                org_id: run.org_id.clone(),
                workspace_id: run.workspace_id.clone(),
                created_by: run.created_by.clone(),
                goal: run.goal.clone(),
                provider_id: run.provider_id.clone(),
                model: run.model.clone(),
                status: RunStatus::Queued,
                current_step_index: 0,
                last_step_id: None,
                plan: None,
                base_commit_hash: base_commit.clone(),
                current_commit_hash: base_commit.clone(),
                last_valid_commit_hash: base_commit,
                run_branch: new_branch,
                worktree_path: None,
                validation_status: None,
                validation_result: None,
                validated_at: None,
                error_message: None,
                started_at: None,
                finished_at: None,
                metadata: RunMetadata {
                    execution_config: serde_json::to_value(&contract.config)?,
                    execution_contract_hash: contract.hash.clone(),
                    execution_contract_material: serde_json::to_value(&contract.material)?,
                    execution_contract_fallback_used: !contract.fallback_fields.is_empty(),
                    execution_contract_fallback_fields: contract.fallback_fields.clone(),
                    forked_from_run_id: Some(run.id),
                    cancel_requested: false,
                    extra,
                },
            };
            self.store.create_run(new_run.clone())?;

            let job = RunJob::new(
                agentkernel_core::model::RunJobId::new(),
                new_run.id,
                new_run.project_id,
                RunJobKind::Start,
                self.config.target_role.clone(),
                serde_json::Value::Null,
                self.config.max_job_attempts,
                self.clock.now(),
            );
            self.store.enqueue_run_job(job.clone())?;

            return Ok(QueueResumeRunOutput::Forked { run: new_run, queued_job: job, contract });
        }

        if let Some(overrides) = &input.overrides {
            let requested = freeze(profile, overrides, run.metadata.execution_contract_hash.clone())?;
            check_resume_compatibility(&persisted_config, &requested.config, false, input.override_execution_config)?;
        }

        let job = RunJob::new(
            agentkernel_core::model::RunJobId::new(),
            run.id,
            run.project_id,
            RunJobKind::Resume,
            self.config.target_role.clone(),
            serde_json::Value::Null,
            self.config.max_job_attempts,
            self.clock.now(),
        );
        self.store.enqueue_run_job(job.clone())?;

        Ok(QueueResumeRunOutput::Resumed { run, queued_job: job })
    }

    // -- forkRun (§4.5) ------------------------------------------------------

    pub fn fork_run(&self, run_id: AgentRunId, step_id: AgentStepId) -> Result<ForkRunOutput, KernelError> {
        let source = self.require_run(&run_id)?;
        let step = self
            .store
            .steps_for_run(run_id.as_str())
            .into_iter()
            .find(|s| s.id == step_id)
            .ok_or_else(|| CallerError::NotFound { what: step_id.to_string() })?;
        let base_commit = step
            .commit_hash
            .clone()
            .ok_or_else(|| CallerError::NotFound { what: format!("commit for step {step_id}") })?;

        let profile = self.profile_of(&source);
        let seed = AgentRunId::new().to_string();
        let contract = freeze(profile, &ConfigOverrides::default(), seed)?;

        let new_run_id = AgentRunId::new();
        let new_branch = format!("run/{}", new_run_id.suffix());
        let workspace = self.open_workspace(&source.project_id)?;
        workspace.branch_from(&new_branch, &base_commit)?;

        let mut extra = serde_json::Map::new();
        extra.insert("execution_profile".to_string(), serde_json::to_value(profile)?);

        let new_run = AgentRun {
            id: new_run_id,
            project_id: source.project_id,
            org_id: source.org_id.clone(),
            workspace_id: source.workspace_id.clone(),
            created_by: source.created_by.clone(),
            goal: source.goal.clone(),
            provider_id: source.provider_id.clone(),
            model: source.model.clone(),
            status: RunStatus::Queued,
            current_step_index: step.step_index + 1,
            last_step_id: Some(step.id),
            plan: None,
            base_commit_hash: base_commit.clone(),
            current_commit_hash: base_commit.clone(),
            last_valid_commit_hash: base_commit,
            run_branch: new_branch,
            worktree_path: None,
            validation_status: None,
            validation_result: None,
            validated_at: None,
            error_message: None,
            started_at: None,
            finished_at: None,
            metadata: RunMetadata {
                execution_config: serde_json::to_value(&contract.config)?,
                execution_contract_hash: contract.hash.clone(),
                execution_contract_material: serde_json::to_value(&contract.material)?,
                execution_contract_fallback_used: !contract.fallback_fields.is_empty(),
                execution_contract_fallback_fields: contract.fallback_fields.clone(),
                forked_from_run_id: Some(source.id),
                cancel_requested: false,
                extra,
            },
        };
        self.store.create_run(new_run.clone())?;

        let job = RunJob::new(
            agentkernel_core::model::RunJobId::new(),
            new_run.id,
            new_run.project_id,
            RunJobKind::Start,
            self.config.target_role.clone(),
            serde_json::Value::Null,
            self.config.max_job_attempts,
            self.clock.now(),
        );
        self.store.enqueue_run_job(job.clone())?;

        Ok(ForkRunOutput { run: new_run, queued_job: job, contract })
    }

    // -- cancelRun (§4.5) ----------------------------------------------------

    pub fn cancel_run(&self, run_id: AgentRunId) -> Result<(), KernelError> {
        self.require_run(&run_id)?;
        self.store.request_cancel(run_id.as_str())?;
        self.store.set_run_status(run_id.as_str(), RunStatus::Cancelled, None)?;
        self.store.mark_run_finished(run_id.as_str())?;

        if let Some(job) = self.store.snapshot().active_job_for_run(run_id.as_str()).cloned() {
            self.store.release_job(job.id.as_str(), false)?;
        }
        Ok(())
    }

    // -- getRunWithSteps (§4.5) ----------------------------------------------

    pub fn get_run_with_steps(&self, project_id: ProjectId, run_id: AgentRunId) -> Result<RunWithSteps, KernelError> {
        let run = self.require_run(&run_id)?;
        if run.project_id != project_id {
            return Err(CallerError::NotFound { what: run_id.to_string() }.into());
        }
        let steps = self.store.steps_for_run(run_id.as_str());

        let mut telemetry = Vec::new();
        let mut stub_debt = Vec::new();
        for step in &steps {
            telemetry.extend(step.correction_policy.iter().cloned());
            if let Some(envelope) = &step.correction_telemetry {
                if let Some(targets) = envelope.classification.get("debt_targets").and_then(|v| v.as_array()) {
                    for target in targets {
                        if let Some(s) = target.as_str() {
                            if !stub_debt.iter().any(|existing: &String| existing == s) {
                                stub_debt.push(s.to_string());
                            }
                        }
                    }
                }
            }
        }

        Ok(RunWithSteps { run, steps, telemetry, stub_debt })
    }

    // -- validateRunOutput (§4.5, §4.6) --------------------------------------

    pub async fn validate_run_output(
        &self,
        project_id: ProjectId,
        run_id: AgentRunId,
        strict_v1_ready: bool,
    ) -> Result<ValidateRunOutputResult, KernelError> {
        let run = self.require_run(&run_id)?;
        if run.project_id != project_id {
            return Err(CallerError::NotFound { what: run_id.to_string() }.into());
        }
        if run.status.is_active() {
            return Err(CallerError::RunStillActive { run_id: run_id.to_string() }.into());
        }

        let target = self.worktree_path(&project_id, &run.run_branch);
        let pipeline = agentkernel_validation::ValidationPipeline::new((self.check_factory)());
        let report = pipeline.run(&target).await;

        let status = if report.ok {
            agentkernel_core::model::ValidationStatus::Passed
        } else {
            agentkernel_core::model::ValidationStatus::Failed
        };
        self.store.record_validation(run_id.as_str(), status, report.clone())?;

        let v1_ready = if strict_v1_ready {
            let checks = (self.check_factory)();
            Some(agentkernel_validation::run_v1_ready(&checks, &target, &self.clock).await)
        } else {
            None
        };

        let run = self.require_run(&run_id)?;
        Ok(ValidateRunOutputResult { run, validation: report, v1_ready, target_path: target.to_string_lossy().into_owned() })
    }

    /// Records a project-level activity entry (§3 "History"). Used by
    /// callers outside the agent run flow (manual save, scaffold) that still
    /// need the branch-lock check from §4.4.
    pub fn record_project_history(&self, project_id: &ProjectId, entry: HistoryEntry) -> Result<(), KernelError> {
        if self.store.has_active_run(project_id.as_str()) {
            return Err(CallerError::BranchLockedByActiveRun { project_id: project_id.to_string() }.into());
        }
        self.store.update_project_head(project_id.as_str(), entry.commit_hash.clone())?;
        self.store.push_project_history(project_id.as_str(), entry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolError;
    use agentkernel_core::planner::{Plan, PlanContext, PlannedStep, PlannedStepType, Tool};
    use agentkernel_core::FakeClock;
    use agentkernel_session::StagedChange;
    use agentkernel_store::ContentStore;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct OneStepPlanner;

    #[async_trait]
    impl Planner for OneStepPlanner {
        async fn plan(&self, _ctx: PlanContext) -> Result<Plan, agentkernel_core::planner::PlannerError> {
            Ok(Plan {
                steps: vec![PlannedStep {
                    id: "step-1".to_string(),
                    kind: PlannedStepType::Modify,
                    tool: Tool::WriteFile,
                    input: serde_json::json!({"path": "src/lib.rs"}),
                    mutates: true,
                    deep_correction: None,
                }],
            })
        }

        async fn plan_correction(
            &self,
            _ctx: agentkernel_core::planner::CorrectionPlanContext,
        ) -> Result<Vec<PlannedStep>, agentkernel_core::planner::PlannerError> {
            Ok(Vec::new())
        }
    }

    struct WriteOneFile;

    #[async_trait]
    impl ToolRunner for WriteOneFile {
        async fn invoke(
            &self,
            _run_id: &str,
            step: &agentkernel_core::planner::PlannedStep,
            _worktree: &std::path::Path,
        ) -> Result<Vec<StagedChange>, ToolError> {
            Ok(vec![StagedChange::create(
                step.input.get("path").and_then(|v| v.as_str()).unwrap_or("out.rs").to_string(),
                b"fn main() {}".to_vec(),
            )])
        }
    }

    fn kernel(dir: &std::path::Path) -> AgentKernel<FakeClock, OneStepPlanner> {
        let store = ContentStore::open(dir.join("wal.log"), FakeClock::new()).unwrap();
        AgentKernel::new(
            store,
            FakeClock::new(),
            dir.join("projects"),
            Arc::new(OneStepPlanner),
            Arc::new(WriteOneFile),
            Arc::new(Vec::new),
            KernelConfig::default(),
        )
    }

    fn seeded_project(kernel: &AgentKernel<FakeClock, OneStepPlanner>) -> ProjectId {
        let project_id = ProjectId::new();
        let workspace = kernel.open_workspace(&project_id).unwrap();
        workspace.write("main", "README.md", b"hello").unwrap();
        let head = workspace.commit("main", "scaffold", "agent-kernel").unwrap();
        let mut project = agentkernel_core::model::Project::new(
            project_id,
            "org-1",
            "ws-1",
            "demo",
            "blank",
            "user-1",
            kernel.clock.now(),
        );
        project.workspace_head = Some(head);
        kernel.store.create_project(project).unwrap();
        project_id
    }

    #[test]
    fn queue_run_rejects_a_second_active_run() {
        let dir = tempdir().unwrap();
        let kernel = kernel(dir.path());
        let project_id = seeded_project(&kernel);

        let input = QueueRunInput {
            project_id,
            org_id: "org-1".to_string(),
            workspace_id: "ws-1".to_string(),
            created_by: "user-1".to_string(),
            goal: "add a feature".to_string(),
            provider_id: "anthropic".to_string(),
            model: "claude".to_string(),
            profile: ExecutionProfile::Full,
            overrides: ConfigOverrides::default(),
            randomness_seed: "seed-1".to_string(),
        };
        kernel.queue_run(input.clone()).unwrap();

        let err = kernel.queue_run(input).unwrap_err();
        assert!(matches!(err, KernelError::Caller(CallerError::BranchLockedByActiveRun { .. })));
    }

    #[test]
    fn queue_run_without_a_scaffolded_workspace_is_rejected() {
        let dir = tempdir().unwrap();
        let kernel = kernel(dir.path());
        let project_id = ProjectId::new();
        let project = agentkernel_core::model::Project::new(
            project_id,
            "org-1",
            "ws-1",
            "demo",
            "blank",
            "user-1",
            kernel.clock.now(),
        );
        kernel.store.create_project(project).unwrap();

        let input = QueueRunInput {
            project_id,
            org_id: "org-1".to_string(),
            workspace_id: "ws-1".to_string(),
            created_by: "user-1".to_string(),
            goal: "add a feature".to_string(),
            provider_id: "anthropic".to_string(),
            model: "claude".to_string(),
            profile: ExecutionProfile::Full,
            overrides: ConfigOverrides::default(),
            randomness_seed: "seed-1".to_string(),
        };
        let err = kernel.queue_run(input).unwrap_err();
        assert!(matches!(err, KernelError::Caller(CallerError::NotFound { .. })));
    }

    #[test]
    fn cancel_run_releases_the_active_job_non_retryable() {
        let dir = tempdir().unwrap();
        let kernel = kernel(dir.path());
        let project_id = seeded_project(&kernel);

        let output = kernel
            .queue_run(QueueRunInput {
                project_id,
                org_id: "org-1".to_string(),
                workspace_id: "ws-1".to_string(),
                created_by: "user-1".to_string(),
                goal: "add a feature".to_string(),
                provider_id: "anthropic".to_string(),
                model: "claude".to_string(),
                profile: ExecutionProfile::Full,
                overrides: ConfigOverrides::default(),
                randomness_seed: "seed-1".to_string(),
            })
            .unwrap();

        kernel.cancel_run(output.run.id).unwrap();
        let run = kernel.store.get_run(output.run.id.as_str()).unwrap();
        assert_eq!(run.status, RunStatus::Cancelled);
        assert!(kernel.store.snapshot().active_job_for_run(output.run.id.as_str()).is_none());
    }

    #[test]
    fn get_run_with_steps_rejects_a_run_from_another_project() {
        let dir = tempdir().unwrap();
        let kernel = kernel(dir.path());
        let project_id = seeded_project(&kernel);
        let output = kernel
            .queue_run(QueueRunInput {
                project_id,
                org_id: "org-1".to_string(),
                workspace_id: "ws-1".to_string(),
                created_by: "user-1".to_string(),
                goal: "add a feature".to_string(),
                provider_id: "anthropic".to_string(),
                model: "claude".to_string(),
                profile: ExecutionProfile::Full,
                overrides: ConfigOverrides::default(),
                randomness_seed: "seed-1".to_string(),
            })
            .unwrap();

        let err = kernel.get_run_with_steps(ProjectId::new(), output.run.id).unwrap_err();
        assert!(matches!(err, KernelError::Caller(CallerError::NotFound { .. })));
    }
}
