// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute-worker process (§5, §6): claims queued run jobs and drives them
//! through the kernel's execute loop. Never accepts caller requests
//! directly — `queueRun` and friends are an HTTP service's job, running in a
//! separate process that shares the same content store.

mod env;
mod planner;
mod tool;

use agentkernel_core::model::{RunJobStatus, WorkerNode, WorkerNodeId};
use agentkernel_core::{Clock, SystemClock};
use agentkernel_kernel::{AgentKernel, KernelConfig};
use agentkernel_store::ContentStore;
use agentkernel_validation::ArchitectureCheck;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const EXIT_CLEAN: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_LEASE_LOST: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let clock = SystemClock;
    let wal_path = env::state_dir().join("wal.log");
    let store = match ContentStore::open(&wal_path, clock.clone()) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, path = %wal_path.display(), "failed to open content store");
            return EXIT_FATAL;
        }
    };

    let node_id = WorkerNodeId::from_string(env::node_id());
    let node_role = env::node_role();
    let node_capabilities = env::node_capabilities();
    let node = WorkerNode::new(node_id, node_role.clone(), node_capabilities.clone(), clock.now());
    if let Err(e) = store.upsert_worker_node(node) {
        error!(error = %e, "failed to register worker node");
        return EXIT_FATAL;
    }
    info!(node_id = node_id.as_str(), role = %node_role, "worker node registered");

    let planner = Arc::new(planner::SubprocessPlanner::new(
        std::env::var("AGENT_PLANNER_COMMAND").unwrap_or_else(|_| "agent-planner".to_string()),
        Vec::new(),
        Duration::from_secs(120),
    ));
    let tool_runner: Arc<dyn agentkernel_kernel::ToolRunner> = Arc::new(tool::ProcessToolRunner);
    let check_factory: Arc<dyn Fn() -> Vec<Box<dyn agentkernel_validation::Check>> + Send + Sync> =
        Arc::new(|| vec![Box::new(ArchitectureCheck) as Box<dyn agentkernel_validation::Check>]);

    let kernel = Arc::new(AgentKernel::new(
        store,
        clock.clone(),
        env::state_dir().join("projects"),
        planner,
        tool_runner,
        check_factory,
        KernelConfig { target_role: node_role, ..KernelConfig::default() },
    ));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let heartbeat_kernel = kernel.clone();
    let mut node_heartbeat = tokio::time::interval(env::worker_heartbeat_interval());
    let mut lease_lost = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested, stopping after in-flight job");
                break;
            }
            _ = node_heartbeat.tick() => {
                if let Err(e) = heartbeat_kernel.store().worker_heartbeat(node_id.as_str()) {
                    warn!(error = %e, "worker node heartbeat failed");
                }
            }
            claimed = claim_once(kernel.as_ref(), node_id.as_str(), &node_capabilities) => {
                match claimed {
                    Ok(Some(job)) => {
                        if let Err(fatal) = run_claimed_job(&kernel, job, node_id.as_str()).await {
                            if fatal {
                                return EXIT_FATAL;
                            }
                            lease_lost = true;
                        }
                    }
                    Ok(None) => tokio::time::sleep(env::worker_poll_interval()).await,
                    Err(e) => {
                        error!(error = %e, "failed to poll for run jobs");
                        tokio::time::sleep(env::worker_poll_interval()).await;
                    }
                }
            }
        }
    }

    if lease_lost {
        EXIT_LEASE_LOST
    } else {
        EXIT_CLEAN
    }
}

async fn claim_once<C: Clock, P: agentkernel_core::planner::Planner>(
    kernel: &AgentKernel<C, P>,
    node_id: &str,
    capabilities: &[String],
) -> Result<Option<agentkernel_core::model::RunJob>, agentkernel_store::StoreError> {
    kernel.store().claim_next_run_job(node_id, &kernel.config().target_role, capabilities, env::lease_seconds())
}

/// Runs one claimed job, heartbeating its lease concurrently. Returns
/// `Ok(())` on any outcome the caller should keep going after; `Err(true)`
/// for a fatal store error, `Err(false)` if the lease was lost mid-run.
async fn run_claimed_job<C: Clock + 'static, P: agentkernel_core::planner::Planner + 'static>(
    kernel: &Arc<AgentKernel<C, P>>,
    job: agentkernel_core::model::RunJob,
    node_id: &str,
) -> Result<(), bool> {
    info!(job_id = job.id.as_str(), run_id = job.run_id.as_str(), "claimed run job");

    let heartbeat_kernel = kernel.clone();
    let job_id = job.id.as_str().to_string();
    let node_id_owned = node_id.to_string();
    let lease_seconds = env::lease_seconds();
    let heartbeat_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(env::worker_heartbeat_interval());
        loop {
            ticker.tick().await;
            if heartbeat_kernel.store().heartbeat_job(&job_id, &node_id_owned, lease_seconds).is_err() {
                return;
            }
        }
    });

    let outcome = kernel.run_job(&job).await;
    heartbeat_handle.abort();

    match outcome {
        Ok(()) => {
            if let Err(e) = kernel.store().complete_job(job.id.as_str(), RunJobStatus::Complete, None) {
                error!(error = %e, job_id = job.id.as_str(), "failed to mark run job complete");
                return Err(true);
            }
            Ok(())
        }
        Err(e) => {
            let retryable = e.is_retryable();
            warn!(error = %e, job_id = job.id.as_str(), retryable, "run job released after error");
            if let Err(store_err) = kernel.store().release_job(job.id.as_str(), retryable) {
                error!(error = %store_err, job_id = job.id.as_str(), "failed to release run job");
                return Err(true);
            }
            Err(false)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::model::contract::ExecutionProfile;
    use agentkernel_core::model::{Project, ProjectId};
    use agentkernel_core::planner::{Plan, PlanContext, PlannedStep, PlannedStepType, Planner as PlannerTrait, PlannerError, Tool};
    use agentkernel_core::FakeClock;
    use agentkernel_kernel::{KernelConfig, QueueRunInput, ToolError, ToolRunner};
    use agentkernel_session::StagedChange;
    use agentkernel_store::ContentStore;
    use agentkernel_workspace::ProjectWorkspace;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct OneStepPlanner;

    #[async_trait]
    impl PlannerTrait for OneStepPlanner {
        async fn plan(&self, _ctx: PlanContext) -> Result<Plan, PlannerError> {
            Ok(Plan {
                steps: vec![PlannedStep {
                    id: "step-1".to_string(),
                    kind: PlannedStepType::Modify,
                    tool: Tool::WriteFile,
                    input: serde_json::json!({"path": "out.rs"}),
                    mutates: true,
                    deep_correction: None,
                }],
            })
        }

        async fn plan_correction(
            &self,
            _ctx: agentkernel_core::planner::CorrectionPlanContext,
        ) -> Result<Vec<PlannedStep>, PlannerError> {
            Ok(Vec::new())
        }
    }

    struct WriteOneFile;

    #[async_trait]
    impl ToolRunner for WriteOneFile {
        async fn invoke(&self, _run_id: &str, step: &PlannedStep, _worktree: &std::path::Path) -> Result<Vec<StagedChange>, ToolError> {
            Ok(vec![StagedChange::create(
                step.input.get("path").and_then(|v| v.as_str()).unwrap_or("out.rs").to_string(),
                b"fn main() {}".to_vec(),
            )])
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ToolRunner for AlwaysFails {
        async fn invoke(&self, _run_id: &str, _step: &PlannedStep, _worktree: &std::path::Path) -> Result<Vec<StagedChange>, ToolError> {
            Err(ToolError::Failed { tool: "write_file".to_string(), detail: "disk full".to_string() })
        }
    }

    /// Builds a kernel over a fresh temp dir, a scaffolded project, and one
    /// queued run job driven by `tool_runner`.
    fn seeded(
        dir: &std::path::Path,
        tool_runner: Arc<dyn ToolRunner>,
    ) -> (Arc<AgentKernel<FakeClock, OneStepPlanner>>, agentkernel_core::model::AgentRunId) {
        let store = ContentStore::open(dir.join("wal.log"), FakeClock::new()).unwrap();
        let kernel = Arc::new(AgentKernel::new(
            store,
            FakeClock::new(),
            dir.join("projects"),
            Arc::new(OneStepPlanner),
            tool_runner,
            Arc::new(Vec::new),
            KernelConfig::default(),
        ));

        let project_id = ProjectId::new();
        let workspace = kernel.store().get_project(project_id.as_str());
        assert!(workspace.is_none());

        let now = FakeClock::new().now();
        let ws = ProjectWorkspace::open(dir.join("projects").join(project_id.as_str()), FakeClock::new()).unwrap();
        ws.write("main", "README.md", b"hello").unwrap();
        let head = ws.commit("main", "scaffold", "agent-kernel").unwrap();
        let mut project = Project::new(project_id, "org-1", "ws-1", "demo", "blank", "user-1", now);
        project.workspace_head = Some(head);
        kernel.store().create_project(project).unwrap();

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
                overrides: agentkernel_contract::ConfigOverrides::default(),
                randomness_seed: "seed-1".to_string(),
            })
            .unwrap();
        (kernel, output.run.id)
    }

    #[tokio::test]
    async fn claim_once_returns_the_queued_job() {
        let dir = tempdir().unwrap();
        let (kernel, run_id) = seeded(dir.path(), Arc::new(WriteOneFile));
        let job = claim_once(kernel.as_ref(), "node-1").await.unwrap().unwrap();
        assert_eq!(job.run_id, run_id);
    }

    #[tokio::test]
    async fn run_claimed_job_completes_on_success() {
        let dir = tempdir().unwrap();
        let (kernel, _run_id) = seeded(dir.path(), Arc::new(WriteOneFile));
        let job = claim_once(kernel.as_ref(), "node-1").await.unwrap().unwrap();
        let result = run_claimed_job(&kernel, job.clone(), "node-1").await;
        assert!(result.is_ok());
        let stored = kernel.store().get_run(job.run_id.as_str()).unwrap();
        assert_eq!(stored.status, agentkernel_core::model::RunStatus::Complete);
    }

    /// A non-retryable tool failure is absorbed into a terminal `Failed` run
    /// (§7): the job itself still completes, since the worker did its part
    /// of draining the job to a terminal point.
    #[tokio::test]
    async fn run_claimed_job_completes_the_job_even_when_the_run_fails() {
        let dir = tempdir().unwrap();
        let (kernel, run_id) = seeded(dir.path(), Arc::new(AlwaysFails));
        let job = claim_once(kernel.as_ref(), "node-1").await.unwrap().unwrap();
        let result = run_claimed_job(&kernel, job.clone(), "node-1").await;
        assert!(result.is_ok());
        let stored = kernel.store().get_run(run_id.as_str()).unwrap();
        assert_eq!(stored.status, agentkernel_core::model::RunStatus::Failed);
    }
}
