// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A `Planner` that delegates to an external process over stdio (§6
//! "Planner API (the core consumes; external implementation)"). Grounded in
//! the teacher's process-spawning idiom for external agent invocations: pipe
//! stdio, set the working directory, pass configuration through the
//! environment, read the result back as JSON.

use agentkernel_core::planner::{CorrectionPlanContext, PlanContext, Plan, Planner, PlannedStep, PlannerError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Request envelope written to the planner process's stdin.
#[derive(serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PlannerRequest<'a> {
    Plan {
        run_id: &'a str,
        project_id: &'a str,
        goal: &'a str,
        provider_id: &'a str,
        model: &'a str,
    },
    PlanCorrection {
        run_id: &'a str,
        failed_step_id: &'a str,
        profile: &'a agentkernel_core::model::CorrectionProfile,
        constraint: &'a agentkernel_core::model::CorrectionConstraint,
        attempt: u32,
    },
}

#[derive(serde::Deserialize)]
struct PlanResponse {
    steps: Vec<PlannedStep>,
}

pub struct SubprocessPlanner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessPlanner {
    pub fn new(command: String, args: Vec<String>, timeout: Duration) -> Self {
        Self { command, args, timeout }
    }

    async fn run(&self, request: PlannerRequest<'_>) -> Result<PlanResponse, PlannerError> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| PlannerError::Failed { detail: format!("failed to encode planner request: {e}") })?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PlannerError::Failed { detail: format!("failed to spawn planner process: {e}") })?;

        let mut stdin = child.stdin.take().expect("stdin piped");
        stdin
            .write_all(&payload)
            .await
            .map_err(|e| PlannerError::Failed { detail: format!("failed to write planner request: {e}") })?;
        drop(stdin);

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PlannerError::Timeout { timeout_ms: self.timeout.as_millis() as u64 })?
            .map_err(|e| PlannerError::Failed { detail: format!("planner process I/O error: {e}") })?;

        if !output.status.success() {
            return Err(PlannerError::Failed {
                detail: format!(
                    "planner process exited {}: {}",
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| PlannerError::Failed { detail: format!("malformed planner response: {e}") })
    }
}

#[async_trait]
impl Planner for SubprocessPlanner {
    async fn plan(&self, ctx: PlanContext) -> Result<Plan, PlannerError> {
        let response = self
            .run(PlannerRequest::Plan {
                run_id: &ctx.run_id,
                project_id: &ctx.project_id,
                goal: &ctx.goal,
                provider_id: &ctx.provider_id,
                model: &ctx.model,
            })
            .await?;
        Ok(Plan { steps: response.steps })
    }

    async fn plan_correction(&self, ctx: CorrectionPlanContext) -> Result<Vec<PlannedStep>, PlannerError> {
        let response = self
            .run(PlannerRequest::PlanCorrection {
                run_id: &ctx.run_id,
                failed_step_id: ctx.failed_step_id.as_str(),
                profile: &ctx.profile,
                constraint: &ctx.constraint,
                attempt: ctx.attempt,
            })
            .await?;
        Ok(response.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_request_tags_by_kind() {
        let request = PlannerRequest::Plan { run_id: "run-1", project_id: "proj-1", goal: "add a feature", provider_id: "anthropic", model: "claude" };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["kind"], "plan");
        assert_eq!(value["run_id"], "run-1");
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_as_planner_failed() {
        let planner = SubprocessPlanner::new("false".to_string(), Vec::new(), Duration::from_secs(5));
        let err = planner
            .run(PlannerRequest::Plan { run_id: "r", project_id: "p", goal: "g", provider_id: "a", model: "m" })
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Failed { .. }));
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_planner_failed() {
        let planner = SubprocessPlanner::new("definitely-not-a-real-binary-xyz".to_string(), Vec::new(), Duration::from_secs(5));
        let err = planner
            .run(PlannerRequest::Plan { run_id: "r", project_id: "p", goal: "g", provider_id: "a", model: "m" })
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Failed { .. }));
    }
}
