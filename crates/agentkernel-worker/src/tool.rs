// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process `ToolRunner` (§4.5.2c): executes the deterministic tools
//! directly against the run's worktree. `ai_mutation` has no local
//! implementation — it requires an external model call the worker doesn't
//! make on its own — so it always fails; a deployment that needs it wires
//! its own `ToolRunner` through `AgentKernel::new` instead of this one.

use agentkernel_core::canonical::hash_bytes;
use agentkernel_core::planner::{PlannedStep, Tool};
use agentkernel_kernel::{ToolError, ToolRunner};
use agentkernel_session::StagedChange;
use async_trait::async_trait;
use std::path::Path;

/// `input: {"path": "...", "content": "..."}`.
#[derive(serde::Deserialize)]
struct WriteFileInput {
    path: String,
    content: String,
}

/// `input: {"path": "..."}`.
#[derive(serde::Deserialize)]
struct ReadFileInput {
    path: String,
}

/// `input: {"dir": "..."}`, defaulting to the worktree root.
#[derive(serde::Deserialize)]
struct ListFilesInput {
    #[serde(default)]
    dir: Option<String>,
}

/// `input: {"command": "...", "args": [...]}`.
#[derive(serde::Deserialize)]
struct RunCommandInput {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

pub struct ProcessToolRunner;

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    async fn invoke(
        &self,
        _run_id: &str,
        step: &PlannedStep,
        worktree: &Path,
    ) -> Result<Vec<StagedChange>, ToolError> {
        match step.tool {
            Tool::WriteFile => write_file(step, worktree),
            Tool::ReadFile => {
                read_file(step, worktree)?;
                Ok(Vec::new())
            }
            Tool::ListFiles => {
                list_files(step, worktree)?;
                Ok(Vec::new())
            }
            Tool::RunCommand => run_command(step, worktree).await,
            Tool::FetchRuntimeLogs => Ok(Vec::new()),
            Tool::AiMutation | Tool::ManualFileWrite => Err(ToolError::Failed {
                tool: step.tool.to_string(),
                detail: "no local implementation; configure an external ToolRunner for this tool".to_string(),
            }),
        }
    }
}

fn decode_input<T: serde::de::DeserializeOwned>(step: &PlannedStep) -> Result<T, ToolError> {
    serde_json::from_value(step.input.clone())
        .map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: format!("malformed input: {e}") })
}

fn write_file(step: &PlannedStep, worktree: &Path) -> Result<Vec<StagedChange>, ToolError> {
    let input: WriteFileInput = decode_input(step)?;
    let full_path = worktree.join(&input.path);
    let content = input.content.into_bytes();
    let change = if full_path.exists() {
        let old = std::fs::read(&full_path)
            .map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: e.to_string() })?;
        StagedChange::update(input.path, content, hash_bytes(&old))
    } else {
        StagedChange::create(input.path, content)
    };
    Ok(vec![change])
}

fn read_file(step: &PlannedStep, worktree: &Path) -> Result<String, ToolError> {
    let input: ReadFileInput = decode_input(step)?;
    std::fs::read_to_string(worktree.join(&input.path))
        .map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: e.to_string() })
}

fn list_files(step: &PlannedStep, worktree: &Path) -> Result<Vec<String>, ToolError> {
    let input: ListFilesInput = decode_input(step)?;
    let dir = match &input.dir {
        Some(d) => worktree.join(d),
        None => worktree.to_path_buf(),
    };
    let entries = std::fs::read_dir(&dir)
        .map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: e.to_string() })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: e.to_string() })?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

async fn run_command(step: &PlannedStep, worktree: &Path) -> Result<Vec<StagedChange>, ToolError> {
    let input: RunCommandInput = decode_input(step)?;
    let output = tokio::process::Command::new(&input.command)
        .args(&input.args)
        .current_dir(worktree)
        .output()
        .await
        .map_err(|e| ToolError::Failed { tool: step.tool.to_string(), detail: e.to_string() })?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: step.tool.to_string(),
            detail: format!(
                "exit {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::planner::PlannedStepType;

    fn step(tool: Tool, input: serde_json::Value) -> PlannedStep {
        PlannedStep { id: "step-1".to_string(), kind: PlannedStepType::Modify, tool, input, mutates: tool.mutates(), deep_correction: None }
    }

    #[tokio::test]
    async fn write_file_creates_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessToolRunner;
        let changes = runner
            .invoke("run-1", &step(Tool::WriteFile, serde_json::json!({"path": "src/lib.rs", "content": "fn main() {}"})), dir.path())
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, agentkernel_session::ChangeType::Create);
        assert!(changes[0].old_content_hash.is_none());
    }

    #[tokio::test]
    async fn write_file_updates_with_matching_old_hash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("src.rs"), b"old").unwrap();
        let runner = ProcessToolRunner;
        let changes = runner
            .invoke("run-1", &step(Tool::WriteFile, serde_json::json!({"path": "src.rs", "content": "new"})), dir.path())
            .await
            .unwrap();
        assert_eq!(changes[0].change_type, agentkernel_session::ChangeType::Update);
        assert_eq!(changes[0].old_content_hash.as_deref(), Some(hash_bytes(b"old").as_str()));
    }

    #[tokio::test]
    async fn read_file_returns_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let runner = ProcessToolRunner;
        let changes = runner.invoke("run-1", &step(Tool::ReadFile, serde_json::json!({"path": "a.txt"})), dir.path()).await.unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn list_files_sorts_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        let runner = ProcessToolRunner;
        runner.invoke("run-1", &step(Tool::ListFiles, serde_json::json!({})), dir.path()).await.unwrap();
        let names = list_files(&step(Tool::ListFiles, serde_json::json!({})), dir.path()).unwrap();
        assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[tokio::test]
    async fn run_command_fails_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessToolRunner;
        let err = runner
            .invoke("run-1", &step(Tool::RunCommand, serde_json::json!({"command": "false", "args": []})), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }

    #[tokio::test]
    async fn ai_mutation_has_no_local_implementation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessToolRunner;
        let err = runner.invoke("run-1", &step(Tool::AiMutation, serde_json::json!({})), dir.path()).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed { tool, .. } if tool == "ai_mutation"));
    }
}
