// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step transaction over a project branch (§4.2).
//!
//! A step either commits as a single atomic change, or leaves the
//! branch byte-identical to its head: `stage_change` and `validate_step`
//! never touch the working tree, only `apply_step_changes` does, and
//! `abort_step` resets the branch back to the commit it had when the
//! step began.

use crate::change::{ChangeType, StagedChange};
use crate::error::SessionError;
use crate::limits::{is_env_path, SessionLimits};
use agentkernel_core::Clock;
use agentkernel_workspace::object::{DiffKind, FileDiff};
use agentkernel_workspace::{path, ProjectWorkspace};
use std::sync::Arc;

struct OpenStep {
    step_id: String,
    step_index: usize,
    allowed_path_prefixes: Option<Vec<String>>,
    head_before: Option<String>,
    staged: Vec<StagedChange>,
    validated: bool,
    applied: bool,
}

pub struct FileSession<C: Clock> {
    workspace: Arc<ProjectWorkspace<C>>,
    branch: String,
    limits: SessionLimits,
    open_step: Option<OpenStep>,
    last_committed_diffs: Vec<FileDiff>,
}

impl<C: Clock> FileSession<C> {
    pub fn create(workspace: Arc<ProjectWorkspace<C>>, branch: impl Into<String>, limits: SessionLimits) -> Self {
        Self { workspace, branch: branch.into(), limits, open_step: None, last_committed_diffs: Vec::new() }
    }

    pub fn begin_step(
        &mut self,
        step_id: impl Into<String>,
        step_index: usize,
        allowed_path_prefixes: Option<Vec<String>>,
    ) -> Result<(), SessionError> {
        if self.open_step.is_some() {
            return Err(SessionError::StepAlreadyOpen);
        }
        let head_before = self.workspace.branch_head(&self.branch).ok();
        self.open_step = Some(OpenStep {
            step_id: step_id.into(),
            step_index,
            allowed_path_prefixes,
            head_before,
            staged: Vec::new(),
            validated: false,
            applied: false,
        });
        Ok(())
    }

    pub fn stage_change(&mut self, change: StagedChange) -> Result<(), SessionError> {
        let branch = self.branch.clone();
        let current = self.workspace.read(&branch, &change.path)?;
        let step = self.open_step.as_mut().ok_or(SessionError::NoOpenStep)?;

        match change.change_type {
            ChangeType::Create => {
                if current.exists {
                    return Err(SessionError::AlreadyExists(change.path));
                }
            }
            ChangeType::Update => {
                if !current.exists {
                    return Err(SessionError::NotFound(change.path));
                }
                if change.old_content_hash.as_deref() != current.content_hash.as_deref() {
                    return Err(SessionError::StaleOptimisticLock(change.path));
                }
            }
            ChangeType::Delete => {
                if !current.exists {
                    return Err(SessionError::NotFound(change.path));
                }
                if let Some(expected) = &change.old_content_hash {
                    if Some(expected.as_str()) != current.content_hash.as_deref() {
                        return Err(SessionError::StaleOptimisticLock(change.path));
                    }
                }
            }
        }

        step.validated = false;
        step.staged.push(change);
        Ok(())
    }

    pub fn validate_step(&mut self) -> Result<(), SessionError> {
        let branch = self.branch.clone();
        let limits = self.limits;
        let step = self.open_step.as_mut().ok_or(SessionError::NoOpenStep)?;

        if step.staged.len() > limits.max_files_per_step {
            return Err(SessionError::StepBudgetExceeded(format!(
                "{} files staged, limit {}",
                step.staged.len(),
                limits.max_files_per_step
            )));
        }

        let mut total_bytes: u64 = 0;
        for change in &step.staged {
            path::resolve(std::path::Path::new(""), &change.path)?;

            if !limits.allow_env_mutation && is_env_path(&change.path) {
                return Err(SessionError::EnvMutationNotAllowed(change.path.clone()));
            }

            if let Some(prefixes) = &step.allowed_path_prefixes {
                if !prefixes.iter().any(|prefix| change.path.starts_with(prefix)) {
                    return Err(SessionError::CorrectionConstraintViolation(change.path.clone()));
                }
            }

            let size = match change.change_type {
                ChangeType::Create | ChangeType::Update => change.new_content.as_ref().map(|c| c.len() as u64).unwrap_or(0),
                ChangeType::Delete => self.workspace.stat(&branch, &change.path)?.size,
            };
            if size > limits.max_file_bytes {
                return Err(SessionError::StepBudgetExceeded(format!(
                    "{} is {size} bytes, limit {}",
                    change.path, limits.max_file_bytes
                )));
            }
            total_bytes += size;
        }

        if total_bytes > limits.max_total_diff_bytes {
            return Err(SessionError::StepBudgetExceeded(format!(
                "staged diff is {total_bytes} bytes, limit {}",
                limits.max_total_diff_bytes
            )));
        }

        step.validated = true;
        Ok(())
    }

    pub fn apply_step_changes(&mut self) -> Result<(), SessionError> {
        let branch = self.branch.clone();
        let step = self.open_step.as_mut().ok_or(SessionError::NoOpenStep)?;
        if !step.validated {
            return Err(SessionError::NotValidated);
        }

        for change in &step.staged {
            match change.change_type {
                ChangeType::Create | ChangeType::Update => {
                    let content = change.new_content.as_deref().unwrap_or_default();
                    self.workspace.write(&branch, &change.path, content)?;
                }
                ChangeType::Delete => {
                    self.workspace.remove(&branch, &change.path)?;
                }
            }
        }

        self.open_step.as_mut().ok_or(SessionError::NoOpenStep)?.applied = true;
        Ok(())
    }

    /// Commit the open step. Subject format matches §4.1:
    /// `step-<n> (<tool>) :: agentRunId=<runId>`.
    pub fn commit_step(&mut self, agent_run_id: &str, tool: &str, author: &str) -> Result<String, SessionError> {
        let step = self.open_step.as_ref().ok_or(SessionError::NoOpenStep)?;
        if !step.applied {
            return Err(SessionError::NotApplied);
        }
        let subject = format!("step-{} ({tool}) :: agentRunId={agent_run_id}", step.step_index);
        let diffs = synth_diffs(&step.staged);

        let hash = self.workspace.commit(&self.branch, &subject, author)?;
        self.last_committed_diffs = diffs;
        self.open_step = None;
        Ok(hash)
    }

    /// Restore the branch to its exact state before the open step began,
    /// and discard the step. Safe to call whether or not changes were
    /// ever applied.
    pub fn abort_step(&mut self) -> Result<(), SessionError> {
        let Some(step) = self.open_step.take() else { return Ok(()) };
        if !step.applied {
            return Ok(());
        }
        match &step.head_before {
            Some(head) => self.workspace.reset_hard(&self.branch, head)?,
            None => self.workspace.clear(&self.branch)?,
        }
        Ok(())
    }

    pub fn last_committed_diffs(&self) -> &[FileDiff] {
        &self.last_committed_diffs
    }

    pub fn open_step_id(&self) -> Option<&str> {
        self.open_step.as_ref().map(|s| s.step_id.as_str())
    }
}

fn synth_diffs(staged: &[StagedChange]) -> Vec<FileDiff> {
    staged
        .iter()
        .map(|change| {
            let (kind, hunk) = match change.change_type {
                ChangeType::Create => {
                    (DiffKind::Add, String::from_utf8_lossy(change.new_content.as_deref().unwrap_or_default()).into_owned())
                }
                ChangeType::Update => (
                    DiffKind::Modify,
                    String::from_utf8_lossy(change.new_content.as_deref().unwrap_or_default()).into_owned(),
                ),
                ChangeType::Delete => (DiffKind::Delete, String::new()),
            };
            FileDiff { path: change.path.clone(), kind, hunk }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::FakeClock;
    use tempfile::tempdir;

    fn session() -> (tempfile::TempDir, FileSession<FakeClock>) {
        let dir = tempdir().unwrap();
        let ws = Arc::new(ProjectWorkspace::open(dir.path().join("proj"), FakeClock::new()).unwrap());
        let limits = SessionLimits::new(5, 10_000, 5_000, false);
        (dir, FileSession::create(ws, "run-branch", limits))
    }

    #[test]
    fn full_create_lifecycle_commits_a_single_step() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        session.stage_change(StagedChange::create("src/a.rs", b"fn main() {}".to_vec())).unwrap();
        session.validate_step().unwrap();
        session.apply_step_changes().unwrap();
        let hash = session.commit_step("run-1", "write_file", "agent-kernel").unwrap();
        assert!(!hash.is_empty());
        assert_eq!(session.last_committed_diffs().len(), 1);
    }

    #[test]
    fn create_over_existing_path_fails() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        session.stage_change(StagedChange::create("a.rs", b"one".to_vec())).unwrap();
        session.validate_step().unwrap();
        session.apply_step_changes().unwrap();
        session.commit_step("run-1", "write_file", "agent-kernel").unwrap();

        session.begin_step("step-2", 1, None).unwrap();
        let err = session.stage_change(StagedChange::create("a.rs", b"two".to_vec())).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyExists(_)));
    }

    #[test]
    fn update_with_stale_hash_is_rejected() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        session.stage_change(StagedChange::create("a.rs", b"one".to_vec())).unwrap();
        session.validate_step().unwrap();
        session.apply_step_changes().unwrap();
        session.commit_step("run-1", "write_file", "agent-kernel").unwrap();

        session.begin_step("step-2", 1, None).unwrap();
        let err = session.stage_change(StagedChange::update("a.rs", b"two".to_vec(), "stale-hash")).unwrap_err();
        assert!(matches!(err, SessionError::StaleOptimisticLock(_)));
    }

    #[test]
    fn abort_after_apply_restores_exact_prior_head() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        session.stage_change(StagedChange::create("a.rs", b"one".to_vec())).unwrap();
        session.validate_step().unwrap();
        session.apply_step_changes().unwrap();
        session.commit_step("run-1", "write_file", "agent-kernel").unwrap();

        session.begin_step("step-2", 1, None).unwrap();
        session.stage_change(StagedChange::create("b.rs", b"two".to_vec())).unwrap();
        session.validate_step().unwrap();
        session.apply_step_changes().unwrap();
        session.abort_step().unwrap();

        let result = session.workspace.read("run-branch", "b.rs").unwrap();
        assert!(!result.exists);
        let result = session.workspace.read("run-branch", "a.rs").unwrap();
        assert!(result.exists);
    }

    #[test]
    fn step_budget_rejects_too_many_files() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        for n in 0..6 {
            session.stage_change(StagedChange::create(format!("f{n}.rs"), b"x".to_vec())).unwrap();
        }
        let err = session.validate_step().unwrap_err();
        assert!(matches!(err, SessionError::StepBudgetExceeded(_)));
    }

    #[test]
    fn env_file_write_is_rejected_unless_allowed() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, None).unwrap();
        session.stage_change(StagedChange::create(".env", b"SECRET=1".to_vec())).unwrap();
        let err = session.validate_step().unwrap_err();
        assert!(matches!(err, SessionError::EnvMutationNotAllowed(_)));
    }

    #[test]
    fn correction_constraint_rejects_paths_outside_allowed_prefixes() {
        let (_dir, mut session) = session();
        session.begin_step("step-1", 0, Some(vec!["src/".to_string()])).unwrap();
        session.stage_change(StagedChange::create("other/x.rs", b"x".to_vec())).unwrap();
        let err = session.validate_step().unwrap_err();
        assert!(matches!(err, SessionError::CorrectionConstraintViolation(_)));
    }
}
