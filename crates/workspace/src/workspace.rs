// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project content-addressed filesystem with branches (§4.1).
//!
//! On disk, a project's workspace root looks like:
//!
//! ```text
//! <root>/
//!   worktrees/<branch>/...      # live working tree for each branch
//!   objects/blobs/<sha256>      # raw file contents, content-addressed
//!   objects/commits/<sha256>    # JSON-encoded Commit objects
//!   refs/<branch>               # commit hash the branch currently points at
//! ```
//!
//! `write` only ever touches `worktrees/<branch>`; `commit` is what
//! snapshots a worktree into the object store and advances the branch ref.

use crate::diffing::line_diff;
use crate::error::WorkspaceError;
use crate::object::{blob_hash, Commit, CommitLogEntry, DiffKind, FileDiff, Tree};
use crate::path;
use agentkernel_core::Clock;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ReadResult {
    pub exists: bool,
    pub content: Option<Vec<u8>>,
    pub content_hash: Option<String>,
}

pub struct StatResult {
    pub exists: bool,
    pub size: u64,
    pub mode: u32,
}

pub struct ProjectWorkspace<C: Clock> {
    root: PathBuf,
    clock: C,
}

impl<C: Clock> ProjectWorkspace<C> {
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, WorkspaceError> {
        let root = root.into();
        fs::create_dir_all(root.join("worktrees"))?;
        fs::create_dir_all(root.join("objects").join("blobs"))?;
        fs::create_dir_all(root.join("objects").join("commits"))?;
        fs::create_dir_all(root.join("refs"))?;
        Ok(Self { root, clock })
    }

    fn worktree_dir(&self, branch: &str) -> PathBuf {
        self.root.join("worktrees").join(branch)
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.root.join("objects").join("blobs").join(hash)
    }

    fn commit_path(&self, hash: &str) -> PathBuf {
        self.root.join("objects").join("commits").join(hash)
    }

    fn ref_path(&self, branch: &str) -> PathBuf {
        self.root.join("refs").join(branch)
    }

    // -- Reads ---------------------------------------------------------------

    pub fn read(&self, branch: &str, file_path: &str) -> Result<ReadResult, WorkspaceError> {
        let resolved = path::resolve(&self.worktree_dir(branch), file_path)?;
        if !resolved.is_file() {
            return Ok(ReadResult { exists: false, content: None, content_hash: None });
        }
        let content = fs::read(&resolved)?;
        let content_hash = blob_hash(&content);
        Ok(ReadResult { exists: true, content: Some(content), content_hash: Some(content_hash) })
    }

    pub fn write(&self, branch: &str, file_path: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let resolved = path::resolve(&self.worktree_dir(branch), file_path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&resolved, content)?;
        Ok(())
    }

    /// Remove a tracked file from the branch's working tree. Not part of
    /// the read/write/stat/list surface spelled out for callers, but the
    /// primitive the File Session needs to apply a staged `delete` change.
    pub fn remove(&self, branch: &str, file_path: &str) -> Result<(), WorkspaceError> {
        let resolved = path::resolve(&self.worktree_dir(branch), file_path)?;
        if resolved.is_file() {
            fs::remove_file(&resolved)?;
        }
        Ok(())
    }

    /// Wipe a branch's working tree back to empty, without touching its
    /// ref. Used by the File Session to abort a step opened before the
    /// branch had any commits at all (so there is no prior HEAD to reset
    /// to).
    pub fn clear(&self, branch: &str) -> Result<(), WorkspaceError> {
        let worktree = self.worktree_dir(branch);
        if worktree.exists() {
            fs::remove_dir_all(&worktree)?;
        }
        fs::create_dir_all(&worktree)?;
        Ok(())
    }

    pub fn stat(&self, branch: &str, file_path: &str) -> Result<StatResult, WorkspaceError> {
        let resolved = path::resolve(&self.worktree_dir(branch), file_path)?;
        match fs::metadata(&resolved) {
            Ok(meta) => Ok(StatResult { exists: true, size: meta.len(), mode: file_mode(&meta) }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(StatResult { exists: false, size: 0, mode: 0 })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn list(&self, branch: &str, prefix: &str) -> Result<Vec<String>, WorkspaceError> {
        let root = self.worktree_dir(branch);
        let mut paths = Vec::new();
        if root.is_dir() {
            walk(&root, &root, &mut paths)?;
        }
        paths.retain(|p| p.starts_with(prefix));
        paths.sort();
        Ok(paths)
    }

    // -- Commits ---------------------------------------------------------------

    pub fn commit(&self, branch: &str, subject: &str, author: &str) -> Result<String, WorkspaceError> {
        let worktree = self.worktree_dir(branch);
        let mut tree = Tree::new();
        if worktree.is_dir() {
            let mut paths = Vec::new();
            walk(&worktree, &worktree, &mut paths)?;
            for rel in paths {
                let content = fs::read(worktree.join(&rel))?;
                let hash = blob_hash(&content);
                self.write_blob(&hash, &content)?;
                tree.insert(rel, hash);
            }
        }

        let parent = self.branch_head(branch).ok();
        if let Some(parent_hash) = &parent {
            let parent_commit = self.load_commit(parent_hash)?;
            if parent_commit.tree == tree {
                tracing::warn!(branch, parent = %parent_hash, "commit rejected: no staged changes");
                return Err(WorkspaceError::EmptyCommit);
            }
        }

        let commit = Commit {
            parent,
            tree,
            subject: subject.to_string(),
            author: author.to_string(),
            timestamp: self.clock.now(),
        };
        let hash = commit.hash();
        self.write_commit(&hash, &commit)?;
        self.set_branch_head(branch, &hash)?;
        Ok(hash)
    }

    pub fn branch_from(&self, name: &str, commit_hash: &str) -> Result<(), WorkspaceError> {
        let commit = self.load_commit(commit_hash)?;
        let worktree = self.worktree_dir(name);
        if worktree.exists() {
            fs::remove_dir_all(&worktree)?;
        }
        fs::create_dir_all(&worktree)?;
        self.materialize(&worktree, &commit.tree)?;
        self.set_branch_head(name, commit_hash)?;
        Ok(())
    }

    pub fn branch_head(&self, branch: &str) -> Result<String, WorkspaceError> {
        let path = self.ref_path(branch);
        if !path.is_file() {
            return Err(WorkspaceError::BranchNotFound(branch.to_string()));
        }
        Ok(fs::read_to_string(path)?.trim().to_string())
    }

    pub fn reset_hard(&self, branch: &str, commit_hash: &str) -> Result<(), WorkspaceError> {
        tracing::warn!(branch, commit = %commit_hash, "resetting branch worktree, discarding uncommitted changes");
        let commit = self.load_commit(commit_hash)?;
        let worktree = self.worktree_dir(branch);
        if worktree.exists() {
            fs::remove_dir_all(&worktree)?;
        }
        fs::create_dir_all(&worktree)?;
        self.materialize(&worktree, &commit.tree)?;
        self.set_branch_head(branch, commit_hash)?;
        Ok(())
    }

    pub fn list_commits(&self, branch: &str, limit: usize) -> Result<Vec<CommitLogEntry>, WorkspaceError> {
        let mut out = Vec::new();
        let mut cursor = self.branch_head(branch).ok();
        while let Some(hash) = cursor {
            if out.len() >= limit {
                break;
            }
            let commit = self.load_commit(&hash)?;
            out.push(CommitLogEntry {
                hash: hash.clone(),
                subject: commit.subject.clone(),
                author: commit.author.clone(),
                timestamp: commit.timestamp,
            });
            cursor = commit.parent;
        }
        Ok(out)
    }

    pub fn diff(&self, from: &str, to: &str) -> Result<Vec<FileDiff>, WorkspaceError> {
        let from_tree = self.load_commit(from)?.tree;
        let to_tree = self.load_commit(to)?.tree;

        let mut paths: Vec<&String> = from_tree.keys().chain(to_tree.keys()).collect();
        paths.sort();
        paths.dedup();

        let mut diffs = Vec::new();
        for path in paths {
            match (from_tree.get(path), to_tree.get(path)) {
                (None, Some(new_hash)) => {
                    let content = self.read_blob(new_hash)?;
                    diffs.push(FileDiff {
                        path: path.clone(),
                        kind: DiffKind::Add,
                        hunk: String::from_utf8_lossy(&content).into_owned(),
                    });
                }
                (Some(old_hash), None) => {
                    let content = self.read_blob(old_hash)?;
                    diffs.push(FileDiff {
                        path: path.clone(),
                        kind: DiffKind::Delete,
                        hunk: String::from_utf8_lossy(&content).into_owned(),
                    });
                }
                (Some(old_hash), Some(new_hash)) if old_hash != new_hash => {
                    let old_content = self.read_blob(old_hash)?;
                    let new_content = self.read_blob(new_hash)?;
                    let hunk = line_diff(
                        &String::from_utf8_lossy(&old_content),
                        &String::from_utf8_lossy(&new_content),
                    );
                    diffs.push(FileDiff { path: path.clone(), kind: DiffKind::Modify, hunk });
                }
                _ => {}
            }
        }
        Ok(diffs)
    }

    // -- Object store plumbing --------------------------------------------------

    fn write_blob(&self, hash: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let path = self.blob_path(hash);
        if !path.exists() {
            fs::write(path, content)?;
        }
        Ok(())
    }

    fn read_blob(&self, hash: &str) -> Result<Vec<u8>, WorkspaceError> {
        fs::read(self.blob_path(hash)).map_err(WorkspaceError::Io)
    }

    fn write_commit(&self, hash: &str, commit: &Commit) -> Result<(), WorkspaceError> {
        let path = self.commit_path(hash);
        if !path.exists() {
            fs::write(path, serde_json::to_vec(commit)?)?;
        }
        Ok(())
    }

    fn load_commit(&self, hash: &str) -> Result<Commit, WorkspaceError> {
        let path = self.commit_path(hash);
        if !path.is_file() {
            return Err(WorkspaceError::CommitNotFound(hash.to_string()));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    fn set_branch_head(&self, branch: &str, hash: &str) -> Result<(), WorkspaceError> {
        fs::write(self.ref_path(branch), hash)?;
        Ok(())
    }

    fn materialize(&self, worktree: &Path, tree: &Tree) -> Result<(), WorkspaceError> {
        for (rel, hash) in tree {
            let content = self.read_blob(hash)?;
            let dest = worktree.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(dest, content)?;
        }
        Ok(())
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), WorkspaceError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(root, &entry.path(), out)?;
        } else if file_type.is_file() {
            let rel = entry.path().strip_prefix(root).unwrap_or(&entry.path()).to_path_buf();
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    0o644
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkernel_core::FakeClock;
    use tempfile::tempdir;

    fn workspace() -> (tempfile::TempDir, ProjectWorkspace<FakeClock>) {
        let dir = tempdir().unwrap();
        let ws = ProjectWorkspace::open(dir.path().join("proj"), FakeClock::new()).unwrap();
        (dir, ws)
    }

    #[test]
    fn write_then_read_round_trips_content() {
        let (_dir, ws) = workspace();
        ws.write("main", "src/a.txt", b"hello").unwrap();
        let result = ws.read("main", "src/a.txt").unwrap();
        assert!(result.exists);
        assert_eq!(result.content.unwrap(), b"hello");
    }

    #[test]
    fn read_of_missing_file_reports_not_exists() {
        let (_dir, ws) = workspace();
        let result = ws.read("main", "nope.txt").unwrap();
        assert!(!result.exists);
    }

    #[test]
    fn commit_with_no_staged_changes_against_parent_is_empty() {
        let (_dir, ws) = workspace();
        ws.write("main", "a.txt", b"1").unwrap();
        ws.commit("main", "first", "tester").unwrap();
        let err = ws.commit("main", "second", "tester").unwrap_err();
        assert!(matches!(err, WorkspaceError::EmptyCommit));
    }

    #[test]
    fn branch_from_materializes_the_source_commit_tree() {
        let (_dir, ws) = workspace();
        ws.write("main", "a.txt", b"1").unwrap();
        let hash = ws.commit("main", "first", "tester").unwrap();

        ws.branch_from("run-1", &hash).unwrap();
        let result = ws.read("run-1", "a.txt").unwrap();
        assert_eq!(result.content.unwrap(), b"1");
    }

    #[test]
    fn reset_hard_discards_uncommitted_changes() {
        let (_dir, ws) = workspace();
        ws.write("main", "a.txt", b"1").unwrap();
        let hash = ws.commit("main", "first", "tester").unwrap();
        ws.write("main", "a.txt", b"uncommitted").unwrap();

        ws.reset_hard("main", &hash).unwrap();
        let result = ws.read("main", "a.txt").unwrap();
        assert_eq!(result.content.unwrap(), b"1");
    }

    #[test]
    fn list_commits_is_recent_first() {
        let (_dir, ws) = workspace();
        ws.write("main", "a.txt", b"1").unwrap();
        let first = ws.commit("main", "first", "tester").unwrap();
        ws.write("main", "a.txt", b"2").unwrap();
        let second = ws.commit("main", "second", "tester").unwrap();

        let log = ws.list_commits("main", 10).unwrap();
        assert_eq!(log[0].hash, second);
        assert_eq!(log[1].hash, first);
    }

    #[test]
    fn diff_reports_add_modify_delete() {
        let (_dir, ws) = workspace();
        ws.write("main", "keep.txt", b"same").unwrap();
        ws.write("main", "gone.txt", b"bye").unwrap();
        let from = ws.commit("main", "first", "tester").unwrap();

        ws.remove("main", "gone.txt").unwrap();
        ws.write("main", "keep.txt", b"same").unwrap();
        ws.write("main", "new.txt", b"fresh").unwrap();
        let to = ws.commit("main", "second", "tester").unwrap();

        let mut diffs = ws.diff(&from, &to).unwrap();
        diffs.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].path, "gone.txt");
        assert!(matches!(diffs[0].kind, DiffKind::Delete));
        assert_eq!(diffs[1].path, "new.txt");
        assert!(matches!(diffs[1].kind, DiffKind::Add));
    }

    #[test]
    fn list_filters_by_prefix_and_is_sorted() {
        let (_dir, ws) = workspace();
        ws.write("main", "src/b.rs", b"").unwrap();
        ws.write("main", "src/a.rs", b"").unwrap();
        ws.write("main", "README.md", b"").unwrap();

        let listed = ws.list("main", "src/").unwrap();
        assert_eq!(listed, vec!["src/a.rs".to_string(), "src/b.rs".to_string()]);
    }

    #[test]
    fn path_escape_is_rejected_through_the_workspace_api() {
        let (_dir, ws) = workspace();
        let err = ws.write("main", "../escape.txt", b"x").unwrap_err();
        assert!(matches!(err, WorkspaceError::PathEscape(_)));
    }
}
