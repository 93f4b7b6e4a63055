// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed object model: blobs keyed by SHA-256 of their raw
//! bytes, and commits that snapshot a branch's full path -> blob hash
//! tree. Simplified relative to a real git object store (no separate
//! tree objects, no packfiles, no delta compression) since the kernel
//! only needs branch/commit/diff semantics, not interoperability with
//! an actual git client.

use agentkernel_core::canonical::{canonical_hash, hash_bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SHA-256 hex digest of `content`.
pub fn blob_hash(content: &[u8]) -> String {
    hash_bytes(content)
}

/// A commit's tree: every tracked path mapped to its blob hash, sorted
/// for deterministic iteration and diffing.
pub type Tree = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub parent: Option<String>,
    pub tree: Tree,
    pub subject: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

impl Commit {
    /// The commit hash: SHA-256 over the canonical JSON encoding of every
    /// field above (including `timestamp`, so two commits with identical
    /// trees and subjects at different times still hash distinctly).
    pub fn hash(&self) -> String {
        canonical_hash(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Add,
    Modify,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub kind: DiffKind,
    pub hunk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitLogEntry {
    pub hash: String,
    pub subject: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_hash_is_deterministic_and_content_addressed() {
        assert_eq!(blob_hash(b"hello"), blob_hash(b"hello"));
        assert_ne!(blob_hash(b"hello"), blob_hash(b"world"));
    }

    #[test]
    fn commit_hash_changes_with_timestamp() {
        let mut tree = Tree::new();
        tree.insert("a.txt".to_string(), blob_hash(b"a"));
        let c1 = Commit {
            parent: None,
            tree: tree.clone(),
            subject: "s".to_string(),
            author: "a".to_string(),
            timestamp: DateTime::from_timestamp(1, 0).unwrap(),
        };
        let c2 = Commit { timestamp: DateTime::from_timestamp(2, 0).unwrap(), ..c1.clone() };
        assert_ne!(c1.hash(), c2.hash());
    }
}
