// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project entity (§3).

use super::ids::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounded recent-first history of project activity. Never grows past
/// [`HISTORY_LIMIT`] entries; oldest entries fall off the back on push.
pub const HISTORY_LIMIT: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Scaffold,
    ManualSave,
    AgentRun,
}

/// A single recorded activity entry on a project's history list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub prompt: Option<String>,
    pub summary: String,
    pub files_changed: Vec<String>,
    pub commit_hash: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub org_id: String,
    pub workspace_id: String,
    pub name: String,
    pub template_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Recent-first, bounded to [`HISTORY_LIMIT`].
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Commit hash of HEAD on the project's main branch. Always set once the
    /// project's workspace has been scaffolded.
    pub workspace_head: Option<String>,
}

impl Project {
    pub fn new(
        id: ProjectId,
        org_id: impl Into<String>,
        workspace_id: impl Into<String>,
        name: impl Into<String>,
        template_id: impl Into<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            org_id: org_id.into(),
            workspace_id: workspace_id.into(),
            name: name.into(),
            template_id: template_id.into(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            history: Vec::new(),
            workspace_head: None,
        }
    }

    /// Push a new history entry to the front, dropping the oldest entry if
    /// the list would exceed [`HISTORY_LIMIT`].
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            kind: HistoryKind::ManualSave,
            prompt: None,
            summary: format!("entry {n}"),
            files_changed: vec![],
            commit_hash: format!("hash{n}"),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_is_bounded_and_recent_first() {
        let mut project = Project::new(
            ProjectId::new(),
            "org",
            "ws",
            "name",
            "tmpl",
            "user",
            Utc::now(),
        );
        for n in 0..(HISTORY_LIMIT + 10) {
            project.push_history(entry(n));
        }
        assert_eq!(project.history.len(), HISTORY_LIMIT);
        assert_eq!(project.history[0].summary, format!("entry {}", HISTORY_LIMIT + 9));
    }
}
