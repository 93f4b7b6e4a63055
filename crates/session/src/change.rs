// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staged change description passed to [`crate::session::FileSession::stage_change`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub struct StagedChange {
    pub path: String,
    pub change_type: ChangeType,
    pub new_content: Option<Vec<u8>>,
    pub old_content_hash: Option<String>,
}

impl StagedChange {
    pub fn create(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self { path: path.into(), change_type: ChangeType::Create, new_content: Some(content), old_content_hash: None }
    }

    pub fn update(path: impl Into<String>, content: Vec<u8>, old_content_hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change_type: ChangeType::Update,
            new_content: Some(content),
            old_content_hash: Some(old_content_hash.into()),
        }
    }

    pub fn delete(path: impl Into<String>, old_content_hash: Option<String>) -> Self {
        Self { path: path.into(), change_type: ChangeType::Delete, new_content: None, old_content_hash }
    }
}
