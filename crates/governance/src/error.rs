// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("execution contract material is malformed: {0}")]
    MalformedContractMaterial(serde_json::Error),

    #[error("failed to hash governance decision: {0}")]
    Hashing(serde_json::Error),
}
