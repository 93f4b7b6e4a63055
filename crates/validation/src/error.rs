// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to read workspace layer config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed layer config: {0}")]
    Malformed(#[from] serde_json::Error),
}
