// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Kernel (§4.5, §4.7): the six entry points external collaborators
//! call (`queueRun`, `queueResumeRun`, `forkRun`, `cancelRun`,
//! `getRunWithSteps`, `validateRunOutput`) and the execute loop a worker
//! drives a claimed run job through. Everything else (planning, tool
//! invocation, the file-session transaction layer, the content store) is
//! held behind a trait or a collaborator crate; this crate only sequences
//! them per the execution contract.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
mod execute;
mod kernel;
pub mod tool;
pub mod types;

pub use error::KernelError;
pub use kernel::{AgentKernel, KernelConfig};
pub use tool::{ToolError, ToolRunner};
pub use types::{
    ForkRunOutput, ForkStepId, QueueResumeRunInput, QueueResumeRunOutput, QueueRunInput, QueueRunOutput,
    RunWithSteps, ValidateRunOutputResult,
};
