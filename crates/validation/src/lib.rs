// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation Pipeline (§4.6): architecture/typecheck/build/tests/runtime
//! checks folded into a [`agentkernel_core::model::ValidationReport`], plus
//! the optional stricter V1-ready gate.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod architecture;
pub mod check;
pub mod error;
pub mod imports;
pub mod layers;
pub mod pipeline;
pub mod v1ready;

pub use architecture::{ArchitectureCheck, ArchitectureViolation};
pub use check::Check;
pub use error::ValidationError;
pub use layers::LayerConfig;
pub use pipeline::ValidationPipeline;
pub use v1ready::run_v1_ready;
