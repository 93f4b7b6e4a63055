// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correction Planner (§4.7): classifies a validation failure into a
//! `CorrectionProfile`, selects the intent that bounds the corrective step,
//! and evaluates the correction policy rules after each attempt.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod classifier;
pub mod intent;
pub mod policy;
pub mod runtime_logs;

pub use classifier::classify;
pub use intent::select_intent;
pub use policy::{evaluate, PolicyEvaluation};
