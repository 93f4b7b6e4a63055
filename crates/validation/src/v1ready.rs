// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The optional, stricter V1-ready gate (§4.6): a named subset of checks
//! (bootable container, public endpoint responds, seed check) whose verdict
//! is `YES` iff every one of them passed.

use crate::check::Check;
use agentkernel_core::clock::Clock;
use agentkernel_core::model::{CheckStatus, V1ReadyReport, V1Verdict};
use std::path::Path;

pub async fn run_v1_ready<C: Clock>(checks: &[Box<dyn Check>], workspace: &Path, clock: &C) -> V1ReadyReport {
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        results.push(check.run(workspace).await);
    }
    let ok = results.iter().all(|r| !matches!(r.status, CheckStatus::Fail));
    let verdict = if ok { V1Verdict::Ready } else { V1Verdict::NotReady };
    V1ReadyReport { ok, verdict, checks: results, generated_at: clock.now() }
}
