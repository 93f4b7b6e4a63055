// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation report types (§3, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

crate::simple_display! {
    CheckStatus {
        Pass => "pass",
        Fail => "fail",
        Skip => "skip",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheckResult {
    pub id: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationCheckResult {
    pub fn is_blocking_failure(&self) -> bool {
        matches!(self.status, CheckStatus::Fail)
    }
}

/// Result of running the validation pipeline (§4.6) against a run's
/// worktree at `current_commit_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub blocking_count: u32,
    pub warning_count: u32,
    pub summary: String,
    pub checks: Vec<ValidationCheckResult>,
}

impl ValidationReport {
    /// Fold a list of check results into an aggregate report. A report is
    /// `ok` iff no check is `Fail`; `Skip` never blocks.
    pub fn from_checks(checks: Vec<ValidationCheckResult>) -> Self {
        let blocking_count = checks.iter().filter(|c| c.is_blocking_failure()).count() as u32;
        let warning_count = checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::Skip))
            .count() as u32;
        let ok = blocking_count == 0;
        let summary = if ok {
            format!("{} checks passed", checks.len())
        } else {
            format!("{blocking_count} of {} checks failed", checks.len())
        };
        Self {
            ok,
            blocking_count,
            warning_count,
            summary,
            checks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum V1Verdict {
    Ready,
    NotReady,
}

/// The optional stricter "is this genuinely shippable" gate layered on top
/// of [`ValidationReport`] (§4.6 "Optional V1-ready report"). Distinct from
/// the ordinary report: a run can pass ordinary validation while failing
/// this gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V1ReadyReport {
    pub ok: bool,
    pub verdict: V1Verdict,
    pub checks: Vec<ValidationCheckResult>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: CheckStatus) -> ValidationCheckResult {
        ValidationCheckResult {
            id: "chk".into(),
            status,
            message: String::new(),
            details: None,
        }
    }

    #[test]
    fn report_is_ok_when_no_check_fails() {
        let report = ValidationReport::from_checks(vec![check(CheckStatus::Pass), check(CheckStatus::Skip)]);
        assert!(report.ok);
        assert_eq!(report.blocking_count, 0);
        assert_eq!(report.warning_count, 1);
    }

    #[test]
    fn report_is_blocked_by_any_failure() {
        let report = ValidationReport::from_checks(vec![check(CheckStatus::Pass), check(CheckStatus::Fail)]);
        assert!(!report.ok);
        assert_eq!(report.blocking_count, 1);
    }
}
