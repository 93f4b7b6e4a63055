// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs the configured [`Check`]s against a workspace and folds their
//! results into a [`ValidationReport`] (§4.6 "Summary semantics").

use crate::check::Check;
use agentkernel_core::model::ValidationReport;
use std::path::Path;

pub struct ValidationPipeline {
    checks: Vec<Box<dyn Check>>,
}

impl ValidationPipeline {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    pub async fn run(&self, workspace: &Path) -> ValidationReport {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let result = check.run(workspace).await;
            tracing::info!(check = check.id(), status = %result.status, "validation check completed");
            results.push(result);
        }
        ValidationReport::from_checks(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::ArchitectureCheck;
    use tempfile::tempdir;

    #[tokio::test]
    async fn empty_project_without_layer_config_passes_via_skip() {
        let dir = tempdir().unwrap();
        let pipeline = ValidationPipeline::new(vec![Box::new(ArchitectureCheck)]);
        let report = pipeline.run(dir.path()).await;
        assert!(report.ok);
        assert_eq!(report.checks.len(), 1);
    }
}
