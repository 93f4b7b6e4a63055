// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The layer-dependency config the architecture check enforces. Scaffolded
//! projects declare their own layers under `src/`; a project without this
//! file opts out of the architecture check entirely (it's skipped, not
//! failed).

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const LAYER_CONFIG_FILE: &str = "architecture.layers.json";

/// Maps each layer (a top-level directory under `src/`) to the set of
/// other layers it is allowed to import from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub layers: BTreeMap<String, Vec<String>>,
}

impl LayerConfig {
    /// Reads `architecture.layers.json` from the workspace root. `Ok(None)`
    /// when the project doesn't define one.
    pub fn load(workspace: &Path) -> Result<Option<Self>, ValidationError> {
        let path = workspace.join(LAYER_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn may_depend_on(&self, from: &str, to: &str) -> bool {
        from == to
            || self
                .layers
                .get(from)
                .map(|allowed| allowed.iter().any(|l| l == to))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_file_yields_none() {
        let dir = tempdir().unwrap();
        assert!(LayerConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn loads_and_answers_dependency_queries() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(LAYER_CONFIG_FILE),
            r#"{"layers": {"domain": [], "application": ["domain"]}}"#,
        )
        .unwrap();
        let config = LayerConfig::load(dir.path()).unwrap().unwrap();
        assert!(config.may_depend_on("application", "domain"));
        assert!(!config.may_depend_on("domain", "application"));
        assert!(config.may_depend_on("domain", "domain"));
    }
}
