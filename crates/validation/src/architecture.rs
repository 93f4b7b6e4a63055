// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `architecture` check (§4.6): layer-dependency enforcement, missing
//! import targets, dependency cycles, and per-layer test-contract coverage
//! over a scaffolded project's `src/` tree.

use crate::check::Check;
use crate::imports::extract_relative_imports;
use crate::layers::LayerConfig;
use agentkernel_core::model::{CheckStatus, ValidationCheckResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

#[derive(Debug, Clone, Serialize)]
pub struct ArchitectureViolation {
    pub rule_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ArchitectureViolation {
    fn new(rule_id: &str, message: impl Into<String>, path: Option<String>) -> Self {
        Self { rule_id: rule_id.to_string(), message: message.into(), path }
    }
}

pub struct ArchitectureCheck;

#[async_trait]
impl Check for ArchitectureCheck {
    fn id(&self) -> &'static str {
        "architecture"
    }

    async fn run(&self, workspace: &Path) -> ValidationCheckResult {
        let config = match LayerConfig::load(workspace) {
            Ok(Some(config)) => config,
            Ok(None) => {
                return ValidationCheckResult {
                    id: self.id().to_string(),
                    status: CheckStatus::Skip,
                    message: "no layer config; architecture check skipped".to_string(),
                    details: None,
                }
            }
            Err(err) => {
                return ValidationCheckResult {
                    id: self.id().to_string(),
                    status: CheckStatus::Fail,
                    message: format!("could not read layer config: {err}"),
                    details: None,
                }
            }
        };

        let violations = check_architecture(workspace, &config);
        let status = if violations.is_empty() { CheckStatus::Pass } else { CheckStatus::Fail };
        let message = if violations.is_empty() {
            "architecture check passed".to_string()
        } else {
            format!("{} architecture violation(s)", violations.len())
        };
        ValidationCheckResult {
            id: self.id().to_string(),
            status,
            message,
            details: Some(json!({ "violations": violations })),
        }
    }
}

fn check_architecture(workspace: &Path, config: &LayerConfig) -> Vec<ArchitectureViolation> {
    let mut violations = Vec::new();
    let src = workspace.join("src");

    for layer in config.layers.keys() {
        if !src.join(layer).is_dir() {
            violations.push(ArchitectureViolation::new(
                "STRUCTURE.MISSING_LAYER",
                format!("layer '{layer}' declared but src/{layer} does not exist"),
                Some(format!("src/{layer}")),
            ));
        }
    }

    let mut source_files = Vec::new();
    walk_source_files(&src, &mut source_files);

    let mut layer_edges: BTreeSet<(String, String)> = BTreeSet::new();
    let mut files_per_layer: BTreeMap<String, u32> = BTreeMap::new();

    for file in &source_files {
        let rel = file.strip_prefix(&src).unwrap_or(file);
        let Some(layer) = rel.components().next().and_then(|c| c.as_os_str().to_str()) else {
            continue;
        };
        *files_per_layer.entry(layer.to_string()).or_insert(0) += 1;

        let Ok(source) = std::fs::read_to_string(file) else { continue };
        for specifier in extract_relative_imports(&source) {
            let Some(target) = resolve_relative(file, &specifier) else { continue };
            let Ok(target_rel) = target.strip_prefix(&src) else { continue };
            let Some(target_layer) = target_rel.components().next().and_then(|c| c.as_os_str().to_str()) else {
                continue;
            };

            if !target_exists(&target) {
                violations.push(ArchitectureViolation::new(
                    "IMPORT.MISSING_TARGET",
                    format!("{} imports '{}' which does not resolve to a file", rel.display(), specifier),
                    Some(rel.display().to_string()),
                ));
                continue;
            }

            if target_layer != layer {
                layer_edges.insert((layer.to_string(), target_layer.to_string()));
                if !config.may_depend_on(layer, target_layer) {
                    violations.push(ArchitectureViolation::new(
                        "ARCH.LAYER_VIOLATION",
                        format!("{layer} (in {}) may not depend on {target_layer}", rel.display()),
                        Some(rel.display().to_string()),
                    ));
                }
            }
        }
    }

    if let Some(cycle) = find_cycle(&layer_edges) {
        violations.push(ArchitectureViolation::new(
            "GRAPH.CYCLE",
            format!("layer dependency cycle: {}", cycle.join(" -> ")),
            None,
        ));
    }

    let has_tests = workspace.join("tests").is_dir() || workspace.join("__tests__").is_dir();
    if !has_tests && !files_per_layer.is_empty() {
        violations.push(ArchitectureViolation::new(
            "TEST.CONTRACT_MISSING_TESTS",
            "project has source files under src/ but no tests/ or __tests__/ directory",
            None,
        ));
    }

    violations
}

fn walk_source_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_source_files(&path, out);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
}

fn resolve_relative(from_file: &Path, specifier: &str) -> Option<PathBuf> {
    let base = from_file.parent()?;
    Some(normalize(&base.join(specifier)))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// A specifier resolves if the exact path exists, or if adding a source
/// extension or `/index.<ext>` does.
fn target_exists(target: &Path) -> bool {
    if target.is_file() {
        return true;
    }
    for ext in SOURCE_EXTENSIONS {
        if target.with_extension(ext).is_file() {
            return true;
        }
        if target.join(format!("index.{ext}")).is_file() {
            return true;
        }
    }
    false
}

fn find_cycle(edges: &BTreeSet<(String, String)>) -> Option<Vec<String>> {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, to) in edges {
        adjacency.entry(from.as_str()).or_default().push(to.as_str());
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

    fn visit<'a>(
        node: &'a str,
        adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
        marks: &mut BTreeMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        stack.push(node);
        if let Some(targets) = adjacency.get(node) {
            for target in targets {
                if let Some(cycle) = visit(target, adjacency, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut stack = Vec::new();
    for node in adjacency.keys() {
        if let Some(cycle) = visit(node, &adjacency, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn passes_clean_layered_project() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "architecture.layers.json",
            r#"{"layers": {"domain": [], "application": ["domain"]}}"#,
        );
        write(dir.path(), "src/domain/user.ts", "export class User {}");
        write(
            dir.path(),
            "src/application/userService.ts",
            "import { User } from '../domain/user';",
        );
        write(dir.path(), "tests/user.test.ts", "test('noop', () => {});");

        let result = ArchitectureCheck.run(dir.path()).await;
        assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
    }

    #[tokio::test]
    async fn flags_reverse_layer_dependency() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "architecture.layers.json",
            r#"{"layers": {"domain": [], "application": ["domain"]}}"#,
        );
        write(dir.path(), "src/domain/user.ts", "import '../application/userService';");
        write(dir.path(), "src/application/userService.ts", "export const svc = {};");
        write(dir.path(), "tests/user.test.ts", "test('noop', () => {});");

        let result = ArchitectureCheck.run(dir.path()).await;
        assert_eq!(result.status, CheckStatus::Fail);
        let violations = result.details.unwrap()["violations"].clone();
        let rule_ids: Vec<String> =
            violations.as_array().unwrap().iter().map(|v| v["rule_id"].as_str().unwrap().to_string()).collect();
        assert!(rule_ids.contains(&"ARCH.LAYER_VIOLATION".to_string()));
    }

    #[tokio::test]
    async fn flags_missing_import_target() {
        let dir = tempdir().unwrap();
        write(dir.path(), "architecture.layers.json", r#"{"layers": {"domain": []}}"#);
        write(dir.path(), "src/domain/user.ts", "import { X } from './missing';");
        write(dir.path(), "tests/user.test.ts", "test('noop', () => {});");

        let result = ArchitectureCheck.run(dir.path()).await;
        assert_eq!(result.status, CheckStatus::Fail);
        let violations = result.details.unwrap()["violations"].clone();
        let rule_ids: Vec<String> =
            violations.as_array().unwrap().iter().map(|v| v["rule_id"].as_str().unwrap().to_string()).collect();
        assert!(rule_ids.contains(&"IMPORT.MISSING_TARGET".to_string()));
    }

    #[tokio::test]
    async fn skips_when_no_layer_config_present() {
        let dir = tempdir().unwrap();
        let result = ArchitectureCheck.run(dir.path()).await;
        assert_eq!(result.status, CheckStatus::Skip);
    }

    #[test]
    fn detects_a_two_node_cycle() {
        let mut edges = BTreeSet::new();
        edges.insert(("a".to_string(), "b".to_string()));
        edges.insert(("b".to_string(), "a".to_string()));
        assert!(find_cycle(&edges).is_some());
    }

    #[test]
    fn acyclic_graph_has_no_cycle() {
        let mut edges = BTreeSet::new();
        edges.insert(("a".to_string(), "b".to_string()));
        edges.insert(("b".to_string(), "c".to_string()));
        assert!(find_cycle(&edges).is_none());
    }
}
