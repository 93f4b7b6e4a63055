// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String heuristics over a failed step's tail runtime logs (§4.7).

use regex::Regex;
use std::sync::OnceLock;

fn module_not_found_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"Cannot find module '([^']+)'|ERR_MODULE_NOT_FOUND"#).expect("static regex is valid")
    })
}

fn stack_frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"at .*\(([^():]+):\d+:\d+\)"#).expect("static regex is valid"))
}

fn middleware_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(app\.use|router\.use|middleware).{0,40}(is not a function|is not defined|undefined)"#)
            .expect("static regex is valid")
    })
}

/// `Cannot find module 'X'` or `ERR_MODULE_NOT_FOUND` (§4.7 rule 3). Returns
/// the files implicated by nearby stack frames and the missing specifiers.
pub fn find_import_resolution_errors(logs: &str) -> (Vec<String>, Vec<String>) {
    let mut imports = Vec::new();
    for cap in module_not_found_pattern().captures_iter(logs) {
        if let Some(module) = cap.get(1) {
            imports.push(module.as_str().to_string());
        }
    }
    let mut files = Vec::new();
    for cap in stack_frame_pattern().captures_iter(logs) {
        files.push(cap[1].to_string());
    }
    files.sort();
    files.dedup();
    imports.sort();
    imports.dedup();
    (files, imports)
}

/// Middleware-API runtime symptom heuristic (§4.7 rule 2): an error
/// referencing `app.use`/`router.use`/"middleware" paired with a
/// not-a-function or undefined symptom.
pub fn find_middleware_api_symptoms(logs: &str) -> bool {
    middleware_pattern().is_match(logs)
}
