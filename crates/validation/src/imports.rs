// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relative-import extraction over JS/TS source text, used by the
//! architecture check to build its dependency graph (§4.6).

use regex::Regex;
use std::sync::OnceLock;

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:import\s+(?:[^'"]*?\s+from\s+)?|require\()\s*['"](\.{1,2}/[^'"]+)['"]"#)
            .expect("static import regex is valid")
    })
}

/// Every relative import specifier (`./x`, `../y/z`) referenced in `source`,
/// in source order. Absolute and bare (package) specifiers are ignored —
/// only intra-project edges matter for layer enforcement.
pub fn extract_relative_imports(source: &str) -> Vec<String> {
    import_pattern()
        .captures_iter(source)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_import_and_require_specifiers() {
        let source = r#"
            import { foo } from '../domain/foo';
            import './side-effect';
            const bar = require("./bar");
            import pkg from 'lodash';
        "#;
        let imports = extract_relative_imports(source);
        assert_eq!(imports, vec!["../domain/foo", "./side-effect", "./bar"]);
    }

    #[test]
    fn ignores_bare_package_specifiers() {
        assert!(extract_relative_imports("import x from 'react'").is_empty());
    }
}
