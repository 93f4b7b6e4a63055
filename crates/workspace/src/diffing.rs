// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal textual diff for `ProjectWorkspace::diff`. Trims the common
//! prefix and suffix of matching lines and renders the remaining middle
//! section unified-diff style. Not intended to produce minimal hunks the
//! way a full LCS diff would; good enough for human-readable change
//! previews and for corrective-step context.

pub fn line_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut prefix = 0;
    while prefix < old_lines.len() && prefix < new_lines.len() && old_lines[prefix] == new_lines[prefix] {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < old_lines.len() - prefix
        && suffix < new_lines.len() - prefix
        && old_lines[old_lines.len() - 1 - suffix] == new_lines[new_lines.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let mut out = String::new();
    for line in &old_lines[prefix..old_lines.len() - suffix] {
        out.push('-');
        out.push_str(line);
        out.push('\n');
    }
    for line in &new_lines[prefix..new_lines.len() - suffix] {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_produces_empty_hunk() {
        assert_eq!(line_diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn single_line_change_is_isolated() {
        let hunk = line_diff("a\nb\nc\n", "a\nX\nc\n");
        assert_eq!(hunk, "-b\n+X\n");
    }

    #[test]
    fn pure_append_has_no_removed_lines() {
        let hunk = line_diff("a\n", "a\nb\n");
        assert_eq!(hunk, "+b\n");
    }
}
