//! Deterministic built-in formatter
//!
//! Used when no external tool is available or all of them fail. The pass is
//! pure whitespace normalization and must be idempotent: formatting already
//! formatted source produces no further changes.

use regex::Regex;
use std::sync::LazyLock;

static BRACE_AFTER_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)[ \t]*\{").unwrap_or_else(|e| panic!("invalid regex: {e}")));

/// Normalizes whitespace: tabs become spaces, trailing whitespace is
/// trimmed, blank-line runs collapse to one, `){` gets a single space, and
/// the output ends with exactly one newline.
#[must_use]
pub fn basic_format(code: &str, indent_width: u8) -> String {
    let indent = " ".repeat(indent_width.max(1) as usize);
    let mut lines: Vec<String> = code
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(|line| {
            let line = line.replace('\t', &indent);
            let line = BRACE_AFTER_PAREN.replace_all(&line, ") {");
            line.trim_end().to_string()
        })
        .collect();

    // Collapse runs of blank lines to a single blank line
    lines.dedup_by(|a, b| a.is_empty() && b.is_empty());

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    while lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }

    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tabs_become_spaces() {
        assert_eq!(basic_format("\tx();", 2), "  x();\n");
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        assert_eq!(basic_format("const a = 1;   \n", 2), "const a = 1;\n");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(basic_format("a\n\n\n\nb", 2), "a\n\nb\n");
    }

    #[test]
    fn brace_spacing_is_normalized() {
        assert_eq!(basic_format("if (x){ y(); }", 2), "if (x) { y(); }\n");
        assert_eq!(basic_format("if (x)   { y(); }", 2), "if (x) { y(); }\n");
    }

    #[test]
    fn leading_and_trailing_blanks_are_dropped() {
        assert_eq!(basic_format("\n\nconst a = 1;\n\n\n", 2), "const a = 1;\n");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(basic_format("", 2), "");
        assert_eq!(basic_format("\n\n\n", 2), "");
    }

    #[test]
    fn formatting_is_idempotent_on_sample() {
        let code = "function f(){\n\tif (x)   {\n\t\treturn 1;   \n\t}\n\n\n\treturn 0;\n}";
        let once = basic_format(code, 2);
        assert_eq!(basic_format(&once, 2), once);
    }

    proptest! {
        #[test]
        fn formatting_is_idempotent(code in "[ -~\t\n]{0,400}") {
            let once = basic_format(&code, 2);
            let twice = basic_format(&once, 2);
            prop_assert_eq!(once, twice);
        }
    }
}
