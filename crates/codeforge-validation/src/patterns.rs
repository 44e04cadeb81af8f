//! Pattern-based security and quality checks

use crate::report::{Issue, IssueCategory, IssueSeverity};
use crate::scan::scrub;
use regex::Regex;
use std::sync::LazyLock;

/// Dangerous constructs that should not appear in generated code. Matching
/// runs on scrubbed source so occurrences inside strings and comments are
/// not reported.
static SECURITY_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\beval\s*\(", "dynamic code execution via eval()"),
        (r"\bnew\s+Function\s*\(", "dynamic code execution via new Function()"),
        (r"\.innerHTML\s*=", "raw HTML sink assignment via innerHTML"),
        (r"\bdocument\.write\s*\(", "document-level raw write"),
        (
            r"\bset(?:Timeout|Interval)\s*\(\s*['\x22`]",
            "timer fed a code string",
        ),
    ]
    .into_iter()
    .map(|(pattern, message)| {
        (
            Regex::new(pattern).unwrap_or_else(|e| panic!("invalid security pattern: {e}")),
            message,
        )
    })
    .collect()
});

/// Debug-only statements that should not ship in generated artifacts.
static DEBUG_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bconsole\.(?:log|debug|trace)\s*\(", "console debug statement"),
        (r"\bdebugger\b", "debugger statement"),
        (r"\balert\s*\(", "alert() call"),
    ]
    .into_iter()
    .map(|(pattern, message)| {
        (
            Regex::new(pattern).unwrap_or_else(|e| panic!("invalid debug pattern: {e}")),
            message,
        )
    })
    .collect()
});

/// Scans for denylisted dangerous constructs. Every match is reported at
/// high severity; whether that blocks integration is the caller's policy.
#[must_use]
pub fn check_security(code: &str) -> Vec<Issue> {
    scan_lines(code, &SECURITY_PATTERNS, IssueCategory::Security, IssueSeverity::High)
}

/// Flags debug-only statements at low severity.
#[must_use]
pub fn check_debug_statements(code: &str) -> Vec<Issue> {
    scan_lines(code, &DEBUG_PATTERNS, IssueCategory::Quality, IssueSeverity::Low)
}

fn scan_lines(
    code: &str,
    patterns: &[(Regex, &'static str)],
    category: IssueCategory,
    severity: IssueSeverity,
) -> Vec<Issue> {
    let scrubbed = scrub(code);
    let mut issues = Vec::new();
    for (line_idx, line) in scrubbed.lines().enumerate() {
        for (pattern, message) in patterns {
            if pattern.is_match(line) {
                issues.push(Issue {
                    category,
                    severity,
                    message: (*message).to_string(),
                    line: Some(line_idx + 1),
                });
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_is_flagged_with_line() {
        let issues = check_security("const a = 1;\neval(payload);");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, Some(2));
        assert_eq!(issues[0].severity, IssueSeverity::High);
    }

    #[test]
    fn all_denylisted_constructs_are_caught() {
        let code = concat!(
            "eval(x);\n",
            "const f = new Function(body);\n",
            "node.innerHTML = html;\n",
            "document.write(markup);\n",
            "setTimeout(\"doIt()\", 100);\n",
            "setInterval('tick()', 50);\n",
        );
        assert_eq!(check_security(code).len(), 6);
    }

    #[test]
    fn patterns_in_strings_are_not_flagged() {
        let code = "const help = \"never call eval(input)\";";
        assert!(check_security(code).is_empty());
    }

    #[test]
    fn timer_with_function_argument_is_allowed() {
        let code = "setTimeout(() => tick(), 100);";
        assert!(check_security(code).is_empty());
    }

    #[test]
    fn console_log_is_low_severity_quality() {
        let issues = check_debug_statements("console.log(state);");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Quality);
        assert_eq!(issues[0].severity, IssueSeverity::Low);
    }
}
