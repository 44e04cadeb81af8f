//! Complexity and size metrics
//!
//! Cyclomatic complexity is approximated as 1 plus the count of branching,
//! looping, and conditional-operator occurrences. No AST is involved.

use crate::scan::scrub;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BRANCH_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:if|for|while|case|catch)\b").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

static BRANCH_OPERATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&&|\|\||\?").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

/// Metrics for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    /// Raw line count
    pub lines: usize,
    /// Approximated cyclomatic complexity
    pub complexity: u32,
    /// Maximum bracket nesting depth
    pub nesting_depth: u32,
    /// Comment lines divided by total lines
    pub comment_ratio: f64,
    /// Composite score in `0..=100`; higher is simpler
    pub complexity_score: u32,
}

/// Computes all metrics for a source string.
///
/// Pattern counting runs on scrubbed source so keywords inside strings and
/// comments do not inflate the counts. The comment ratio runs on the raw
/// source, since that is where the comments are.
#[must_use]
pub fn analyze(code: &str) -> CodeMetrics {
    let scrubbed = scrub(code);
    let complexity = cyclomatic_complexity(&scrubbed);
    let nesting_depth = max_nesting_depth(&scrubbed);
    let lines = code.lines().count();

    CodeMetrics {
        lines,
        complexity,
        nesting_depth,
        comment_ratio: comment_ratio(code),
        complexity_score: complexity_score(complexity, nesting_depth),
    }
}

/// 1 + branching keywords + short-circuit/ternary operators.
fn cyclomatic_complexity(scrubbed: &str) -> u32 {
    let keywords = BRANCH_KEYWORDS.find_iter(scrubbed).count();
    let operators = BRANCH_OPERATORS.find_iter(scrubbed).count();
    1 + (keywords + operators) as u32
}

/// Maximum depth of the `{ } ( ) [ ]` stack. Expects scrubbed input;
/// mismatches are the syntax check's concern, not this one's.
fn max_nesting_depth(scrubbed: &str) -> u32 {
    let mut depth: u32 = 0;
    let mut max = 0;
    for ch in scrubbed.chars() {
        match ch {
            '{' | '(' | '[' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' | ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Fraction of lines that are comments (`//`, `/*`, or `*` continuations).
fn comment_ratio(code: &str) -> f64 {
    let total = code.lines().count();
    if total == 0 {
        return 0.0;
    }
    let comments = code
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            t.starts_with("//") || t.starts_with("/*") || t.starts_with('*')
        })
        .count();
    comments as f64 / total as f64
}

/// `max(0, 100 - (2*complexity + 5*depth))`.
fn complexity_score(complexity: u32, nesting_depth: u32) -> u32 {
    100u32.saturating_sub(2 * complexity + 5 * nesting_depth)
}
