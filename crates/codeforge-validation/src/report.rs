//! Validation report types and severity aggregation

use crate::metrics::CodeMetrics;
use codeforge_utils::Severity;
use serde::{Deserialize, Serialize};

/// Which check produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Syntax,
    Complexity,
    Security,
    Quality,
}

impl IssueCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Complexity => "complexity",
            Self::Security => "security",
            Self::Quality => "quality",
        }
    }
}

/// Fine-grained issue severity. `High` and `Low` exist for security and
/// debug findings; they fold into the three report levels via
/// [`IssueSeverity::report_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Info,
    Low,
    Warning,
    High,
    Error,
}

impl IssueSeverity {
    /// Collapses to the three-level report scale: `High` counts as a
    /// warning, `Low` as advisory.
    #[must_use]
    pub const fn report_level(self) -> Severity {
        match self {
            Self::Error => Severity::Error,
            Self::High | Self::Warning => Severity::Warning,
            Self::Low | Self::Info => Severity::Info,
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub message: String,
    /// 1-based source line, when the finding is positional
    pub line: Option<usize>,
}

/// Aggregated verdict for one artifact. Built once per validation and never
/// mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// False only when an error-level issue is present
    pub valid: bool,
    /// Worst report-level severity across all issues
    pub severity: Severity,
    pub issues: Vec<Issue>,
    /// Absent when a syntax failure short-circuited the metric checks
    pub metrics: Option<CodeMetrics>,
    /// One human-readable suggestion per issue, in issue order
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    /// Builds the report from accumulated issues, deriving validity,
    /// overall severity, and per-issue suggestions.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>, metrics: Option<CodeMetrics>) -> Self {
        let severity = issues
            .iter()
            .map(|i| i.severity.report_level())
            .max()
            .unwrap_or(Severity::Info);
        let suggestions = issues.iter().map(suggestion_for).collect();
        Self {
            valid: severity != Severity::Error,
            severity,
            issues,
            metrics,
            suggestions,
        }
    }
}

/// Human-readable fix hint for an issue, keyed by its category.
fn suggestion_for(issue: &Issue) -> String {
    let hint = match issue.category {
        IssueCategory::Syntax => "Fix the bracket or delimiter mismatch before re-running",
        IssueCategory::Complexity => {
            "Extract helper functions or flatten control flow to reduce complexity"
        }
        IssueCategory::Security => {
            "Replace the dangerous construct with a safe equivalent (no dynamic code or raw sinks)"
        }
        IssueCategory::Quality => "Remove debug statements and document non-obvious logic",
    };
    match issue.line {
        Some(line) => format!("{hint} (line {line})"),
        None => hint.to_string(),
    }
}
