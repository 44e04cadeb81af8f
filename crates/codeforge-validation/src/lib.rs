//! Heuristic static analysis for generated artifacts
//!
//! The validator never parses to an AST. It runs four cheap checks over a
//! candidate source string and aggregates them into a [`ValidationReport`]:
//! bracket-balance syntax checking, approximated cyclomatic complexity,
//! a security denylist scan, and documentation-quality heuristics.

pub mod metrics;
pub mod patterns;
pub mod report;
pub mod scan;

pub use metrics::CodeMetrics;
pub use report::{Issue, IssueCategory, IssueSeverity, ValidationReport};
pub use scan::SyntaxIssue;

use camino::Utf8Path;
use codeforge_config::{SecurityPolicy, ValidatorConfig};
use codeforge_utils::error::ValidateError;

/// Configured validator. Cheap to construct and clone; holds only the
/// thresholds and the security policy.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
    policy: SecurityPolicy,
}

impl Validator {
    #[must_use]
    pub const fn new(config: ValidatorConfig, policy: SecurityPolicy) -> Self {
        Self { config, policy }
    }

    /// Checks bracket balance. An empty result means the source parses
    /// under the permissive scanner.
    #[must_use]
    pub fn validate_syntax(&self, code: &str) -> Vec<SyntaxIssue> {
        scan::check_brackets(code)
    }

    /// Computes size and complexity metrics.
    #[must_use]
    pub fn analyze_complexity(&self, code: &str) -> CodeMetrics {
        metrics::analyze(code)
    }

    /// Scans for denylisted dangerous constructs. Under a blocking policy
    /// the findings are escalated to error severity.
    #[must_use]
    pub fn check_security(&self, code: &str) -> Vec<Issue> {
        let mut issues = patterns::check_security(code);
        if self.policy == SecurityPolicy::Block {
            for issue in &mut issues {
                issue.severity = IssueSeverity::Error;
            }
        }
        issues
    }

    /// Documentation-quality heuristics: comment ratio plus debug-statement
    /// denylist.
    #[must_use]
    pub fn check_quality(&self, code: &str) -> Vec<Issue> {
        let mut issues = patterns::check_debug_statements(code);
        let ratio = metrics::analyze(code).comment_ratio;
        if ratio < self.config.min_comment_ratio {
            issues.push(Issue {
                category: IssueCategory::Quality,
                severity: IssueSeverity::Info,
                message: format!(
                    "comment ratio {ratio:.2} is below the minimum {:.2}",
                    self.config.min_comment_ratio
                ),
                line: None,
            });
        }
        issues
    }

    /// Runs the full check pipeline and aggregates a report.
    ///
    /// A syntax failure short-circuits: the report carries only the syntax
    /// issues, no metrics, and `valid: false`. Otherwise all issues from the
    /// complexity, security, and quality checks are merged and the overall
    /// severity is the worst level present.
    #[must_use]
    pub fn validate_code(&self, code: &str) -> ValidationReport {
        let syntax_issues = self.validate_syntax(code);
        if !syntax_issues.is_empty() {
            let issues = syntax_issues
                .into_iter()
                .map(|s| Issue {
                    category: IssueCategory::Syntax,
                    severity: IssueSeverity::Error,
                    message: format!("{} at {}:{}", s.message, s.line, s.column),
                    line: Some(s.line),
                })
                .collect();
            return ValidationReport::from_issues(issues, None);
        }

        let metrics = self.analyze_complexity(code);
        let mut issues = Vec::new();

        if metrics.complexity > self.config.max_complexity {
            issues.push(Issue {
                category: IssueCategory::Complexity,
                severity: IssueSeverity::Warning,
                message: format!(
                    "cyclomatic complexity {} exceeds maximum {}",
                    metrics.complexity, self.config.max_complexity
                ),
                line: None,
            });
        }
        if metrics.nesting_depth > self.config.max_nesting_depth {
            issues.push(Issue {
                category: IssueCategory::Complexity,
                severity: IssueSeverity::Warning,
                message: format!(
                    "nesting depth {} exceeds maximum {}",
                    metrics.nesting_depth, self.config.max_nesting_depth
                ),
                line: None,
            });
        }
        if metrics.lines as u32 > self.config.max_lines {
            issues.push(Issue {
                category: IssueCategory::Complexity,
                severity: IssueSeverity::Warning,
                message: format!(
                    "length {} lines exceeds maximum {}",
                    metrics.lines, self.config.max_lines
                ),
                line: None,
            });
        }

        issues.extend(self.check_security(code));
        issues.extend(self.check_quality(code));

        let report = ValidationReport::from_issues(issues, Some(metrics));
        tracing::debug!(
            valid = report.valid,
            severity = %report.severity,
            issue_count = report.issues.len(),
            "Validation complete"
        );
        report
    }

    /// Reads a file and validates its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn validate_file(&self, path: &Utf8Path) -> Result<ValidationReport, ValidateError> {
        let code = std::fs::read_to_string(path).map_err(|source| ValidateError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(self.validate_code(&code))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default(), SecurityPolicy::default())
    }
}
