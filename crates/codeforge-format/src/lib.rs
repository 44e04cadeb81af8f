//! Multi-tool code formatting
//!
//! [`Formatter::format_code`] tries each detected external tool in
//! preference order against a scratch file; if none is available or all
//! fail, a deterministic built-in fallback normalizes whitespace. Results
//! are cached by content hash.

pub mod fallback;
pub mod report;
pub mod style;
pub mod tools;

pub use fallback::basic_format;
pub use report::{generate_format_report, ChangeKind, FormatReport, LineChange};
pub use style::{apply_style_guide, QuoteStyle, StyleGuide};
pub use tools::{detect_tools, DetectedTool, ToolKind};

use camino::{Utf8Path, Utf8PathBuf};
use codeforge_config::FormatterConfig;
use codeforge_utils::content_hash;
use codeforge_utils::error::FormatError;
use codeforge_validation::{ValidationReport, Validator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

/// Name reported when the built-in fallback produced the output.
pub const FALLBACK_TOOL: &str = "basic";

/// Outcome of one formatting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatResult {
    pub success: bool,
    pub code: String,
    /// Tool that produced the output; [`FALLBACK_TOOL`] for the built-in pass
    pub tool: String,
    /// One entry per external tool that was tried and failed
    pub warnings: Vec<String>,
}

/// Formatter with detected tools and a content-hash result cache.
pub struct Formatter {
    config: FormatterConfig,
    tools: Vec<DetectedTool>,
    cache: Mutex<HashMap<String, FormatResult>>,
    validated_cache: Mutex<HashMap<String, (FormatResult, ValidationReport)>>,
}

impl Formatter {
    /// Detects available tools under `root` and builds the formatter. With
    /// `fallback_only` configured, no detection runs and every call uses
    /// the built-in pass.
    #[must_use]
    pub fn new(config: FormatterConfig, root: &Utf8Path) -> Self {
        let tools = if config.fallback_only {
            Vec::new()
        } else {
            let detected = detect_tools(root);
            tracing::debug!(
                tools = ?detected.iter().map(|t| t.kind.as_str()).collect::<Vec<_>>(),
                "Detected formatting tools"
            );
            detected
        };
        Self {
            config,
            tools,
            cache: Mutex::new(HashMap::new()),
            validated_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Formats source, preferring external tools and falling back to the
    /// built-in pass. The first tool to succeed wins; failures are carried
    /// as warnings on the result.
    pub async fn format_code(&self, code: &str, language: &str) -> FormatResult {
        let key = content_hash(&format!("{language}\n{code}"));
        if let Some(cached) = self.lock_cache().get(&key).cloned() {
            tracing::debug!(key = %key, tool = %cached.tool, "Format cache hit");
            return cached;
        }

        let mut warnings = Vec::new();
        let extension = extension_for(language);

        for tool in &self.tools {
            match self.run_tool(tool, code, extension).await {
                Ok(formatted) => {
                    let result = FormatResult {
                        success: true,
                        code: formatted,
                        tool: tool.kind.as_str().to_string(),
                        warnings,
                    };
                    self.lock_cache().insert(key, result.clone());
                    return result;
                }
                Err(e) => {
                    tracing::warn!(tool = %tool.kind, error = %e, "Formatter tool failed");
                    warnings.push(format!("{}: {e}", tool.kind));
                }
            }
        }

        let result = FormatResult {
            success: true,
            code: basic_format(code, self.config.indent_width),
            tool: FALLBACK_TOOL.to_string(),
            warnings,
        };
        self.lock_cache().insert(key, result.clone());
        result
    }

    /// Formats, then validates the formatted output. The composed pair is
    /// cached by the same content-hash key as [`Formatter::format_code`].
    pub async fn format_and_validate(
        &self,
        code: &str,
        language: &str,
        validator: &Validator,
    ) -> (FormatResult, ValidationReport) {
        let key = content_hash(&format!("{language}\n{code}"));
        if let Some((formatted, report)) = self.lock_validated_cache().get(&key).cloned() {
            tracing::debug!(key = %key, "Format-and-validate cache hit");
            return (formatted, report);
        }
        let formatted = self.format_code(code, language).await;
        let report = validator.validate_code(&formatted.code);
        self.lock_validated_cache()
            .insert(key, (formatted.clone(), report.clone()));
        (formatted, report)
    }

    /// Writes the candidate to a scratch file, runs the tool's fix-in-place
    /// mode under a timeout, and reads the result back. The scratch file is
    /// removed on every path, including timeouts.
    async fn run_tool(
        &self,
        tool: &DetectedTool,
        code: &str,
        extension: &str,
    ) -> Result<String, FormatError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("codeforge-fmt-")
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map_err(|e| FormatError::Scratch(e.to_string()))?;
        scratch
            .write_all(code.as_bytes())
            .map_err(|e| FormatError::Scratch(e.to_string()))?;
        scratch
            .flush()
            .map_err(|e| FormatError::Scratch(e.to_string()))?;

        let scratch_path = Utf8PathBuf::from_path_buf(scratch.path().to_path_buf())
            .map_err(|p| FormatError::Scratch(format!("non-UTF-8 scratch path: {}", p.display())))?;

        let timeout = Duration::from_secs(self.config.tool_timeout_secs);
        let args = tool.kind.fix_args(&scratch_path, tool.config_path.as_deref());

        let invocation = tokio::process::Command::new(tool.binary.as_std_path())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match tokio::time::timeout(timeout, invocation).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(FormatError::Tool {
                    tool: tool.kind.as_str().to_string(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FormatError::ToolTimeout {
                    tool: tool.kind.as_str().to_string(),
                    duration: timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(FormatError::Tool {
                tool: tool.kind.as_str().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        std::fs::read_to_string(&scratch_path).map_err(|e| FormatError::Scratch(e.to_string()))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, FormatResult>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[allow(clippy::type_complexity)]
    fn lock_validated_cache(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, (FormatResult, ValidationReport)>> {
        self.validated_cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn extension_for(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "javascript" | "js" => "js",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "json" => "json",
        "css" => "css",
        _ => "ts",
    }
}
