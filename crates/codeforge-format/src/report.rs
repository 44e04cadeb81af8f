//! Before/after formatting reports

use serde::{Deserialize, Serialize};

/// Classification of one changed line position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One positional line difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    /// 0-based line index in whichever side has the line
    pub index: usize,
    pub kind: ChangeKind,
}

/// Size counts and a positional diff between original and formatted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatReport {
    pub original_lines: usize,
    pub formatted_lines: usize,
    pub original_chars: usize,
    pub formatted_chars: usize,
    pub changes: Vec<LineChange>,
}

impl FormatReport {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compares line-by-line at matching indices. This is positional, not a
/// minimal edit script: an inserted line near the top reports every later
/// position as modified.
#[must_use]
pub fn generate_format_report(original: &str, formatted: &str) -> FormatReport {
    let original_lines: Vec<&str> = original.lines().collect();
    let formatted_lines: Vec<&str> = formatted.lines().collect();
    let common = original_lines.len().min(formatted_lines.len());

    let mut changes = Vec::new();
    for index in 0..common {
        if original_lines[index] != formatted_lines[index] {
            changes.push(LineChange {
                index,
                kind: ChangeKind::Modified,
            });
        }
    }
    for index in common..formatted_lines.len() {
        changes.push(LineChange {
            index,
            kind: ChangeKind::Added,
        });
    }
    for index in common..original_lines.len() {
        changes.push(LineChange {
            index,
            kind: ChangeKind::Removed,
        });
    }

    FormatReport {
        original_lines: original_lines.len(),
        formatted_lines: formatted_lines.len(),
        original_chars: original.chars().count(),
        formatted_chars: formatted.chars().count(),
        changes,
    }
}
