//! Atomic file writes
//!
//! Integration must never leave a partially written artifact on disk. Writes
//! go to a temp file in the destination directory, are synced, then renamed
//! over the target in one step.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::io::Write;
use tempfile::NamedTempFile;

/// Outcome of an atomic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicWriteResult {
    /// Bytes written after normalization
    pub bytes_written: usize,
    /// Whether the target file already existed
    pub replaced: bool,
}

/// Writes `content` to `path` atomically.
///
/// Line endings are normalized to `\n` and a trailing newline is ensured, so
/// repeated writes of identical logical content are byte-stable. Parent
/// directories are created as needed. The temp file is created in the target's
/// directory so the final rename never crosses a filesystem boundary.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the temp file
/// cannot be written or synced, or the rename fails.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let normalized = normalize_content(content);
    let replaced = path.exists();

    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory {parent}"))?;

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {parent}"))?;
    temp.write_all(normalized.as_bytes())
        .with_context(|| format!("Failed to write temp file for {path}"))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {path}"))?;
    temp.persist(path)
        .with_context(|| format!("Failed to persist {path}"))?;

    Ok(AtomicWriteResult {
        bytes_written: normalized.len(),
        replaced,
    })
}

/// Normalizes line endings to `\n` and ensures exactly one trailing newline.
#[must_use]
pub fn normalize_content(content: &str) -> String {
    let mut out = content.replace("\r\n", "\n").replace('\r', "\n");
    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn utf8_temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn writes_new_file_and_reports_not_replaced() {
        let (_dir, root) = utf8_temp_dir();
        let target = root.join("out.ts");
        let result = write_file_atomic(&target, "const x = 1;\n").unwrap();
        assert!(!result.replaced);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "const x = 1;\n");
    }

    #[test]
    fn overwrite_reports_replaced() {
        let (_dir, root) = utf8_temp_dir();
        let target = root.join("out.ts");
        write_file_atomic(&target, "a\n").unwrap();
        let result = write_file_atomic(&target, "b\n").unwrap();
        assert!(result.replaced);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "b\n");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let (_dir, root) = utf8_temp_dir();
        let target = root.join("src").join("components").join("Button.tsx");
        write_file_atomic(&target, "export {};").unwrap();
        assert!(target.exists());
    }

    #[test]
    fn normalizes_crlf_and_trailing_newlines() {
        assert_eq!(normalize_content("a\r\nb\r"), "a\nb\n");
        assert_eq!(normalize_content("a\n\n\n"), "a\n");
        assert_eq!(normalize_content("a"), "a\n");
        assert_eq!(normalize_content(""), "");
    }
}
