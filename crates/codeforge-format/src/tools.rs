//! External formatter tool discovery
//!
//! Tools are detected by walking upward from a root directory looking for
//! their configuration files, then checking that the binary is actually on
//! PATH. The resulting list preserves preference order.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Supported external formatters, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Prettier,
    Biome,
    Eslint,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [Self::Prettier, Self::Biome, Self::Eslint];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prettier => "prettier",
            Self::Biome => "biome",
            Self::Eslint => "eslint",
        }
    }

    /// Configuration filenames that signal this tool is in use.
    #[must_use]
    pub const fn config_names(self) -> &'static [&'static str] {
        match self {
            Self::Prettier => &[
                ".prettierrc",
                ".prettierrc.json",
                ".prettierrc.yaml",
                "prettier.config.js",
            ],
            Self::Biome => &["biome.json", "biome.jsonc"],
            Self::Eslint => &[".eslintrc", ".eslintrc.json", "eslint.config.js"],
        }
    }

    /// Arguments for the fix-in-place invocation against a scratch file.
    #[must_use]
    pub fn fix_args(self, scratch: &Utf8Path, config: Option<&Utf8Path>) -> Vec<String> {
        let mut args = match self {
            Self::Prettier => vec!["--write".to_string()],
            Self::Biome => vec!["format".to_string(), "--write".to_string()],
            Self::Eslint => vec!["--fix".to_string()],
        };
        if let Some(config) = config {
            let flag = match self {
                Self::Prettier | Self::Eslint => "--config",
                Self::Biome => "--config-path",
            };
            args.push(flag.to_string());
            args.push(config.to_string());
        }
        args.push(scratch.to_string());
        args
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected tool: its binary and the config file that revealed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTool {
    pub kind: ToolKind,
    pub binary: Utf8PathBuf,
    pub config_path: Option<Utf8PathBuf>,
}

/// Walks upward from `root` looking for tool configuration files, then
/// filters to tools whose binary resolves on PATH. Order follows
/// [`ToolKind::ALL`] preference.
#[must_use]
pub fn detect_tools(root: &Utf8Path) -> Vec<DetectedTool> {
    ToolKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let config_path = find_config(root, kind);
            config_path.as_ref()?;
            let binary = which::which(kind.as_str()).ok()?;
            let binary = Utf8PathBuf::from_path_buf(binary).ok()?;
            Some(DetectedTool {
                kind,
                binary,
                config_path,
            })
        })
        .collect()
}

fn find_config(root: &Utf8Path, kind: ToolKind) -> Option<Utf8PathBuf> {
    let mut current = Some(root);
    while let Some(dir) = current {
        for name in kind.config_names() {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_args_include_scratch_last() {
        let scratch = Utf8Path::new("/tmp/scratch.ts");
        for kind in ToolKind::ALL {
            let args = kind.fix_args(scratch, None);
            assert_eq!(args.last().map(String::as_str), Some("/tmp/scratch.ts"));
        }
    }

    #[test]
    fn fix_args_carry_discovered_config() {
        let scratch = Utf8Path::new("/tmp/scratch.ts");
        let config = Utf8Path::new("/repo/.prettierrc");
        let args = ToolKind::Prettier.fix_args(scratch, Some(config));
        assert!(args.contains(&"--config".to_string()));
        assert!(args.contains(&"/repo/.prettierrc".to_string()));
    }

    #[test]
    fn find_config_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join(".prettierrc"), "{}").unwrap();
        let nested = root.join("src").join("components");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested, ToolKind::Prettier).unwrap();
        assert_eq!(found, root.join(".prettierrc"));
        assert!(find_config(&nested, ToolKind::Biome).is_none());
    }
}
