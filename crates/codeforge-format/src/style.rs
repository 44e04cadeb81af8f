//! Declarative style-guide application
//!
//! A style guide here is a small set of substitution parameters, applied
//! textually. This is explicitly heuristic; it does not re-parse the source.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\\\n]*)""#).unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'([^'\\\n]*)'").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

/// Quote character preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
}

/// Style parameters applied by [`apply_style_guide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleGuide {
    pub quotes: QuoteStyle,
    pub semicolons: bool,
}

impl StyleGuide {
    /// Resolves a named guide. Unknown names fall back to the default
    /// (double quotes, semicolons).
    #[must_use]
    pub fn by_name(name: &str) -> Self {
        match name {
            "standard" => Self {
                quotes: QuoteStyle::Single,
                semicolons: false,
            },
            "airbnb" => Self {
                quotes: QuoteStyle::Single,
                semicolons: true,
            },
            _ => Self {
                quotes: QuoteStyle::Double,
                semicolons: true,
            },
        }
    }
}

/// Applies quote and semicolon preferences by direct substitution. Only
/// simple single-line literals without escapes or embedded quotes are
/// rewritten; anything ambiguous is left alone.
#[must_use]
pub fn apply_style_guide(code: &str, guide: StyleGuide) -> String {
    let quoted = match guide.quotes {
        QuoteStyle::Single => DOUBLE_QUOTED
            .replace_all(code, |caps: &regex::Captures<'_>| {
                let inner = &caps[1];
                if inner.contains('\'') {
                    caps[0].to_string()
                } else {
                    format!("'{inner}'")
                }
            })
            .into_owned(),
        QuoteStyle::Double => SINGLE_QUOTED
            .replace_all(code, |caps: &regex::Captures<'_>| {
                let inner = &caps[1];
                if inner.contains('"') {
                    caps[0].to_string()
                } else {
                    format!("\"{inner}\"")
                }
            })
            .into_owned(),
    };

    if guide.semicolons {
        quoted
    } else {
        quoted
            .lines()
            .map(strip_trailing_semicolon)
            .collect::<Vec<_>>()
            .join("\n")
            + if quoted.ends_with('\n') { "\n" } else { "" }
    }
}

fn strip_trailing_semicolon(line: &str) -> &str {
    let trimmed = line.trim_end();
    // `for (;;)` headers and empty statements keep their semicolons
    if trimmed.ends_with(';') && !trimmed.ends_with(";;") && trimmed.len() > 1 {
        &line[..line.rfind(';').unwrap_or(line.len())]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_guides_resolve() {
        assert_eq!(StyleGuide::by_name("standard").quotes, QuoteStyle::Single);
        assert!(!StyleGuide::by_name("standard").semicolons);
        assert_eq!(StyleGuide::by_name("unknown").quotes, QuoteStyle::Double);
    }

    #[test]
    fn double_to_single_quotes() {
        let guide = StyleGuide {
            quotes: QuoteStyle::Single,
            semicolons: true,
        };
        assert_eq!(
            apply_style_guide(r#"import x from "mod";"#, guide),
            "import x from 'mod';"
        );
    }

    #[test]
    fn literal_containing_target_quote_is_untouched() {
        let guide = StyleGuide {
            quotes: QuoteStyle::Single,
            semicolons: true,
        };
        let code = r#"const s = "it's fine";"#;
        assert_eq!(apply_style_guide(code, guide), code);
    }

    #[test]
    fn semicolons_are_stripped_when_disabled() {
        let guide = StyleGuide {
            quotes: QuoteStyle::Double,
            semicolons: false,
        };
        assert_eq!(apply_style_guide("const a = 1;\n", guide), "const a = 1\n");
    }
}
