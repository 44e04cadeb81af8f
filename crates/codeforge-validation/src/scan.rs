//! Lexical scanning shared by the validator checks
//!
//! The validator is deliberately heuristic: it never builds an AST. The
//! scanner walks the source once, tracking string literals and comments, so
//! the bracket checks and pattern scans do not trip on quoted text.

/// A syntax finding with its source position (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Checks bracket balance over `{ } ( ) [ ]`, ignoring brackets inside
/// string literals and comments. Returns all findings; an empty list means
/// the source is balanced.
#[must_use]
pub fn check_brackets(code: &str) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    let mut stack: Vec<(char, usize, usize)> = Vec::new();
    let mut scanner = Scanner::new(code);

    while let Some((_, ch)) = scanner.next_code_char() {
        let (line, column) = scanner.position();
        match ch {
            '{' | '(' | '[' => stack.push((ch, line, column)),
            '}' | ')' | ']' => {
                let expected = matching_open(ch);
                match stack.pop() {
                    Some((open, ..)) if open == expected => {}
                    Some((open, open_line, open_column)) => {
                        issues.push(SyntaxIssue {
                            line,
                            column,
                            message: format!(
                                "Mismatched '{ch}': expected closing for '{open}' opened at \
                                 {open_line}:{open_column}"
                            ),
                        });
                    }
                    None => {
                        issues.push(SyntaxIssue {
                            line,
                            column,
                            message: format!("Unmatched closing '{ch}'"),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    for (open, line, column) in stack {
        issues.push(SyntaxIssue {
            line,
            column,
            message: format!("Unclosed '{open}'"),
        });
    }

    issues
}

/// Returns the source with string-literal and comment interiors blanked to
/// spaces. Newlines are preserved so line counts stay meaningful, which lets
/// the pattern checks run on the result without matching quoted text.
#[must_use]
pub fn scrub(code: &str) -> String {
    let mut out: Vec<char> = code
        .chars()
        .map(|c| if c == '\n' { '\n' } else { ' ' })
        .collect();
    let mut scanner = Scanner::new(code);
    while let Some((pos, ch)) = scanner.next_code_char() {
        out[pos] = ch;
    }
    out.into_iter().collect()
}

fn matching_open(close: char) -> char {
    match close {
        '}' => '{',
        ')' => '(',
        _ => '[',
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    LineComment,
    BlockComment,
    /// Inside a string; the char is the delimiter (`'`, `"`, or a backtick)
    Str(char),
}

/// Single-pass scanner yielding characters outside strings and comments,
/// with their char offset and 1-based line/column.
struct Scanner<'a> {
    chars: std::iter::Peekable<std::iter::Enumerate<std::str::Chars<'a>>>,
    state: LexState,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(code: &'a str) -> Self {
        Self {
            chars: code.chars().enumerate().peekable(),
            state: LexState::Code,
            line: 1,
            column: 0,
        }
    }

    /// Position of the character most recently returned.
    const fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let (pos, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some((pos, ch))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn next_code_char(&mut self) -> Option<(usize, char)> {
        loop {
            let (pos, ch) = self.advance()?;
            match self.state {
                LexState::Code => match ch {
                    '/' => match self.peek_char() {
                        Some('/') => {
                            self.advance();
                            self.state = LexState::LineComment;
                        }
                        Some('*') => {
                            self.advance();
                            self.state = LexState::BlockComment;
                        }
                        _ => return Some((pos, ch)),
                    },
                    // Delimiters stay visible; only string interiors are hidden
                    '\'' | '"' | '`' => {
                        self.state = LexState::Str(ch);
                        return Some((pos, ch));
                    }
                    _ => return Some((pos, ch)),
                },
                LexState::LineComment => {
                    if ch == '\n' {
                        self.state = LexState::Code;
                        return Some((pos, ch));
                    }
                }
                LexState::BlockComment => {
                    if ch == '*' && self.peek_char() == Some('/') {
                        self.advance();
                        self.state = LexState::Code;
                    }
                }
                LexState::Str(delim) => match ch {
                    '\\' => {
                        self.advance();
                    }
                    c if c == delim => {
                        self.state = LexState::Code;
                        return Some((pos, ch));
                    }
                    // Unterminated single-line strings end at the newline
                    '\n' if delim != '`' => {
                        self.state = LexState::Code;
                        return Some((pos, ch));
                    }
                    _ => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_code_has_no_issues() {
        let code = "function f(a) { return [a, (a + 1)]; }";
        assert!(check_brackets(code).is_empty());
    }

    #[test]
    fn unclosed_brace_is_reported_with_position() {
        let code = "function f() {\n  if (x) {\n}";
        let issues = check_brackets(code);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Unclosed '{'"));
        assert_eq!(issues[0].line, 1);
    }

    #[test]
    fn mismatched_pair_is_reported() {
        let issues = check_brackets("const a = (1];");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Mismatched ']'"));
    }

    #[test]
    fn unmatched_close_is_reported() {
        let issues = check_brackets("}");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Unmatched closing '}'"));
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].column, 1);
    }

    #[test]
    fn brackets_in_strings_and_comments_are_ignored() {
        let code = "const s = \"}}}\"; // )))\nconst t = `([{`; /* ]] */";
        assert!(check_brackets(code).is_empty());
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let code = r#"const s = "a\"}";"#;
        assert!(check_brackets(code).is_empty());
    }

    #[test]
    fn scrub_blanks_strings_and_comments() {
        let code = "eval(\"x\"); // eval(y)\n/* eval(z) */ run();";
        let scrubbed = scrub(code);
        assert_eq!(scrubbed.matches("eval(").count(), 1);
        assert!(scrubbed.contains("run();"));
        assert_eq!(scrubbed.lines().count(), code.lines().count());
    }
}
