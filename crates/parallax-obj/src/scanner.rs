use crate::error::ParseError;

// ── Token ─────────────────────────────────────────────────────────────────

/// A whitespace-delimited word with its 1-based column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Token<'s> {
    pub text: &'s str,
    pub col: usize,
}

// ── Directive ─────────────────────────────────────────────────────────────

/// One non-empty source line: the leading keyword plus its arguments.
///
/// Everything after a `#` is a comment and never reaches a directive.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Directive<'s> {
    pub line: usize,
    pub keyword: Token<'s>,
    pub args: Vec<Token<'s>>,
}

impl<'s> Directive<'s> {
    pub fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line, self.keyword.col)
    }

    pub fn err_at(&self, tok: Token<'_>, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line, tok.col)
    }

    /// Parses argument `idx` as a float.
    pub fn float(&self, idx: usize) -> Result<f32, ParseError> {
        let Some(tok) = self.args.get(idx).copied() else {
            return Err(self.err(format!(
                "`{}` expects at least {} values",
                self.keyword.text,
                idx + 1
            )));
        };
        tok.text
            .parse::<f32>()
            .map_err(|_| self.err_at(tok, format!("expected a number, found `{}`", tok.text)))
    }

    /// Parses the first three arguments as a float triple.
    pub fn float3(&self) -> Result<[f32; 3], ParseError> {
        Ok([self.float(0)?, self.float(1)?, self.float(2)?])
    }

    /// The argument text joined back with single spaces (names may contain spaces).
    pub fn rest(&self) -> String {
        self.args.iter().map(|t| t.text).collect::<Vec<_>>().join(" ")
    }
}

// ── Scanner ───────────────────────────────────────────────────────────────

/// Splits `src` into directives, skipping blank and comment-only lines.
pub(crate) fn directives(src: &str) -> impl Iterator<Item = Directive<'_>> {
    src.lines().enumerate().filter_map(|(idx, raw)| {
        let content = match raw.find('#') {
            Some(i) => &raw[..i],
            None => raw,
        };
        let mut tokens = tokenize(content);
        if tokens.is_empty() {
            return None;
        }
        let keyword = tokens.remove(0);
        Some(Directive { line: idx + 1, keyword, args: tokens })
    })
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<(usize, usize)> = None;
    let mut col = 0;

    for (i, ch) in line.char_indices() {
        col += 1;
        if ch.is_whitespace() {
            if let Some((s, c)) = start.take() {
                tokens.push(Token { text: &line[s..i], col: c });
            }
        } else if start.is_none() {
            start = Some((i, col));
        }
    }
    if let Some((s, c)) = start {
        tokens.push(Token { text: &line[s..], col: c });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let d: Vec<_> = directives("\n# header\n   \nv 1 2 3\n").collect();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].line, 4);
        assert_eq!(d[0].keyword.text, "v");
    }

    #[test]
    fn trailing_comment_is_stripped() {
        let d: Vec<_> = directives("usemtl red # the red one").collect();
        assert_eq!(d[0].rest(), "red");
    }

    #[test]
    fn columns_are_one_based() {
        let d: Vec<_> = directives("  f 1  2 3").collect();
        assert_eq!(d[0].keyword.col, 3);
        assert_eq!(d[0].args[0].col, 5);
        assert_eq!(d[0].args[1].col, 8);
    }

    #[test]
    fn float_reports_bad_token_column() {
        let d: Vec<_> = directives("v 1 x 3").collect();
        let e = d[0].float3().unwrap_err();
        assert_eq!((e.line, e.col), (1, 5));
    }
}
