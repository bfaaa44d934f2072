//! Single-pass lexer for sentinel-marked query text.
//!
//! The query composer wraps every string literal in a sentinel pair
//! (`__UTF8__abc__UTF8__`). The lexer splits the query into plain SQL text and
//! literal tokens in one pass, so literal content is never rescanned and can
//! never be confused with markup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TemplaterError;

/// Literals matching this shape are inlined as SQL date/timestamp strings.
static DATE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}:\d{2}(\.\d+)?)?([Zz]|[+-]\d{2}:\d{2})?$")
        .unwrap()
});

/// A token of sentinel-marked query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    /// Plain SQL, emitted unchanged.
    Text(&'src str),
    /// Literal in date/timestamp shape, emitted inline as `'...'`.
    DateLiteral(&'src str),
    /// Any other literal, emitted as `?` and bound positionally.
    Bind(&'src str),
}

/// Returns true if a literal's content is inlined rather than bound.
pub fn is_date_literal(content: &str) -> bool {
    DATE_LITERAL.is_match(content)
}

/// Split `query` into tokens.
///
/// Fails on an opening sentinel with no closing partner, and on a raw `?`
/// appearing in plain SQL outside a quoted string, quoted identifier or comment.
pub fn tokenize<'src>(query: &'src str, sentinel: &str) -> Result<Vec<Token<'src>>, TemplaterError> {
    let mut tokens = Vec::new();
    let mut scan = ScanState::default();

    if sentinel.is_empty() {
        push_text(&mut tokens, &mut scan, query, 0)?;
        return Ok(tokens);
    }

    let mut pos = 0;
    while let Some(rel) = query[pos..].find(sentinel) {
        let open = pos + rel;
        push_text(&mut tokens, &mut scan, &query[pos..open], pos)?;

        let content_start = open + sentinel.len();
        let close = query[content_start..]
            .find(sentinel)
            .map(|r| content_start + r)
            .ok_or_else(|| TemplaterError::UnbalancedMarker {
                marker: sentinel.to_string(),
                offset: open,
            })?;

        let content = &query[content_start..close];
        if scan.in_comment() {
            // Commented-out literals stay as written and bind nothing.
            tokens.push(Token::Text(&query[open..close + sentinel.len()]));
        } else if is_date_literal(content) {
            tokens.push(Token::DateLiteral(content));
        } else {
            tokens.push(Token::Bind(content));
        }
        pos = close + sentinel.len();
    }
    push_text(&mut tokens, &mut scan, &query[pos..], pos)?;

    Ok(tokens)
}

/// Where the scanner is inside plain SQL text. Carried across text tokens;
/// literal tokens do not affect it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Region {
    #[default]
    Code,
    /// Inside a `'...'` string or `"..."` identifier.
    Quoted(char),
    /// After `--` up to the end of the line.
    LineComment,
    /// Between `/*` and `*/`.
    BlockComment,
}

#[derive(Debug, Default)]
struct ScanState {
    region: Region,
    prev: Option<char>,
}

impl ScanState {
    fn feed(&mut self, ch: char) {
        let prev = self.prev.replace(ch);
        self.region = match (self.region, ch) {
            (Region::Code, '\'' | '"') => Region::Quoted(ch),
            (Region::Code, '-') if prev == Some('-') => {
                self.prev = None;
                Region::LineComment
            }
            (Region::Code, '*') if prev == Some('/') => {
                self.prev = None;
                Region::BlockComment
            }
            (Region::Quoted(q), c) if q == c => Region::Code,
            (Region::LineComment, '\n') => Region::Code,
            (Region::BlockComment, '/') if prev == Some('*') => {
                self.prev = None;
                Region::Code
            }
            (region, _) => region,
        };
    }

    fn in_code(&self) -> bool {
        self.region == Region::Code
    }

    fn in_comment(&self) -> bool {
        matches!(self.region, Region::LineComment | Region::BlockComment)
    }

    /// Two-character openers never span a literal token.
    fn break_run(&mut self) {
        self.prev = None;
    }
}

fn push_text<'src>(
    tokens: &mut Vec<Token<'src>>,
    scan: &mut ScanState,
    text: &'src str,
    base: usize,
) -> Result<(), TemplaterError> {
    scan.break_run();
    if text.is_empty() {
        return Ok(());
    }
    for (i, ch) in text.char_indices() {
        if ch == '?' && scan.in_code() {
            return Err(TemplaterError::StrayBindMarker { offset: base + i });
        }
        scan.feed(ch);
    }
    tokens.push(Token::Text(text));
    Ok(())
}
