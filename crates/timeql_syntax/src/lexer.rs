//! Lexer for GraphQL documents.

use crate::token::{Token, TokenKind};
use std::borrow::Cow;
use timeql_core::{Interner, Span, Text};

/// A lexer for GraphQL source text.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
    interner: &'a Interner,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    /// Returns the current position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Peeks at the current byte without consuming.
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    /// Advances by one byte.
    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Advances by n bytes.
    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    /// Advances past the character at the current position.
    fn advance_char(&mut self) {
        let len = self.source[self.pos as usize..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.advance_by(len as u32);
    }

    /// Gets the slice from start to current position.
    #[inline]
    fn slice_from(&self, start: u32) -> &'a str {
        &self.source[start as usize..self.pos as usize]
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b':' => self.single(TokenKind::Colon),
            b'=' => self.single(TokenKind::Eq),
            b'@' => self.single(TokenKind::At),
            b'!' => self.single(TokenKind::Bang),
            b'$' => self.single(TokenKind::Dollar),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    self.advance();
                    TokenKind::Error
                }
            }

            // String literals
            b'"' => self.scan_string(),

            // Numbers
            b'-' | b'0'..=b'9' => self.scan_number(),

            // Names and keywords
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                self.advance_char();
                TokenKind::Error
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace, line terminators, commas, and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => {
                    self.advance();
                }
                Some(b'#') => {
                    let rest = &self.bytes[self.pos as usize..];
                    let len = memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
                    self.advance_by(len as u32);
                }
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    // UTF-8 BOM
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    /// Scans a name or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.slice_from(start);
        TokenKind::from_keyword(text).unwrap_or(TokenKind::Ident)
    }

    fn skip_digits(&mut self) -> u32 {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos - start
    }

    /// Scans a number literal.
    fn scan_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.advance();
        }

        // Integer part: `0` or a non-zero digit followed by digits
        match self.peek() {
            Some(b'0') => {
                self.advance();
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.skip_digits();
                    return TokenKind::Error;
                }
            }
            Some(b'1'..=b'9') => {
                self.skip_digits();
            }
            _ => return TokenKind::Error,
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.advance();
            if self.skip_digits() == 0 {
                return TokenKind::Error;
            }
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if self.skip_digits() == 0 {
                return TokenKind::Error;
            }
        }

        // A number must not run straight into a name or another dot
        if self
            .peek()
            .is_some_and(|c| c == b'.' || c == b'_' || c.is_ascii_alphabetic())
        {
            self.advance();
            return TokenKind::Error;
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    /// Scans a string literal.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // Opening quote

        if self.peek() == Some(b'"') && self.peek_at(1) == Some(b'"') {
            self.advance_by(2);
            return self.scan_block_string();
        }

        loop {
            let rest = &self.bytes[self.pos as usize..];
            let Some(offset) = memchr::memchr3(b'"', b'\\', b'\n', rest) else {
                self.advance_by(rest.len() as u32);
                return TokenKind::Error;
            };
            self.advance_by(offset as u32);
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return TokenKind::StringLiteral;
                }
                Some(b'\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != b'\n') {
                        self.advance_char();
                    }
                }
                _ => return TokenKind::Error,
            }
        }
    }

    /// Scans a block string literal.
    fn scan_block_string(&mut self) -> TokenKind {
        loop {
            match self.peek() {
                None => {
                    return TokenKind::Error;
                }
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.advance_by(3);
                    return TokenKind::BlockStringLiteral;
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    self.advance_by(4); // Escaped triple quote
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Interns the text at the given span.
    pub fn intern_span(&self, span: Span) -> Text {
        self.interner.intern(self.span_text(span))
    }

    /// Gets the text at the given span.
    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }
}

/// An invalid escape sequence inside a string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeError {
    /// Byte offset of the backslash, relative to the string contents.
    pub offset: usize,
    /// The offending sequence.
    pub sequence: String,
}

impl std::fmt::Display for EscapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid escape sequence `{}`", self.sequence)
    }
}

impl std::error::Error for EscapeError {}

/// Decodes the contents of a quoted string (without the quotes).
///
/// Borrows the input when it contains no escape sequences.
pub fn unescape_string(raw: &str) -> Result<Cow<'_, str>, EscapeError> {
    if memchr::memchr(b'\\', raw.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let invalid = |end: usize| {
            let mut end = end.min(raw.len());
            while !raw.is_char_boundary(end) {
                end += 1;
            }
            EscapeError {
                offset,
                sequence: raw[offset..end].to_string(),
            }
        };
        let Some((_, escaped)) = chars.next() else {
            return Err(invalid(raw.len()));
        };
        match escaped {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let hex_start = offset + 2;
                let code = read_hex4(raw, hex_start).ok_or_else(|| invalid(hex_start + 4))?;
                for _ in 0..4 {
                    chars.next();
                }
                let ch = if (0xD800..0xDC00).contains(&code) {
                    // High surrogate: a `\uDC00`-`\uDFFF` low surrogate must follow
                    let low_start = hex_start + 4;
                    let low = raw
                        .get(low_start..low_start + 2)
                        .filter(|prefix| *prefix == "\\u")
                        .and_then(|_| read_hex4(raw, low_start + 2))
                        .filter(|low| (0xDC00..0xE000).contains(low))
                        .ok_or_else(|| invalid(hex_start + 4))?;
                    for _ in 0..6 {
                        chars.next();
                    }
                    char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
                } else {
                    char::from_u32(code)
                };
                out.push(ch.ok_or_else(|| invalid(hex_start + 4))?);
            }
            other => return Err(invalid(offset + 1 + other.len_utf8())),
        }
    }
    Ok(Cow::Owned(out))
}

fn read_hex4(raw: &str, start: usize) -> Option<u32> {
    let digits = raw.get(start..start + 4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Computes the value of a block string from its raw contents (without the
/// triple quotes): common indentation and blank leading/trailing lines are
/// removed.
pub fn block_string_value(raw: &str) -> String {
    let raw = raw.replace("\\\"\"\"", "\"\"\"");
    let lines: Vec<&str> = raw.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();

    let is_blank = |line: &str| line.chars().all(|c| c == ' ' || c == '\t');
    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !is_blank(line))
        .map(|line| indent_of(line))
        .min();

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| match common_indent {
            Some(indent) if i > 0 => line.get(indent..).unwrap_or(""),
            _ => line,
        })
        .collect();

    while out.first().is_some_and(|line| is_blank(line)) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| is_blank(line)) {
        out.pop();
    }

    out.join("\n")
}

/// Tokenizes the entire source.
pub fn tokenize(source: &str, interner: &Interner) -> Vec<Token> {
    let mut lexer = Lexer::new(source, interner);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let interner = Interner::new();
        tokenize(source, &interner).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("{ } ( ) [ ] : ... = @ ! $"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Colon,
                TokenKind::Spread,
                TokenKind::Eq,
                TokenKind::At,
                TokenKind::Bang,
                TokenKind::Dollar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_commas_and_comments_are_trivia() {
        assert_eq!(
            kinds("a, b # trailing comment\n,c"),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("type scalar schema query fragment on true null Time"),
            vec![
                TokenKind::Type,
                TokenKind::Scalar,
                TokenKind::Schema,
                TokenKind::Query,
                TokenKind::Fragment,
                TokenKind::On,
                TokenKind::True,
                TokenKind::Null,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 -17 0 3.14 1e10 2.5e-3"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(kinds("007")[0], TokenKind::Error);
        assert_eq!(kinds("1.")[0], TokenKind::Error);
        assert_eq!(kinds("12abc")[0], TokenKind::Error);
        assert_eq!(kinds("- 1")[0], TokenKind::Error);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#""hello" "esc\"aped" """block string""""#),
            vec![
                TokenKind::StringLiteral,
                TokenKind::StringLiteral,
                TokenKind::BlockStringLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(kinds("\"open\n\"")[0], TokenKind::Error);
        assert_eq!(kinds("\"open")[0], TokenKind::Error);
    }

    #[test]
    fn test_unicode_outside_string_is_single_error() {
        let interner = Interner::new();
        let tokens = tokenize("時 a", &interner);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_unescape_borrowed() {
        assert!(matches!(
            unescape_string("2019-01-01T00:00:00Z"),
            Ok(Cow::Borrowed(_))
        ));
    }

    #[test]
    fn test_unescape_sequences() {
        let value = unescape_string(r#"a\"b\\c\/d\n\té"#).unwrap();
        assert_eq!(value, "a\"b\\c/d\n\té");
    }

    #[test]
    fn test_unescape_surrogate_pair() {
        let value = unescape_string(r"\ud83d\ude00").unwrap();
        assert_eq!(value, "😀");
    }

    #[test]
    fn test_unescape_invalid() {
        let err = unescape_string(r"ab\qc").unwrap_err();
        assert_eq!(err.offset, 2);
        assert_eq!(err.sequence, r"\q");
        assert!(unescape_string(r"\u12").is_err());
        assert!(unescape_string(r"\ud83d").is_err());
    }

    #[test]
    fn test_unescape_invalid_before_multibyte() {
        let err = unescape_string(r"\uaéé").unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.sequence, r"\uaéé");

        let err = unescape_string(r"x\ud83dé").unwrap_err();
        assert_eq!(err.sequence, r"\ud83d");
        assert!(unescape_string(r"\é").is_err());
    }

    #[test]
    fn test_block_string_value() {
        let raw = "\n    Current time.\n      Indented.\n  ";
        assert_eq!(block_string_value(raw), "Current time.\n  Indented.");
        assert_eq!(block_string_value(r#"say \""" hi"#), "say \"\"\" hi");
    }
}
