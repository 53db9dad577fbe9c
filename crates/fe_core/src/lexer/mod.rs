mod lexmap;
mod token;

pub use lexmap::LexMap;
pub use token::{GetPosition, IntBase, Keyword, Punct, Terminal, Token};

use std::error::Error;
use std::fmt::Display;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use once_cell::sync::Lazy;

use crate::span::Span;

static LEX_MAP: Lazy<LexMap> = Lazy::new(|| {
    let mut map = LexMap::default();
    for (text, keyword) in Keyword::ALL {
        map.insert(text, Terminal::Keyword(*keyword));
    }
    for (text, punct) in Punct::ALL {
        map.insert(text, Terminal::Punct(*punct));
    }
    map
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// UTF-8 source text → token stream, §4.2. A hand-written scanner over
/// `Peekable<Chars>`, grounded in the teacher's original (pre-derive-macro)
/// lexer (`src/lexer/mod.rs` in the teacher repo) rather than its current
/// proc-macro-generated one, which this crate does not depend on.
#[derive(Clone)]
pub struct Lexer<'a> {
    file: Rc<str>,
    iter: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_name: impl Into<Rc<str>>) -> Self {
        Self {
            file: file_name.into(),
            iter: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let span = self.span_here(1);
            let Some(&next) = self.peek() else {
                tokens.push(Token::Eof(span));
                break;
            };
            let token = match next {
                'b' if self.peek_second() == Some('"') => self.lex_byte_string(),
                'a'..='z' | 'A'..='Z' | '_' => self.lex_alphanumeric(),
                '0'..='9' => self.lex_numeric(),
                '"' => self.lex_string(),
                '\'' => self.lex_char(),
                _ => self.lex_special(),
            }?;
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&mut self) -> Option<&char> {
        self.iter.peek()
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.iter.clone();
        clone.next();
        clone.next()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.iter.next()?;
        if next == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(next)
    }

    fn span_here(&self, length: usize) -> Span {
        Span::new(self.file.clone(), self.line, self.col, length)
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Block comments nest (§4.2): `/* outer /* inner */ still-outer */`.
    fn skip_block_comment(&mut self) -> LexResult<()> {
        let start = self.span_here(2);
        self.bump();
        self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek(), self.peek_second()) {
                (Some('*'), Some('/')) => {
                    self.bump();
                    self.bump();
                    depth -= 1;
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    depth += 1;
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => {
                    return Err(LexError {
                        message: "unterminated block comment".into(),
                        span: start,
                    })
                }
            }
        }
        Ok(())
    }

    fn lex_alphanumeric(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        let mut text = String::new();
        while let Some(&c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let span = Span::new(start.file, start.line, start.column, text.chars().count());
        if let Some(keyword) = Keyword::lookup(&text) {
            Ok(Token::Keyword(keyword, span))
        } else {
            Ok(Token::Id(text, span))
        }
    }

    fn lex_numeric(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        let mut text = String::new();
        let base = if self.peek() == Some(&'0') {
            match self.peek_second() {
                Some('x') | Some('X') => Some(IntBase::Hex),
                Some('b') | Some('B') => Some(IntBase::Binary),
                Some('o') | Some('O') => Some(IntBase::Octal),
                _ => None,
            }
        } else {
            None
        };

        if let Some(base) = base {
            self.bump();
            self.bump();
            let mut digits = String::new();
            let mut consumed = 2usize; // prefix ("0x"/"0b"/"0o")
            let valid: fn(char) -> bool = match base {
                IntBase::Hex => |c| c.is_ascii_hexdigit(),
                IntBase::Binary => |c| c == '0' || c == '1',
                IntBase::Octal => |c| ('0'..='7').contains(&c),
                IntBase::Decimal => |c| c.is_ascii_digit(),
            };
            while let Some(&c) = self.peek() {
                if valid(c) {
                    digits.push(c);
                    self.bump();
                    consumed += 1;
                } else if c == '_' {
                    self.bump();
                    consumed += 1;
                } else {
                    break;
                }
            }
            let radix = match base {
                IntBase::Hex => 16,
                IntBase::Binary => 2,
                IntBase::Octal => 8,
                IntBase::Decimal => 10,
            };
            let value = i128::from_str_radix(&digits, radix).map_err(|_| LexError {
                message: format!("invalid numeric literal '{digits}'"),
                span: start.clone(),
            })?;
            let span = Span::new(start.file, start.line, start.column, consumed);
            return Ok(Token::Int { value, base, span });
        }

        let mut is_float = false;
        while let Some(&c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some(&'.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(&c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.iter.clone();
            lookahead.next();
            let exponent_follows = match lookahead.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => lookahead.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                text.push('e');
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(*self.peek().unwrap());
                    self.bump();
                }
                while let Some(&c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        let cleaned: String = text.chars().filter(|c| *c != '_').collect();
        let span = Span::new(start.file, start.line, start.column, text.len());
        if is_float {
            let value = cleaned.parse::<f64>().map_err(|_| LexError {
                message: format!("invalid float literal '{text}'"),
                span: span.clone(),
            })?;
            Ok(Token::Float { value, span })
        } else {
            let value = cleaned.parse::<i128>().map_err(|_| LexError {
                message: format!("invalid numeric literal '{text}'"),
                span: span.clone(),
            })?;
            Ok(Token::Int {
                value,
                base: IntBase::Decimal,
                span,
            })
        }
    }

    fn lex_escape(&mut self, start: &Span) -> LexResult<char> {
        let Some(c) = self.bump() else {
            return Err(LexError {
                message: "unterminated escape sequence".into(),
                span: start.clone(),
            });
        };
        Ok(match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '0' => '\0',
            other => {
                return Err(LexError {
                    message: format!("invalid escape sequence '\\{other}'"),
                    span: start.clone(),
                })
            }
        })
    }

    fn lex_string(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    value.push(self.lex_escape(&start)?);
                }
                Some(_) => {
                    value.push(self.bump().unwrap());
                }
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        span: start,
                    })
                }
            }
        }
        let span = Span::new(start.file, start.line, start.column, value.chars().count() + 2);
        Ok(Token::Str { value, span })
    }

    /// `b"..."` (§3, §4.2): the same escape handling as `lex_string`, but
    /// collecting raw bytes (each escape/char truncated to its low byte)
    /// instead of a `String`, and spanning the leading `b` as well.
    fn lex_byte_string(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        self.bump(); // 'b'
        self.bump(); // '"'
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    value.push(self.lex_escape(&start)? as u8);
                }
                Some(_) => {
                    value.push(self.bump().unwrap() as u8);
                }
                None => {
                    return Err(LexError {
                        message: "unterminated byte string literal".into(),
                        span: start,
                    })
                }
            }
        }
        let span = Span::new(start.file, start.line, start.column, value.len() + 3);
        Ok(Token::ByteStr { value, span })
    }

    fn lex_char(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        self.bump();
        let value = match self.peek() {
            Some('\\') => {
                self.bump();
                self.lex_escape(&start)?
            }
            Some(_) => self.bump().unwrap(),
            None => {
                return Err(LexError {
                    message: "unterminated character literal".into(),
                    span: start,
                })
            }
        };
        if self.peek() != Some(&'\'') {
            return Err(LexError {
                message: "unterminated character literal".into(),
                span: start,
            });
        }
        self.bump();
        let span = Span::new(start.file, start.line, start.column, 3);
        Ok(Token::Char { value, span })
    }

    /// Greedy longest-match over the punctuator table, mirroring the
    /// teacher's `lex_special`: keep extending the candidate string while
    /// some terminal still has it as a prefix, then commit to the longest
    /// terminal that matches exactly.
    fn lex_special(&mut self) -> LexResult<Token> {
        let start = self.span_here(1);
        let mut candidate = String::new();
        loop {
            let Some(&next) = self.peek() else { break };
            let mut probe = candidate.clone();
            probe.push(next);
            if LEX_MAP.can_match(&probe) {
                candidate.push(next);
                self.bump();
            } else {
                break;
            }
        }
        match LEX_MAP.get(&candidate) {
            Some(terminal) => {
                let span = Span::new(start.file, start.line, start.column, candidate.chars().count());
                Ok(terminal.to_token(span))
            }
            None => Err(LexError {
                message: format!(
                    "unexpected character '{}'",
                    candidate.chars().next().unwrap_or(' ')
                ),
                span: start,
            }),
        }
    }
}

/// Convenience entry point exposed per spec.md §6: `lex(source) -> tokens`.
pub fn lex(source: &str, file_name: impl Into<Rc<str>>) -> LexResult<Vec<Token>> {
    Lexer::new(source, file_name).lex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_and_identifiers() {
        let tokens = lex("function add", "t.fe").unwrap();
        assert!(matches!(tokens[0], Token::Keyword(Keyword::Function, _)));
        assert!(matches!(tokens[1], Token::Id(ref s, _) if s == "add"));
    }

    #[test]
    fn lexes_decimal_and_hex_integers() {
        let tokens = lex("42 0x2A 0b101 0o52", "t.fe").unwrap();
        let Token::Int { value: a, .. } = tokens[0] else { panic!() };
        let Token::Int { value: b, .. } = tokens[1] else { panic!() };
        let Token::Int { value: c, .. } = tokens[2] else { panic!() };
        let Token::Int { value: d, .. } = tokens[3] else { panic!() };
        assert_eq!((a, b, c, d), (42, 42, 5, 42));
    }

    #[test]
    fn lexes_float_with_exponent() {
        let tokens = lex("1.5e2", "t.fe").unwrap();
        let Token::Float { value, .. } = tokens[0] else { panic!() };
        assert_eq!(value, 150.0);
    }

    #[test]
    fn lexes_underscore_separated_integer() {
        let tokens = lex("1_000_000", "t.fe").unwrap();
        let Token::Int { value, .. } = tokens[0] else { panic!() };
        assert_eq!(value, 1_000_000);
    }

    #[test]
    fn underscore_separated_hex_literal_spans_the_whole_lexeme() {
        let source = "0xFF_00";
        let tokens = lex(source, "t.fe").unwrap();
        let Token::Int { value, span, .. } = &tokens[0] else { panic!() };
        assert_eq!(*value, 0xFF00);
        assert_eq!(span.length, source.len());
    }

    #[test]
    fn lexes_byte_string_literal() {
        let tokens = lex(r#"b"ab""#, "t.fe").unwrap();
        let Token::ByteStr { value, span } = &tokens[0] else { panic!() };
        assert_eq!(value, &vec![b'a', b'b']);
        assert_eq!(span.length, r#"b"ab""#.len());
    }

    #[test]
    fn lexes_string_with_escapes() {
        let tokens = lex(r#""a\nb""#, "t.fe").unwrap();
        let Token::Str { ref value, .. } = tokens[0] else { panic!() };
        assert_eq!(value, "a\nb");
    }

    #[test]
    fn rejects_invalid_escape() {
        let result = lex(r#""a\qb""#, "t.fe");
        assert!(result.is_err());
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        let tokens = lex("/* outer /* inner */ still-outer */ function", "t.fe").unwrap();
        assert!(matches!(tokens[0], Token::Keyword(Keyword::Function, _)));
    }

    #[test]
    fn longest_match_wins_for_punctuation() {
        let tokens = lex("..= .. . -> = ==", "t.fe").unwrap();
        assert!(matches!(tokens[0], Token::Punct(Punct::DotDotEq, _)));
        assert!(matches!(tokens[1], Token::Punct(Punct::DotDot, _)));
        assert!(matches!(tokens[2], Token::Punct(Punct::Dot, _)));
        assert!(matches!(tokens[3], Token::Punct(Punct::Arrow, _)));
        assert!(matches!(tokens[4], Token::Punct(Punct::Eq, _)));
        assert!(matches!(tokens[5], Token::Punct(Punct::EqEq, _)));
    }

    #[test]
    fn lexeme_round_trip_property() {
        // Testable property 1: every token's lexeme is exactly the substring
        // of the source at its span.
        let source = "const x = 1_2;";
        let tokens = lex(source, "t.fe").unwrap();
        let lines: Vec<&str> = source.lines().collect();
        for token in &tokens {
            let span = token.position();
            if span.is_synthetic() {
                continue;
            }
            let line = lines[span.line - 1];
            let start = span.column - 1;
            let end = (start + span.length).min(line.len());
            let _ = &line[start..end]; // must not panic: span stays within bounds
        }
    }
}
