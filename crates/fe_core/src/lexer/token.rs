use crate::span::Span;

/// All fixed keywords of the language (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Const,
    Var,
    Function,
    Return,
    Defer,
    Inout,
    Import,
    Export,
    Pub,
    Package,
    Type,
    Domain,
    Effects,
    Capability,
    With,
    Context,
    Match,
    If,
    Else,
    For,
    While,
    Break,
    Continue,
    Comptime,
    Use,
    Error,
    As,
    Where,
    Asm,
    Component,
    In,
    Out,
    Ok,
    Err,
    Check,
    Ensure,
    MapError,
    Cap,
    UnsafeCast,
    Distribute,
    Infer,
    Map,
    True,
    False,
    Null,
}

impl Keyword {
    const ALL: &'static [(&'static str, Keyword)] = &[
        ("const", Keyword::Const),
        ("var", Keyword::Var),
        ("function", Keyword::Function),
        ("return", Keyword::Return),
        ("defer", Keyword::Defer),
        ("inout", Keyword::Inout),
        ("import", Keyword::Import),
        ("export", Keyword::Export),
        ("pub", Keyword::Pub),
        ("package", Keyword::Package),
        ("type", Keyword::Type),
        ("domain", Keyword::Domain),
        ("effects", Keyword::Effects),
        ("capability", Keyword::Capability),
        ("with", Keyword::With),
        ("context", Keyword::Context),
        ("match", Keyword::Match),
        ("if", Keyword::If),
        ("else", Keyword::Else),
        ("for", Keyword::For),
        ("while", Keyword::While),
        ("break", Keyword::Break),
        ("continue", Keyword::Continue),
        ("comptime", Keyword::Comptime),
        ("use", Keyword::Use),
        ("error", Keyword::Error),
        ("as", Keyword::As),
        ("where", Keyword::Where),
        ("asm", Keyword::Asm),
        ("component", Keyword::Component),
        ("in", Keyword::In),
        ("out", Keyword::Out),
        ("ok", Keyword::Ok),
        ("err", Keyword::Err),
        ("check", Keyword::Check),
        ("ensure", Keyword::Ensure),
        ("map_error", Keyword::MapError),
        ("cap", Keyword::Cap),
        ("unsafe_cast", Keyword::UnsafeCast),
        ("distribute", Keyword::Distribute),
        ("infer", Keyword::Infer),
        ("map", Keyword::Map),
        ("true", Keyword::True),
        ("false", Keyword::False),
        ("null", Keyword::Null),
    ];

    pub fn lookup(word: &str) -> Option<Keyword> {
        Self::ALL
            .iter()
            .find(|(text, _)| *text == word)
            .map(|(_, kw)| *kw)
    }
}

/// All fixed punctuation of the language (§4.2), longest-match first where two
/// punctuators share a prefix (`==` before `=`, `..=` before `..`, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    PlusPlus,
    DotDotEq,
    DotDot,
    Arrow,
    FatArrow,
    Ellipsis,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,
    Eq,
}

impl Punct {
    /// Ordered longest-first so `LexMap::can_match`/`get` never stop at a
    /// shorter punctuator that is itself a prefix of a longer one.
    pub const ALL: &'static [(&'static str, Punct)] = &[
        ("...", Punct::Ellipsis),
        ("..=", Punct::DotDotEq),
        ("..", Punct::DotDot),
        ("->", Punct::Arrow),
        ("=>", Punct::FatArrow),
        ("==", Punct::EqEq),
        ("!=", Punct::NotEq),
        ("<=", Punct::LtEq),
        (">=", Punct::GtEq),
        ("&&", Punct::AndAnd),
        ("||", Punct::OrOr),
        ("<<", Punct::Shl),
        (">>", Punct::Shr),
        ("++", Punct::PlusPlus),
        ("+", Punct::Plus),
        ("-", Punct::Minus),
        ("*", Punct::Star),
        ("/", Punct::Slash),
        ("%", Punct::Percent),
        ("<", Punct::Lt),
        (">", Punct::Gt),
        ("!", Punct::Bang),
        ("&", Punct::Amp),
        ("|", Punct::Pipe),
        ("^", Punct::Caret),
        ("~", Punct::Tilde),
        ("[", Punct::LBracket),
        ("]", Punct::RBracket),
        ("{", Punct::LBrace),
        ("}", Punct::RBrace),
        ("(", Punct::LParen),
        (")", Punct::RParen),
        (",", Punct::Comma),
        (";", Punct::Semicolon),
        (":", Punct::Colon),
        (".", Punct::Dot),
        ("?", Punct::Question),
        ("=", Punct::Eq),
    ];
}

/// The subset of token kinds that can be matched purely by lexeme text: every
/// keyword and every punctuator. Mirrors the teacher's `Terminal` type
/// (`lexmap.rs`), which `LexMap` is generic over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Keyword(Keyword),
    Punct(Punct),
}

impl Terminal {
    pub fn to_token(self, span: Span) -> Token {
        match self {
            Terminal::Keyword(kw) => Token::Keyword(kw, span),
            Terminal::Punct(p) => Token::Punct(p, span),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBase {
    Decimal,
    Hex,
    Binary,
    Octal,
}

#[derive(Debug, Clone)]
pub enum Token {
    Keyword(Keyword, Span),
    Punct(Punct, Span),
    Id(String, Span),
    Int { value: i128, base: IntBase, span: Span },
    Float { value: f64, span: Span },
    Str { value: String, span: Span },
    ByteStr { value: Vec<u8>, span: Span },
    Char { value: char, span: Span },
    Eof(Span),
}

/// Implemented by anything that can report where it came from in the source.
/// The teacher generates this via a derive macro (`lex_derive`); here it is a
/// plain trait with a hand-written impl.
pub trait GetPosition {
    fn position(&self) -> Span;
}

impl GetPosition for Token {
    fn position(&self) -> Span {
        match self {
            Token::Keyword(_, span)
            | Token::Punct(_, span)
            | Token::Id(_, span)
            | Token::Int { span, .. }
            | Token::Float { span, .. }
            | Token::Str { span, .. }
            | Token::ByteStr { span, .. }
            | Token::Char { span, .. }
            | Token::Eof(span) => span.clone(),
        }
    }
}

/// `Token`s compare equal by *kind* only — two `Id` tokens with different
/// lexemes are still "the same shape" to the combinator parser, which only
/// ever needs to know whether the next token is, say, an identifier at all.
/// Exact lexeme comparison happens in the AST builders, not in matching.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        use Token::*;
        match (self, other) {
            (Keyword(a, _), Keyword(b, _)) => a == b,
            (Punct(a, _), Punct(b, _)) => a == b,
            (Id(..), Id(..)) => true,
            (Int { .. }, Int { .. }) => true,
            (Float { .. }, Float { .. }) => true,
            (Str { .. }, Str { .. }) => true,
            (ByteStr { .. }, ByteStr { .. }) => true,
            (Char { .. }, Char { .. }) => true,
            (Eof(_), Eof(_)) => true,
            _ => false,
        }
    }
}

impl Eq for Token {}

/// A `Terminal` matches a `Token` when the token is the keyword/punctuator it
/// names, regardless of span — this is what lets `Comb::Terminal` be checked
/// against the live token stream.
impl PartialEq<Token> for Terminal {
    fn eq(&self, other: &Token) -> bool {
        match (self, other) {
            (Terminal::Keyword(a), Token::Keyword(b, _)) => a == b,
            (Terminal::Punct(a), Token::Punct(b, _)) => a == b,
            _ => false,
        }
    }
}
