use std::fmt;

use serde::Serialize;

/// Source location for error reporting (1-based).
///
/// The default `0:0` marks a node built in code rather than parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Token kinds produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// End of input.
    Eof,
    Ident,
    IntLiteral,
    RealLiteral,
    /// `'...'` or `"..."`; the lexeme excludes the delimiters.
    StringLiteral,

    // Keywords
    Module,
    Import,
    Const,
    Type,
    Var,
    Procedure,
    Begin,
    End,
    If,
    Then,
    Else,
    Elsif,
    While,
    Do,
    Repeat,
    Until,
    For,
    To,
    By,
    Case,
    Of,
    Return,
    Array,
    Record,
    Pointer,
    Is,
    In,
    Loop,
    Exit,
    With,
    Nil,
    True,
    False,
    Boolean,
    Char,
    Integer,
    Real,
    Div,
    Mod,
    Or,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Equal,
    Hash,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Ampersand,
    Caret,
    Bar,
    Tilde,
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,
    DotDot,
}

/// Reserved words, in their lowercase spelling.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("module", TokenKind::Module),
    ("import", TokenKind::Import),
    ("const", TokenKind::Const),
    ("type", TokenKind::Type),
    ("var", TokenKind::Var),
    ("procedure", TokenKind::Procedure),
    ("begin", TokenKind::Begin),
    ("end", TokenKind::End),
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("else", TokenKind::Else),
    ("elsif", TokenKind::Elsif),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("repeat", TokenKind::Repeat),
    ("until", TokenKind::Until),
    ("for", TokenKind::For),
    ("to", TokenKind::To),
    ("by", TokenKind::By),
    ("case", TokenKind::Case),
    ("of", TokenKind::Of),
    ("return", TokenKind::Return),
    ("array", TokenKind::Array),
    ("record", TokenKind::Record),
    ("pointer", TokenKind::Pointer),
    ("is", TokenKind::Is),
    ("in", TokenKind::In),
    ("loop", TokenKind::Loop),
    ("exit", TokenKind::Exit),
    ("with", TokenKind::With),
    ("nil", TokenKind::Nil),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("boolean", TokenKind::Boolean),
    ("char", TokenKind::Char),
    ("integer", TokenKind::Integer),
    ("real", TokenKind::Real),
    ("div", TokenKind::Div),
    ("mod", TokenKind::Mod),
    ("or", TokenKind::Or),
];

impl TokenKind {
    /// Classify a word as a reserved keyword.
    ///
    /// A keyword matches only when spelled entirely in lowercase or
    /// entirely in uppercase; `Begin` is an identifier.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        let uppercase = word.bytes().all(|b| b.is_ascii_uppercase());
        KEYWORDS
            .iter()
            .find(|(spelling, _)| {
                *spelling == word || (uppercase && spelling.eq_ignore_ascii_case(word))
            })
            .map(|&(_, kind)| kind)
    }

    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Module
                | Self::Import
                | Self::Const
                | Self::Type
                | Self::Var
                | Self::Procedure
                | Self::Begin
                | Self::End
                | Self::If
                | Self::Then
                | Self::Else
                | Self::Elsif
                | Self::While
                | Self::Do
                | Self::Repeat
                | Self::Until
                | Self::For
                | Self::To
                | Self::By
                | Self::Case
                | Self::Of
                | Self::Return
                | Self::Array
                | Self::Record
                | Self::Pointer
                | Self::Is
                | Self::In
                | Self::Loop
                | Self::Exit
                | Self::With
                | Self::Nil
                | Self::True
                | Self::False
                | Self::Boolean
                | Self::Char
                | Self::Integer
                | Self::Real
                | Self::Div
                | Self::Mod
                | Self::Or
        )
    }

    /// Canonical source text for fixed-spelling kinds.
    #[must_use]
    pub const fn spelling(self) -> Option<&'static str> {
        let text = match self {
            Self::Eof | Self::Ident | Self::IntLiteral | Self::RealLiteral | Self::StringLiteral => {
                return None;
            }
            Self::Module => "MODULE",
            Self::Import => "IMPORT",
            Self::Const => "CONST",
            Self::Type => "TYPE",
            Self::Var => "VAR",
            Self::Procedure => "PROCEDURE",
            Self::Begin => "BEGIN",
            Self::End => "END",
            Self::If => "IF",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::Elsif => "ELSIF",
            Self::While => "WHILE",
            Self::Do => "DO",
            Self::Repeat => "REPEAT",
            Self::Until => "UNTIL",
            Self::For => "FOR",
            Self::To => "TO",
            Self::By => "BY",
            Self::Case => "CASE",
            Self::Of => "OF",
            Self::Return => "RETURN",
            Self::Array => "ARRAY",
            Self::Record => "RECORD",
            Self::Pointer => "POINTER",
            Self::Is => "IS",
            Self::In => "IN",
            Self::Loop => "LOOP",
            Self::Exit => "EXIT",
            Self::With => "WITH",
            Self::Nil => "NIL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Boolean => "BOOLEAN",
            Self::Char => "CHAR",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Or => "OR",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Assign => ":=",
            Self::Equal => "=",
            Self::Hash => "#",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Ampersand => "&",
            Self::Caret => "^",
            Self::Bar => "|",
            Self::Tilde => "~",
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Dot => ".",
            Self::DotDot => "..",
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "end of input"),
            Self::Ident => write!(f, "identifier"),
            Self::IntLiteral => write!(f, "integer literal"),
            Self::RealLiteral => write!(f, "real literal"),
            Self::StringLiteral => write!(f, "string literal"),
            other => match other.spelling() {
                Some(text) => write!(f, "'{text}'"),
                None => write!(f, "{other:?}"),
            },
        }
    }
}

/// A single token with its kind, source text, and location.
///
/// The lexeme is owned, so a token outlives the scanner that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, lexeme: String, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.span.line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.span.column
    }
}
