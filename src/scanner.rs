use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::token::{Span, Token, TokenKind};

/// Classifies a scanner error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// The source could not be opened or read.
    Io {
        kind: io::ErrorKind,
        message: String,
    },
    /// A character that cannot start any token, or a malformed UTF-8
    /// sequence (reported as U+FFFD).
    InvalidCharacter(char),
    /// String literal without its closing delimiter.
    UnterminatedString,
    /// `(*` comment without its closing `*)`.
    UnterminatedComment,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { message, .. } => write!(f, "cannot read source: {message}"),
            Self::InvalidCharacter(ch) => {
                write!(f, "invalid character {ch:?} (U+{:04X})", u32::from(*ch))
            }
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedComment => write!(f, "unterminated comment"),
        }
    }
}

/// Error produced while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub span: Span,
}

impl ScanError {
    fn io(err: &io::Error, span: Span) -> Self {
        Self {
            kind: ScanErrorKind::Io {
                kind: err.kind(),
                message: err.to_string(),
            },
            span,
        }
    }
}

/// Tokenize a whole source string, excluding the end-of-input token.
///
/// # Errors
///
/// Returns the first `ScanError` encountered.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ScanError> {
    Scanner::from_source(input)?.collect()
}

/// One decoded code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    Char(char),
    Malformed,
    Eof,
}

/// Streaming scanner with one token of lookahead.
///
/// Bytes are decoded into whole code points held in two cells,
/// `current` and `lookahead`, so a token boundary never splits a
/// multi-byte sequence.
pub struct Scanner<R> {
    reader: BufReader<R>,
    pending: Option<u8>,
    current: Decoded,
    lookahead: Decoded,
    line: usize,
    column: usize,
    peeked: Option<Token>,
    finished: bool,
}

impl Scanner<File> {
    /// Open a source file for scanning.
    ///
    /// # Errors
    ///
    /// Returns `ScanErrorKind::Io` when the file cannot be opened or read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let file = File::open(path).map_err(|e| ScanError::io(&e, Span::new(1, 1)))?;
        Self::new(file)
    }
}

impl<'a> Scanner<&'a [u8]> {
    /// Scan an in-memory source string.
    ///
    /// # Errors
    ///
    /// Same as [`Scanner::new`]; reading from memory does not fail.
    pub fn from_source(source: &'a str) -> Result<Self, ScanError> {
        Self::new(source.as_bytes())
    }
}

impl<R: Read> Scanner<R> {
    /// Bind a scanner to a byte stream, priming both character cells.
    ///
    /// # Errors
    ///
    /// Returns `ScanErrorKind::Io` if the first bytes cannot be read.
    pub fn new(reader: R) -> Result<Self, ScanError> {
        let mut scanner = Self {
            reader: BufReader::new(reader),
            pending: None,
            current: Decoded::Eof,
            lookahead: Decoded::Eof,
            line: 1,
            column: 1,
            peeked: None,
            finished: false,
        };
        scanner.current = scanner.decode()?;
        scanner.lookahead = scanner.decode()?;
        if scanner.current == Decoded::Char('\u{FEFF}') {
            scanner.current = scanner.lookahead;
            scanner.lookahead = scanner.decode()?;
        }
        Ok(scanner)
    }

    /// Consume and return the next token.
    ///
    /// After end of input this keeps returning `Eof` tokens.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError` for invalid characters, unterminated
    /// strings or comments, and read failures.
    pub fn next_token(&mut self) -> Result<Token, ScanError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    /// Return the next token without consuming it.
    ///
    /// Repeated calls return the same token until `next_token` is called.
    ///
    /// # Errors
    ///
    /// Same as [`Scanner::next_token`].
    pub fn peek_token(&mut self) -> Result<&Token, ScanError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Tear down the scanner and hand back the underlying reader.
    #[must_use]
    pub fn close(self) -> R {
        self.reader.into_inner()
    }

    const fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ScanError> {
        if let Some(byte) = self.pending.take() {
            return Ok(Some(byte));
        }
        let span = self.span();
        loop {
            match self.reader.fill_buf() {
                Ok(&[byte, ..]) => {
                    self.reader.consume(1);
                    return Ok(Some(byte));
                }
                Ok(_) => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ScanError::io(&e, span)),
            }
        }
    }

    fn decode(&mut self) -> Result<Decoded, ScanError> {
        let Some(lead) = self.read_byte()? else {
            return Ok(Decoded::Eof);
        };
        let (width, mut value, min) = match lead {
            0x00..=0x7F => return Ok(Decoded::Char(char::from(lead))),
            0xC2..=0xDF => (2, u32::from(lead & 0x1F), 0x80),
            0xE0..=0xEF => (3, u32::from(lead & 0x0F), 0x800),
            0xF0..=0xF4 => (4, u32::from(lead & 0x07), 0x1_0000),
            _ => return Ok(Decoded::Malformed),
        };
        for _ in 1..width {
            match self.read_byte()? {
                Some(byte) if byte & 0xC0 == 0x80 => {
                    value = (value << 6) | u32::from(byte & 0x3F);
                }
                Some(byte) => {
                    // Not a continuation byte; it starts the next code point.
                    self.pending = Some(byte);
                    return Ok(Decoded::Malformed);
                }
                None => return Ok(Decoded::Malformed),
            }
        }
        if value < min {
            return Ok(Decoded::Malformed);
        }
        Ok(char::from_u32(value).map_or(Decoded::Malformed, Decoded::Char))
    }

    fn advance(&mut self) -> Result<(), ScanError> {
        match self.current {
            Decoded::Eof => return Ok(()),
            Decoded::Char('\n') => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        self.current = self.lookahead;
        self.lookahead = self.decode()?;
        Ok(())
    }

    const fn lookahead_is(&self, ch: char) -> bool {
        matches!(self.lookahead, Decoded::Char(c) if c == ch)
    }

    fn scan(&mut self) -> Result<Token, ScanError> {
        self.skip_trivia()?;

        let start = self.span();
        let ch = match self.current {
            Decoded::Eof => return Ok(Token::new(TokenKind::Eof, String::new(), start)),
            Decoded::Malformed => {
                return Err(ScanError {
                    kind: ScanErrorKind::InvalidCharacter(char::REPLACEMENT_CHARACTER),
                    span: start,
                });
            }
            Decoded::Char(ch) => ch,
        };

        if ch.is_alphabetic() || ch == '_' {
            self.read_word(start)
        } else if ch.is_ascii_digit() {
            self.read_number(start)
        } else if ch == '\'' || ch == '"' {
            self.read_string(ch, start)
        } else {
            self.read_symbol(ch, start)
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ScanError> {
        loop {
            match self.current {
                Decoded::Char(ch) if ch.is_whitespace() => self.advance()?,
                Decoded::Char('(') if self.lookahead_is('*') => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), ScanError> {
        let start = self.span();
        self.advance()?; // (
        self.advance()?; // *
        let mut depth = 1usize;

        while depth > 0 {
            match self.current {
                Decoded::Eof => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnterminatedComment,
                        span: start,
                    });
                }
                Decoded::Char('(') if self.lookahead_is('*') => {
                    self.advance()?;
                    self.advance()?;
                    depth += 1;
                }
                Decoded::Char('*') if self.lookahead_is(')') => {
                    self.advance()?;
                    self.advance()?;
                    depth -= 1;
                }
                Decoded::Malformed => {
                    return Err(ScanError {
                        kind: ScanErrorKind::InvalidCharacter(char::REPLACEMENT_CHARACTER),
                        span: self.span(),
                    });
                }
                Decoded::Char(_) => self.advance()?,
            }
        }

        Ok(())
    }

    fn read_word(&mut self, start: Span) -> Result<Token, ScanError> {
        let mut text = String::new();
        while let Decoded::Char(ch) = self.current {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            text.push(ch);
            self.advance()?;
        }

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Ident);
        Ok(Token::new(kind, text, start))
    }

    fn read_number(&mut self, start: Span) -> Result<Token, ScanError> {
        let mut text = String::new();
        let mut kind = TokenKind::IntLiteral;

        loop {
            match self.current {
                Decoded::Char(ch) if ch.is_ascii_digit() => {
                    text.push(ch);
                    self.advance()?;
                }
                // `1..5` is a range, and a second `.` ends a real.
                Decoded::Char('.')
                    if kind == TokenKind::IntLiteral && !self.lookahead_is('.') =>
                {
                    kind = TokenKind::RealLiteral;
                    text.push('.');
                    self.advance()?;
                }
                _ => break,
            }
        }

        Ok(Token::new(kind, text, start))
    }

    fn read_string(&mut self, delimiter: char, start: Span) -> Result<Token, ScanError> {
        self.advance()?; // opening delimiter

        let mut value = String::new();
        loop {
            match self.current {
                Decoded::Eof => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnterminatedString,
                        span: start,
                    });
                }
                Decoded::Malformed => {
                    return Err(ScanError {
                        kind: ScanErrorKind::InvalidCharacter(char::REPLACEMENT_CHARACTER),
                        span: self.span(),
                    });
                }
                Decoded::Char(ch) if ch == delimiter => {
                    self.advance()?;
                    break;
                }
                Decoded::Char(ch) => {
                    value.push(ch);
                    self.advance()?;
                }
            }
        }

        Ok(Token::new(TokenKind::StringLiteral, value, start))
    }

    fn read_symbol(&mut self, ch: char, start: Span) -> Result<Token, ScanError> {
        // Two-character operators win over their one-character prefixes.
        let double = match (ch, self.lookahead) {
            (':', Decoded::Char('=')) => Some(TokenKind::Assign),
            ('.', Decoded::Char('.')) => Some(TokenKind::DotDot),
            ('<', Decoded::Char('=')) => Some(TokenKind::LessEqual),
            ('>', Decoded::Char('=')) => Some(TokenKind::GreaterEqual),
            _ => None,
        };
        if let Some(kind) = double {
            let mut text = String::from(ch);
            self.advance()?;
            if let Decoded::Char(second) = self.current {
                text.push(second);
            }
            self.advance()?;
            return Ok(Token::new(kind, text, start));
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Equal,
            '#' => TokenKind::Hash,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '&' => TokenKind::Ampersand,
            '^' => TokenKind::Caret,
            '|' => TokenKind::Bar,
            '~' => TokenKind::Tilde,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '.' => TokenKind::Dot,
            _ => {
                return Err(ScanError {
                    kind: ScanErrorKind::InvalidCharacter(ch),
                    span: start,
                });
            }
        };
        self.advance()?;
        Ok(Token::new(kind, String::from(ch), start))
    }
}

impl<R: Read> Iterator for Scanner<R> {
    type Item = Result<Token, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
