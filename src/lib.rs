//! Scanner, parser, formatter, and builder for Oberon-family source modules.
//!
//! A typed AST for the Pascal/Modula-2/Oberon lineage of languages, with
//! tools to parse modules from text or files, build them programmatically,
//! and format them back to canonical source.
//!
//! # Quick start
//!
//! ## Parse and re-format a module
//!
//! ```
//! use oberon_syntax::{format, parse_str};
//!
//! let module = parse_str("MODULE M; VAR x: INTEGER; BEGIN x := 1 END M.").unwrap();
//! assert_eq!(module.name.name, "M");
//! assert_eq!(
//!     format(&module),
//!     "MODULE M;\nVAR\n  x: INTEGER;\nBEGIN\n  x := 1\nEND M.\n"
//! );
//! ```
//!
//! ## Drive the scanner directly
//!
//! ```
//! use oberon_syntax::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::from_source("x := 42").unwrap();
//! assert_eq!(scanner.peek_token().unwrap().kind, TokenKind::Ident);
//! assert_eq!(scanner.next_token().unwrap().lexeme, "x");
//! assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Assign);
//! ```
//!
//! ## Build a module programmatically
//!
//! ```
//! use oberon_syntax::{Declaration, Expr, Module, Statement, TypeExpr, format};
//!
//! let module = Module::new("Counter")
//!     .declare(Declaration::var(&["n"], TypeExpr::named("INTEGER")))
//!     .statement(Statement::assign(Expr::ident("n"), Expr::int(0)));
//!
//! assert!(format(&module).contains("n := 0"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod formatter;
pub mod parser;
pub mod scanner;
pub mod token;

use std::path::Path;

pub use ast::{
    BinaryOp, Block, Declaration, Export, Expr, Ident, IdentDef, Import, Literal, Module,
    ProcedureDecl, Qualident, Statement, TypeExpr, UnaryOp,
};
pub use formatter::{format, format_expr, format_statements};
pub use parser::{
    DEFAULT_MAX_NESTING, Expected, ParseError, ParseErrorKind, ParseOptions, parse_expression,
    parse_module, parse_module_with, parse_statements,
};
pub use scanner::{ScanError, ScanErrorKind, Scanner, tokenize};
pub use token::{Span, Token, TokenKind};

/// Unified error type covering both scanning and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A scanner error.
    #[error("{0}")]
    Scan(#[from] ScanError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Source position the error refers to.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Scan(err) => err.span,
            Self::Parse(err) => err.span,
        }
    }
}

/// Scan and parse a module held in memory.
pub fn parse_str(input: &str) -> Result<Module, Error> {
    let mut scanner = Scanner::from_source(input)?;
    parse_module(&mut scanner)
}

/// Parse the module stored at `path`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Module, Error> {
    let mut scanner = Scanner::open(path)?;
    parse_module(&mut scanner)
}
