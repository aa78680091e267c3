use std::fmt;
use std::io::Read;
use std::mem;

use crate::Error;
use crate::ast::{
    BinaryOp, Block, Branch, CaseArm, CaseLabel, Declaration, Export, Expr, FieldList, Ident,
    IdentDef, Import, Literal, Module, ParamSection, ProcedureDecl, Qualident, SetElement,
    Statement, TypeExpr, UnaryOp,
};
use crate::scanner::Scanner;
use crate::token::{Span, Token, TokenKind};

/// Nesting limit used by [`ParseOptions::default`].
///
/// Sized so the deepest accepted input still parses on a 2 MiB thread
/// stack in an unoptimized build.
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Parser behavior options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum depth of nested expressions, statement sequences, types,
    /// and procedures before the input is rejected. Index and argument
    /// lists count as an extra level.
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    Expression,
    Type,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(kind) => write!(f, "{kind}"),
            Self::Expression => write!(f, "expression"),
            Self::Type => write!(f, "type"),
        }
    }
}

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The current token does not fit the grammar.
    UnexpectedToken {
        expected: Expected,
        found: TokenKind,
        lexeme: String,
    },
    /// `MODULE M; ... END N.` with `M != N`.
    ModuleNameMismatch { opening: String, closing: String },
    /// `PROCEDURE P; ... END Q` with `P != Q`.
    ProcedureNameMismatch { opening: String, closing: String },
    /// Numeric literal that does not fit its type.
    NumberOutOfRange { lexeme: String },
    /// Input nested deeper than `ParseOptions::max_nesting`.
    NestingTooDeep { limit: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                expected,
                found: TokenKind::Eof,
                ..
            } => write!(f, "expected {expected}, found end of input"),
            Self::UnexpectedToken {
                expected,
                found,
                lexeme,
            } => match found {
                TokenKind::Ident
                | TokenKind::IntLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral => {
                    write!(f, "expected {expected}, found {found} '{lexeme}'")
                }
                _ => write!(f, "expected {expected}, found {found}"),
            },
            Self::ModuleNameMismatch { opening, closing } => {
                write!(f, "module '{opening}' is closed by 'END {closing}'")
            }
            Self::ProcedureNameMismatch { opening, closing } => {
                write!(f, "procedure '{opening}' is closed by 'END {closing}'")
            }
            Self::NumberOutOfRange { lexeme } => {
                write!(f, "number out of range: {lexeme}")
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "nesting exceeds the limit of {limit} levels")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse one module from a scanner with default options.
///
/// # Errors
///
/// Returns `Error::Scan` for lexical failures and `Error::Parse` for the
/// first grammar violation; no partial tree is produced.
pub fn parse_module<R: Read>(scanner: &mut Scanner<R>) -> Result<Module, Error> {
    parse_module_with(scanner, ParseOptions::default())
}

/// Parse one module with explicit options.
pub fn parse_module_with<R: Read>(
    scanner: &mut Scanner<R>,
    options: ParseOptions,
) -> Result<Module, Error> {
    Parser::new(scanner, options)?.module()
}

/// Parse a bare statement sequence that runs to end of input.
pub fn parse_statements<R: Read>(scanner: &mut Scanner<R>) -> Result<Vec<Statement>, Error> {
    let mut parser = Parser::new(scanner, ParseOptions::default())?;
    let statements = parser.statement_sequence()?;
    parser.expect(TokenKind::Eof)?;
    Ok(statements)
}

/// Parse a single expression that runs to end of input.
pub fn parse_expression<R: Read>(scanner: &mut Scanner<R>) -> Result<Expr, Error> {
    let mut parser = Parser::new(scanner, ParseOptions::default())?;
    let expr = parser.expression()?;
    parser.expect(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser<'s, R> {
    scanner: &'s mut Scanner<R>,
    current: Token,
    options: ParseOptions,
    depth: usize,
}

impl<'s, R: Read> Parser<'s, R> {
    fn new(scanner: &'s mut Scanner<R>, options: ParseOptions) -> Result<Self, Error> {
        let current = scanner.next_token()?;
        Ok(Self {
            scanner,
            current,
            options,
            depth: 0,
        })
    }

    // -----------------------------------------------------------
    // Module structure.
    // -----------------------------------------------------------

    fn module(&mut self) -> Result<Module, Error> {
        self.expect(TokenKind::Module)?;
        let name = self.ident()?;
        self.expect(TokenKind::Semicolon)?;

        let imports = if self.check(TokenKind::Import) {
            self.import_list()?
        } else {
            Vec::new()
        };
        let declarations = self.declaration_sequence()?;
        let body = if self.accept(TokenKind::Begin)? {
            self.statement_sequence()?
        } else {
            Vec::new()
        };

        self.expect(TokenKind::End)?;
        let closing_name = self.ident()?;
        if closing_name.name != name.name {
            return Err(Self::error(
                ParseErrorKind::ModuleNameMismatch {
                    opening: name.name,
                    closing: closing_name.name,
                },
                closing_name.span,
            ));
        }
        self.expect(TokenKind::Dot)?;
        self.expect(TokenKind::Eof)?;

        Ok(Module {
            name,
            imports,
            declarations,
            body,
            closing_name,
        })
    }

    fn import_list(&mut self) -> Result<Vec<Import>, Error> {
        self.expect(TokenKind::Import)?;
        let mut imports = Vec::new();
        loop {
            let local = self.ident()?;
            let original = if self.accept(TokenKind::Assign)? {
                Some(self.ident()?)
            } else {
                None
            };
            imports.push(Import { local, original });
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(imports)
    }

    // -----------------------------------------------------------
    // Declarations.
    // -----------------------------------------------------------

    fn declaration_sequence(&mut self) -> Result<Vec<Declaration>, Error> {
        let mut declarations = Vec::new();
        loop {
            match self.current.kind {
                TokenKind::Const => {
                    self.bump()?;
                    while self.check(TokenKind::Ident) {
                        let name = self.ident_def()?;
                        self.expect(TokenKind::Equal)?;
                        let value = self.expression()?;
                        self.expect(TokenKind::Semicolon)?;
                        declarations.push(Declaration::Const { name, value });
                    }
                }
                TokenKind::Type => {
                    self.bump()?;
                    while self.check(TokenKind::Ident) {
                        let name = self.ident_def()?;
                        self.expect(TokenKind::Equal)?;
                        let ty = self.type_expr()?;
                        self.expect(TokenKind::Semicolon)?;
                        declarations.push(Declaration::Type { name, ty });
                    }
                }
                TokenKind::Var => {
                    self.bump()?;
                    while self.check(TokenKind::Ident) {
                        let names = self.ident_def_list()?;
                        self.expect(TokenKind::Colon)?;
                        let ty = self.type_expr()?;
                        self.expect(TokenKind::Semicolon)?;
                        declarations.push(Declaration::Var { names, ty });
                    }
                }
                TokenKind::Procedure => {
                    let procedure = self.procedure_declaration()?;
                    self.expect(TokenKind::Semicolon)?;
                    declarations.push(Declaration::Procedure(procedure));
                }
                _ => return Ok(declarations),
            }
        }
    }

    fn procedure_declaration(&mut self) -> Result<ProcedureDecl, Error> {
        self.descend(|p| {
            p.expect(TokenKind::Procedure)?;
            let forward = p.accept(TokenKind::Caret)?;
            let name = p.ident_def()?;
            let (params, return_type) = if p.check(TokenKind::LParen) {
                p.formal_parameters()?
            } else {
                (Vec::new(), None)
            };

            // A forward heading ends here; the caller takes the `;`.
            if forward {
                let closing_name = name.ident.clone();
                return Ok(ProcedureDecl {
                    name,
                    forward,
                    params,
                    return_type,
                    body: Block::default(),
                    closing_name,
                });
            }
            p.expect(TokenKind::Semicolon)?;

            let declarations = p.declaration_sequence()?;
            let statements = if p.accept(TokenKind::Begin)? {
                p.statement_sequence()?
            } else {
                Vec::new()
            };
            let return_expr = if p.accept(TokenKind::Return)? {
                Some(p.expression()?)
            } else {
                None
            };
            p.expect(TokenKind::End)?;

            let closing_name = p.ident()?;
            if closing_name.name != name.ident.name {
                return Err(Self::error(
                    ParseErrorKind::ProcedureNameMismatch {
                        opening: name.ident.name,
                        closing: closing_name.name,
                    },
                    closing_name.span,
                ));
            }

            Ok(ProcedureDecl {
                name,
                forward,
                params,
                return_type,
                body: Block {
                    declarations,
                    statements,
                    return_expr,
                },
                closing_name,
            })
        })
    }

    fn formal_parameters(&mut self) -> Result<(Vec<ParamSection>, Option<Qualident>), Error> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let is_var = self.accept(TokenKind::Var)?;
                let names = self.ident_list()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.type_expr()?;
                params.push(ParamSection { is_var, names, ty });
                if !self.accept(TokenKind::Semicolon)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_type = if self.accept(TokenKind::Colon)? {
            Some(self.qualident()?)
        } else {
            None
        };
        Ok((params, return_type))
    }

    // -----------------------------------------------------------
    // Types.
    // -----------------------------------------------------------

    fn type_expr(&mut self) -> Result<TypeExpr, Error> {
        self.descend(|p| match p.current.kind {
            TokenKind::Ident
            | TokenKind::Boolean
            | TokenKind::Char
            | TokenKind::Integer
            | TokenKind::Real => Ok(TypeExpr::Named(p.qualident()?)),
            TokenKind::Array => {
                p.bump()?;
                let lengths = if p.check(TokenKind::Of) {
                    Vec::new()
                } else {
                    p.expression_list()?
                };
                p.expect(TokenKind::Of)?;
                let element = Box::new(p.type_expr()?);
                Ok(TypeExpr::Array { lengths, element })
            }
            TokenKind::Record => p.record_type(),
            TokenKind::Pointer => {
                p.bump()?;
                p.expect(TokenKind::To)?;
                Ok(TypeExpr::Pointer(Box::new(p.type_expr()?)))
            }
            TokenKind::Procedure => {
                p.bump()?;
                let (params, return_type) = if p.check(TokenKind::LParen) {
                    p.formal_parameters()?
                } else {
                    (Vec::new(), None)
                };
                Ok(TypeExpr::Procedure {
                    params,
                    return_type,
                })
            }
            _ => Err(p.unexpected(Expected::Type)),
        })
    }

    fn record_type(&mut self) -> Result<TypeExpr, Error> {
        self.expect(TokenKind::Record)?;
        let base = if self.accept(TokenKind::LParen)? {
            let base = self.qualident()?;
            self.expect(TokenKind::RParen)?;
            Some(base)
        } else {
            None
        };

        let mut fields = Vec::new();
        loop {
            if self.check(TokenKind::Ident) {
                let names = self.ident_def_list()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.type_expr()?;
                fields.push(FieldList { names, ty });
            }
            if !self.accept(TokenKind::Semicolon)? {
                break;
            }
        }
        self.expect(TokenKind::End)?;

        Ok(TypeExpr::Record { base, fields })
    }

    // -----------------------------------------------------------
    // Statements.
    // -----------------------------------------------------------

    const fn at_sequence_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::End
                | TokenKind::Else
                | TokenKind::Elsif
                | TokenKind::Until
                | TokenKind::Bar
                | TokenKind::Eof
        )
    }

    fn statement_sequence(&mut self) -> Result<Vec<Statement>, Error> {
        self.descend(|p| {
            let mut statements = Vec::new();
            while !p.at_sequence_end() {
                let statement = p.statement()?;
                let separated = p.accept(TokenKind::Semicolon)?;
                // An empty statement only exists between separators.
                if separated || !matches!(statement, Statement::Empty) {
                    statements.push(statement);
                }
                if !separated {
                    break;
                }
            }
            Ok(statements)
        })
    }

    fn statement(&mut self) -> Result<Statement, Error> {
        match self.current.kind {
            TokenKind::Ident => self.assignment_or_call(),
            TokenKind::If => self.if_statement(),
            TokenKind::Case => self.case_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Repeat => {
                self.bump()?;
                let body = self.statement_sequence()?;
                self.expect(TokenKind::Until)?;
                let until = self.expression()?;
                Ok(Statement::Repeat { body, until })
            }
            TokenKind::For => self.for_statement(),
            TokenKind::Loop => {
                self.bump()?;
                let body = self.statement_sequence()?;
                self.expect(TokenKind::End)?;
                Ok(Statement::Loop { body })
            }
            TokenKind::Exit => {
                self.bump()?;
                Ok(Statement::Exit)
            }
            TokenKind::Return => {
                self.bump()?;
                // `RETURN` directly followed by a procedure result.
                let value = if self.at_sequence_end()
                    || self.check(TokenKind::Semicolon)
                    || self.check(TokenKind::Return)
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                Ok(Statement::Return(value))
            }
            _ => Ok(Statement::Empty),
        }
    }

    fn assignment_or_call(&mut self) -> Result<Statement, Error> {
        // `x := ...` is decided by one token of lookahead.
        if self.peek_kind()? == TokenKind::Assign {
            let target = Expr::Ident(self.ident()?);
            self.bump()?;
            let value = self.expression()?;
            return Ok(Statement::Assignment { target, value });
        }

        let designator = self.designator()?;
        if self.accept(TokenKind::Assign)? {
            let value = self.expression()?;
            return Ok(Statement::Assignment {
                target: designator,
                value,
            });
        }

        let args = if self.check(TokenKind::LParen) {
            self.actual_parameters()?
        } else {
            Vec::new()
        };
        Ok(Statement::Call {
            callee: designator,
            args,
        })
    }

    fn if_statement(&mut self) -> Result<Statement, Error> {
        self.expect(TokenKind::If)?;
        let mut branches = vec![self.branch(TokenKind::Then)?];
        while self.accept(TokenKind::Elsif)? {
            branches.push(self.branch(TokenKind::Then)?);
        }
        let else_body = if self.accept(TokenKind::Else)? {
            Some(self.statement_sequence()?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;
        Ok(Statement::If {
            branches,
            else_body,
        })
    }

    fn while_statement(&mut self) -> Result<Statement, Error> {
        self.expect(TokenKind::While)?;
        let mut branches = vec![self.branch(TokenKind::Do)?];
        while self.accept(TokenKind::Elsif)? {
            branches.push(self.branch(TokenKind::Do)?);
        }
        self.expect(TokenKind::End)?;
        Ok(Statement::While { branches })
    }

    /// `cond THEN seq` or `cond DO seq`.
    fn branch(&mut self, keyword: TokenKind) -> Result<Branch, Error> {
        let cond = self.expression()?;
        self.expect(keyword)?;
        let body = self.statement_sequence()?;
        Ok(Branch { cond, body })
    }

    fn case_statement(&mut self) -> Result<Statement, Error> {
        self.expect(TokenKind::Case)?;
        let selector = self.expression()?;
        self.expect(TokenKind::Of)?;

        let mut arms = Vec::new();
        loop {
            if !matches!(
                self.current.kind,
                TokenKind::Bar | TokenKind::Else | TokenKind::End
            ) {
                arms.push(self.case_arm()?);
            }
            if !self.accept(TokenKind::Bar)? {
                break;
            }
        }

        let else_body = if self.accept(TokenKind::Else)? {
            Some(self.statement_sequence()?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;

        Ok(Statement::Case {
            selector,
            arms,
            else_body,
        })
    }

    fn case_arm(&mut self) -> Result<CaseArm, Error> {
        let mut labels = Vec::new();
        loop {
            let low = self.expression()?;
            let high = if self.accept(TokenKind::DotDot)? {
                Some(self.expression()?)
            } else {
                None
            };
            labels.push(CaseLabel { low, high });
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::Colon)?;
        let body = self.statement_sequence()?;
        Ok(CaseArm { labels, body })
    }

    fn for_statement(&mut self) -> Result<Statement, Error> {
        self.expect(TokenKind::For)?;
        let var = self.ident()?;
        self.expect(TokenKind::Assign)?;
        let from = self.expression()?;
        self.expect(TokenKind::To)?;
        let to = self.expression()?;
        let by = if self.accept(TokenKind::By)? {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Do)?;
        let body = self.statement_sequence()?;
        self.expect(TokenKind::End)?;
        Ok(Statement::For {
            var,
            from,
            to,
            by,
            body,
        })
    }

    // -----------------------------------------------------------
    // Expressions.
    // -----------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, Error> {
        self.descend(|p| {
            let left = p.simple_expression()?;
            // Relations do not chain: at most one per expression.
            let Some(op) = relation(p.current.kind) else {
                return Ok(left);
            };
            p.bump()?;
            let right = p.simple_expression()?;
            Ok(binary(op, left, right))
        })
    }

    fn simple_expression(&mut self) -> Result<Expr, Error> {
        let mut left = self.term()?;
        while let Some(op) = additive(self.current.kind) {
            self.bump()?;
            let right = self.term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, Error> {
        let mut left = self.unary()?;
        while let Some(op) = multiplicative(self.current.kind) {
            self.bump()?;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Tilde => UnaryOp::Not,
            _ => return self.factor(),
        };
        self.bump()?;
        let operand = self.descend(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn factor(&mut self) -> Result<Expr, Error> {
        match self.current.kind {
            TokenKind::IntLiteral => {
                let token = self.bump()?;
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    Self::error(
                        ParseErrorKind::NumberOutOfRange {
                            lexeme: token.lexeme.clone(),
                        },
                        token.span,
                    )
                })?;
                Ok(Expr::Literal(Literal::Integer(value)))
            }
            TokenKind::RealLiteral => {
                let token = self.bump()?;
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        Self::error(
                            ParseErrorKind::NumberOutOfRange {
                                lexeme: token.lexeme.clone(),
                            },
                            token.span,
                        )
                    })?;
                Ok(Expr::Literal(Literal::Real(value)))
            }
            TokenKind::StringLiteral => {
                let token = self.bump()?;
                Ok(Expr::Literal(Literal::String(token.lexeme)))
            }
            TokenKind::True => {
                self.bump()?;
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Nil => {
                self.bump()?;
                Ok(Expr::Literal(Literal::Nil))
            }
            TokenKind::LBrace => self.set(),
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident => {
                let designator = self.designator()?;
                if self.check(TokenKind::LParen) {
                    let args = self.actual_parameters()?;
                    Ok(Expr::Call {
                        callee: Box::new(designator),
                        args,
                    })
                } else {
                    Ok(designator)
                }
            }
            _ => Err(self.unexpected(Expected::Expression)),
        }
    }

    fn set(&mut self) -> Result<Expr, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let low = self.expression()?;
                let high = if self.accept(TokenKind::DotDot)? {
                    Some(self.expression()?)
                } else {
                    None
                };
                elements.push(SetElement { low, high });
                if !self.accept(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Set(elements))
    }

    /// Identifier followed by any chain of `.f`, `[i]`, and `^`.
    fn designator(&mut self) -> Result<Expr, Error> {
        let mut expr = Expr::Ident(self.ident()?);
        loop {
            let kind = self.current.kind;
            match kind {
                TokenKind::Dot if self.peek_kind()? == TokenKind::Ident => {
                    self.bump()?;
                    let field = self.ident()?;
                    expr = Expr::Field {
                        base: Box::new(expr),
                        field,
                    };
                }
                TokenKind::LBracket => {
                    self.bump()?;
                    let indices = self.descend(Self::expression_list)?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index {
                        base: Box::new(expr),
                        indices,
                    };
                }
                TokenKind::Caret => {
                    self.bump()?;
                    expr = Expr::Deref(Box::new(expr));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn actual_parameters(&mut self) -> Result<Vec<Expr>, Error> {
        self.expect(TokenKind::LParen)?;
        let args = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.descend(Self::expression_list)?
        };
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn expression_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut exprs = vec![self.expression()?];
        while self.accept(TokenKind::Comma)? {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    // -----------------------------------------------------------
    // Names.
    // -----------------------------------------------------------

    fn ident(&mut self) -> Result<Ident, Error> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: token.lexeme,
            span: token.span,
        })
    }

    fn ident_def(&mut self) -> Result<IdentDef, Error> {
        let ident = self.ident()?;
        let export = if self.accept(TokenKind::Star)? {
            Export::Public
        } else if self.accept(TokenKind::Minus)? {
            Export::ReadOnly
        } else {
            Export::Private
        };
        Ok(IdentDef { ident, export })
    }

    fn ident_list(&mut self) -> Result<Vec<Ident>, Error> {
        let mut idents = vec![self.ident()?];
        while self.accept(TokenKind::Comma)? {
            idents.push(self.ident()?);
        }
        Ok(idents)
    }

    fn ident_def_list(&mut self) -> Result<Vec<IdentDef>, Error> {
        let mut idents = vec![self.ident_def()?];
        while self.accept(TokenKind::Comma)? {
            idents.push(self.ident_def()?);
        }
        Ok(idents)
    }

    /// `name`, `Module.name`, or a predeclared type keyword kept as written.
    fn qualident(&mut self) -> Result<Qualident, Error> {
        if matches!(
            self.current.kind,
            TokenKind::Boolean | TokenKind::Char | TokenKind::Integer | TokenKind::Real
        ) {
            let token = self.bump()?;
            return Ok(Qualident {
                module: None,
                name: Ident {
                    name: token.lexeme,
                    span: token.span,
                },
            });
        }

        let first = self.ident()?;
        if self.check(TokenKind::Dot) && self.peek_kind()? == TokenKind::Ident {
            self.bump()?;
            let name = self.ident()?;
            return Ok(Qualident {
                module: Some(first),
                name,
            });
        }
        Ok(Qualident {
            module: None,
            name: first,
        })
    }

    // -----------------------------------------------------------
    // Token plumbing.
    // -----------------------------------------------------------

    /// Advance to the next token, returning the one just consumed.
    fn bump(&mut self) -> Result<Token, Error> {
        let next = self.scanner.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn peek_kind(&mut self) -> Result<TokenKind, Error> {
        Ok(self.scanner.peek_token()?.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn accept(&mut self, kind: TokenKind) -> Result<bool, Error> {
        if self.check(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind) {
            self.bump()
        } else {
            Err(self.unexpected(Expected::Token(kind)))
        }
    }

    fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= self.options.max_nesting {
            return Err(Self::error(
                ParseErrorKind::NestingTooDeep {
                    limit: self.options.max_nesting,
                },
                self.current.span,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, expected: Expected) -> Error {
        Self::error(
            ParseErrorKind::UnexpectedToken {
                expected,
                found: self.current.kind,
                lexeme: self.current.lexeme.clone(),
            },
            self.current.span,
        )
    }

    const fn error(kind: ParseErrorKind, span: Span) -> Error {
        Error::Parse(ParseError { kind, span })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

const fn relation(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::Hash => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::In => BinaryOp::In,
        TokenKind::Is => BinaryOp::Is,
        _ => return None,
    })
}

const fn additive(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    })
}

const fn multiplicative(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::RealDiv,
        TokenKind::Div => BinaryOp::Div,
        TokenKind::Mod => BinaryOp::Mod,
        TokenKind::Ampersand => BinaryOp::And,
        _ => return None,
    })
}
