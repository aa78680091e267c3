//! Syntax tree for one source module.
//!
//! Ownership runs strictly parent to child; child sequences keep source
//! order. Equality is structural: identifier positions are not compared,
//! so a tree parsed from reformatted text equals the original tree.

use serde::Serialize;

use crate::token::Span;

/// Identifier with the position of its token.
#[derive(Debug, Clone, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Ident {}

/// Export mark on a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Export {
    #[default]
    Private,
    /// `name*`
    Public,
    /// `name-`
    ReadOnly,
}

/// Declared name with its export mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentDef {
    pub ident: Ident,
    pub export: Export,
}

/// Possibly module-qualified name: `name` or `Module.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Qualident {
    pub module: Option<Ident>,
    pub name: Ident,
}

/// Complete source module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub name: Ident,
    pub imports: Vec<Import>,
    pub declarations: Vec<Declaration>,
    pub body: Vec<Statement>,
    pub closing_name: Ident,
}

/// `local` or `local := original`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub local: Ident,
    pub original: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Declaration {
    Const { name: IdentDef, value: Expr },
    Type { name: IdentDef, ty: TypeExpr },
    Var { names: Vec<IdentDef>, ty: TypeExpr },
    Procedure(ProcedureDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureDecl {
    pub name: IdentDef,
    /// `PROCEDURE ^ P(...)`: a heading with no body.
    pub forward: bool,
    pub params: Vec<ParamSection>,
    pub return_type: Option<Qualident>,
    /// Empty for a forward declaration.
    pub body: Block,
    /// Repeats `name` for a forward declaration.
    pub closing_name: Ident,
}

/// Nested declarations followed by a statement sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub declarations: Vec<Declaration>,
    pub statements: Vec<Statement>,
    /// Result given by `RETURN e` directly before `END`, with no `;`
    /// in front of it. A `RETURN` after a separator is a statement, so
    /// this cannot follow a trailing `Statement::Empty` in source text.
    pub return_expr: Option<Expr>,
}

/// `[VAR] a, b: T` in a formal parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSection {
    pub is_var: bool,
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExpr {
    Named(Qualident),
    /// `ARRAY n, m OF T`; no lengths for an open array.
    Array {
        lengths: Vec<Expr>,
        element: Box<TypeExpr>,
    },
    Record {
        base: Option<Qualident>,
        fields: Vec<FieldList>,
    },
    Pointer(Box<TypeExpr>),
    Procedure {
        params: Vec<ParamSection>,
        return_type: Option<Qualident>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldList {
    pub names: Vec<IdentDef>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Assignment {
        target: Expr,
        value: Expr,
    },
    /// Procedure call; `callee` is a designator such as `P` or `Out.Int`.
    Call {
        callee: Expr,
        args: Vec<Expr>,
    },
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Statement>>,
    },
    Case {
        selector: Expr,
        arms: Vec<CaseArm>,
        else_body: Option<Vec<Statement>>,
    },
    /// `WHILE c DO ... {ELSIF c DO ...} END`
    While {
        branches: Vec<Branch>,
    },
    Repeat {
        body: Vec<Statement>,
        until: Expr,
    },
    For {
        var: Ident,
        from: Expr,
        to: Expr,
        by: Option<Expr>,
        body: Vec<Statement>,
    },
    Loop {
        body: Vec<Statement>,
    },
    Exit,
    Return(Option<Expr>),
    Empty,
}

/// Condition with its guarded statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub cond: Expr,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseArm {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Statement>,
}

/// `low` or `low..high`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseLabel {
    pub low: Expr,
    pub high: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Ident(Ident),
    Literal(Literal),
    /// `{a, b..c}`
    Set(Vec<SetElement>),
    Field {
        base: Box<Expr>,
        field: Ident,
    },
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `p^`
    Deref(Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetElement {
    pub low: Expr,
    pub high: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Mul,
    RealDiv,
    Div,
    Mod,
    And,
    Add,
    Sub,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    Is,
}

/// Binding strength of an operator level; higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Primary,
}

impl BinaryOp {
    #[must_use]
    pub const fn precedence(self) -> Precedence {
        match self {
            Self::Mul | Self::RealDiv | Self::Div | Self::Mod | Self::And => {
                Precedence::Multiplicative
            }
            Self::Add | Self::Sub | Self::Or => Precedence::Additive,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual
            | Self::In
            | Self::Is => Precedence::Relational,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Mul => "*",
            Self::RealDiv => "/",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::And => "&",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Or => "OR",
            Self::Equal => "=",
            Self::NotEqual => "#",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::In => "IN",
            Self::Is => "IS",
        }
    }
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Neg => "-",
            Self::Not => "~",
        }
    }
}

impl Expr {
    #[must_use]
    pub const fn precedence(&self) -> Precedence {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { .. } => Precedence::Unary,
            _ => Precedence::Primary,
        }
    }
}

impl Declaration {
    /// Names introduced by this declaration, in source order.
    #[must_use]
    pub fn names(&self) -> Vec<&Ident> {
        match self {
            Self::Const { name, .. } | Self::Type { name, .. } => vec![&name.ident],
            Self::Var { names, .. } => names.iter().map(|n| &n.ident).collect(),
            Self::Procedure(procedure) => vec![&procedure.name.ident],
        }
    }
}
