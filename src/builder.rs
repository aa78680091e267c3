use crate::ast::{
    BinaryOp, Block, Declaration, Export, Expr, Ident, IdentDef, Import, Literal, Module,
    ParamSection, ProcedureDecl, Qualident, Statement, TypeExpr, UnaryOp,
};
use crate::token::Span;

impl Ident {
    /// Create an identifier with no source position.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            span: Span::default(),
        }
    }
}

impl IdentDef {
    /// Create an unexported declared name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            ident: Ident::new(name),
            export: Export::Private,
        }
    }

    /// Mark the name as exported (`name*`).
    #[must_use]
    pub const fn exported(mut self) -> Self {
        self.export = Export::Public;
        self
    }

    /// Mark the name as exported read-only (`name-`).
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.export = Export::ReadOnly;
        self
    }
}

impl Qualident {
    /// Unqualified name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            module: None,
            name: Ident::new(name),
        }
    }

    /// `module.name`
    #[must_use]
    pub fn qualified(module: &str, name: &str) -> Self {
        Self {
            module: Some(Ident::new(module)),
            name: Ident::new(name),
        }
    }
}

impl Module {
    /// Create an empty module; the closing name matches the opening one.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Ident::new(name),
            imports: Vec::new(),
            declarations: Vec::new(),
            body: Vec::new(),
            closing_name: Ident::new(name),
        }
    }

    /// Add `IMPORT name`.
    #[must_use]
    pub fn import(mut self, name: &str) -> Self {
        self.imports.push(Import {
            local: Ident::new(name),
            original: None,
        });
        self
    }

    /// Add `IMPORT local := original`.
    #[must_use]
    pub fn import_as(mut self, local: &str, original: &str) -> Self {
        self.imports.push(Import {
            local: Ident::new(local),
            original: Some(Ident::new(original)),
        });
        self
    }

    #[must_use]
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Append a statement to the module body.
    #[must_use]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.body.push(statement);
        self
    }
}

impl Declaration {
    /// `CONST name = value`
    #[must_use]
    pub fn constant(name: &str, value: Expr) -> Self {
        Self::Const {
            name: IdentDef::new(name),
            value,
        }
    }

    /// `TYPE name = ty`
    #[must_use]
    pub fn type_decl(name: &str, ty: TypeExpr) -> Self {
        Self::Type {
            name: IdentDef::new(name),
            ty,
        }
    }

    /// `VAR a, b: ty`
    #[must_use]
    pub fn var(names: &[&str], ty: TypeExpr) -> Self {
        Self::Var {
            names: names.iter().map(|&n| IdentDef::new(n)).collect(),
            ty,
        }
    }
}

impl From<ProcedureDecl> for Declaration {
    fn from(procedure: ProcedureDecl) -> Self {
        Self::Procedure(procedure)
    }
}

impl ProcedureDecl {
    /// Create a procedure with no parameters and an empty body.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: IdentDef::new(name),
            forward: false,
            params: Vec::new(),
            return_type: None,
            body: Block::default(),
            closing_name: Ident::new(name),
        }
    }

    #[must_use]
    pub const fn exported(mut self) -> Self {
        self.name.export = Export::Public;
        self
    }

    /// Add a value parameter section `names: ty`.
    #[must_use]
    pub fn param(mut self, names: &[&str], ty: TypeExpr) -> Self {
        self.params.push(ParamSection {
            is_var: false,
            names: names.iter().map(|&n| Ident::new(n)).collect(),
            ty,
        });
        self
    }

    /// Add a `VAR` parameter section.
    #[must_use]
    pub fn var_param(mut self, names: &[&str], ty: TypeExpr) -> Self {
        self.params.push(ParamSection {
            is_var: true,
            names: names.iter().map(|&n| Ident::new(n)).collect(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: Qualident) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Make this a forward heading (`PROCEDURE ^ name`). The body is
    /// not printed.
    #[must_use]
    pub const fn forward(mut self) -> Self {
        self.forward = true;
        self
    }

    /// Set the trailing `RETURN value` that precedes `END name`.
    #[must_use]
    pub fn result(mut self, value: Expr) -> Self {
        self.body.return_expr = Some(value);
        self
    }

    /// Add a local declaration.
    #[must_use]
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.body.declarations.push(declaration);
        self
    }

    #[must_use]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.body.statements.push(statement);
        self
    }
}

impl TypeExpr {
    /// Unqualified named type such as `INTEGER`.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Named(Qualident::new(name))
    }

    #[must_use]
    pub fn array(lengths: Vec<Expr>, element: Self) -> Self {
        Self::Array {
            lengths,
            element: Box::new(element),
        }
    }

    #[must_use]
    pub fn pointer(target: Self) -> Self {
        Self::Pointer(Box::new(target))
    }
}

impl Expr {
    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::Ident(Ident::new(name))
    }

    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    #[must_use]
    pub const fn real(value: f64) -> Self {
        Self::Literal(Literal::Real(value))
    }

    /// String literal. The formatter delimits it with `'`, or with `"`
    /// when the text holds a `'`; text holding both quote characters has
    /// no source spelling and will not scan back.
    #[must_use]
    pub fn string(text: &str) -> Self {
        Self::Literal(Literal::String(text.to_string()))
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Function call `callee(args)`.
    #[must_use]
    pub fn call(callee: Self, args: Vec<Self>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Field selector `self.name`.
    #[must_use]
    pub fn field(self, name: &str) -> Self {
        Self::Field {
            base: Box::new(self),
            field: Ident::new(name),
        }
    }

    /// Index selector `self[indices]`.
    #[must_use]
    pub fn index(self, indices: Vec<Self>) -> Self {
        Self::Index {
            base: Box::new(self),
            indices,
        }
    }
}

impl Statement {
    /// `target := value`
    #[must_use]
    pub const fn assign(target: Expr, value: Expr) -> Self {
        Self::Assignment { target, value }
    }

    /// Procedure call statement.
    #[must_use]
    pub const fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::Call { callee, args }
    }
}
