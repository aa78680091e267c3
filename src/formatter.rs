//! Pretty-printer that serializes a module AST back into canonical text.
//!
//! Produces uppercase keywords, two-space indentation, and only the
//! parentheses operator precedence requires. Reparsing the output yields
//! a tree equal to the input.

use std::fmt::Write as _;

use crate::ast::{
    CaseArm, Declaration, Export, Expr, FieldList, IdentDef, Literal, Module, ParamSection,
    Precedence, ProcedureDecl, Qualident, Statement, TypeExpr,
};

/// Format a `Module` AST into source text ending in a newline.
#[must_use]
pub fn format(module: &Module) -> String {
    let mut out = String::new();
    out.push_str("MODULE ");
    out.push_str(&module.name.name);
    out.push_str(";\n");

    if !module.imports.is_empty() {
        out.push_str("IMPORT ");
        for (i, import) in module.imports.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&import.local.name);
            if let Some(original) = &import.original {
                out.push_str(" := ");
                out.push_str(&original.name);
            }
        }
        out.push_str(";\n");
    }

    format_declarations(&mut out, &module.declarations, 0);

    if !module.body.is_empty() {
        out.push_str("BEGIN\n");
        format_sequence(&mut out, &module.body, 1);
    }
    out.push_str("END ");
    out.push_str(&module.closing_name.name);
    out.push_str(".\n");
    out
}

/// Format a single expression on one line.
#[must_use]
pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    format_expression(&mut out, expr);
    out
}

/// Format a statement sequence, one statement per line.
#[must_use]
pub fn format_statements(statements: &[Statement]) -> String {
    let mut out = String::new();
    format_sequence(&mut out, statements, 0);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

// ---------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Const,
    Type,
    Var,
}

fn format_declarations(out: &mut String, declarations: &[Declaration], level: usize) {
    let mut section = None;

    for declaration in declarations {
        let wanted = match declaration {
            Declaration::Const { .. } => Some(Section::Const),
            Declaration::Type { .. } => Some(Section::Type),
            Declaration::Var { .. } => Some(Section::Var),
            Declaration::Procedure(_) => None,
        };
        if wanted.is_some() && wanted != section {
            indent(out, level);
            out.push_str(match wanted {
                Some(Section::Const) => "CONST\n",
                Some(Section::Type) => "TYPE\n",
                _ => "VAR\n",
            });
        }
        section = wanted;

        match declaration {
            Declaration::Const { name, value } => {
                indent(out, level + 1);
                format_ident_def(out, name);
                out.push_str(" = ");
                format_expression(out, value);
            }
            Declaration::Type { name, ty } => {
                indent(out, level + 1);
                format_ident_def(out, name);
                out.push_str(" = ");
                format_type(out, ty, level + 1);
            }
            Declaration::Var { names, ty } => {
                indent(out, level + 1);
                format_ident_defs(out, names);
                out.push_str(": ");
                format_type(out, ty, level + 1);
            }
            Declaration::Procedure(procedure) => {
                format_procedure(out, procedure, level);
            }
        }
        out.push_str(";\n");
    }
}

/// Forward headings print without a body; the caller adds the `;`.
fn format_procedure(out: &mut String, procedure: &ProcedureDecl, level: usize) {
    indent(out, level);
    out.push_str("PROCEDURE ");
    if procedure.forward {
        out.push_str("^ ");
    }
    format_ident_def(out, &procedure.name);
    format_signature(out, &procedure.params, procedure.return_type.as_ref(), level);
    if procedure.forward {
        return;
    }
    out.push_str(";\n");

    let body = &procedure.body;
    format_declarations(out, &body.declarations, level + 1);

    if !body.statements.is_empty() {
        indent(out, level);
        out.push_str("BEGIN\n");
        format_sequence(out, &body.statements, level + 1);
    }
    if let Some(value) = &body.return_expr {
        indent(out, level + 1);
        out.push_str("RETURN ");
        format_expression(out, value);
        out.push('\n');
    }
    indent(out, level);
    out.push_str("END ");
    out.push_str(&procedure.closing_name.name);
}

/// Formal parameters; omitted entirely when there is nothing to say.
fn format_signature(
    out: &mut String,
    params: &[ParamSection],
    return_type: Option<&Qualident>,
    level: usize,
) {
    if params.is_empty() && return_type.is_none() {
        return;
    }
    out.push('(');
    for (i, section) in params.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        if section.is_var {
            out.push_str("VAR ");
        }
        for (j, name) in section.names.iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            out.push_str(&name.name);
        }
        out.push_str(": ");
        format_type(out, &section.ty, level);
    }
    out.push(')');
    if let Some(ty) = return_type {
        out.push_str(": ");
        format_qualident(out, ty);
    }
}

fn format_type(out: &mut String, ty: &TypeExpr, level: usize) {
    match ty {
        TypeExpr::Named(name) => format_qualident(out, name),
        TypeExpr::Array { lengths, element } => {
            out.push_str("ARRAY ");
            if !lengths.is_empty() {
                format_expressions(out, lengths);
                out.push(' ');
            }
            out.push_str("OF ");
            format_type(out, element, level);
        }
        TypeExpr::Record { base, fields } => format_record(out, base.as_ref(), fields, level),
        TypeExpr::Pointer(target) => {
            out.push_str("POINTER TO ");
            format_type(out, target, level);
        }
        TypeExpr::Procedure {
            params,
            return_type,
        } => {
            out.push_str("PROCEDURE");
            if !params.is_empty() || return_type.is_some() {
                out.push(' ');
            }
            format_signature(out, params, return_type.as_ref(), level);
        }
    }
}

fn format_record(out: &mut String, base: Option<&Qualident>, fields: &[FieldList], level: usize) {
    out.push_str("RECORD");
    if let Some(base) = base {
        out.push_str(" (");
        format_qualident(out, base);
        out.push(')');
    }
    if fields.is_empty() {
        out.push_str(" END");
        return;
    }
    out.push('\n');
    for (i, field) in fields.iter().enumerate() {
        indent(out, level + 1);
        format_ident_defs(out, &field.names);
        out.push_str(": ");
        format_type(out, &field.ty, level + 1);
        if i + 1 < fields.len() {
            out.push(';');
        }
        out.push('\n');
    }
    indent(out, level);
    out.push_str("END");
}

fn format_qualident(out: &mut String, name: &Qualident) {
    if let Some(module) = &name.module {
        out.push_str(&module.name);
        out.push('.');
    }
    out.push_str(&name.name.name);
}

fn format_ident_def(out: &mut String, def: &IdentDef) {
    out.push_str(&def.ident.name);
    match def.export {
        Export::Private => {}
        Export::Public => out.push('*'),
        Export::ReadOnly => out.push('-'),
    }
}

fn format_ident_defs(out: &mut String, defs: &[IdentDef]) {
    for (i, def) in defs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_ident_def(out, def);
    }
}

// ---------------------------------------------------------------
// Statements
// ---------------------------------------------------------------

/// One statement per line. Separators go between statements, and after
/// an empty statement so that it survives reparsing.
fn format_sequence(out: &mut String, statements: &[Statement], level: usize) {
    for (i, statement) in statements.iter().enumerate() {
        indent(out, level);
        format_statement(out, statement, level);
        if i + 1 < statements.len() || matches!(statement, Statement::Empty) {
            out.push(';');
        }
        out.push('\n');
    }
}

fn format_statement(out: &mut String, statement: &Statement, level: usize) {
    match statement {
        Statement::Assignment { target, value } => {
            format_expression(out, target);
            out.push_str(" := ");
            format_expression(out, value);
        }
        Statement::Call { callee, args } => {
            format_expression(out, callee);
            if !args.is_empty() {
                out.push('(');
                format_expressions(out, args);
                out.push(')');
            }
        }
        Statement::If {
            branches,
            else_body,
        } => {
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    indent(out, level);
                    out.push_str("ELSIF ");
                } else {
                    out.push_str("IF ");
                }
                format_expression(out, &branch.cond);
                out.push_str(" THEN\n");
                format_sequence(out, &branch.body, level + 1);
            }
            format_else(out, else_body.as_deref(), level);
            indent(out, level);
            out.push_str("END");
        }
        Statement::Case {
            selector,
            arms,
            else_body,
        } => {
            out.push_str("CASE ");
            format_expression(out, selector);
            out.push_str(" OF\n");
            for (i, arm) in arms.iter().enumerate() {
                format_case_arm(out, arm, i == 0, level);
            }
            format_else(out, else_body.as_deref(), level);
            indent(out, level);
            out.push_str("END");
        }
        Statement::While { branches } => {
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    indent(out, level);
                    out.push_str("ELSIF ");
                } else {
                    out.push_str("WHILE ");
                }
                format_expression(out, &branch.cond);
                out.push_str(" DO\n");
                format_sequence(out, &branch.body, level + 1);
            }
            indent(out, level);
            out.push_str("END");
        }
        Statement::Repeat { body, until } => {
            out.push_str("REPEAT\n");
            format_sequence(out, body, level + 1);
            indent(out, level);
            out.push_str("UNTIL ");
            format_expression(out, until);
        }
        Statement::For {
            var,
            from,
            to,
            by,
            body,
        } => {
            out.push_str("FOR ");
            out.push_str(&var.name);
            out.push_str(" := ");
            format_expression(out, from);
            out.push_str(" TO ");
            format_expression(out, to);
            if let Some(step) = by {
                out.push_str(" BY ");
                format_expression(out, step);
            }
            out.push_str(" DO\n");
            format_sequence(out, body, level + 1);
            indent(out, level);
            out.push_str("END");
        }
        Statement::Loop { body } => {
            out.push_str("LOOP\n");
            format_sequence(out, body, level + 1);
            indent(out, level);
            out.push_str("END");
        }
        Statement::Exit => out.push_str("EXIT"),
        Statement::Return(value) => {
            out.push_str("RETURN");
            if let Some(value) = value {
                out.push(' ');
                format_expression(out, value);
            }
        }
        Statement::Empty => {}
    }
}

fn format_else(out: &mut String, else_body: Option<&[Statement]>, level: usize) {
    if let Some(body) = else_body {
        indent(out, level);
        out.push_str("ELSE\n");
        format_sequence(out, body, level + 1);
    }
}

fn format_case_arm(out: &mut String, arm: &CaseArm, first: bool, level: usize) {
    indent(out, level);
    out.push_str(if first { "  " } else { "| " });
    for (i, label) in arm.labels.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_expression(out, &label.low);
        if let Some(high) = &label.high {
            out.push_str("..");
            format_expression(out, high);
        }
    }
    out.push_str(":\n");
    format_sequence(out, &arm.body, level + 2);
}

// ---------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------

fn format_expression(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Ident(ident) => out.push_str(&ident.name),
        Expr::Literal(literal) => format_literal(out, literal),
        Expr::Set(elements) => {
            out.push('{');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expression(out, &element.low);
                if let Some(high) = &element.high {
                    out.push_str("..");
                    format_expression(out, high);
                }
            }
            out.push('}');
        }
        Expr::Field { base, field } => {
            format_expression(out, base);
            out.push('.');
            out.push_str(&field.name);
        }
        Expr::Index { base, indices } => {
            format_expression(out, base);
            out.push('[');
            format_expressions(out, indices);
            out.push(']');
        }
        Expr::Deref(base) => {
            format_expression(out, base);
            out.push('^');
        }
        Expr::Call { callee, args } => {
            format_expression(out, callee);
            out.push('(');
            format_expressions(out, args);
            out.push(')');
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.symbol());
            format_operand(out, operand, operand.precedence() < Precedence::Unary);
        }
        Expr::Binary { op, left, right } => {
            let level = op.precedence();
            // Relations do not chain, so an equal-level left side is wrapped too.
            let wrap_left = left.precedence() < level
                || (level == Precedence::Relational && left.precedence() == level);
            format_operand(out, left, wrap_left);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            format_operand(out, right, right.precedence() <= level);
        }
    }
}

fn format_operand(out: &mut String, expr: &Expr, parenthesize: bool) {
    if parenthesize {
        out.push('(');
        format_expression(out, expr);
        out.push(')');
    } else {
        format_expression(out, expr);
    }
}

fn format_expressions(out: &mut String, exprs: &[Expr]) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_expression(out, expr);
    }
}

fn format_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Integer(value) => {
            let _ = write!(out, "{value}");
        }
        Literal::Real(value) => {
            let text = value.to_string();
            out.push_str(&text);
            if !text.contains('.') {
                out.push_str(".0");
            }
        }
        Literal::String(text) => {
            let quote = if text.contains('\'') { '"' } else { '\'' };
            out.push(quote);
            out.push_str(text);
            out.push(quote);
        }
        Literal::Boolean(true) => out.push_str("TRUE"),
        Literal::Boolean(false) => out.push_str("FALSE"),
        Literal::Nil => out.push_str("NIL"),
    }
}
