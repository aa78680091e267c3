//! Property-based tests with proptest.
//!
//! Generate random ASTs, format them, parse them back, and verify the
//! tree survives unchanged. Also checks the scanner's keyword,
//! lookahead, and literal laws over generated input.

use oberon_syntax::ast::{Branch, CaseArm, CaseLabel, ParamSection, SetElement};
use oberon_syntax::{
    BinaryOp, Declaration, Export, Expr, Ident, IdentDef, Literal, Module, ProcedureDecl,
    Qualident, Scanner, Statement, TokenKind, TypeExpr, UnaryOp, format, parse_str, tokenize,
};
use proptest::prelude::*;

const KEYWORDS: &[&str] = &[
    "module", "import", "const", "type", "var", "procedure", "begin", "end", "if", "then", "else",
    "elsif", "while", "do", "repeat", "until", "for", "to", "by", "case", "of", "return", "array",
    "record", "pointer", "is", "in", "loop", "exit", "with", "nil", "true", "false", "boolean",
    "char", "integer", "real", "div", "mod", "or",
];

// -- Leaf strategies --

/// Identifier that is never a reserved word.
fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,7}".prop_filter("reserved word", |s| TokenKind::keyword(s).is_none())
}

fn ident() -> impl Strategy<Value = Ident> {
    name().prop_map(|n| Ident::new(&n))
}

fn ident_def() -> impl Strategy<Value = IdentDef> {
    (
        name(),
        prop_oneof![
            3 => Just(Export::Private),
            1 => Just(Export::Public),
            1 => Just(Export::ReadOnly),
        ],
    )
        .prop_map(|(n, export)| IdentDef {
            ident: Ident::new(&n),
            export,
        })
}

fn qualident() -> impl Strategy<Value = Qualident> {
    prop_oneof![
        3 => name().prop_map(|n| Qualident::new(&n)),
        1 => (name(), name()).prop_map(|(m, n)| Qualident::qualified(&m, &n)),
        1 => prop_oneof![Just("INTEGER"), Just("REAL"), Just("BOOLEAN"), Just("CHAR")]
            .prop_map(Qualident::new),
    ]
}

/// Literals the scanner can produce: no negative numbers, reals that
/// print exactly.
fn literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        (0i64..=i64::MAX).prop_map(Literal::Integer),
        (0u32..100_000).prop_map(|n| Literal::Real(f64::from(n) / 8.0)),
        "[a-zA-Z0-9 ']{0,10}".prop_map(Literal::String),
        any::<bool>().prop_map(Literal::Boolean),
        Just(Literal::Nil),
    ]
}

/// `x`, `x.f`, `x[i]`, or `x^`.
fn designator() -> impl Strategy<Value = Expr> {
    prop_oneof![
        4 => ident().prop_map(Expr::Ident),
        1 => (ident(), name()).prop_map(|(base, f)| Expr::Ident(base).field(&f)),
        1 => (ident(), (0i64..100).prop_map(Expr::int))
            .prop_map(|(base, i)| Expr::Ident(base).index(vec![i])),
        1 => ident().prop_map(|base| Expr::Deref(Box::new(Expr::Ident(base)))),
    ]
}

fn binary_op() -> impl Strategy<Value = BinaryOp> {
    prop::sample::select(vec![
        BinaryOp::Mul,
        BinaryOp::RealDiv,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::And,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Or,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::Less,
        BinaryOp::LessEqual,
        BinaryOp::Greater,
        BinaryOp::GreaterEqual,
        BinaryOp::In,
        BinaryOp::Is,
    ])
}

fn unary_op() -> impl Strategy<Value = UnaryOp> {
    prop_oneof![Just(UnaryOp::Plus), Just(UnaryOp::Neg), Just(UnaryOp::Not)]
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        3 => designator(),
        3 => literal().prop_map(Expr::Literal),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            4 => (binary_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expr::binary(op, l, r)),
            2 => (unary_op(), inner.clone()).prop_map(|(op, e)| Expr::unary(op, e)),
            1 => (ident(), prop::collection::vec(inner.clone(), 0..=2))
                .prop_map(|(f, args)| Expr::call(Expr::Ident(f), args)),
            1 => prop::collection::vec(
                (inner.clone(), prop::option::of(inner)).prop_map(|(low, high)| SetElement { low, high }),
                0..=2,
            )
            .prop_map(Expr::Set),
        ]
    })
}

// -- Statements --

fn simple_statement() -> impl Strategy<Value = Statement> {
    prop_oneof![
        4 => (designator(), expr()).prop_map(|(t, v)| Statement::assign(t, v)),
        2 => (designator(), prop::collection::vec(expr(), 0..=2))
            .prop_map(|(c, args)| Statement::call(c, args)),
        1 => Just(Statement::Exit),
        1 => prop::option::of(expr()).prop_map(Statement::Return),
        1 => Just(Statement::Empty),
    ]
}

fn statements(depth: u32) -> BoxedStrategy<Vec<Statement>> {
    prop::collection::vec(statement(depth), 0..=3).boxed()
}

fn statement(depth: u32) -> BoxedStrategy<Statement> {
    if depth == 0 {
        return simple_statement().boxed();
    }
    let body = || statements(depth - 1);
    let branch = move || (expr(), statements(depth - 1)).prop_map(|(cond, body)| Branch { cond, body });

    prop_oneof![
        6 => simple_statement(),
        1 => (
            prop::collection::vec(branch(), 1..=2),
            prop::option::of(body()),
        )
            .prop_map(|(branches, else_body)| Statement::If { branches, else_body }),
        1 => (
            expr(),
            prop::collection::vec(
                (
                    prop::collection::vec(
                        (expr(), prop::option::of(expr())).prop_map(|(low, high)| CaseLabel { low, high }),
                        1..=2,
                    ),
                    body(),
                )
                    .prop_map(|(labels, body)| CaseArm { labels, body }),
                0..=2,
            ),
            prop::option::of(body()),
        )
            .prop_map(|(selector, arms, else_body)| Statement::Case {
                selector,
                arms,
                else_body,
            }),
        1 => prop::collection::vec(branch(), 1..=2)
            .prop_map(|branches| Statement::While { branches }),
        1 => (body(), expr()).prop_map(|(body, until)| Statement::Repeat { body, until }),
        1 => (ident(), expr(), expr(), prop::option::of(expr()), body())
            .prop_map(|(var, from, to, by, body)| Statement::For { var, from, to, by, body }),
        1 => body().prop_map(|body| Statement::Loop { body }),
    ]
    .boxed()
}

// -- Types and declarations --

fn type_expr() -> impl Strategy<Value = TypeExpr> {
    let leaf = qualident().prop_map(TypeExpr::Named);
    leaf.prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            (prop::collection::vec((1i64..64).prop_map(Expr::int), 0..=2), inner.clone())
                .prop_map(|(lengths, element)| TypeExpr::array(lengths, element)),
            inner.clone().prop_map(TypeExpr::pointer),
            (
                prop::option::of(qualident()),
                prop::collection::vec(
                    (prop::collection::vec(ident_def(), 1..=2), inner.clone())
                        .prop_map(|(names, ty)| oberon_syntax::ast::FieldList { names, ty }),
                    0..=2,
                ),
            )
                .prop_map(|(base, fields)| TypeExpr::Record { base, fields }),
            (params(inner), prop::option::of(qualident()))
                .prop_map(|(params, return_type)| TypeExpr::Procedure { params, return_type }),
        ]
    })
}

fn params(ty: impl Strategy<Value = TypeExpr>) -> impl Strategy<Value = Vec<ParamSection>> {
    prop::collection::vec(
        (any::<bool>(), prop::collection::vec(ident(), 1..=2), ty)
            .prop_map(|(is_var, names, ty)| ParamSection { is_var, names, ty }),
        0..=2,
    )
}

fn simple_declaration() -> impl Strategy<Value = Declaration> {
    prop_oneof![
        (ident_def(), expr()).prop_map(|(name, value)| Declaration::Const { name, value }),
        (ident_def(), type_expr()).prop_map(|(name, ty)| Declaration::Type { name, ty }),
        (prop::collection::vec(ident_def(), 1..=3), type_expr())
            .prop_map(|(names, ty)| Declaration::Var { names, ty }),
    ]
}

fn procedure() -> impl Strategy<Value = Declaration> {
    (
        ident_def(),
        params(type_expr()),
        prop::option::of(qualident()),
        prop::collection::vec(simple_declaration(), 0..=2),
        statements(1),
        prop::option::of(expr()),
    )
        .prop_map(|(name, params, return_type, declarations, mut body, result)| {
            // An empty statement needs a trailing `;`, which would turn
            // the result into a RETURN statement.
            if result.is_some() {
                while body.last() == Some(&Statement::Empty) {
                    body.pop();
                }
            }
            let mut procedure = ProcedureDecl::new(&name.ident.name);
            procedure.name = name;
            procedure.params = params;
            procedure.return_type = return_type;
            procedure.body.declarations = declarations;
            procedure.body.statements = body;
            procedure.body.return_expr = result;
            Declaration::Procedure(procedure)
        })
}

fn forward_heading() -> impl Strategy<Value = Declaration> {
    (ident_def(), params(type_expr()), prop::option::of(qualident())).prop_map(
        |(name, params, return_type)| {
            let mut procedure = ProcedureDecl::new(&name.ident.name).forward();
            procedure.name = name;
            procedure.params = params;
            procedure.return_type = return_type;
            Declaration::Procedure(procedure)
        },
    )
}

fn module() -> impl Strategy<Value = Module> {
    (
        name(),
        prop::collection::vec((ident(), prop::option::of(ident())), 0..=2),
        prop::collection::vec(
            prop_oneof![6 => simple_declaration(), 2 => procedure(), 1 => forward_heading()],
            0..=4,
        ),
        statements(2),
    )
        .prop_map(|(n, imports, declarations, body)| {
            let mut module = Module::new(&n);
            for (local, original) in imports {
                module = match original {
                    Some(original) => module.import_as(&local.name, &original.name),
                    None => module.import(&local.name),
                };
            }
            module.declarations = declarations;
            module.body = body;
            module
        })
}

/// Change the case of the letters selected by `mask`.
fn flip_case(word: &str, mask: u64) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask & (1 << (i % 64)) == 0 {
                c
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

// -- Property tests --

proptest! {
    /// parse(format(ast)) == ast.
    #[test]
    fn ast_survives_format_and_parse(m in module()) {
        let formatted = format(&m);
        let parsed = parse_str(&formatted).map_err(|e| {
            TestCaseError::fail(std::format!("parse error: {e}\n--- output ---\n{formatted}"))
        })?;
        prop_assert_eq!(&m, &parsed, "formatted:\n{}", formatted);
    }

    /// Formatting is idempotent: format(parse(format(x))) == format(x).
    #[test]
    fn format_idempotent(m in module()) {
        let first = format(&m);
        let parsed = parse_str(&first).map_err(|e| {
            TestCaseError::fail(std::format!("parse error: {e}\n--- output ---\n{first}"))
        })?;
        prop_assert_eq!(first, format(&parsed));
    }

    /// A formatted module never produces a scan error.
    #[test]
    fn format_never_produces_scan_error(m in module()) {
        let formatted = format(&m);
        tokenize(&formatted).map_err(|e| {
            TestCaseError::fail(std::format!("scan error: {e}\n--- output ---\n{formatted}"))
        })?;
    }

    /// Reserved words match only in all-lowercase or all-uppercase spelling.
    #[test]
    fn keyword_case_law(index in 0..KEYWORDS.len(), mask in any::<u64>()) {
        let word = flip_case(KEYWORDS[index], mask);
        let tokens = tokenize(&word).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        let uniform = word == word.to_ascii_lowercase() || word == word.to_ascii_uppercase();
        if uniform {
            prop_assert!(tokens[0].kind.is_keyword(), "{} should be a keyword", word);
        } else {
            prop_assert_eq!(tokens[0].kind, TokenKind::Ident);
        }
        prop_assert_eq!(&tokens[0].lexeme, &word);
    }

    /// Two peeks agree, and the next token is the peeked one.
    #[test]
    fn lookahead_law(input in "[a-z0-9 :=;+().<>#,]{0,40}") {
        let mut scanner = Scanner::from_source(&input).unwrap();
        loop {
            let first = scanner.peek_token().cloned();
            let second = scanner.peek_token().cloned();
            prop_assert_eq!(&first, &second);
            let next = scanner.next_token();
            prop_assert_eq!(&first, &next);
            match next {
                Ok(token) if token.kind == TokenKind::Eof => break,
                Ok(_) => {}
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
    }

    /// Digit strings scan as a single integer literal.
    #[test]
    fn integer_literal_law(n in any::<u64>()) {
        let text = n.to_string();
        let tokens = tokenize(&text).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        prop_assert_eq!(&tokens[0].lexeme, &text);
    }

    /// A quoted string's lexeme is its content without delimiters.
    #[test]
    fn string_literal_law(content in "[a-zA-Z0-9 .;:=]{0,12}") {
        let tokens = tokenize(&std::format!("'{content}'")).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        prop_assert_eq!(&tokens[0].lexeme, &content);
    }
}
