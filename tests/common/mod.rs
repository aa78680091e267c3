#![allow(dead_code)]

use oberon_syntax::{Error, Module, format, parse_str};

/// Parse canonical text and assert the formatter reproduces it exactly.
pub fn roundtrip(input: &str) {
    let module = parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}\n{input}"));
    let output = format(&module);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Helper: format an AST, parse it back, assert structural equality.
pub fn assert_ast_roundtrip(original: &Module) {
    let formatted = format(original);
    let parsed = parse_str(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });

    assert_eq!(
        original.imports, parsed.imports,
        "imports mismatch\n--- formatted ---\n{formatted}"
    );
    assert_eq!(
        original.declarations, parsed.declarations,
        "declarations mismatch\n--- formatted ---\n{formatted}"
    );
    assert_eq!(
        original.body, parsed.body,
        "body mismatch\n--- formatted ---\n{formatted}"
    );
    assert_eq!(original, &parsed);
}

/// Wrap a statement sequence in a module named `T`.
pub fn in_module(statements: &str) -> String {
    format!("MODULE T;\nBEGIN\n{statements}\nEND T.\n")
}

pub fn parse_ok(input: &str) -> Module {
    parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}\n--- input ---\n{input}"))
}

pub fn parse_err(input: &str) -> Error {
    match parse_str(input) {
        Ok(module) => panic!("expected an error, parsed {module:?}"),
        Err(e) => e,
    }
}
