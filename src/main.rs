//! CLI tool to validate and format Oberon source modules.

use std::fs;
use std::process::ExitCode;

use oberon_syntax::{Scanner, TokenKind};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: oberonc <command> [files...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  validate  Check that module(s) parse");
        eprintln!("  fmt       Format module(s) and print to stdout");
        eprintln!("  check     Check that module(s) are formatted");
        eprintln!("  tokens    Print the token stream of each file");
        eprintln!("  ast       Print the syntax tree of each module as JSON");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  oberonc validate Hello.Mod");
        eprintln!("  oberonc fmt Hello.Mod");
        eprintln!("  oberonc ast Hello.Mod > Hello.json");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let files = &args[2..];

    if !matches!(command, "validate" | "fmt" | "check" | "tokens" | "ast") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let ok = match command {
            "validate" => validate(path),
            "fmt" => fmt(path, false),
            "check" => fmt(path, true),
            "tokens" => tokens(path),
            _ => ast(path),
        };
        had_error |= !ok;
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn validate(path: &str) -> bool {
    match oberon_syntax::parse_file(path) {
        Ok(module) => {
            let declarations = module.declarations.len();
            let statements = module.body.len();
            eprintln!(
                "{path}: valid ({declarations} declaration(s), \
                 {statements} statement(s))"
            );
            true
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}

/// Print the formatted module, or with `check_only` compare it to the file.
fn fmt(path: &str, check_only: bool) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{path}: {e}");
            return false;
        }
    };

    let module = match oberon_syntax::parse_str(&content) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{path}: {e}");
            return false;
        }
    };

    let formatted = oberon_syntax::format(&module);
    if !check_only {
        print!("{formatted}");
        return true;
    }
    if formatted == content {
        eprintln!("{path}: formatted");
        true
    } else {
        eprintln!("{path}: not formatted");
        false
    }
}

fn tokens(path: &str) -> bool {
    let mut scanner = match Scanner::open(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{path}: {e}");
            return false;
        }
    };

    loop {
        match scanner.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => return true,
            Ok(token) => {
                println!(
                    "{}:{}\t{}\t{}",
                    token.line(),
                    token.column(),
                    token.kind,
                    token.lexeme
                );
            }
            Err(e) => {
                eprintln!("{path}: {e}");
                return false;
            }
        }
    }
}

fn ast(path: &str) -> bool {
    let module = match oberon_syntax::parse_file(path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{path}: {e}");
            return false;
        }
    };

    match serde_json::to_string_pretty(&module) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            false
        }
    }
}
