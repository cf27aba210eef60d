//! Frontend (lexer + parser) integration tests
//!
//! Token shapes, AST shapes for the trickier constructs, and diagnostic
//! rendering.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use eucleia_runtime::ast::{AssignTarget, ElseBranch, Expr, ImportKind, Stmt};
use eucleia_runtime::{Lexer, Parser, TokenKind};

fn parse(source: &str) -> eucleia_runtime::ast::Program {
    let mut lexer = Lexer::new(source);
    let (tokens, lex_diagnostics) = lexer.tokenize();
    assert!(lex_diagnostics.is_empty(), "{:?}", lex_diagnostics);
    let mut parser = Parser::new(tokens);
    let (program, diagnostics) = parser.parse();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    program
}

// ============================================================================
// Lexer
// ============================================================================

#[test]
fn test_type_names_are_identifiers() {
    let mut lexer = Lexer::new("int float bool string array Point");
    let (tokens, _) = lexer.tokenize();
    assert!(tokens[..tokens.len() - 1]
        .iter()
        .all(|t| t.kind == TokenKind::Identifier));
}

#[test]
fn test_keywords_are_not_identifiers() {
    let mut lexer = Lexer::new("func struct class if else while do for break return import");
    let (tokens, _) = lexer.tokenize();
    assert!(tokens[..tokens.len() - 1]
        .iter()
        .all(|t| t.kind != TokenKind::Identifier));
}

#[test]
fn test_number_dot_disambiguation() {
    // `1.x` is an int followed by member access syntax, not a float
    let mut lexer = Lexer::new("1.5 1.x");
    let (tokens, _) = lexer.tokenize();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Float,
            TokenKind::Int,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_spans_slice_back_to_lexemes() {
    let source = "int abc = 1;";
    let mut lexer = Lexer::new(source);
    let (tokens, _) = lexer.tokenize();
    let abc = &tokens[1];
    assert_eq!(abc.lexeme, "abc");
    assert_eq!(&source[abc.span.start..abc.span.end], "abc");
}

#[test]
fn test_lexer_diagnostic_for_stray_char() {
    let mut lexer = Lexer::new("int x = 1 @ 2;");
    let (_, diagnostics) = lexer.tokenize();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains('@'));
}

// ============================================================================
// Parser shapes
// ============================================================================

#[test]
fn test_dangling_else_attaches_to_nearest_if() {
    let program = parse("if (a) { if (b) { } else { } }");
    let Stmt::If(outer) = &program.stmts[0] else {
        panic!("expected if");
    };
    assert!(outer.else_branch.is_none());
    let Stmt::If(inner) = &outer.then_block.stmts[0] else {
        panic!("expected nested if");
    };
    assert!(matches!(inner.else_branch, Some(ElseBranch::Else(_))));
}

#[test]
fn test_assignment_targets() {
    let program = parse("x = 1; a[0] = 2; p.f = 3;");
    let targets: Vec<&AssignTarget> = program
        .stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::Assign(assign) => &assign.target,
            other => panic!("expected assignment, got {:?}", other),
        })
        .collect();
    assert!(matches!(targets[0], AssignTarget::Name(_)));
    assert!(matches!(targets[1], AssignTarget::Index { .. }));
    assert!(matches!(targets[2], AssignTarget::Member { .. }));
}

#[test]
fn test_method_call_vs_member_access() {
    let program = parse("p.area(); p.x;");
    let Stmt::Expr(call_stmt) = &program.stmts[0] else {
        panic!("expected expression statement");
    };
    assert!(matches!(call_stmt.expr, Expr::MethodCall(_)));
    let Stmt::Expr(member_stmt) = &program.stmts[1] else {
        panic!("expected expression statement");
    };
    assert!(matches!(member_stmt.expr, Expr::Member(_)));
}

#[test]
fn test_chained_index() {
    let program = parse("grid[1][2];");
    let Stmt::Expr(stmt) = &program.stmts[0] else {
        panic!("expected expression statement");
    };
    let Expr::Index(outer) = &stmt.expr else {
        panic!("expected index");
    };
    assert!(matches!(&*outer.target, Expr::Index(_)));
}

#[test]
fn test_import_forms() {
    let program = parse("import <math>\nimport \"util.eu\";");
    let kinds: Vec<&ImportKind> = program
        .stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::Import(import) => &import.kind,
            other => panic!("expected import, got {:?}", other),
        })
        .collect();
    assert!(matches!(kinds[0], ImportKind::Module(id) if id.name == "math"));
    assert!(matches!(kinds[1], ImportKind::File(path) if path == "util.eu"));
}

#[test]
fn test_struct_inheritance_header() {
    let program = parse("struct Derived : Base { int x; }");
    let Stmt::Struct(decl) = &program.stmts[0] else {
        panic!("expected struct");
    };
    assert_eq!(decl.parent.as_ref().unwrap().name, "Base");
}

#[test]
fn test_logical_precedence() {
    // a || b && c parses as a || (b && c)
    let program = parse("flag = a || b && c;");
    let Stmt::Assign(assign) = &program.stmts[0] else {
        panic!("expected assignment");
    };
    let Expr::Binary(or) = &assign.value else {
        panic!("expected binary");
    };
    assert_eq!(or.op, eucleia_runtime::ast::BinaryOp::Or);
    assert!(
        matches!(&*or.right, Expr::Binary(and) if and.op == eucleia_runtime::ast::BinaryOp::And)
    );
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_parser_reports_multiple_errors() {
    let mut lexer = Lexer::new("int x 1;\nint y 2;\nint z = 3;");
    let (tokens, _) = lexer.tokenize();
    let mut parser = Parser::new(tokens);
    let (program, diagnostics) = parser.parse();
    assert_eq!(diagnostics.len(), 2);
    assert!(program
        .stmts
        .iter()
        .any(|stmt| matches!(stmt, Stmt::VarDecl(decl) if decl.name.name == "z")));
}

#[test]
fn test_diagnostic_line_col_rendering() {
    let source = "int x = 1;\nint y 2;";
    let mut lexer = Lexer::new(source);
    let (tokens, _) = lexer.tokenize();
    let mut parser = Parser::new(tokens);
    let (_, diagnostics) = parser.parse();
    assert_eq!(diagnostics.len(), 1);
    let rendered = diagnostics[0].format_with_source(source);
    assert!(rendered.starts_with("2:"), "got: {}", rendered);
    assert!(rendered.contains("error[EU0001]"), "got: {}", rendered);
}

#[test]
fn test_serde_ast_roundtrip() {
    let program = parse("func f(int a) { return a * 2; }");
    let json = serde_json::to_string(&program).unwrap();
    let back: eucleia_runtime::ast::Program = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);
}
