use cwat_interner::Interner;
use cwat_ir::ast::*;
use cwat_ir::symbols::{FuncState, Storage, Symbols};
use cwat_ir::{BinOp, Literal, Type, UnOp};

use crate::error::{CompileError, CompileResult, ErrorKind};

fn parse(source: &str) -> CompileResult<(Program, Symbols)> {
    let mut interner = Interner::new();
    crate::parse(source, &mut interner)
}

fn parse_err(source: &str) -> CompileError {
    match parse(source) {
        Ok(_) => panic!("expected an error for:\n{source}"),
        Err(err) => err,
    }
}

fn test_compiles(source: &str, should_compile: bool) {
    let result = parse(source);

    if should_compile {
        if let Err(err) = result {
            panic!("program failed to compile:\n{source}\n{err}");
        }
    } else {
        assert!(result.is_err(), "program compiled unexpectedly:\n{source}");
    }
}

fn assert_error(source: &str, kind: ErrorKind, line: usize) -> CompileError {
    let err = parse_err(source);
    assert_eq!((err.kind, err.line), (kind, line), "{err}");
    err
}

fn functions(program: &Program) -> Vec<&Function> {
    program
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Func(func) => Some(func),
            Item::Global(_) => None,
        })
        .collect()
}

/// Body of the last function in the program.
fn body(source: &str) -> Vec<Stmt> {
    let (program, _) = parse(source).unwrap();
    functions(&program).last().unwrap().body.clone()
}

/// Parses `expr` as the final statement of a function with the given declarations.
fn expr(decls: &str, expr: &str) -> Expr {
    let source = format!("void f() {{ {decls} {expr}; }}");

    match body(&source).pop() {
        Some(Stmt::Expr(expr)) => expr,
        other => panic!("expected an expression statement, found {other:?}"),
    }
}

/// Prefix rendering of an expression tree.
fn sexpr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Int(n)) => n.to_string(),
        ExprKind::Literal(Literal::Float(f)) => format!("{f:?}"),
        ExprKind::Var(var) => format!("v{}", var.0),
        ExprKind::Call { func, args } => {
            let args: Vec<String> = args.iter().map(sexpr).collect();
            format!("(call f{} {})", func.0, args.join(" "))
        }
        ExprKind::UnOp {
            op: UnOp::Cast,
            expr: inner,
        } => format!("(cast {} {})", expr.ty, sexpr(inner)),
        ExprKind::UnOp { op, expr } => format!("({op:?} {})", sexpr(expr)),
        ExprKind::BinOp { op, lhs, rhs } => {
            format!("({op:?} {} {})", sexpr(lhs), sexpr(rhs))
        }
    }
}

#[test]
fn multiplication_binds_tighter() {
    assert_eq!(sexpr(&expr("", "2 + 3 * 4")), "(Add 2 (Mul 3 4))");
    assert_eq!(sexpr(&expr("", "2 * 3 + 4")), "(Add (Mul 2 3) 4)");
}

#[test]
fn left_associative() {
    assert_eq!(sexpr(&expr("", "1 + 2 + 3")), "(Add (Add 1 2) 3)");
    assert_eq!(sexpr(&expr("", "8 / 4 / 2")), "(Div (Div 8 4) 2)");
    assert_eq!(sexpr(&expr("", "1 - 2 + 3")), "(Add (Sub 1 2) 3)");
}

#[test]
fn parentheses() {
    assert_eq!(sexpr(&expr("", "(1 + 2) * 3")), "(Mul (Add 1 2) 3)");
    assert_eq!(sexpr(&expr("", "((4))")), "4");
}

#[test]
fn operator_levels() {
    assert_eq!(
        sexpr(&expr("int a; int b;", "a = a + 1 < b && b == 2 || !a")),
        "(Assign v0 (LogicalOr (LogicalAnd (Lt (Add v0 1) v1) (Eq v1 2)) (Not v0)))"
    );
    assert_eq!(
        sexpr(&expr("int a;", "a & 1 == 1")),
        "(BitwiseAnd v0 (Eq 1 1))"
    );
}

#[test]
fn unary_operators() {
    assert_eq!(sexpr(&expr("int a;", "-a * 2")), "(Mul (Negate v0) 2)");
    assert_eq!(sexpr(&expr("int a;", "a - -a")), "(Sub v0 (Negate v0))");
    assert_eq!(sexpr(&expr("int a;", "- - a")), "(Negate (Negate v0))");
    assert_eq!(
        sexpr(&expr("int* p;", "*p + 1")),
        "(Add (Deref v0) 1)"
    );
    assert_eq!(
        sexpr(&expr("int a; int* p;", "a * *p")),
        "(Mul v0 (Deref v1))"
    );
}

#[test]
fn casts_and_promotion() {
    assert_eq!(
        sexpr(&expr("int i; int n;", "(float)i / n * 2")),
        "(Mul (Div (cast float v0) (cast float v1)) (cast float 2))"
    );
    assert_eq!(
        sexpr(&expr("float x;", "x = 1")),
        "(Assign v0 (cast float 1))"
    );
    assert_eq!(sexpr(&expr("", "(int)-1.5")), "(cast int (Negate 1.5))");
}

#[test]
fn calls() {
    let source = "
        int add(int a, float b);
        int add(int a, float b) { return a; }
        void f() { add(1 + 2, 3); }
    ";

    match &body(source)[..] {
        [Stmt::Expr(call)] => {
            assert_eq!(sexpr(call), "(call f0 (Add 1 2) (cast float 3))");
            assert_eq!(call.ty, Type::Int);
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[test]
fn call_arity() {
    let err = assert_error(
        "int g(int a) { return a; }\nvoid f() {\n    g(1, 2);\n}",
        ErrorKind::Syntax,
        3,
    );
    assert_eq!(err.message, "too many arguments");
    assert_eq!(err.source_line, "g(1, 2);");

    let err = assert_error(
        "int g(int a, int b) { return a; }\nvoid f() { g(1); }",
        ErrorKind::Syntax,
        2,
    );
    assert_eq!(err.message, "not enough arguments");
}

#[test]
fn invalid_expressions() {
    let err = assert_error("void f() { 1 2; }", ErrorKind::Syntax, 1);
    assert_eq!(err.message, "invalid combination of operators and operands");

    let err = assert_error("void f() { 1 +; }", ErrorKind::Syntax, 1);
    assert_eq!(err.message, "invalid expression");

    let err = assert_error("void f() {\n;\n}", ErrorKind::Syntax, 2);
    assert!(err.message.starts_with("expected an expression"));

    assert_error("void f() { int a; a ! a; }", ErrorKind::Syntax, 1);
    assert_error("void f() { else; }", ErrorKind::Syntax, 1);
}

#[test]
fn redefinition_in_same_scope() {
    let err = assert_error("void f() {\n    int a;\n    int a;\n}", ErrorKind::Scope, 3);
    assert_eq!(err.message, "redefinition of the symbol `a`");

    assert_error("int g;\nvoid g() {}", ErrorKind::Scope, 2);
}

#[test]
fn shadowing_in_inner_scope() {
    test_compiles("void f() { int a; while (1) { float a; a = 1.5; } a = 1; }", true);
    test_compiles("int a; void f(int a) { a = 2; }", true);
    test_compiles("void f(int a) { int a; }", false);
}

#[test]
fn undeclared_and_out_of_scope() {
    let err = assert_error("void f() {\n    x = 1;\n}", ErrorKind::Scope, 2);
    assert_eq!(err.message, "no such symbol `x`");

    assert_error(
        "void f() {\n    if (1) { int y; }\n    y = 2;\n}",
        ErrorKind::Scope,
        3,
    );
}

#[test]
fn functions_and_variables_share_a_namespace() {
    let err = assert_error("void f() { int a; a(); }", ErrorKind::Scope, 1);
    assert_eq!(err.message, "`a` is not a function");

    let err = assert_error("void f() { f = 1; }", ErrorKind::Scope, 1);
    assert_eq!(err.message, "`f` is not a variable");
}

#[test]
fn initializer_types() {
    let err = assert_error("void f() {\n    int x = 1.5;\n}", ErrorKind::Type, 2);
    assert_eq!(err.message, "types mismatching");

    match &body("void f() { float x = 1; }")[..] {
        [Stmt::VarDecl {
            init: Some(init), ..
        }] => assert_eq!(sexpr(init), "(cast float 1)"),
        other => panic!("unexpected body {other:?}"),
    }
}

#[test]
fn pointer_and_array_operands() {
    test_compiles("void f() { int a[3]; a + 1; }", true);
    test_compiles("void f() { int* p; p - 1; 1 + p; }", true);

    assert_error("void f() {\n float f; int* p;\n p + f; }", ErrorKind::Type, 3);
    assert_error("void f() { int* p; p * 2; }", ErrorKind::Type, 1);
}

#[test]
fn assignment_targets() {
    assert_error("void f() { int a; 1 = a; }", ErrorKind::Type, 1);
    assert_error("void f() { int a[2]; int b[2]; a = b; }", ErrorKind::Type, 1);
    assert_error("void f() { int a; int b; (a = 1) + b; }", ErrorKind::Type, 1);
}

#[test]
fn array_declarations() {
    let (_, symbols) = parse("int grid[2][3]; void f() { int row[4]; }").unwrap();

    let grid = Type::Array(Box::new(Type::Array(Box::new(Type::Int), 3)), 2);
    assert_eq!(symbols.vars[cwat_ir::symbols::VarId(0)].ty, grid);

    let err = assert_error("void f() { int a[0]; }", ErrorKind::Type, 1);
    assert_eq!(err.message, "array length must be positive");

    let err = assert_error("void f() { int n; int a[n]; }", ErrorKind::Type, 1);
    assert_eq!(err.message, "array length must be a constant integer");

    assert_error("void f() { int a[1.5]; }", ErrorKind::Type, 1);
    assert_error("int g[2 + 1];", ErrorKind::Type, 1);
    assert_error("void f() { int a[]; }", ErrorKind::Syntax, 1);
    assert_error("void f() { int a[2] = 1; }", ErrorKind::Type, 1);
}

#[test]
fn void_variables() {
    assert_error("void f() { void v; }", ErrorKind::Type, 1);
    assert_error("void f(void v) {}", ErrorKind::Type, 1);
    test_compiles("void f(void* v) {}", true);
}

#[test]
fn returns() {
    test_compiles("int f() { return 1; }", true);
    test_compiles("float f() { return 1; }", true);
    test_compiles("void f() { return; }", true);

    assert_error("int f() { return 1.5; }", ErrorKind::Type, 1);
    assert_error("int f() {\n return;\n}", ErrorKind::Type, 2);
    assert_error("void f() { return 1; }", ErrorKind::Type, 1);
}

#[test]
fn loop_control() {
    test_compiles("void f() { while (1) { if (1) { break; } continue; } }", true);

    let err = assert_error("void f() {\n    break;\n}", ErrorKind::Syntax, 2);
    assert_eq!(err.message, "`break` outside of a loop");

    assert_error("void f() { if (1) { continue; } }", ErrorKind::Syntax, 1);
}

#[test]
fn conditions() {
    assert_error("void g() {} void f() { if (g()) {} }", ErrorKind::Type, 1);
    test_compiles("void f() { float x; while (x) {} if (!x) {} }", true);
}

#[test]
fn if_else_chain() {
    let stmts = body("void f(int a) { if (a) { a = 1; } else if (a == 2) { a = 3; } else { a = 4; } }");

    let [Stmt::If(first)] = &stmts[..] else {
        panic!("expected a single if statement");
    };

    let Some(Else::If(second)) = first.next.as_deref() else {
        panic!("expected an else if");
    };
    assert_eq!(sexpr(&second.cond), "(Eq v0 2)");

    assert!(matches!(second.next.as_deref(), Some(Else::Block(block)) if block.len() == 1));
}

#[test]
fn externs() {
    let (program, symbols) =
        parse("extern void print_int(int val);\nextern float sqrt(float x);").unwrap();

    assert_eq!(program.externs.len(), 2);
    assert!(program.items.is_empty());
    assert!(symbols
        .funcs
        .iter()
        .all(|func| func.state == FuncState::Extern));

    let err = assert_error("extern int f(int a) {\n}", ErrorKind::Syntax, 1);
    assert_eq!(err.message, "extern functions cannot have a body");

    assert_error("extern void f();\nvoid f() {}", ErrorKind::Scope, 2);
}

#[test]
fn forward_declarations() {
    test_compiles("int g(int a);\nint f() { return g(1); }\nint g(int a) { return a; }", true);

    let err = assert_error("int g(int a);\nfloat g(int a) { return 1.0; }", ErrorKind::Type, 2);
    assert_eq!(err.message, "conflicting types for `g`");

    assert_error("int g();\n\nvoid f() {}", ErrorKind::Scope, 1);
    assert_error("void g() {}\nvoid g() {}", ErrorKind::Scope, 2);
}

#[test]
fn recursion() {
    test_compiles("int fact(int n) { if (n < 2) { return 1; } return n * fact(n - 1); }", true);
}

#[test]
fn globals() {
    let (program, symbols) = parse("int a = 3;\nfloat b = -2;\nint* c = (int*)0;\nint d;").unwrap();

    let inits: Vec<Option<Literal>> = program
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Global(global) => Some(global.init),
            Item::Func(_) => None,
        })
        .collect();

    assert_eq!(
        inits,
        vec![
            Some(Literal::Int(3)),
            Some(Literal::Float(-2.0)),
            Some(Literal::Int(0)),
            None,
        ]
    );
    assert!(symbols.vars.iter().all(|var| var.storage == Storage::Global));

    assert_error("int a;\nint b = a + 1;", ErrorKind::Type, 2);
}

#[test]
fn top_level_garbage() {
    let err = assert_error("int a;\nreturn 1;", ErrorKind::Syntax, 2);
    assert_eq!(err.message, "invalid high level declaration");
}

#[test]
fn lex_errors_are_fatal() {
    let err = assert_error("void f() {\n    int a = 1 % 2;\n}", ErrorKind::Lex, 2);
    assert_eq!(err.message, "unexpected character '%'");
}

#[test]
fn locals_include_params() {
    let (program, _) = parse("int f(int a, int b) { int c; while (a) { int d; } return c; }").unwrap();
    let func = functions(&program)[0];

    assert_eq!(func.params.len(), 2);
    assert_eq!(func.locals.len(), 4);
    assert_eq!(func.locals[..2], func.params[..]);
    assert_eq!(func.ret_ty, Type::Int);
}

#[test]
fn error_display() {
    let err = parse_err("void f() {\n    int x = 1.5;\n}");
    assert_eq!(
        err.to_string(),
        "line 2: type error: types mismatching\nint x = 1.5;"
    );
}

#[test]
fn bitwise_or_below_equality() {
    assert_eq!(
        sexpr(&expr("int a;", "a | a != a")),
        format!("({:?} v0 ({:?} v0 v0))", BinOp::BitwiseOr, BinOp::NotEq)
    );
}
