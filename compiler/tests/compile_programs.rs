use echo_compiler::Compiler;
use echo_compiler_common::DiagnosticKind;

fn compile(source: &str) -> (Option<String>, echo_compiler_common::DiagnosticBag) {
    Compiler::new("t.ec").compile_str(source)
}

#[test]
fn scenario_1_constant_return() {
    let (generated, diagnostics) = compile("fn main() -> i32 { return 42; }");
    assert!(!diagnostics.has_errors());
    let c = generated.unwrap();
    assert!(c.contains("int32_t main(void)"));
    assert!(c.contains("return 42;"));
}

#[test]
fn scenario_2_function_call() {
    let source = "fn add(i32 a, i32 b) -> i32 { return a + b; } fn main() -> i32 { return add(2, 3); }";
    let (generated, diagnostics) = compile(source);
    assert!(!diagnostics.has_errors());
    let c = generated.unwrap();
    assert!(c.contains("int32_t add(int32_t a, int32_t b)"));
    assert!(c.contains("add(2, 3)"));
}

#[test]
fn scenario_3_generic_add_monomorphizes_both_call_sites() {
    let source = "fn add(auto a, auto b) -> auto { return a + b; } \
                  fn main() -> i32 { add(1, 2); add(1.5, 2.5); return 0; }";
    let (generated, diagnostics) = compile(source);
    assert!(!diagnostics.has_errors());
    let c = generated.unwrap();
    assert!(c.contains("add_i32_i32"));
    assert!(c.contains("add_f64_f64"));
}

#[test]
fn scenario_4_builtin_import_rewrites_to_runtime_symbol() {
    let source = "#include core::io\nfn main() -> i32 { io::print(\"hi\"); return 0; }";
    let (generated, diagnostics) = compile(source);
    assert!(!diagnostics.has_errors());
    assert!(generated.unwrap().contains("echo_print_string(\"hi\")"));
}

#[test]
fn scenario_5_struct_field_order_and_designated_initializer() {
    let source = "struct P { f64 x; f64 y; } \
                  fn main() -> i32 { P p = {x: 1.0, y: 2.0}; return 0; }";
    let (generated, diagnostics) = compile(source);
    assert!(!diagnostics.has_errors());
    let c = generated.unwrap();
    let struct_pos = c.find("typedef struct").expect("struct typedef present");
    let x_pos = c[struct_pos..].find("double x;").expect("x field present") + struct_pos;
    let y_pos = c[struct_pos..].find("double y;").expect("y field present") + struct_pos;
    assert!(x_pos < y_pos, "field order must be preserved");
    assert!(c.contains(".x = 1.0"));
    assert!(c.contains(".y = 2.0"));
}

#[test]
fn scenario_6_undefined_symbol_aborts_with_diagnostic() {
    let (generated, diagnostics) = compile("fn main() -> i32 { return x; }");
    assert!(generated.is_none());
    assert!(diagnostics.has_errors());
    assert!(diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UndefinedSymbol));
}

#[test]
fn empty_source_compiles_to_bare_preamble() {
    let (generated, diagnostics) = compile("");
    assert!(!diagnostics.has_errors());
    assert!(generated.unwrap().contains("echo_runtime.h"));
}

#[test]
fn wrong_argument_count_is_an_error() {
    let source = "fn add(i32 a, i32 b) -> i32 { return a + b; } \
                  fn main() -> i32 { return add(1); }";
    let (generated, diagnostics) = compile(source);
    assert!(generated.is_none());
    assert!(diagnostics.has_errors());
}

#[test]
fn auto_variable_without_initializer_is_an_error() {
    let (generated, diagnostics) = compile("fn main() -> i32 { auto x; return 0; }");
    assert!(generated.is_none());
    assert!(diagnostics.has_errors());
}
