//! Writes a single C translation unit from an annotated AST plus the
//! monomorphizer's instantiation table (§4.7). Emission happens in five
//! fixed phases so that forward declarations always precede bodies,
//! regardless of source order.

use std::collections::HashMap;

use echo_compiler_common::{find_by_qualified_name, functions_in_module, module_exists, short_name, SourceType};

use crate::compiler::ast::{Ast, AstKind, BinaryOperator, Literal, NodeId, UnaryOperator};
use crate::compiler::semantic::monomorphizer::{Instantiation, Monomorphizer};
use crate::compiler::semantic::StructInfo;

use super::BackEndGenerator;

const PREAMBLE: &str = "\
#include <stdio.h>
#include <stdlib.h>
#include <stdbool.h>
#include <stdint.h>
#include <string.h>
#include \"echo_runtime.h\"
";

/// Emits portable C99. Carries only per-emission scratch state (the
/// indentation counter and the set of optional-type typedefs already
/// written) — the AST, struct table, and instantiation table are borrowed
/// for the duration of `generate`.
#[derive(Default)]
pub struct CEmitter {
    output: String,
    indent: usize,
    optional_typedefs_written: Vec<String>,
    /// Bound import name (as it appears at a call site, e.g. `io::print` or
    /// an alias) -> the runtime's C symbol, rebuilt from the program's own
    /// `#include` directives the same way the import resolver binds names
    /// (§4.2). The symbol table isn't available at emit time, so this is
    /// reconstructed rather than threaded through from semantic analysis.
    builtin_names: HashMap<String, String>,
}

impl CEmitter {
    pub fn new() -> Self {
        CEmitter::default()
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn blank_line(&mut self) {
        self.output.push('\n');
    }

    // ---- phase 2: struct type definitions ----

    fn emit_struct_defs(&mut self, ast: &Ast, declarations: &[NodeId], structs: &HashMap<String, StructInfo>) {
        for decl in declarations {
            if let AstKind::Struct { name, .. } = &ast.get(*decl).kind {
                let Some(info) = structs.get(name) else { continue };
                self.line(format!("typedef struct {{"));
                self.indent += 1;
                for (field_name, field_type) in &info.fields {
                    self.line(format!("{} {};", field_type.c_type(plain_struct_c_name), field_name));
                }
                self.indent -= 1;
                self.line(format!("}} {};", name));
                self.blank_line();
            }
        }
    }

    fn emit_optional_typedefs(&mut self, ast: &Ast, roots: &[NodeId]) {
        let mut optional_types: Vec<SourceType> = Vec::new();
        for root in roots {
            collect_optional_types(ast, *root, &mut optional_types);
        }
        if optional_types.is_empty() {
            return;
        }
        for ty in optional_types {
            let outer = ty.c_type(plain_struct_c_name);
            if self.optional_typedefs_written.contains(&outer) {
                continue;
            }
            let mut inner_ty = ty.clone();
            inner_ty.is_optional = false;
            let inner = inner_ty.c_type(plain_struct_c_name);
            self.line(format!("typedef ECHO_OPTIONAL({}) {};", inner, outer));
            self.optional_typedefs_written.push(outer);
        }
        self.blank_line();
    }

    // ---- phase 3: forward declarations ----

    fn emit_forward_decls(&mut self, ast: &Ast, declarations: &[NodeId], monomorphizer: &Monomorphizer) {
        for decl in declarations {
            if let AstKind::Function { name, parameters, return_type, .. } = &ast.get(*decl).kind {
                self.line(format!("{};", self.signature(ast, name, parameters, *return_type)));
            }
        }
        for instantiation in monomorphizer.instantiations() {
            if let AstKind::Function { name, parameters, return_type, .. } = &ast.get(instantiation.header).kind {
                self.line(format!("{};", self.signature(ast, name, parameters, *return_type)));
            }
        }
        self.blank_line();
    }

    fn signature(&self, ast: &Ast, name: &str, parameters: &[NodeId], return_type: Option<NodeId>) -> String {
        let ret_c = return_type
            .map(|rt| type_node_source_type(ast, rt).c_type(plain_struct_c_name))
            .unwrap_or_else(|| "void".to_string());
        let params_c = if parameters.is_empty() {
            "void".to_string()
        } else {
            parameters
                .iter()
                .map(|p| match &ast.get(*p).kind {
                    AstKind::Parameter { name, declared_type } => {
                        format!("{} {}", type_node_source_type(ast, *declared_type).c_type(plain_struct_c_name), name)
                    }
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("{} {}({})", ret_c, name, params_c)
    }

    // ---- phase 4: bodies ----

    fn emit_bodies(&mut self, ast: &Ast, declarations: &[NodeId], monomorphizer: &Monomorphizer) {
        for decl in declarations {
            if let AstKind::Function { name, parameters, return_type, body } = &ast.get(*decl).kind {
                let sig = self.signature(ast, name, parameters, *return_type);
                self.line(format!("{} {{", sig));
                self.indent += 1;
                self.emit_block_statements(ast, *body, &HashMap::new());
                self.indent -= 1;
                self.line("}");
                self.blank_line();
            }
        }

        for instantiation in monomorphizer.instantiations() {
            self.emit_instantiation_body(ast, instantiation);
        }
    }

    /// Synthesizes an instantiation's body from the shared template body
    /// (§9, header-only synthesis): the template AST is never cloned, so
    /// each instantiation walks the same body nodes under a substitution
    /// environment mapping the template's own parameter names to this
    /// instantiation's concrete types, resolving any `auto` variable
    /// declaration encountered along the way.
    fn emit_instantiation_body(&mut self, ast: &Ast, instantiation: &Instantiation) {
        let AstKind::Function { name, parameters, return_type, body } = &ast.get(instantiation.header).kind else {
            return;
        };
        let sig = self.signature(ast, name, parameters, *return_type);
        let mut env: HashMap<String, SourceType> = HashMap::new();
        for param in parameters {
            if let AstKind::Parameter { name, declared_type } = &ast.get(*param).kind {
                env.insert(name.clone(), type_node_source_type(ast, *declared_type));
            }
        }
        self.line(format!("{} {{", sig));
        self.indent += 1;
        self.emit_block_statements(ast, *body, &env);
        self.indent -= 1;
        self.line("}");
        self.blank_line();
    }

    fn emit_block_statements(&mut self, ast: &Ast, block: NodeId, env: &HashMap<String, SourceType>) {
        let statements = match &ast.get(block).kind {
            AstKind::Block { statements } => statements.clone(),
            _ => return,
        };
        for stmt in statements {
            self.emit_statement(ast, stmt, env);
        }
    }

    fn emit_statement(&mut self, ast: &Ast, stmt: NodeId, env: &HashMap<String, SourceType>) {
        match &ast.get(stmt).kind {
            AstKind::Block { .. } => {
                self.line("{");
                self.indent += 1;
                self.emit_block_statements(ast, stmt, env);
                self.indent -= 1;
                self.line("}");
            }
            AstKind::VariableDecl { name, declared_type, initializer } => {
                let ty = if matches!(ast.get(*declared_type).kind, AstKind::AutoType) {
                    initializer
                        .map(|init| resolve_expr_type(ast, init, env))
                        .unwrap_or_else(|| SourceType::named("i32"))
                } else {
                    type_node_source_type(ast, *declared_type)
                };
                let c_ty = ty.c_type(plain_struct_c_name);
                match initializer {
                    Some(init) => {
                        self.line(format!("{} {} = {};", c_ty, name, self.expr_to_c(ast, *init, env)));
                    }
                    None => self.line(format!("{} {};", c_ty, name)),
                }
            }
            AstKind::ExpressionStmt { expression } => {
                self.line(format!("{};", self.expr_to_c(ast, *expression, env)));
            }
            AstKind::Return { expression } => match expression {
                Some(expr) => self.line(format!("return {};", self.expr_to_c(ast, *expr, env))),
                None => self.line("return;"),
            },
            AstKind::If { condition, then_branch, else_branch } => {
                self.line(format!("if ({}) {{", self.expr_to_c(ast, *condition, env)));
                self.indent += 1;
                self.emit_as_block(ast, *then_branch, env);
                self.indent -= 1;
                match else_branch {
                    Some(else_branch) => {
                        self.line("} else {");
                        self.indent += 1;
                        self.emit_as_block(ast, *else_branch, env);
                        self.indent -= 1;
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }
            AstKind::While { condition, body } => {
                self.line(format!("while ({}) {{", self.expr_to_c(ast, *condition, env)));
                self.indent += 1;
                self.emit_as_block(ast, *body, env);
                self.indent -= 1;
                self.line("}");
            }
            AstKind::For { init, condition, step, body } => {
                let init_c = init.map(|n| self.for_clause_to_c(ast, n, env)).unwrap_or_default();
                let cond_c = condition.map(|n| self.expr_to_c(ast, n, env)).unwrap_or_default();
                let step_c = step.map(|n| self.expr_to_c(ast, n, env)).unwrap_or_default();
                self.line(format!("for ({}; {}; {}) {{", init_c, cond_c, step_c));
                self.indent += 1;
                self.emit_as_block(ast, *body, env);
                self.indent -= 1;
                self.line("}");
            }
            _ => {
                self.line(format!("{};", self.expr_to_c(ast, stmt, env)));
            }
        }
    }

    /// `If`/`While`/`For` bodies aren't always `Block` nodes (a single
    /// statement is legal per §6's grammar); wrap a bare statement so the
    /// emitted C always gets braces.
    fn emit_as_block(&mut self, ast: &Ast, node: NodeId, env: &HashMap<String, SourceType>) {
        if matches!(ast.get(node).kind, AstKind::Block { .. }) {
            self.emit_block_statements(ast, node, env);
        } else {
            self.emit_statement(ast, node, env);
        }
    }

    /// A `for` init clause is a `VariableDecl` or expression statement
    /// without its own trailing semicolon, since the surrounding `for (...)`
    /// supplies the separators.
    fn for_clause_to_c(&self, ast: &Ast, node: NodeId, env: &HashMap<String, SourceType>) -> String {
        match &ast.get(node).kind {
            AstKind::VariableDecl { name, declared_type, initializer } => {
                let ty = if matches!(ast.get(*declared_type).kind, AstKind::AutoType) {
                    initializer
                        .map(|init| resolve_expr_type(ast, init, env))
                        .unwrap_or_else(|| SourceType::named("i32"))
                } else {
                    type_node_source_type(ast, *declared_type)
                };
                let c_ty = ty.c_type(plain_struct_c_name);
                match initializer {
                    Some(init) => format!("{} {} = {}", c_ty, name, self.expr_to_c(ast, init, env)),
                    None => format!("{} {}", c_ty, name),
                }
            }
            AstKind::ExpressionStmt { expression } => self.expr_to_c(ast, *expression, env),
            _ => self.expr_to_c(ast, node, env),
        }
    }

    fn expr_to_c(&self, ast: &Ast, node: NodeId, env: &HashMap<String, SourceType>) -> String {
        match &ast.get(node).kind {
            AstKind::Literal(lit) => literal_to_c(lit),
            AstKind::Identifier { name } => name.clone(),
            AstKind::ScopeResolution { segments } => segments.join("::"),
            AstKind::BinaryOp { op, lhs, rhs } => {
                format!("({} {} {})", self.expr_to_c(ast, *lhs, env), binary_op_c(*op), self.expr_to_c(ast, *rhs, env))
            }
            AstKind::UnaryOp { op, operand } => {
                format!("({}{})", unary_op_c(*op), self.expr_to_c(ast, *operand, env))
            }
            AstKind::Assignment { target, value } => {
                format!("{} = {}", self.expr_to_c(ast, *target, env), self.expr_to_c(ast, *value, env))
            }
            AstKind::ArrayAccess { array, index } => {
                format!("{}[{}]", self.expr_to_c(ast, *array, env), self.expr_to_c(ast, *index, env))
            }
            AstKind::MemberAccess { object, field, arrow } => {
                let sep = if *arrow { "->" } else { "." };
                format!("{}{}{}", self.expr_to_c(ast, *object, env), sep, field)
            }
            AstKind::PointerDeref { operand } => format!("(*{})", self.expr_to_c(ast, *operand, env)),
            AstKind::AddressOf { operand } => format!("(&{})", self.expr_to_c(ast, *operand, env)),
            AstKind::Alloc { allocated_type, initializer } => {
                let ty = type_node_source_type(ast, *allocated_type);
                let c_ty = ty.c_type(plain_struct_c_name);
                match initializer {
                    Some(init) => format!("echo_alloc_init({}, {})", c_ty, self.expr_to_c(ast, *init, env)),
                    None => format!("echo_alloc(sizeof({}))", c_ty),
                }
            }
            AstKind::Delete { operand } => format!("echo_free({})", self.expr_to_c(ast, *operand, env)),
            AstKind::Call { callee, arguments } => {
                let callee_c = self.call_target(ast, node, *callee);
                let args_c = arguments.iter().map(|a| self.expr_to_c(ast, *a, env)).collect::<Vec<_>>().join(", ");
                format!("{}({})", callee_c, args_c)
            }
            AstKind::StructLiteral { fields, .. } => {
                let fields_c = fields
                    .iter()
                    .map(|(name, value)| format!(".{} = {}", name, self.expr_to_c(ast, *value, env)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {} }}", fields_c)
            }
            _ => String::new(),
        }
    }

    /// A generic-function call site carries its resolved mangled name on
    /// the `Call` node's `generics.mangled_key` (set during monomorphization
    /// in the semantic pass); builtins and ordinary user functions are
    /// emitted by their symbol's own name.
    fn call_target(&self, ast: &Ast, call: NodeId, callee: NodeId) -> String {
        if let Some(mangled) = ast.get(call).generics.as_ref().and_then(|g| g.mangled_key.clone()) {
            return mangled;
        }
        let raw = self.expr_to_c(ast, callee, &HashMap::new());
        self.builtin_names.get(&raw).cloned().unwrap_or(raw)
    }
}

/// Mirrors `import_resolver::resolve_one`'s name-binding rules, but records
/// bound-name -> c_symbol instead of declaring symbols, since the emitter
/// only needs the final call-site spelling, not a resolvable declaration.
fn collect_builtin_names(ast: &Ast, declarations: &[NodeId]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for decl in declarations {
        let AstKind::Preprocessor { directive } = &ast.get(*decl).kind else { continue };
        let (path, alias) = match directive.split_once(" as ") {
            Some((path, alias)) => (path.trim(), Some(alias.trim())),
            None => (directive.trim(), None),
        };

        if let Some(builtin) = find_by_qualified_name(path) {
            let bound_name = alias.map(str::to_string).unwrap_or_else(|| short_name(path));
            map.insert(bound_name, builtin.c_symbol().to_string());
            continue;
        }

        if module_exists(path) {
            for f in functions_in_module(path) {
                map.insert(f.qualified_name().to_string(), f.c_symbol().to_string());
                let short = match alias {
                    Some(prefix) => rename_module_prefix(f.qualified_name(), path, prefix),
                    None => short_name(f.qualified_name()),
                };
                map.insert(short, f.c_symbol().to_string());
            }
        }
    }
    map
}

fn rename_module_prefix(qualified_name: &str, module_prefix: &str, alias_prefix: &str) -> String {
    match qualified_name.strip_prefix(&format!("{}::", module_prefix)) {
        Some(rest) => format!("{}::{}", alias_prefix, rest),
        None => qualified_name.to_string(),
    }
}

impl BackEndGenerator for CEmitter {
    fn generate(
        mut self,
        ast: &Ast,
        program: NodeId,
        structs: &HashMap<String, StructInfo>,
        monomorphizer: &Monomorphizer,
    ) -> String {
        let declarations = match &ast.get(program).kind {
            AstKind::Program { declarations } => declarations.clone(),
            _ => Vec::new(),
        };
        self.builtin_names = collect_builtin_names(ast, &declarations);

        self.line(PREAMBLE.trim_end());
        self.blank_line();

        let mut roots = declarations.clone();
        roots.extend(monomorphizer.instantiations().iter().map(|i| i.header));
        self.emit_optional_typedefs(ast, &roots);

        self.emit_struct_defs(ast, &declarations, structs);
        self.emit_forward_decls(ast, &declarations, monomorphizer);
        self.emit_bodies(ast, &declarations, monomorphizer);

        self.output
    }
}

fn plain_struct_c_name(name: &str) -> String {
    name.to_string()
}

fn type_node_source_type(ast: &Ast, node: NodeId) -> SourceType {
    match &ast.get(node).kind {
        AstKind::Type { name, is_pointer, is_optional, is_array } => SourceType {
            base: name.clone(),
            is_pointer: *is_pointer,
            is_optional: *is_optional,
            is_array: *is_array,
        },
        _ => SourceType::named("i32"),
    }
}

fn collect_optional_types(ast: &Ast, node: NodeId, sink: &mut Vec<SourceType>) {
    if let AstKind::Type { is_optional: true, .. } = &ast.get(node).kind {
        sink.push(type_node_source_type(ast, node));
    }
    for child in ast.get(node).child_ids() {
        collect_optional_types(ast, child, sink);
    }
}

fn literal_to_c(lit: &Literal) -> String {
    match lit {
        Literal::Integer(v) => v.to_string(),
        Literal::Float(v) => format!("{:?}", v),
        Literal::Str(s) => format!("\"{}\"", escape_c_string(s)),
        Literal::Char(c) => format!("'{}'", escape_c_char(*c)),
        Literal::Bool(b) => b.to_string(),
        Literal::Null => "NULL".to_string(),
    }
}

fn escape_c_string(s: &str) -> String {
    s.chars().flat_map(|c| escape_c_char_into(c)).collect()
}

fn escape_c_char(c: char) -> String {
    escape_c_char_into(c).into_iter().collect()
}

fn escape_c_char_into(c: char) -> Vec<char> {
    match c {
        '\n' => vec!['\\', 'n'],
        '\t' => vec!['\\', 't'],
        '\r' => vec!['\\', 'r'],
        '"' => vec!['\\', '"'],
        '\\' => vec!['\\', '\\'],
        other => vec![other],
    }
}

fn binary_op_c(op: BinaryOperator) -> &'static str {
    op.lexeme()
}

fn unary_op_c(op: UnaryOperator) -> &'static str {
    op.lexeme()
}

/// Cut-down expression-type oracle (§4.6) used only to resolve `auto`
/// variable declarations inside a generic template's body at emit time,
/// under the per-instantiation parameter substitution environment built in
/// `emit_instantiation_body`. Mirrors the semantic analyzer's oracle rules
/// exactly; it does not re-run member-access or call validation, since a
/// generic template's body is never independently analyzed (§4.3 only
/// analyzes non-generic function bodies) — only the concrete types needed
/// to print a declaration are recovered here.
fn resolve_expr_type(ast: &Ast, node: NodeId, env: &HashMap<String, SourceType>) -> SourceType {
    match &ast.get(node).kind {
        AstKind::Literal(lit) => SourceType::named(lit.inferred_type_name()),
        AstKind::Identifier { name } => env.get(name).cloned().unwrap_or_else(|| SourceType::named("i32")),
        AstKind::BinaryOp { op, lhs, rhs } => {
            if op.is_comparison() {
                return SourceType::named("bool");
            }
            let lhs_ty = resolve_expr_type(ast, *lhs, env);
            let rhs_ty = resolve_expr_type(ast, *rhs, env);
            if lhs_ty == rhs_ty {
                lhs_ty
            } else {
                SourceType::named("i32")
            }
        }
        _ => SourceType::named("i32"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::SymbolTable;
    use crate::compiler::parser::{AstParser, RecursiveDescentParser};
    use crate::compiler::semantic::SemanticAnalyser;
    use echo_compiler_common::DiagnosticBag;

    fn compile_to_c(source: &str) -> String {
        let parser = RecursiveDescentParser::new(source, "t.ec");
        let (mut ast, parse_diags) = parser.parse();
        assert!(parse_diags.is_empty());
        let program = ast.root();
        let mut symbols = SymbolTable::new();
        crate::compiler::import_resolver::resolve_imports(&ast, program, &mut symbols, &mut DiagnosticBag::new(), "t.ec");
        let result = SemanticAnalyser::new(&mut ast, symbols, "t.ec").analyse(program);
        assert!(!result.diagnostics.has_errors(), "{:?}", result.diagnostics.iter().collect::<Vec<_>>());
        CEmitter::new().generate(&ast, program, &result.structs, &result.monomorphizer)
    }

    #[test]
    fn emits_main_returning_constant() {
        let c = compile_to_c("fn main() -> i32 { return 42; }");
        assert!(c.contains("int32_t main(void)"));
        assert!(c.contains("return 42;"));
    }

    #[test]
    fn emits_add_function_and_call_site() {
        let c = compile_to_c(
            "fn add(i32 a, i32 b) -> i32 { return a + b; } fn main() -> i32 { return add(2, 3); }",
        );
        assert!(c.contains("int32_t add(int32_t a, int32_t b)"));
        assert!(c.contains("add(2, 3)"));
    }

    #[test]
    fn generic_add_emits_two_mangled_instantiations() {
        let c = compile_to_c(
            "fn add(auto a, auto b) -> auto { return a + b; } \
             fn main() -> i32 { add(1, 2); add(1.5, 2.5); return 0; }",
        );
        assert!(c.contains("add_i32_i32"));
        assert!(c.contains("add_f64_f64"));
        assert!(c.contains("add_i32_i32(1, 2)"));
        assert!(c.contains("add_f64_f64(1.5, 2.5)"));
    }

    #[test]
    fn builtin_import_rewrites_to_runtime_symbol() {
        let c = compile_to_c("#include core::io\nfn main() -> i32 { io::print(\"hi\"); return 0; }");
        assert!(c.contains("echo_print_string(\"hi\")"));
    }

    #[test]
    fn struct_field_order_and_designated_initializer_are_preserved() {
        let c = compile_to_c(
            "struct P { f64 x; f64 y; } fn main() -> i32 { P p = {x: 1.0, y: 2.0}; return 0; }",
        );
        assert!(c.contains("double x;\n    double y;") || c.contains("double x;\ndouble y;"));
        assert!(c.contains(".x = 1.0"));
        assert!(c.contains(".y = 2.0"));
    }

    #[test]
    fn empty_program_emits_only_preamble() {
        let c = compile_to_c("");
        assert!(c.contains("#include \"echo_runtime.h\""));
        assert!(!c.contains("int32_t"));
    }
}
