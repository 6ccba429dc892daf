//! Three-pass semantic analyzer (§4.3): struct declarations, then function
//! declarations, then function bodies. The body pass is where the
//! expression-type oracle (§4.6), member-access validation (§4.4), and the
//! monomorphizer (§4.5) all get driven from call-site visits.

pub mod member_access;
pub mod monomorphizer;

use std::collections::HashMap;

use echo_compiler_common::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity, SourceType};
use log::debug;

use crate::compiler::ast::{Ast, AstKind, NodeId, Pos, ScopeId, Symbol, SymbolKind, SymbolTable};

use monomorphizer::Monomorphizer;

/// A struct's field list, in declaration order. Kept distinct from the
/// `Symbol(Struct)` entry in the symbol table because the emitter needs
/// field *order*, and `member_access::validate` needs a direct name->type
/// lookup; neither is naturally a symbol-table responsibility.
#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub fields: Vec<(String, SourceType)>,
}

/// Runs the three passes over `program` and returns everything the emitter
/// needs: the populated symbol table, every generic instantiation produced
/// by call-site monomorphization, and the struct field tables.
pub struct SemanticAnalyser<'a> {
    ast: &'a mut Ast,
    symbols: SymbolTable,
    monomorphizer: Monomorphizer,
    structs: HashMap<String, StructInfo>,
    diagnostics: DiagnosticBag,
    file: String,
}

/// Everything downstream of semantic analysis (the emitter) needs.
pub struct AnalysisResult {
    pub symbols: SymbolTable,
    pub monomorphizer: Monomorphizer,
    pub structs: HashMap<String, StructInfo>,
    pub diagnostics: DiagnosticBag,
}

impl<'a> SemanticAnalyser<'a> {
    pub fn new(ast: &'a mut Ast, symbols: SymbolTable, file: impl Into<String>) -> Self {
        SemanticAnalyser {
            ast,
            symbols,
            monomorphizer: Monomorphizer::new(),
            structs: HashMap::new(),
            diagnostics: DiagnosticBag::new(),
            file: file.into(),
        }
    }

    pub fn analyse(mut self, program: NodeId) -> AnalysisResult {
        let declarations = match &self.ast.get(program).kind {
            AstKind::Program { declarations } => declarations.clone(),
            _ => Vec::new(),
        };

        debug!("struct pass: {} top-level declarations", declarations.len());
        for decl in &declarations {
            if matches!(self.ast.get(*decl).kind, AstKind::Struct { .. }) {
                self.analyse_struct(*decl);
            }
        }

        debug!("function-declaration pass");
        for decl in &declarations {
            match &self.ast.get(*decl).kind {
                AstKind::Function { .. } | AstKind::GenericFunction { .. } => {
                    self.declare_function(*decl);
                }
                _ => {}
            }
        }

        debug!("function-body pass");
        for decl in &declarations {
            if matches!(self.ast.get(*decl).kind, AstKind::Function { .. }) {
                self.analyse_function_body(*decl);
            }
        }

        AnalysisResult {
            symbols: self.symbols,
            monomorphizer: self.monomorphizer,
            structs: self.structs,
            diagnostics: self.diagnostics,
        }
    }

    // ---- struct pass ----

    fn analyse_struct(&mut self, decl: NodeId) {
        let (name, fields, pos) = match &self.ast.get(decl).kind {
            AstKind::Struct { name, fields } => (name.clone(), fields.clone(), self.ast.get(decl).pos),
            _ => return,
        };

        let mut field_infos = Vec::with_capacity(fields.len());
        for field in &fields {
            let (field_name, declared_type, field_pos) = match &self.ast.get(*field).kind {
                AstKind::VariableDecl { name, declared_type, .. } => {
                    (name.clone(), *declared_type, self.ast.get(*field).pos)
                }
                _ => continue,
            };

            if matches!(self.ast.get(declared_type).kind, AstKind::AutoType) {
                self.error(
                    DiagnosticKind::InvalidAutoUsage,
                    field_pos,
                    format!("auto not allowed in struct field '{}'", field_name),
                );
                continue;
            }

            let field_type = type_node_to_source_type(self.ast, declared_type);
            if echo_compiler_common::PrimitiveType::parse(&field_type.base).is_none()
                && !self.structs.contains_key(&field_type.base)
            {
                self.warn(
                    DiagnosticKind::UndefinedType,
                    field_pos,
                    format!("unknown field type '{}' on field '{}'", field_type.base, field_name),
                );
            }

            field_infos.push((field_name, field_type));
        }

        self.structs.insert(name.clone(), StructInfo { name: name.clone(), fields: field_infos });

        let global = self.symbols.global_scope();
        if self.symbols.declare(global, Symbol::new(&name, SymbolKind::Struct, decl, global)).is_err() {
            self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
        }
    }

    // ---- function-declaration pass ----

    fn declare_function(&mut self, decl: NodeId) {
        let global = self.symbols.global_scope();
        let pos = self.ast.get(decl).pos;

        match self.ast.get(decl).kind.clone() {
            AstKind::Function { name, parameters, return_type, .. } => {
                let param_types = parameters
                    .iter()
                    .map(|p| parameter_type(self.ast, *p))
                    .collect();
                let return_type = return_type
                    .map(|rt| type_node_to_source_type(self.ast, rt))
                    .unwrap_or_else(|| SourceType::named("void"));
                let symbol = Symbol::new(&name, SymbolKind::Function { param_types, return_type }, decl, global);
                if self.symbols.declare(global, symbol).is_err() {
                    self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
                }
            }
            AstKind::GenericFunction { name, parameters, .. } => {
                let symbol = Symbol::new(
                    &name,
                    SymbolKind::GenericFunction { parameter_count: parameters.len() },
                    decl,
                    global,
                );
                if self.symbols.declare(global, symbol).is_err() {
                    self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
                }
            }
            _ => {}
        }
    }

    // ---- function-body pass ----

    fn analyse_function_body(&mut self, decl: NodeId) {
        let (parameters, return_type, body) = match self.ast.get(decl).kind.clone() {
            AstKind::Function { parameters, return_type, body, .. } => (parameters, return_type, body),
            _ => return,
        };

        let global = self.symbols.global_scope();
        let fn_scope = self.symbols.open_scope(global, true);

        for param in &parameters {
            let (name, declared_type, pos) = match &self.ast.get(*param).kind {
                AstKind::Parameter { name, declared_type } => (name.clone(), *declared_type, self.ast.get(*param).pos),
                _ => continue,
            };
            let ty = type_node_to_source_type(self.ast, declared_type);
            let symbol = Symbol::new(&name, SymbolKind::Parameter, *param, fn_scope)
                .with_declared_type(ty)
                .with_initialized(true);
            if self.symbols.declare(fn_scope, symbol).is_err() {
                self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
            }
        }

        self.analyse_block(fn_scope, body);

        let return_type = return_type.map(|rt| type_node_to_source_type(self.ast, rt));
        let is_void = return_type.map(|t| t.base == "void").unwrap_or(true);
        if !is_void && !contains_return(self.ast, body) {
            self.warn(
                DiagnosticKind::MissingReturn,
                self.ast.get(decl).pos,
                "function may not return a value on every path".to_string(),
            );
        }
    }

    // ---- statements ----

    fn analyse_block(&mut self, parent_scope: ScopeId, block: NodeId) {
        let statements = match &self.ast.get(block).kind {
            AstKind::Block { statements } => statements.clone(),
            _ => return,
        };
        let scope = self.symbols.open_scope(parent_scope, false);
        for stmt in statements {
            self.analyse_statement(scope, stmt);
        }
    }

    fn analyse_statement(&mut self, scope: ScopeId, stmt: NodeId) {
        match self.ast.get(stmt).kind.clone() {
            AstKind::Block { .. } => self.analyse_block(scope, stmt),
            AstKind::VariableDecl { name, declared_type, initializer } => {
                self.analyse_variable_decl(scope, stmt, &name, declared_type, initializer);
            }
            AstKind::ExpressionStmt { expression } => {
                self.analyse_expression(scope, expression, None);
            }
            AstKind::Return { expression } => {
                if let Some(expr) = expression {
                    self.analyse_expression(scope, expr, None);
                }
            }
            AstKind::If { condition, then_branch, else_branch } => {
                self.analyse_expression(scope, condition, None);
                self.analyse_statement(scope, then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyse_statement(scope, else_branch);
                }
            }
            AstKind::While { condition, body } => {
                self.analyse_expression(scope, condition, None);
                self.analyse_statement(scope, body);
            }
            AstKind::For { init, condition, step, body } => {
                let loop_scope = self.symbols.open_scope(scope, false);
                if let Some(init) = init {
                    self.analyse_statement(loop_scope, init);
                }
                if let Some(condition) = condition {
                    self.analyse_expression(loop_scope, condition, None);
                }
                if let Some(step) = step {
                    self.analyse_expression(loop_scope, step, None);
                }
                self.analyse_statement(loop_scope, body);
            }
            _ => {
                self.analyse_expression(scope, stmt, None);
            }
        }
    }

    fn analyse_variable_decl(
        &mut self,
        scope: ScopeId,
        decl: NodeId,
        name: &str,
        declared_type: NodeId,
        initializer: Option<NodeId>,
    ) {
        let pos = self.ast.get(decl).pos;
        let is_auto = matches!(self.ast.get(declared_type).kind, AstKind::AutoType);

        if is_auto {
            let Some(init) = initializer else {
                self.error(
                    DiagnosticKind::InvalidAutoUsage,
                    pos,
                    "auto variable must have an initializer".to_string(),
                );
                return;
            };
            let inferred = self.analyse_expression(scope, init, None);
            let inferred = inferred.unwrap_or_else(|| SourceType::named("i32"));
            let inferred_node = self.ast.alloc(crate::compiler::ast::AstNode::new(
                AstKind::Type {
                    name: inferred.base.clone(),
                    is_pointer: inferred.is_pointer,
                    is_optional: inferred.is_optional,
                    is_array: inferred.is_array,
                },
                pos,
            ));
            if let AstKind::VariableDecl { declared_type: slot, .. } = &mut self.ast.get_mut(decl).kind {
                *slot = inferred_node;
            }
            let symbol = Symbol::new(name, SymbolKind::Variable, decl, scope)
                .with_declared_type(inferred)
                .with_initialized(true);
            if self.symbols.declare(scope, symbol).is_err() {
                self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
            }
            return;
        }

        let declared = type_node_to_source_type(self.ast, declared_type);
        let initialized = if let Some(init) = initializer {
            self.analyse_expression(scope, init, Some(&declared));
            true
        } else {
            false
        };
        let symbol = Symbol::new(name, SymbolKind::Variable, decl, scope)
            .with_declared_type(declared)
            .with_initialized(initialized);
        if self.symbols.declare(scope, symbol).is_err() {
            self.error(DiagnosticKind::RedefinedSymbol, pos, format!("redefined symbol '{}'", name));
        }
    }

    // ---- expressions / the §4.6 type oracle ----

    /// Analyzes `node` for diagnostics (undefined symbols, uninitialized
    /// reads, member-access validity, monomorphization) and returns its
    /// type per the §4.6 oracle table. `expected` carries context for
    /// struct-literal targeting (§9): the declared type of the
    /// `VariableDecl` a bare `{...}` literal appears in, if any.
    fn analyse_expression(&mut self, scope: ScopeId, node: NodeId, expected: Option<&SourceType>) -> Option<SourceType> {
        let pos = self.ast.get(node).pos;
        match self.ast.get(node).kind.clone() {
            AstKind::Literal(lit) => {
                let ty = SourceType::named(lit.inferred_type_name());
                self.ast.get_mut(node).resolved_type = Some(ty.clone());
                Some(ty)
            }
            AstKind::Identifier { name } => {
                let found = self.symbols.resolve(scope, &name).cloned();
                match found {
                    None => {
                        self.error(DiagnosticKind::UndefinedSymbol, pos, format!("undefined symbol '{}'", name));
                        None
                    }
                    Some(symbol) => {
                        if matches!(symbol.kind, SymbolKind::Variable) && !symbol.initialized {
                            self.warn(
                                DiagnosticKind::UninitializedVariable,
                                pos,
                                format!("'{}' may be used uninitialized", name),
                            );
                        }
                        let ty = symbol.declared_type.clone();
                        if let Some(ty) = &ty {
                            self.ast.get_mut(node).resolved_type = Some(ty.clone());
                        }
                        ty
                    }
                }
            }
            AstKind::ScopeResolution { segments } => {
                let joined = segments.join("::");
                let global = self.symbols.global_scope();
                let found = self.symbols.resolve_in_scope(global, &joined).cloned();
                match found {
                    None => {
                        self.error(DiagnosticKind::UndefinedSymbol, pos, format!("undefined symbol '{}'", joined));
                        None
                    }
                    Some(symbol) => symbol.declared_type.clone(),
                }
            }
            AstKind::StructLiteral { type_name, fields } => {
                for (_, value) in &fields {
                    self.analyse_expression(scope, *value, None);
                }
                let base = type_name.or_else(|| expected.map(|t| t.base.clone()));
                match base {
                    Some(base) => Some(SourceType::named(base)),
                    None => {
                        self.error(
                            DiagnosticKind::InvalidOperation,
                            pos,
                            "cannot determine struct literal's type from context".to_string(),
                        );
                        None
                    }
                }
            }
            AstKind::MemberAccess { object, field, .. } => {
                let obj_type = self.analyse_expression(scope, object, None);
                let structs = self.structs.clone();
                member_access::validate(&self.symbols, &structs, scope, obj_type, &field, pos, &mut self.diagnostics, &self.file)
            }
            AstKind::Call { callee, arguments } => self.analyse_call(scope, node, callee, arguments),
            AstKind::BinaryOp { op, lhs, rhs } => {
                let lhs_ty = self.analyse_expression(scope, lhs, None);
                let rhs_ty = self.analyse_expression(scope, rhs, None);
                let ty = if op.is_comparison() {
                    SourceType::named("bool")
                } else {
                    match (lhs_ty, rhs_ty) {
                        (Some(a), Some(b)) if a == b => a,
                        _ => SourceType::named("i32"),
                    }
                };
                self.ast.get_mut(node).resolved_type = Some(ty.clone());
                Some(ty)
            }
            AstKind::UnaryOp { operand, .. } => {
                self.analyse_expression(scope, operand, None);
                Some(SourceType::named("i32"))
            }
            AstKind::Assignment { target, value } => {
                self.analyse_expression(scope, target, None);
                self.analyse_expression(scope, value, None);
                if let AstKind::Identifier { name } = &self.ast.get(target).kind.clone() {
                    self.mark_initialized(scope, name);
                }
                Some(SourceType::named("i32"))
            }
            AstKind::ArrayAccess { array, index } => {
                self.analyse_expression(scope, array, None);
                self.analyse_expression(scope, index, None);
                Some(SourceType::named("i32"))
            }
            AstKind::PointerDeref { operand } | AstKind::AddressOf { operand } => {
                self.analyse_expression(scope, operand, None);
                Some(SourceType::named("i32"))
            }
            AstKind::Alloc { initializer, .. } => {
                if let Some(init) = initializer {
                    self.analyse_expression(scope, init, None);
                }
                Some(SourceType::named("i32"))
            }
            AstKind::Delete { operand } => {
                self.analyse_expression(scope, operand, None);
                Some(SourceType::named("i32"))
            }
            _ => Some(SourceType::named("i32")),
        }
    }

    fn mark_initialized(&mut self, scope: ScopeId, name: &str) {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.symbols.resolve_in_scope(id, name).is_some() {
                if let Some(symbol) = self.symbols.scope_mut(id).get_mut(name) {
                    symbol.initialized = true;
                }
                return;
            }
            current = if self.symbols.scope(id).is_function_boundary { None } else { Some(self.symbols.parent_of(id)) };
        }
        let global = self.symbols.global_scope();
        if let Some(symbol) = self.symbols.scope_mut(global).get_mut(name) {
            symbol.initialized = true;
        }
    }

    /// Drives monomorphization for calls to `GenericFunction` symbols
    /// (§4.5); ordinary function calls only get an argument-count check,
    /// since argument-type matching against a concrete signature is a
    /// documented weak area (§4.3).
    fn analyse_call(&mut self, scope: ScopeId, call: NodeId, callee: NodeId, arguments: Vec<NodeId>) -> Option<SourceType> {
        let pos = self.ast.get(call).pos;
        let callee_name = match &self.ast.get(callee).kind {
            AstKind::Identifier { name } => Some(name.clone()),
            AstKind::ScopeResolution { segments } => Some(segments.join("::")),
            _ => None,
        };

        let Some(callee_name) = callee_name else {
            for arg in &arguments {
                self.analyse_expression(scope, *arg, None);
            }
            return Some(SourceType::named("i32"));
        };

        let symbol = match &self.ast.get(callee).kind {
            AstKind::ScopeResolution { .. } => {
                let global = self.symbols.global_scope();
                self.symbols.resolve_in_scope(global, &callee_name).cloned()
            }
            _ => self.symbols.resolve(scope, &callee_name).cloned(),
        };

        let Some(symbol) = symbol else {
            self.error(DiagnosticKind::UndefinedFunction, pos, format!("undefined function '{}'", callee_name));
            for arg in &arguments {
                self.analyse_expression(scope, *arg, None);
            }
            return None;
        };

        match symbol.kind {
            SymbolKind::GenericFunction { parameter_count } => {
                if arguments.len() != parameter_count {
                    self.error(
                        DiagnosticKind::WrongArgumentCount,
                        pos,
                        format!("'{}' expects {} argument(s), found {}", callee_name, parameter_count, arguments.len()),
                    );
                    return None;
                }

                let mut type_args = Vec::with_capacity(arguments.len());
                for arg in &arguments {
                    match self.analyse_expression(scope, *arg, None) {
                        Some(ty) => type_args.push(ty),
                        None => return None,
                    }
                }

                let template = symbol.declaration;
                let instantiation = self.monomorphizer.instantiate(self.ast, template, type_args)?;
                let inferred: Vec<String> = instantiation.type_arguments.iter().map(ToString::to_string).collect();
                if let Some(generics) = &mut self.ast.get_mut(call).generics {
                    generics.mangled_key = Some(instantiation.mangled_name.clone());
                    generics.inferred = inferred;
                } else {
                    self.ast.get_mut(call).generics = Some(crate::compiler::ast::GenericsMeta {
                        mangled_key: Some(instantiation.mangled_name.clone()),
                        template: Some(template),
                        inferred,
                        ..Default::default()
                    });
                }
                self.ast.get_mut(call).resolved_type = Some(instantiation.return_type.clone());
                Some(instantiation.return_type)
            }
            SymbolKind::Function { param_types, return_type } => {
                if arguments.len() != param_types.len() {
                    self.error(
                        DiagnosticKind::WrongArgumentCount,
                        pos,
                        format!("'{}' expects {} argument(s), found {}", callee_name, param_types.len(), arguments.len()),
                    );
                }
                for arg in &arguments {
                    self.analyse_expression(scope, *arg, None);
                }
                self.ast.get_mut(call).resolved_type = Some(return_type.clone());
                Some(return_type)
            }
            _ => {
                self.error(DiagnosticKind::InvalidOperation, pos, format!("'{}' is not callable", callee_name));
                for arg in &arguments {
                    self.analyse_expression(scope, *arg, None);
                }
                None
            }
        }
    }

    fn error(&mut self, kind: DiagnosticKind, pos: Pos, message: String) {
        self.diagnostics.push(Diagnostic::new(kind, Severity::Error, pos.line, pos.column, self.file.clone(), message));
    }

    fn warn(&mut self, kind: DiagnosticKind, pos: Pos, message: String) {
        self.diagnostics.push(Diagnostic::new(kind, Severity::Warning, pos.line, pos.column, self.file.clone(), message));
    }
}

fn parameter_type(ast: &Ast, param: NodeId) -> SourceType {
    match &ast.get(param).kind {
        AstKind::Parameter { declared_type, .. } => type_node_to_source_type(ast, *declared_type),
        _ => SourceType::named("i32"),
    }
}

fn type_node_to_source_type(ast: &Ast, node: NodeId) -> SourceType {
    match &ast.get(node).kind {
        AstKind::Type { name, is_pointer, is_optional, is_array } => SourceType {
            base: name.clone(),
            is_pointer: *is_pointer,
            is_optional: *is_optional,
            is_array: *is_array,
        },
        AstKind::AutoType => SourceType::named("auto"),
        _ => SourceType::named("i32"),
    }
}

/// Conservative "did we see a `Return` anywhere in this body" scan used by
/// the missing-return warning (§4.3): a full control-flow proof that every
/// path returns is out of scope, so presence anywhere in the tree is the
/// approximation the spec calls for.
fn contains_return(ast: &Ast, node: NodeId) -> bool {
    if matches!(ast.get(node).kind, AstKind::Return { .. }) {
        return true;
    }
    ast.get(node).child_ids().iter().any(|child| contains_return(ast, *child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::{AstParser, RecursiveDescentParser};

    fn analyse(source: &str) -> (AnalysisResult, Ast) {
        let parser = RecursiveDescentParser::new(source, "t.ec");
        let (mut ast, parse_diags) = parser.parse();
        assert!(parse_diags.is_empty(), "parse errors: {:?}", parse_diags.iter().collect::<Vec<_>>());
        let program = ast.root();
        let mut symbols = SymbolTable::new();
        crate::compiler::import_resolver::resolve_imports(&ast, program, &mut symbols, &mut DiagnosticBag::new(), "t.ec");
        let result = SemanticAnalyser::new(&mut ast, symbols, "t.ec").analyse(program);
        (result, ast)
    }

    #[test]
    fn undefined_identifier_is_an_error() {
        let (result, _) = analyse("fn main() -> i32 { return x; }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn generic_add_produces_two_instantiations_for_two_type_tuples() {
        let (result, _) = analyse(
            "fn add(auto a, auto b) -> auto { return a + b; } \
             fn main() -> i32 { add(1, 2); add(1.5, 2.5); return 0; }",
        );
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.monomorphizer.instantiations().len(), 2);
        let names: Vec<_> = result.monomorphizer.instantiations().iter().map(|i| i.mangled_name.clone()).collect();
        assert!(names.contains(&"add_i32_i32".to_string()));
        assert!(names.contains(&"add_f64_f64".to_string()));
    }

    #[test]
    fn wrong_argument_count_is_an_error() {
        let (result, _) = analyse(
            "fn add(i32 a, i32 b) -> i32 { return a + b; } fn main() -> i32 { return add(1); }",
        );
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn auto_variable_without_initializer_is_an_error() {
        let (result, _) = analyse("fn main() -> i32 { auto x; return 0; }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn auto_struct_field_is_an_error() {
        let (result, _) = analyse("struct S { auto f; } fn main() -> i32 { return 0; }");
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn non_void_function_without_return_warns() {
        let (result, _) = analyse("fn main() -> i32 { i32 x = 1; }");
        assert!(!result.diagnostics.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.kind == DiagnosticKind::MissingReturn));
    }

    #[test]
    fn member_access_on_known_struct_field_resolves() {
        let (result, _) = analyse(
            "struct Point { i32 x; i32 y; } \
             fn main() -> i32 { Point p = {x: 1, y: 2}; return p.x; }",
        );
        assert!(!result.diagnostics.has_errors());
    }

    #[test]
    fn member_access_on_unknown_field_is_an_error() {
        let (result, _) = analyse(
            "struct Point { i32 x; } \
             fn main() -> i32 { Point p = {x: 1}; return p.z; }",
        );
        assert!(result.diagnostics.has_errors());
    }
}
