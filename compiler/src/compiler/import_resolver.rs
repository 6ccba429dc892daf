//! Translates `#include <path> [as <alias>]` preprocessor directives into
//! global-scope symbols drawn from the hard-coded built-in function table
//! (§4.2). There is no notion of a resolvable user module; every import
//! bottoms out in `echo_compiler_common::builtins`.

use echo_compiler_common::{
    find_by_qualified_name, functions_in_module, module_exists, short_name, BuiltinFunction,
    Diagnostic, DiagnosticBag, DiagnosticKind, Severity, SourceType,
};

use crate::compiler::ast::{Ast, AstKind, NodeId, Pos, Scope, Symbol, SymbolKind, SymbolTable};

/// Walks every top-level `Preprocessor` node in `program` and populates the
/// symbol table's global scope. Diagnostics are recorded, not raised, so a
/// file with several bad imports still gets analyzed past the first one.
pub fn resolve_imports(
    ast: &Ast,
    program: NodeId,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticBag,
    file: &str,
) {
    let declarations = match &ast.get(program).kind {
        AstKind::Program { declarations } => declarations.clone(),
        _ => return,
    };

    for decl in declarations {
        let node = ast.get(decl);
        if let AstKind::Preprocessor { directive } = &node.kind {
            resolve_one(directive, decl, node.pos, symbols, diagnostics, file);
        }
    }
}

fn resolve_one(
    directive: &str,
    decl: NodeId,
    pos: Pos,
    symbols: &mut SymbolTable,
    diagnostics: &mut DiagnosticBag,
    file: &str,
) {
    let (path, alias) = match directive.split_once(" as ") {
        Some((path, alias)) => (path.trim(), Some(alias.trim())),
        None => (directive.trim(), None),
    };

    if let Some(builtin) = find_by_qualified_name(path) {
        // Function import or function alias.
        let bound_name = alias.map(str::to_string).unwrap_or_else(|| short_name(path));
        declare_builtin(symbols, &bound_name, builtin, decl);
        return;
    }

    if module_exists(path) {
        // Module import or module alias.
        let functions: Vec<BuiltinFunction> = functions_in_module(path).collect();
        for f in &functions {
            declare_builtin(symbols, f.qualified_name(), *f, decl);
            let short = match alias {
                Some(prefix) => rename_module_prefix(f.qualified_name(), path, prefix),
                None => short_name(f.qualified_name()),
            };
            declare_builtin(symbols, &short, *f, decl);
        }
        return;
    }

    diagnostics.push(Diagnostic::new(
        DiagnosticKind::UndefinedSymbol,
        Severity::Error,
        pos.line,
        pos.column,
        file.to_string(),
        format!("unknown import '{}'", path),
    ));
}

fn rename_module_prefix(qualified_name: &str, module_prefix: &str, alias_prefix: &str) -> String {
    match qualified_name.strip_prefix(&format!("{}::", module_prefix)) {
        Some(rest) => format!("{}::{}", alias_prefix, rest),
        None => qualified_name.to_string(),
    }
}

fn declare_builtin(symbols: &mut SymbolTable, name: &str, f: BuiltinFunction, decl: NodeId) {
    let param_types: Vec<SourceType> = f.param_types().iter().map(|t| SourceType::named(*t)).collect();
    let return_type = SourceType::named(f.return_type());
    let mut symbol = Symbol::builtin(
        name,
        SymbolKind::Function {
            param_types,
            return_type: return_type.clone(),
        },
        decl,
    );
    symbol.declared_type = Some(return_type);
    // Redeclaring the same builtin under an alias that collides with an
    // earlier import is harmless (last import wins); only a genuine
    // user-declared symbol clash is worth failing on, and that is caught
    // later when user declarations are inserted over these entries.
    let _ = global_scope_mut(symbols).add_symbol(symbol);
}

fn global_scope_mut(symbols: &mut SymbolTable) -> &mut Scope {
    let global = symbols.global_scope();
    symbols.scope_mut(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::{AstNode};

    fn program_with_imports(directives: &[&str]) -> (Ast, NodeId) {
        let mut ast = Ast::new();
        let mut declarations = Vec::new();
        for d in directives {
            declarations.push(ast.alloc(AstNode::new(
                AstKind::Preprocessor {
                    directive: d.to_string(),
                },
                Pos::default(),
            )));
        }
        let program = ast.alloc(AstNode::new(AstKind::Program { declarations }, Pos::default()));
        ast.set_root(program);
        (ast, program)
    }

    #[test]
    fn module_import_registers_full_and_short_names() {
        let (ast, program) = program_with_imports(&["core::io"]);
        let mut symbols = SymbolTable::new();
        let mut diags = DiagnosticBag::new();
        resolve_imports(&ast, program, &mut symbols, &mut diags, "t.ec");
        assert!(diags.is_empty());
        let global = symbols.global_scope();
        assert!(symbols.resolve_in_scope(global, "core::io::print").is_some());
        assert!(symbols.resolve_in_scope(global, "io::print").is_some());
    }

    #[test]
    fn function_import_registers_only_short_name() {
        let (ast, program) = program_with_imports(&["core::io::print"]);
        let mut symbols = SymbolTable::new();
        let mut diags = DiagnosticBag::new();
        resolve_imports(&ast, program, &mut symbols, &mut diags, "t.ec");
        assert!(diags.is_empty());
        let global = symbols.global_scope();
        assert!(symbols.resolve_in_scope(global, "io::print").is_some());
        assert!(symbols.resolve_in_scope(global, "core::io::print").is_none());
    }

    #[test]
    fn function_alias_binds_chosen_name() {
        let (ast, program) = program_with_imports(&["core::io::print as puts"]);
        let mut symbols = SymbolTable::new();
        let mut diags = DiagnosticBag::new();
        resolve_imports(&ast, program, &mut symbols, &mut diags, "t.ec");
        assert!(diags.is_empty());
        let global = symbols.global_scope();
        assert!(symbols.resolve_in_scope(global, "puts").is_some());
    }

    #[test]
    fn unknown_import_is_an_error() {
        let (ast, program) = program_with_imports(&["core::nope"]);
        let mut symbols = SymbolTable::new();
        let mut diags = DiagnosticBag::new();
        resolve_imports(&ast, program, &mut symbols, &mut diags, "t.ec");
        assert!(diags.has_errors());
    }
}
