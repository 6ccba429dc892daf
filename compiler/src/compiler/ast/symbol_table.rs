use std::collections::HashMap;
use std::fmt;

use super::arena::NodeId;
use super::scope::{ScopeId, ScopeIdGenerator};
use echo_compiler_common::SourceType;

/// What kind of declaration a `Symbol` stands for. Extends the original
/// implementation's `SymbolType` (variable/function/parameter/struct/enum)
/// with a dedicated `TypeParameter` kind for generic placeholders, since
/// those are looked up during monomorphization the same way any other
/// identifier is.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function {
        param_types: Vec<SourceType>,
        return_type: SourceType,
    },
    /// A `GenericFunction` declaration. Carries only the placeholder
    /// parameter count, not concrete types — call sites resolve their own
    /// concrete types through the monomorphizer (§4.5), not through this
    /// symbol.
    GenericFunction {
        parameter_count: usize,
    },
    Struct,
    Enum,
    TypeParameter,
}

/// A single named declaration visible in some scope. `declaration` is a
/// non-owning reference into the `Ast` arena the symbol table was built
/// from: the node outlives no borrow because the arena, not the symbol,
/// owns it (see arena.rs).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub declared_type: Option<SourceType>,
    pub declaration: NodeId,
    pub scope: ScopeId,
    pub is_builtin: bool,
    /// Set once an initializer (or, for parameters, the call itself) has
    /// given this symbol a value. Drives the `UninitializedVariable`
    /// diagnostic; parameters and builtins are always initialized.
    pub initialized: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, declaration: NodeId, scope: ScopeId) -> Self {
        Symbol {
            name: name.into(),
            kind,
            declared_type: None,
            declaration,
            scope,
            is_builtin: false,
            initialized: false,
        }
    }

    pub fn with_declared_type(mut self, ty: SourceType) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_initialized(mut self, initialized: bool) -> Self {
        self.initialized = initialized;
        self
    }

    pub fn builtin(name: impl Into<String>, kind: SymbolKind, declaration: NodeId) -> Self {
        let mut symbol = Symbol::new(name, kind, declaration, ScopeId::global());
        symbol.is_builtin = true;
        symbol.initialized = true;
        symbol
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }
}

/// One lexical scope. `is_function_boundary` blocks implicit lookups into
/// the enclosing scope chain the way a function body can't see a caller's
/// locals; this is the `subroutine` flag on the teacher's `SymbolScope` and
/// `Scope.is_function_scope` in the original implementation.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub is_function_boundary: bool,
    symbols: HashMap<String, Symbol>,
    declaration_order: Vec<String>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, is_function_boundary: bool) -> Self {
        Scope {
            id,
            parent,
            is_function_boundary,
            symbols: HashMap::new(),
            declaration_order: Vec::new(),
        }
    }

    /// Adds `symbol` to this scope. Fails if a symbol by that name is
    /// already declared here (redeclaration within the same scope is
    /// rejected; shadowing an outer scope's symbol is fine).
    pub fn add_symbol(&mut self, symbol: Symbol) -> Result<(), String> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(symbol.name);
        }
        self.declaration_order.push(symbol.name.clone());
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.declaration_order.iter().filter_map(move |n| self.symbols.get(n))
    }
}

/// Owns every `Scope` produced while walking one compilation unit's AST and
/// resolves identifiers against the current scope chain. The global scope
/// (`ScopeId::global()`) always exists and is checked first on every lookup,
/// so a nested scope never needs a qualified name to see a builtin or a
/// top-level function.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: HashMap<ScopeId, Scope>,
    id_gen: ScopeIdGenerator,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut scopes = HashMap::new();
        scopes.insert(ScopeId::global(), Scope::new(ScopeId::global(), None, false));
        SymbolTable {
            scopes,
            id_gen: ScopeIdGenerator::new(),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId::global()
    }

    pub fn open_scope(&mut self, parent: ScopeId, is_function_boundary: bool) -> ScopeId {
        let id = self.id_gen.next_id();
        self.scopes.insert(id, Scope::new(id, Some(parent), is_function_boundary));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.get(&id).expect("unknown ScopeId")
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        self.scopes.get_mut(&id).expect("unknown ScopeId")
    }

    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), String> {
        self.scope_mut(scope).add_symbol(symbol)
    }

    /// Resolves `name` starting from `scope` and walking outward: `scope`
    /// itself first, then its ancestors, stopping after the first function
    /// boundary crossed so a nested block can't see past the function it
    /// lives in. The global scope is always consulted last as a fallback
    /// (top-level functions and imports must be visible from any function
    /// body), but only as a fallback — an inner declaration shadows an
    /// outer one of the same name, global included.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if let Some(sym) = s.get(name) {
                return Some(sym);
            }
            if s.is_function_boundary {
                break;
            }
            current = s.parent;
        }
        if scope != ScopeId::global() {
            self.scope(ScopeId::global()).get(name)
        } else {
            None
        }
    }

    pub fn resolve_in_scope(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scope(scope).get(name)
    }

    pub fn parent_of(&self, id: ScopeId) -> ScopeId {
        self.scope(id).parent.unwrap_or_else(ScopeId::global)
    }

    fn children_of(&self, id: ScopeId) -> Vec<&Scope> {
        self.scopes
            .values()
            .filter(|s| s.parent == Some(id))
            .collect()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn print_scope(table: &SymbolTable, f: &mut fmt::Formatter<'_>, id: ScopeId, depth: usize) -> fmt::Result {
            let indent = "  ".repeat(depth);
            writeln!(f, "{}{} {{", indent, id)?;
            for symbol in table.scope(id).iter() {
                writeln!(f, "{}  {} : {:?}", indent, symbol.name, symbol.kind)?;
            }
            for child in table.children_of(id) {
                print_scope(table, f, child.id, depth + 1)?;
            }
            writeln!(f, "{}}}", indent)
        }

        print_scope(self, f, ScopeId::global(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::arena::Ast;
    use crate::compiler::ast::node::{AstKind, AstNode, Pos};

    fn dummy_node(ast: &mut Ast) -> NodeId {
        ast.alloc(AstNode::new(AstKind::Identifier { name: "x".into() }, Pos::default()))
    }

    #[test]
    fn global_lookup_visible_from_nested_scope() {
        let mut ast = Ast::new();
        let decl = dummy_node(&mut ast);
        let mut table = SymbolTable::new();
        table
            .declare(table.global_scope(), Symbol::new("foo", SymbolKind::Variable, decl, ScopeId::global()))
            .unwrap();
        let child = table.open_scope(table.global_scope(), false);
        assert!(table.resolve(child, "foo").is_some());
    }

    #[test]
    fn function_boundary_blocks_parent_lookup() {
        let mut ast = Ast::new();
        let decl = dummy_node(&mut ast);
        let mut table = SymbolTable::new();
        let outer = table.open_scope(table.global_scope(), false);
        table
            .declare(outer, Symbol::new("local", SymbolKind::Variable, decl, outer))
            .unwrap();
        let inner_fn = table.open_scope(outer, true);
        assert!(table.resolve(inner_fn, "local").is_none());
    }

    #[test]
    fn redeclaration_in_same_scope_errors() {
        let mut ast = Ast::new();
        let decl = dummy_node(&mut ast);
        let mut table = SymbolTable::new();
        let scope = table.open_scope(table.global_scope(), false);
        table
            .declare(scope, Symbol::new("x", SymbolKind::Variable, decl, scope))
            .unwrap();
        let err = table.declare(scope, Symbol::new("x", SymbolKind::Variable, decl, scope));
        assert!(err.is_err());
    }

    #[test]
    fn shadowing_inner_scope_wins() {
        let mut ast = Ast::new();
        let decl = dummy_node(&mut ast);
        let mut table = SymbolTable::new();
        let outer = table.open_scope(table.global_scope(), false);
        table
            .declare(outer, Symbol::new("x", SymbolKind::Variable, decl, outer).with_declared_type(SourceType::named("i32")))
            .unwrap();
        let inner = table.open_scope(outer, false);
        table
            .declare(inner, Symbol::new("x", SymbolKind::Variable, decl, inner).with_declared_type(SourceType::named("f64")))
            .unwrap();
        let found = table.resolve(inner, "x").unwrap();
        assert_eq!(found.declared_type.as_ref().unwrap().base, "f64");
    }
}
