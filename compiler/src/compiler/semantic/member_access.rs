//! Field access validation for `obj.field` / `obj->field` (§4.4). Takes the
//! object expression's already-resolved type rather than re-walking the
//! expression itself, since by the time a `MemberAccess` node is reached the
//! analyzer has already recursed into `object` as an ordinary expression.

use std::collections::HashMap;

use echo_compiler_common::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity, SourceType};

use crate::compiler::ast::{Pos, ScopeId, Symbol, SymbolKind, SymbolTable};

use super::StructInfo;

/// Resolves the field's type, or records a diagnostic and returns `None`.
pub fn validate(
    symbols: &SymbolTable,
    structs: &HashMap<String, StructInfo>,
    scope: ScopeId,
    obj_type: Option<SourceType>,
    field: &str,
    pos: Pos,
    diagnostics: &mut DiagnosticBag,
    file: &str,
) -> Option<SourceType> {
    let obj_type = obj_type?;

    let is_struct_symbol = matches!(
        symbols.resolve(scope, &obj_type.base),
        Some(Symbol { kind: SymbolKind::Struct, .. })
    ) || matches!(
        symbols.resolve_in_scope(symbols.global_scope(), &obj_type.base),
        Some(Symbol { kind: SymbolKind::Struct, .. })
    );

    let info = structs.get(&obj_type.base);

    if !is_struct_symbol || info.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidOperation,
            Severity::Error,
            pos.line,
            pos.column,
            file.to_string(),
            format!("'{}' is not a struct type", obj_type.base),
        ));
        return None;
    }

    match info.unwrap().fields.iter().find(|(name, _)| name == field) {
        Some((_, ty)) => Some(ty.clone()),
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UndefinedField,
                Severity::Error,
                pos.line,
                pos.column,
                file.to_string(),
                format!("struct '{}' has no field '{}'", obj_type.base, field),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::arena::Ast;
    use crate::compiler::ast::node::{AstKind, AstNode};

    fn dummy_decl(ast: &mut Ast) -> crate::compiler::ast::NodeId {
        ast.alloc(AstNode::new(AstKind::Identifier { name: "p".into() }, Pos::default()))
    }

    #[test]
    fn known_field_resolves_its_declared_type() {
        let mut ast = Ast::new();
        let decl = dummy_decl(&mut ast);
        let mut symbols = SymbolTable::new();
        let global = symbols.global_scope();
        symbols.declare(global, Symbol::new("Point", SymbolKind::Struct, decl, global)).unwrap();
        let mut structs = HashMap::new();
        structs.insert(
            "Point".to_string(),
            StructInfo {
                name: "Point".into(),
                fields: vec![("x".into(), SourceType::named("i32")), ("y".into(), SourceType::named("i32"))],
            },
        );
        let mut diags = DiagnosticBag::new();
        let ty = validate(
            &symbols,
            &structs,
            global,
            Some(SourceType::named("Point")),
            "x",
            Pos::default(),
            &mut diags,
            "t.ec",
        );
        assert_eq!(ty, Some(SourceType::named("i32")));
        assert!(diags.is_empty());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut ast = Ast::new();
        let decl = dummy_decl(&mut ast);
        let mut symbols = SymbolTable::new();
        let global = symbols.global_scope();
        symbols.declare(global, Symbol::new("Point", SymbolKind::Struct, decl, global)).unwrap();
        let mut structs = HashMap::new();
        structs.insert(
            "Point".to_string(),
            StructInfo { name: "Point".into(), fields: vec![("x".into(), SourceType::named("i32"))] },
        );
        let mut diags = DiagnosticBag::new();
        let ty = validate(
            &symbols,
            &structs,
            global,
            Some(SourceType::named("Point")),
            "z",
            Pos::default(),
            &mut diags,
            "t.ec",
        );
        assert_eq!(ty, None);
        assert!(diags.has_errors());
    }

    #[test]
    fn non_struct_object_is_an_error() {
        let symbols = SymbolTable::new();
        let global = symbols.global_scope();
        let structs = HashMap::new();
        let mut diags = DiagnosticBag::new();
        let ty = validate(
            &symbols,
            &structs,
            global,
            Some(SourceType::named("i32")),
            "x",
            Pos::default(),
            &mut diags,
            "t.ec",
        );
        assert_eq!(ty, None);
        assert!(diags.has_errors());
    }
}
