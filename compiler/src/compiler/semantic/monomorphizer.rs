//! Per-call-site generic instantiation (§4.5). A generic function is never
//! emitted on its own; each distinct tuple of concrete argument types seen at
//! a call site produces one `TemplateInstantiation` node carrying a mangled
//! name and a synthesized header. The template's body is never cloned: the
//! header's `body` field simply points back at the template's own body, and
//! the emitter walks it once per instantiation using the placeholder map
//! recorded here to know which concrete type each placeholder parameter
//! stands for at that call site.

use echo_compiler_common::SourceType;

use crate::compiler::ast::{Ast, AstKind, AstNode, NodeId};

/// One concrete specialization of a generic template.
#[derive(Debug, Clone)]
pub struct Instantiation {
    pub template: NodeId,
    pub type_arguments: Vec<SourceType>,
    pub mangled_name: String,
    pub instantiation_node: NodeId,
    pub header: NodeId,
    pub return_type: SourceType,
    /// Template placeholder name -> concrete type, in declaration order.
    pub placeholder_map: Vec<(String, SourceType)>,
}

/// Append-only table of instantiations, keyed by (template, type tuple) so a
/// second call site with the same argument types reuses the first's mangled
/// name instead of emitting a duplicate C function.
#[derive(Debug, Default)]
pub struct Monomorphizer {
    instantiations: Vec<Instantiation>,
}

impl Monomorphizer {
    pub fn new() -> Self {
        Monomorphizer::default()
    }

    pub fn instantiations(&self) -> &[Instantiation] {
        &self.instantiations
    }

    /// Instantiates `template` for `type_args`, or returns the existing
    /// instantiation if this exact (template, type tuple) pair was already
    /// requested by an earlier call site. `type_args` must already be
    /// exactly as long as the template's parameter list; the caller is
    /// responsible for the argument-count check (§4.5 step 1) since that
    /// check needs the raw call-site argument count, not just the types.
    pub fn instantiate(&mut self, ast: &mut Ast, template: NodeId, type_args: Vec<SourceType>) -> Option<Instantiation> {
        if let Some(existing) = self
            .instantiations
            .iter()
            .find(|i| i.template == template && i.type_arguments == type_args)
        {
            return Some(existing.clone());
        }

        let (name, parameters, type_parameters, return_type, body, is_auto_return) = match &ast.get(template).kind {
            AstKind::GenericFunction {
                name,
                parameters,
                type_parameters,
                return_type,
                body,
            } => {
                let is_auto_return = ast
                    .get(template)
                    .generics
                    .as_ref()
                    .map(|g| g.is_auto_return)
                    .unwrap_or(false);
                (name.clone(), parameters.clone(), type_parameters.clone(), *return_type, *body, is_auto_return)
            }
            _ => return None,
        };

        let pos = ast.get(template).pos;

        let mangled_name = format!(
            "{}_{}",
            name,
            type_args.iter().map(SourceType::mangle_fragment).collect::<Vec<_>>().join("_")
        );

        // `type_parameters` only holds one entry per `auto`-typed parameter,
        // in the order those parameters appear among `parameters` as a
        // whole (see the parser's `placeholder_names` collection) — it is
        // *not* the same length as `parameters`/`type_args` whenever a
        // generic function mixes concrete and placeholder parameter types.
        // Pair each placeholder with the type argument at its own position
        // in the full parameter list, not with the next item in `type_args`.
        let auto_param_positions: Vec<usize> = parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(&ast.get(**p).kind, AstKind::Parameter { declared_type, .. } if matches!(ast.get(*declared_type).kind, AstKind::AutoType)))
            .map(|(i, _)| i)
            .collect();

        let placeholder_map: Vec<(String, SourceType)> = type_parameters
            .iter()
            .map(|tp| match &ast.get(*tp).kind {
                AstKind::TypeParameter { name } => name.clone(),
                _ => String::new(),
            })
            .zip(auto_param_positions.iter().filter_map(|i| type_args.get(*i).cloned()))
            .collect();

        let mut concrete_params = Vec::with_capacity(parameters.len());
        for (i, param_id) in parameters.iter().enumerate() {
            let (pname, ppos) = match &ast.get(*param_id).kind {
                AstKind::Parameter { name, .. } => (name.clone(), ast.get(*param_id).pos),
                _ => continue,
            };
            let concrete = type_args.get(i).cloned().unwrap_or_else(|| SourceType::named("i32"));
            let ty_node = ast.alloc(AstNode::new(type_node_kind(&concrete), ppos));
            concrete_params.push(ast.alloc(AstNode::new(AstKind::Parameter { name: pname, declared_type: ty_node }, ppos)));
        }

        let concrete_return = if is_auto_return {
            type_args.first().cloned().unwrap_or_else(|| SourceType::named("i32"))
        } else {
            match return_type {
                Some(rt) => match &ast.get(rt).kind {
                    AstKind::Type { name, is_pointer, is_optional, is_array } => SourceType {
                        base: name.clone(),
                        is_pointer: *is_pointer,
                        is_optional: *is_optional,
                        is_array: *is_array,
                    },
                    _ => SourceType::named("void"),
                },
                None => SourceType::named("void"),
            }
        };
        let return_ty_node = ast.alloc(AstNode::new(type_node_kind(&concrete_return), pos));

        let header = ast.alloc(AstNode::new(
            AstKind::Function {
                name: mangled_name.clone(),
                parameters: concrete_params,
                return_type: Some(return_ty_node),
                body,
            },
            pos,
        ));

        let instantiation_node = ast.alloc(AstNode::new(
            AstKind::TemplateInstantiation {
                template,
                type_arguments: type_args.iter().map(ToString::to_string).collect(),
                mangled_name: mangled_name.clone(),
                header,
            },
            pos,
        ));

        let instantiation = Instantiation {
            template,
            type_arguments: type_args,
            mangled_name,
            instantiation_node,
            header,
            return_type: concrete_return,
            placeholder_map,
        };
        self.instantiations.push(instantiation.clone());
        Some(instantiation)
    }
}

fn type_node_kind(ty: &SourceType) -> AstKind {
    AstKind::Type {
        name: ty.base.clone(),
        is_pointer: ty.is_pointer,
        is_optional: ty.is_optional,
        is_array: ty.is_array,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::{GenericsMeta, Pos};

    fn generic_add(ast: &mut Ast) -> NodeId {
        let a_ty = ast.alloc(AstNode::new(AstKind::AutoType, Pos::default()));
        let b_ty = ast.alloc(AstNode::new(AstKind::AutoType, Pos::default()));
        let a = ast.alloc(AstNode::new(AstKind::Parameter { name: "a".into(), declared_type: a_ty }, Pos::default()));
        let b = ast.alloc(AstNode::new(AstKind::Parameter { name: "b".into(), declared_type: b_ty }, Pos::default()));
        let tp_a = ast.alloc(AstNode::new(AstKind::TypeParameter { name: "a".into() }, Pos::default()));
        let tp_b = ast.alloc(AstNode::new(AstKind::TypeParameter { name: "b".into() }, Pos::default()));
        let lhs = ast.alloc(AstNode::new(AstKind::Identifier { name: "a".into() }, Pos::default()));
        let rhs = ast.alloc(AstNode::new(AstKind::Identifier { name: "b".into() }, Pos::default()));
        let sum = ast.alloc(AstNode::new(
            AstKind::BinaryOp { op: crate::compiler::ast::BinaryOperator::ADD, lhs, rhs },
            Pos::default(),
        ));
        let ret = ast.alloc(AstNode::new(AstKind::Return { expression: Some(sum) }, Pos::default()));
        let body = ast.alloc(AstNode::new(AstKind::Block { statements: vec![ret] }, Pos::default()));
        ast.alloc(
            AstNode::new(
                AstKind::GenericFunction {
                    name: "add".into(),
                    parameters: vec![a, b],
                    type_parameters: vec![tp_a, tp_b],
                    return_type: None,
                    body,
                },
                Pos::default(),
            )
            .with_generics(GenericsMeta {
                is_generic: true,
                is_auto_return: true,
                placeholders: vec!["a".into(), "b".into()],
                ..Default::default()
            }),
        )
    }

    #[test]
    fn distinct_type_tuples_produce_distinct_mangled_names() {
        let mut ast = Ast::new();
        let template = generic_add(&mut ast);
        let mut mono = Monomorphizer::new();
        let i32_i32 = mono
            .instantiate(&mut ast, template, vec![SourceType::named("i32"), SourceType::named("i32")])
            .unwrap();
        let f64_f64 = mono
            .instantiate(&mut ast, template, vec![SourceType::named("f64"), SourceType::named("f64")])
            .unwrap();
        assert_eq!(i32_i32.mangled_name, "add_i32_i32");
        assert_eq!(f64_f64.mangled_name, "add_f64_f64");
        assert_ne!(i32_i32.instantiation_node, f64_f64.instantiation_node);
    }

    #[test]
    fn repeated_call_with_same_types_reuses_instantiation() {
        let mut ast = Ast::new();
        let template = generic_add(&mut ast);
        let mut mono = Monomorphizer::new();
        let first = mono
            .instantiate(&mut ast, template, vec![SourceType::named("i32"), SourceType::named("i32")])
            .unwrap();
        let second = mono
            .instantiate(&mut ast, template, vec![SourceType::named("i32"), SourceType::named("i32")])
            .unwrap();
        assert_eq!(first.instantiation_node, second.instantiation_node);
        assert_eq!(mono.instantiations().len(), 1);
    }

    #[test]
    fn auto_return_resolves_to_first_argument_type() {
        let mut ast = Ast::new();
        let template = generic_add(&mut ast);
        let mut mono = Monomorphizer::new();
        let inst = mono
            .instantiate(&mut ast, template, vec![SourceType::named("f64"), SourceType::named("f64")])
            .unwrap();
        assert_eq!(inst.return_type, SourceType::named("f64"));
    }
}
