use super::arena::NodeId;
use super::literals::Literal;
use super::operators::{BinaryOperator, UnaryOperator};
use echo_compiler_common::SourceType;

/// Source position of a token or node, one-indexed the way the lexer counts
/// lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Pos { line, column }
    }
}

/// Generics metadata attached to `Function`/`GenericFunction`/`Call` nodes.
/// Only generic functions and their call sites populate this; every other
/// node leaves it `None`.
#[derive(Debug, Clone, Default)]
pub struct GenericsMeta {
    pub is_generic: bool,
    pub is_auto_return: bool,
    pub placeholders: Vec<String>,
    pub inferred: Vec<String>,
    /// Non-owning back-reference to the generic template this node was
    /// instantiated from. Never traversed for ownership purposes.
    pub template: Option<NodeId>,
    pub mangled_key: Option<String>,
}

/// The closed set of AST node kinds from §3. Each variant carries only the
/// fields that kind actually uses, per the §9 recommendation to use a
/// discriminated sum type rather than a uniform kind+children-list node;
/// ordering within a variant's fields mirrors the child-ordering contracts
/// spec'd for each kind (e.g. `If`'s `then_branch` before `else_branch`).
#[derive(Debug, Clone)]
pub enum AstKind {
    Program {
        declarations: Vec<NodeId>,
    },
    Function {
        name: String,
        parameters: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    GenericFunction {
        name: String,
        parameters: Vec<NodeId>,
        type_parameters: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    /// A synthesized concrete function produced by the monomorphizer for one
    /// (template, type-tuple) pair. Only the header is synthesized; the
    /// emitter walks the template's body using the instantiation's
    /// placeholder map (see DESIGN.md for why this revision, not eager
    /// body cloning, was chosen to resolve the §9 open question).
    TemplateInstantiation {
        template: NodeId,
        type_arguments: Vec<String>,
        mangled_name: String,
        header: NodeId,
    },
    TypeParameter {
        name: String,
    },
    AutoType,
    VariableDecl {
        name: String,
        declared_type: NodeId,
        initializer: Option<NodeId>,
    },
    Parameter {
        name: String,
        declared_type: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    Return {
        expression: Option<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: NodeId,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Identifier {
        name: String,
    },
    Literal(Literal),
    Type {
        name: String,
        is_pointer: bool,
        is_optional: bool,
        is_array: bool,
    },
    Struct {
        name: String,
        fields: Vec<NodeId>,
    },
    Enum {
        name: String,
        variants: Vec<String>,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    MemberAccess {
        object: NodeId,
        field: String,
        /// `true` for `->`, `false` for `.`
        arrow: bool,
    },
    PointerDeref {
        operand: NodeId,
    },
    AddressOf {
        operand: NodeId,
    },
    Alloc {
        allocated_type: NodeId,
        initializer: Option<NodeId>,
    },
    Delete {
        operand: NodeId,
    },
    Preprocessor {
        directive: String,
    },
    ExpressionStmt {
        expression: NodeId,
    },
    ScopeResolution {
        segments: Vec<String>,
    },
    StructLiteral {
        type_name: Option<String>,
        fields: Vec<(String, NodeId)>,
    },
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: AstKind,
    pub pos: Pos,
    /// Filled in by the semantic analyzer; starts `None` for every node and
    /// is set once the expression-type oracle (or an explicit annotation)
    /// resolves a concrete type, including when an `AutoType` variable
    /// declaration is rewritten to its inferred concrete type.
    pub resolved_type: Option<SourceType>,
    pub generics: Option<GenericsMeta>,
}

impl AstNode {
    pub fn new(kind: AstKind, pos: Pos) -> Self {
        AstNode {
            kind,
            pos,
            resolved_type: None,
            generics: None,
        }
    }

    pub fn with_generics(mut self, generics: GenericsMeta) -> Self {
        self.generics = Some(generics);
        self
    }

    /// Children in the order the corresponding child-ordering contract from
    /// §3 specifies. Used by generic tree walks (scope assignment, the
    /// struct/function declaration passes) that don't care about a node's
    /// specific kind.
    pub fn child_ids(&self) -> Vec<NodeId> {
        match &self.kind {
            AstKind::Program { declarations } => declarations.clone(),
            AstKind::Function {
                parameters,
                return_type,
                body,
                ..
            } => chain(parameters.clone(), return_type, Some(*body)),
            AstKind::GenericFunction {
                parameters,
                type_parameters,
                return_type,
                body,
                ..
            } => {
                let mut out = parameters.clone();
                out.extend(type_parameters.iter().copied());
                if let Some(rt) = return_type {
                    out.push(*rt);
                }
                out.push(*body);
                out
            }
            AstKind::TemplateInstantiation { header, .. } => vec![*header],
            AstKind::TypeParameter { .. } | AstKind::AutoType => vec![],
            AstKind::VariableDecl {
                declared_type,
                initializer,
                ..
            } => chain(vec![*declared_type], initializer, None),
            AstKind::Parameter { declared_type, .. } => vec![*declared_type],
            AstKind::Block { statements } => statements.clone(),
            AstKind::Return { expression } => expression.iter().copied().collect(),
            AstKind::If {
                condition,
                then_branch,
                else_branch,
            } => chain(vec![*condition, *then_branch], else_branch, None),
            AstKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let mut out = vec![];
                out.extend(init.iter().copied());
                out.extend(condition.iter().copied());
                out.extend(step.iter().copied());
                out.push(*body);
                out
            }
            AstKind::While { condition, body } => vec![*condition, *body],
            AstKind::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            AstKind::UnaryOp { operand, .. } => vec![*operand],
            AstKind::Call { callee, arguments } => {
                let mut out = vec![*callee];
                out.extend(arguments.iter().copied());
                out
            }
            AstKind::Identifier { .. } | AstKind::Literal(_) => vec![],
            AstKind::Type { .. } => vec![],
            AstKind::Struct { fields, .. } => fields.clone(),
            AstKind::Enum { .. } => vec![],
            AstKind::Assignment { target, value } => vec![*target, *value],
            AstKind::ArrayAccess { array, index } => vec![*array, *index],
            AstKind::MemberAccess { object, .. } => vec![*object],
            AstKind::PointerDeref { operand } | AstKind::AddressOf { operand } => vec![*operand],
            AstKind::Alloc {
                allocated_type,
                initializer,
            } => chain(vec![*allocated_type], initializer, None),
            AstKind::Delete { operand } => vec![*operand],
            AstKind::Preprocessor { .. } => vec![],
            AstKind::ExpressionStmt { expression } => vec![*expression],
            AstKind::ScopeResolution { .. } => vec![],
            AstKind::StructLiteral { fields, .. } => {
                fields.iter().map(|(_, v)| *v).collect()
            }
        }
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            AstKind::Identifier { name } => Some(name),
            _ => None,
        }
    }
}

fn chain(mut base: Vec<NodeId>, opt_a: &Option<NodeId>, opt_b: Option<NodeId>) -> Vec<NodeId> {
    base.extend(opt_a.iter().copied());
    base.extend(opt_b.iter());
    base
}
