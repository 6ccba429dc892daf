use super::node::AstNode;
use std::fmt;

/// A stable index into an `Ast`'s node storage. `NodeId`s are the
/// non-owning handle a `Symbol` uses to refer back to its declaring AST
/// node (see §9, "Symbol-to-AST reference"): the arena owns every node, and
/// symbols merely borrow an index into it, so no node can outlive the tree
/// and no reference-counting is needed to share a node between the tree and
/// the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every `AstNode` produced while parsing a single source file.
/// Destruction is a single `Vec` drop rather than a recursive post-order
/// walk, because ownership already lives in one place instead of being
/// distributed across a chain of `Box<AstNode>` children.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn alloc(&mut self, node: AstNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.index()]
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> NodeId {
        self.root.expect("Ast::root() called before set_root")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
