use std::fmt;

/// Identifies a lexical scope within a single symbol table. Scope ids are
/// only guaranteed unique within the symbol table that issued them, mirroring
/// the `ScopeId` used to tag `ASTNode::SCOPE_BLOCK` nodes in the teacher's
/// AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn global() -> Self {
        ScopeId(0)
    }

    pub const fn new(id: usize) -> Self {
        ScopeId(id)
    }

    pub fn is_global(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Hands out fresh, strictly increasing scope ids. The global scope always
/// owns id 0.
#[derive(Debug, Default)]
pub struct ScopeIdGenerator {
    next: usize,
}

impl ScopeIdGenerator {
    pub fn new() -> Self {
        ScopeIdGenerator { next: 1 }
    }

    pub fn next_id(&mut self) -> ScopeId {
        let id = ScopeId(self.next);
        self.next += 1;
        id
    }
}
