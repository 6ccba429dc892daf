pub mod arena;
pub mod literals;
pub mod node;
pub mod operators;
pub mod scope;
pub mod symbol_table;

pub use arena::{Ast, NodeId};
pub use node::{AstKind, AstNode, GenericsMeta, Pos};
pub use operators::{BinaryOperator, UnaryOperator};
pub use scope::{ScopeId, ScopeIdGenerator};
pub use symbol_table::{Scope, Symbol, SymbolKind, SymbolTable};
