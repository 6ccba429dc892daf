mod emitter;

use std::collections::HashMap;

use crate::compiler::ast::{Ast, NodeId};
use crate::compiler::semantic::monomorphizer::Monomorphizer;
use crate::compiler::semantic::StructInfo;

pub use emitter::CEmitter;

/// BackEndGenerator walks an annotated AST plus the monomorphizer's
/// instantiation table and writes a C translation unit (§4.7).
pub trait BackEndGenerator {
    fn generate(
        self,
        ast: &Ast,
        program: NodeId,
        structs: &HashMap<String, StructInfo>,
        monomorphizer: &Monomorphizer,
    ) -> String;
}
