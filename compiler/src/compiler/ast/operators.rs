/// Unary operators. See ASTNode::UnaryOp in node.rs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum UnaryOperator {
    NOT,    // !<rhs>
    NEGATE, // -<rhs>
}

impl UnaryOperator {
    pub fn lexeme(&self) -> &'static str {
        match self {
            UnaryOperator::NOT => "!",
            UnaryOperator::NEGATE => "-",
        }
    }
}

/// Binary operators. See ASTNode::BinaryOp in node.rs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BinaryOperator {
    ADD,
    SUB,
    MUL,
    DIV,
    MOD,

    EQUAL,
    NOT_EQUAL,
    GREATER_THAN,
    LESS_THAN,
    GREATER_EQUAL,
    LESS_EQUAL,

    AND,
    OR,
}

impl BinaryOperator {
    pub fn lexeme(&self) -> &'static str {
        match self {
            BinaryOperator::ADD => "+",
            BinaryOperator::SUB => "-",
            BinaryOperator::MUL => "*",
            BinaryOperator::DIV => "/",
            BinaryOperator::MOD => "%",
            BinaryOperator::EQUAL => "==",
            BinaryOperator::NOT_EQUAL => "!=",
            BinaryOperator::GREATER_THAN => ">",
            BinaryOperator::LESS_THAN => "<",
            BinaryOperator::GREATER_EQUAL => ">=",
            BinaryOperator::LESS_EQUAL => "<=",
            BinaryOperator::AND => "&&",
            BinaryOperator::OR => "||",
        }
    }

    /// True for operators whose result type is always `bool` regardless of
    /// the operand type, matching the §4.6 expression-type oracle table.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::EQUAL
                | BinaryOperator::NOT_EQUAL
                | BinaryOperator::GREATER_THAN
                | BinaryOperator::LESS_THAN
                | BinaryOperator::GREATER_EQUAL
                | BinaryOperator::LESS_EQUAL
        )
    }
}
