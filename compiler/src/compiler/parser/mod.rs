use echo_compiler_common::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity};

use crate::compiler::ast::{Ast, AstKind, AstNode, BinaryOperator, GenericsMeta, NodeId, Pos, UnaryOperator};
use crate::compiler::ast::literals::Literal;
use crate::compiler::lexer::{Lexer, Token, TokenKind};

/// Parses one source file into an `Ast` plus whatever diagnostics parsing
/// produced. A parser is meant to be used once; `parse` consumes it.
pub trait AstParser {
    fn parse(self) -> (Ast, DiagnosticBag);
}

/// Hand-rolled recursive-descent parser with one-token lookahead and
/// statement-level panic-mode recovery, per the closed grammar in the
/// language's external interface contract.
pub struct RecursiveDescentParser {
    lexer: Lexer,
    current: Token,
    ast: Ast,
    diagnostics: DiagnosticBag,
    file: String,
}

impl RecursiveDescentParser {
    pub fn new(source: &str, file: impl Into<String>) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        RecursiveDescentParser {
            lexer,
            current,
            ast: Ast::new(),
            diagnostics: DiagnosticBag::new(),
            file: file.into(),
        }
    }

    fn bump(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn at_eof(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Option<()> {
        if self.check(&kind) {
            self.bump();
            Some(())
        } else {
            let found = self.current.kind.clone();
            self.error(&format!("expected {:?}, found {:?}", kind, found));
            None
        }
    }

    fn expect_identifier(&mut self) -> Option<String> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.bump();
                Some(name)
            }
            other => {
                self.error(&format!("expected identifier, found {:?}", other));
                None
            }
        }
    }

    fn error(&mut self, message: &str) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::ParseError,
            Severity::Error,
            self.current.pos.line,
            self.current.pos.column,
            self.file.clone(),
            message.to_string(),
        ));
    }

    fn pos(&self) -> Pos {
        self.current.pos
    }

    fn node_pos(&self, id: NodeId) -> Pos {
        self.ast.get(id).pos
    }

    fn alloc(&mut self, kind: AstKind, pos: Pos) -> NodeId {
        self.ast.alloc(AstNode::new(kind, pos))
    }

    // ---- top level ----

    fn parse_program(&mut self) -> NodeId {
        let start = self.pos();
        let mut declarations = Vec::new();
        while !self.at_eof() {
            match self.parse_top_level() {
                Some(id) => declarations.push(id),
                None => self.synchronize_top_level(),
            }
        }
        self.alloc(AstKind::Program { declarations }, start)
    }

    fn synchronize_top_level(&mut self) {
        while !self.at_eof() {
            match self.current.kind {
                TokenKind::Fn | TokenKind::Struct | TokenKind::Enum | TokenKind::Preprocessor(_) => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn synchronize_statement(&mut self) {
        while !self.at_eof() {
            if matches!(self.current.kind, TokenKind::Semicolon) {
                self.bump();
                return;
            }
            if matches!(self.current.kind, TokenKind::RBrace) {
                return;
            }
            self.bump();
        }
    }

    fn parse_top_level(&mut self) -> Option<NodeId> {
        match self.current.kind {
            TokenKind::Preprocessor(_) => self.parse_preprocessor(),
            TokenKind::Fn => self.parse_function(),
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Enum => self.parse_enum(),
            _ => {
                let found = self.current.kind.clone();
                self.error(&format!("expected function, struct, or enum declaration, found {:?}", found));
                None
            }
        }
    }

    fn parse_preprocessor(&mut self) -> Option<NodeId> {
        let start = self.pos();
        let text = match self.current.kind.clone() {
            TokenKind::Preprocessor(t) => t,
            _ => unreachable!(),
        };
        self.bump();
        let directive = match text.strip_prefix("include ") {
            Some(rest) => rest.trim().to_string(),
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ParseError,
                    Severity::Error,
                    start.line,
                    start.column,
                    self.file.clone(),
                    format!("unsupported preprocessor directive '#{}'", text),
                ));
                text
            }
        };
        Some(self.alloc(AstKind::Preprocessor { directive }, start))
    }

    fn parse_struct(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            let field_start = self.pos();
            let ty = self.parse_type()?;
            let fname = self.expect_identifier()?;
            self.expect(TokenKind::Semicolon)?;
            fields.push(self.alloc(
                AstKind::VariableDecl {
                    name: fname,
                    declared_type: ty,
                    initializer: None,
                },
                field_start,
            ));
        }
        self.expect(TokenKind::RBrace)?;
        Some(self.alloc(AstKind::Struct { name, fields }, start))
    }

    fn parse_enum(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                variants.push(self.expect_identifier()?);
                if self.check(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(self.alloc(AstKind::Enum { name, variants }, start))
    }

    fn parse_function(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump(); // fn
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut parameters = Vec::new();
        let mut placeholder_names = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let param_start = self.pos();
                let ty = self.parse_type()?;
                let is_auto = matches!(self.ast.get(ty).kind, AstKind::AutoType);
                let pname = self.expect_identifier()?;
                if is_auto {
                    placeholder_names.push(pname.clone());
                }
                parameters.push(self.alloc(
                    AstKind::Parameter {
                        name: pname,
                        declared_type: ty,
                    },
                    param_start,
                ));
                if self.check(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let mut return_type = None;
        let mut is_auto_return = false;
        if self.check(&TokenKind::Arrow) {
            self.bump();
            let rty = self.parse_type()?;
            if matches!(self.ast.get(rty).kind, AstKind::AutoType) {
                is_auto_return = true;
            } else {
                return_type = Some(rty);
            }
        }

        let body = self.parse_block()?;
        let is_generic = !placeholder_names.is_empty() || is_auto_return;

        if is_generic {
            let type_parameters: Vec<NodeId> = placeholder_names
                .iter()
                .map(|n| self.alloc(AstKind::TypeParameter { name: n.clone() }, start))
                .collect();
            let node = AstNode::new(
                AstKind::GenericFunction {
                    name,
                    parameters,
                    type_parameters,
                    return_type,
                    body,
                },
                start,
            )
            .with_generics(GenericsMeta {
                is_generic: true,
                is_auto_return,
                placeholders: placeholder_names,
                inferred: Vec::new(),
                template: None,
                mangled_key: None,
            });
            Some(self.ast.alloc(node))
        } else {
            Some(self.alloc(
                AstKind::Function {
                    name,
                    parameters,
                    return_type,
                    body,
                },
                start,
            ))
        }
    }

    // ---- types ----

    fn parse_type(&mut self) -> Option<NodeId> {
        let start = self.pos();
        if self.check(&TokenKind::Auto) {
            self.bump();
            return Some(self.alloc(AstKind::AutoType, start));
        }
        let name = self.expect_identifier()?;
        let mut is_pointer = false;
        let mut is_optional = false;
        let mut is_array = false;
        loop {
            match self.current.kind {
                TokenKind::Star => {
                    is_pointer = true;
                    self.bump();
                }
                TokenKind::Question => {
                    is_optional = true;
                    self.bump();
                }
                TokenKind::LBracket => {
                    self.bump();
                    self.expect(TokenKind::RBracket)?;
                    is_array = true;
                }
                _ => break,
            }
        }
        Some(self.alloc(
            AstKind::Type {
                name,
                is_pointer,
                is_optional,
                is_array,
            },
            start,
        ))
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Some(id) => statements.push(id),
                None => self.synchronize_statement(),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(self.alloc(AstKind::Block { statements }, start))
    }

    fn looks_like_var_decl(&self) -> bool {
        if !matches!(self.current.kind, TokenKind::Auto | TokenKind::Identifier(_)) {
            return false;
        }
        let mut lookahead = self.lexer.clone();
        let mut tok = lookahead.next_token();
        loop {
            match tok.kind {
                TokenKind::Star | TokenKind::Question => tok = lookahead.next_token(),
                TokenKind::LBracket => {
                    tok = lookahead.next_token();
                    if matches!(tok.kind, TokenKind::RBracket) {
                        tok = lookahead.next_token();
                    } else {
                        return false;
                    }
                }
                _ => break,
            }
        }
        matches!(tok.kind, TokenKind::Identifier(_))
    }

    fn parse_statement(&mut self) -> Option<NodeId> {
        match self.current.kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            _ if self.looks_like_var_decl() => self.parse_variable_decl(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_variable_decl(&mut self) -> Option<NodeId> {
        let start = self.pos();
        let ty = self.parse_type()?;
        let name = self.expect_identifier()?;
        let initializer = if self.check(&TokenKind::Eq) {
            self.bump();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Some(self.alloc(
            AstKind::VariableDecl {
                name,
                declared_type: ty,
                initializer,
            },
            start,
        ))
    }

    fn parse_return(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        let expression = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Some(self.alloc(AstKind::Return { expression }, start))
    }

    fn parse_if(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.check(&TokenKind::Else) {
            self.bump();
            Some(self.parse_statement()?)
        } else {
            None
        };
        Some(self.alloc(
            AstKind::If {
                condition,
                then_branch,
                else_branch,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statement()?;
        Some(self.alloc(AstKind::While { condition, body }, start))
    }

    fn parse_for(&mut self) -> Option<NodeId> {
        let start = self.pos();
        self.bump();
        self.expect(TokenKind::LParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            self.bump();
            None
        } else {
            let node = if self.looks_like_var_decl() {
                self.parse_variable_decl()?
            } else {
                let estart = self.pos();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                self.alloc(AstKind::ExpressionStmt { expression: expr }, estart)
            };
            Some(node)
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let step = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_statement()?;
        Some(self.alloc(
            AstKind::For {
                init,
                condition,
                step,
                body,
            },
            start,
        ))
    }

    fn parse_expression_statement(&mut self) -> Option<NodeId> {
        let start = self.pos();
        let expression = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Some(self.alloc(AstKind::ExpressionStmt { expression }, start))
    }

    // ---- expressions, lowest to highest precedence ----

    fn parse_expression(&mut self) -> Option<NodeId> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<NodeId> {
        let start = self.pos();
        let target = self.parse_logic_or()?;
        if self.check(&TokenKind::Eq) {
            self.bump();
            let value = self.parse_assignment()?;
            return Some(self.alloc(AstKind::Assignment { target, value }, start));
        }
        Some(target)
    }

    fn parse_logic_or(&mut self) -> Option<NodeId> {
        let mut left = self.parse_logic_and()?;
        while self.check(&TokenKind::OrOr) {
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_logic_and()?;
            left = self.alloc(AstKind::BinaryOp { op: BinaryOperator::OR, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_logic_and(&mut self) -> Option<NodeId> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_equality()?;
            left = self.alloc(AstKind::BinaryOp { op: BinaryOperator::AND, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<NodeId> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOperator::EQUAL,
                TokenKind::NotEq => BinaryOperator::NOT_EQUAL,
                _ => break,
            };
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_relational()?;
            left = self.alloc(AstKind::BinaryOp { op, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_relational(&mut self) -> Option<NodeId> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Less => BinaryOperator::LESS_THAN,
                TokenKind::Greater => BinaryOperator::GREATER_THAN,
                TokenKind::LessEq => BinaryOperator::LESS_EQUAL,
                TokenKind::GreaterEq => BinaryOperator::GREATER_EQUAL,
                _ => break,
            };
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_additive()?;
            left = self.alloc(AstKind::BinaryOp { op, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::ADD,
                TokenKind::Minus => BinaryOperator::SUB,
                _ => break,
            };
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_multiplicative()?;
            left = self.alloc(AstKind::BinaryOp { op, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOperator::MUL,
                TokenKind::Slash => BinaryOperator::DIV,
                TokenKind::Percent => BinaryOperator::MOD,
                _ => break,
            };
            let start = self.node_pos(left);
            self.bump();
            let rhs = self.parse_unary()?;
            left = self.alloc(AstKind::BinaryOp { op, lhs: left, rhs }, start);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        let start = self.pos();
        match self.current.kind {
            TokenKind::Bang => {
                self.bump();
                let operand = self.parse_unary()?;
                Some(self.alloc(AstKind::UnaryOp { op: UnaryOperator::NOT, operand }, start))
            }
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_unary()?;
                Some(self.alloc(AstKind::UnaryOp { op: UnaryOperator::NEGATE, operand }, start))
            }
            TokenKind::Amp => {
                self.bump();
                let operand = self.parse_unary()?;
                Some(self.alloc(AstKind::AddressOf { operand }, start))
            }
            TokenKind::Star => {
                self.bump();
                let operand = self.parse_unary()?;
                Some(self.alloc(AstKind::PointerDeref { operand }, start))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<NodeId> {
        let mut node = self.parse_primary()?;
        loop {
            match &self.current.kind {
                TokenKind::ColonColon => {
                    let start = self.node_pos(node);
                    let mut segments = vec![self.identifier_name_of(node)?];
                    while self.check(&TokenKind::ColonColon) {
                        self.bump();
                        segments.push(self.expect_identifier()?);
                    }
                    node = self.alloc(AstKind::ScopeResolution { segments }, start);
                }
                TokenKind::Dot => {
                    let start = self.node_pos(node);
                    self.bump();
                    let field = self.expect_identifier()?;
                    node = self.alloc(AstKind::MemberAccess { object: node, field, arrow: false }, start);
                }
                TokenKind::Arrow => {
                    let start = self.node_pos(node);
                    self.bump();
                    let field = self.expect_identifier()?;
                    node = self.alloc(AstKind::MemberAccess { object: node, field, arrow: true }, start);
                }
                TokenKind::LBracket => {
                    let start = self.node_pos(node);
                    self.bump();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    node = self.alloc(AstKind::ArrayAccess { array: node, index }, start);
                }
                TokenKind::LParen => {
                    let start = self.node_pos(node);
                    self.bump();
                    let mut arguments = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            arguments.push(self.parse_expression()?);
                            if self.check(&TokenKind::Comma) {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    node = self.alloc(AstKind::Call { callee: node, arguments }, start);
                }
                _ => break,
            }
        }
        Some(node)
    }

    fn identifier_name_of(&mut self, id: NodeId) -> Option<String> {
        match &self.ast.get(id).kind {
            AstKind::Identifier { name } => Some(name.clone()),
            _ => {
                self.error("expected identifier before '::'");
                None
            }
        }
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        let start = self.pos();
        match self.current.kind.clone() {
            TokenKind::Integer(v) => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Integer(v)), start))
            }
            TokenKind::Float(v) => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Float(v)), start))
            }
            TokenKind::Str(s) => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Str(s)), start))
            }
            TokenKind::Char(c) => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Char(c)), start))
            }
            TokenKind::True => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Bool(true)), start))
            }
            TokenKind::False => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Bool(false)), start))
            }
            TokenKind::Null => {
                self.bump();
                Some(self.alloc(AstKind::Literal(Literal::Null), start))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Some(inner)
            }
            TokenKind::LBrace => self.parse_struct_literal(None, start),
            TokenKind::Alloc => self.parse_alloc(start),
            TokenKind::Delete => {
                self.bump();
                let operand = self.parse_expression()?;
                Some(self.alloc(AstKind::Delete { operand }, start))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                if self.check(&TokenKind::LBrace) {
                    self.parse_struct_literal(Some(name), start)
                } else {
                    Some(self.alloc(AstKind::Identifier { name }, start))
                }
            }
            other => {
                self.error(&format!("unexpected token {:?}", other));
                None
            }
        }
    }

    fn parse_struct_literal(&mut self, type_name: Option<String>, start: Pos) -> Option<NodeId> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let field_name = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expression()?;
                fields.push((field_name, value));
                if self.check(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Some(self.alloc(AstKind::StructLiteral { type_name, fields }, start))
    }

    fn parse_alloc(&mut self, start: Pos) -> Option<NodeId> {
        self.bump(); // alloc
        let allocated_type = self.parse_type()?;
        let initializer = if self.check(&TokenKind::LParen) {
            self.bump();
            let init = if self.check(&TokenKind::RParen) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenKind::RParen)?;
            init
        } else {
            None
        };
        Some(self.alloc(AstKind::Alloc { allocated_type, initializer }, start))
    }
}

impl AstParser for RecursiveDescentParser {
    fn parse(mut self) -> (Ast, DiagnosticBag) {
        let root = self.parse_program();
        self.ast.set_root(root);
        (self.ast, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarations_of(ast: &Ast) -> Vec<AstKind> {
        match &ast.get(ast.root()).kind {
            AstKind::Program { declarations } => declarations.iter().map(|id| ast.get(*id).kind.clone()).collect(),
            _ => panic!("root is not a Program node"),
        }
    }

    #[test]
    fn parses_simple_main_function() {
        let (ast, diags) = RecursiveDescentParser::new("fn main() -> i32 { return 42; }", "t.ec").parse();
        assert!(diags.is_empty());
        let decls = declarations_of(&ast);
        assert_eq!(decls.len(), 1);
        assert!(matches!(&decls[0], AstKind::Function { name, .. } if name == "main"));
    }

    #[test]
    fn generic_function_detected_from_auto_params() {
        let (ast, diags) =
            RecursiveDescentParser::new("fn add(auto a, auto b) -> auto { return a + b; }", "t.ec").parse();
        assert!(diags.is_empty());
        let decls = declarations_of(&ast);
        assert_eq!(decls.len(), 1);
        match &decls[0] {
            AstKind::GenericFunction { type_parameters, .. } => assert_eq!(type_parameters.len(), 2),
            other => panic!("expected GenericFunction, got {:?}", other),
        }
    }

    #[test]
    fn parses_struct_with_fields() {
        let (ast, diags) = RecursiveDescentParser::new("struct P { f64 x; f64 y; }", "t.ec").parse();
        assert!(diags.is_empty());
        let decls = declarations_of(&ast);
        match &decls[0] {
            AstKind::Struct { name, fields } => {
                assert_eq!(name, "P");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected Struct, got {:?}", other),
        }
    }

    #[test]
    fn reports_malformed_function_header_as_parse_error() {
        let (_ast, diags) = RecursiveDescentParser::new("fn main( { return 0; }", "t.ec").parse();
        assert!(diags.has_errors());
    }

    #[test]
    fn parses_preprocessor_import_with_alias() {
        let (ast, diags) =
            RecursiveDescentParser::new("#include core::io as io\nfn main() -> i32 { return 0; }", "t.ec").parse();
        assert!(diags.is_empty());
        let decls = declarations_of(&ast);
        assert!(matches!(&decls[0], AstKind::Preprocessor { directive } if directive == "core::io as io"));
    }

    #[test]
    fn parses_enum_declaration() {
        let (ast, diags) = RecursiveDescentParser::new("enum Color { RED, GREEN, BLUE }", "t.ec").parse();
        assert!(diags.is_empty());
        let decls = declarations_of(&ast);
        match &decls[0] {
            AstKind::Enum { name, variants } => {
                assert_eq!(name, "Color");
                assert_eq!(variants, &vec!["RED".to_string(), "GREEN".to_string(), "BLUE".to_string()]);
            }
            other => panic!("expected Enum, got {:?}", other),
        }
    }
}
