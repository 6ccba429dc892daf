use crate::compiler::ast::Pos;

/// Every lexical category the source grammar produces. Punctuation and
/// operators get their own variant each rather than a generic
/// `Operator(String)` bucket, since the parser dispatches on exact token
/// identity at every call site and a closed enum lets that be a `match`
/// instead of string comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Fn,
    Struct,
    Enum,
    Return,
    If,
    Else,
    While,
    For,
    Auto,
    Alloc,
    Delete,
    True,
    False,
    Null,
    As,

    Identifier(String),
    Integer(i64),
    Float(f64),
    Str(String),
    Char(char),

    /// Raw text following `#`, trimmed, not yet split into path/alias.
    Preprocessor(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    EqEq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    AndAnd,
    OrOr,
    Bang,

    Eq,
    Arrow,       // ->
    ColonColon,  // ::
    Colon,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    Question,
    Amp,

    Eof,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

pub fn keyword_from_str(word: &str) -> Option<TokenKind> {
    Some(match word {
        "fn" => TokenKind::Fn,
        "struct" => TokenKind::Struct,
        "enum" => TokenKind::Enum,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "auto" => TokenKind::Auto,
        "alloc" => TokenKind::Alloc,
        "delete" => TokenKind::Delete,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "as" => TokenKind::As,
        _ => return None,
    })
}
