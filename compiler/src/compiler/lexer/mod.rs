pub mod token;

pub use token::{Token, TokenKind};

use crate::compiler::ast::Pos;
use token::keyword_from_str;

/// Turns a UTF-8 source buffer into a stream of tokens, one token at a
/// time, consumed left-to-right with one-token lookahead by the parser.
/// Operates on `char`s rather than bytes since identifiers/strings are not
/// restricted to ASCII. Cheap to clone: parsers that need bounded lookahead
/// past the current token (e.g. disambiguating a variable declaration from
/// an expression statement) clone it and discard the clone once the peek is
/// done.
#[derive(Clone)]
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.advance();
                    }
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Produces the next token, or a `TokenKind::Eof` once the buffer is
    /// exhausted. Never returns past `Eof`; callers stop polling on it.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.pos();

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, start);
        };

        if c == '#' {
            return self.read_preprocessor(start);
        }
        if c.is_ascii_digit() {
            return self.read_number(start);
        }
        if c == '"' {
            return self.read_string(start);
        }
        if c == '\'' {
            return self.read_char(start);
        }
        if c.is_alphabetic() || c == '_' {
            return self.read_identifier(start);
        }

        self.read_operator(start)
    }

    fn read_preprocessor(&mut self, start: Pos) -> Token {
        self.advance(); // consume '#'
        let mut text = String::new();
        while !matches!(self.peek(), None | Some('\n')) {
            text.push(self.advance().unwrap());
        }
        Token::new(TokenKind::Preprocessor(text.trim().to_string()), start)
    }

    fn read_number(&mut self, start: Pos) -> Token {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !is_float && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => Token::new(TokenKind::Float(v), start),
                Err(_) => Token::new(TokenKind::Error(format!("invalid float literal '{}'", text)), start),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => Token::new(TokenKind::Integer(v), start),
                Err(_) => Token::new(TokenKind::Error(format!("invalid integer literal '{}'", text)), start),
            }
        }
    }

    fn read_string(&mut self, start: Pos) -> Token {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Token::new(TokenKind::Error("unterminated string literal".into()), start),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('r') => text.push('\r'),
                        Some('\\') => text.push('\\'),
                        Some('"') => text.push('"'),
                        Some(other) => text.push(other),
                        None => return Token::new(TokenKind::Error("unterminated string literal".into()), start),
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Str(text), start)
    }

    fn read_char(&mut self, start: Pos) -> Token {
        self.advance(); // opening quote
        let value = match self.advance() {
            Some('\\') => match self.advance() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some(other) => other,
                None => return Token::new(TokenKind::Error("unterminated char literal".into()), start),
            },
            Some(c) => c,
            None => return Token::new(TokenKind::Error("unterminated char literal".into()), start),
        };
        if self.peek() != Some('\'') {
            return Token::new(TokenKind::Error("unterminated char literal".into()), start);
        }
        self.advance();
        Token::new(TokenKind::Char(value), start)
    }

    fn read_identifier(&mut self, start: Pos) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword_from_str(&text).unwrap_or(TokenKind::Identifier(text));
        Token::new(kind, start)
    }

    fn read_operator(&mut self, start: Pos) -> Token {
        let c = self.advance().unwrap();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    TokenKind::Error("unexpected character '|'".into())
                }
            }
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            other => TokenKind::Error(format!("unexpected character '{}'", other)),
        };
        Token::new(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.is_eof();
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_function_signature() {
        let got = kinds("fn add(i32 a, i32 b) -> i32 {");
        assert_eq!(
            got,
            vec![
                TokenKind::Fn,
                TokenKind::Identifier("add".into()),
                TokenKind::LParen,
                TokenKind::Identifier("i32".into()),
                TokenKind::Identifier("a".into()),
                TokenKind::Comma,
                TokenKind::Identifier("i32".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier("i32".into()),
                TokenKind::LBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_preprocessor_line() {
        let got = kinds("#include core::io as io\n");
        assert_eq!(
            got,
            vec![
                TokenKind::Preprocessor("include core::io as io".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_and_float_literals() {
        let got = kinds(r#""hi" 2.5 3 true"#);
        assert_eq!(
            got,
            vec![
                TokenKind::Str("hi".into()),
                TokenKind::Float(2.5),
                TokenKind::Integer(3),
                TokenKind::True,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let got = kinds("1 // comment\n2 /* block */ 3");
        assert_eq!(
            got,
            vec![
                TokenKind::Integer(1),
                TokenKind::Integer(2),
                TokenKind::Integer(3),
                TokenKind::Eof,
            ]
        );
    }
}
