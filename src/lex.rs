use super::*;

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Chip,
    In,
    Out,
    Parts,
    Ident,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Comma,
    Equals,
    Colon,
}

impl TokenKind {
    /// How the parser names this kind in an expected-vs-found message.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Chip => "'CHIP'",
            TokenKind::In => "'IN'",
            TokenKind::Out => "'OUT'",
            TokenKind::Parts => "'PARTS'",
            TokenKind::Ident => "an identifier",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Equals => "'='",
            TokenKind::Colon => "':'",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub loc: Loc,
}

lazy_static! {
    // Keywords are matched before the identifier rule, so they never
    // tokenize as identifiers. Matching is case-sensitive.
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut keywords = HashMap::new();
        keywords.insert("CHIP", TokenKind::Chip);
        keywords.insert("IN", TokenKind::In);
        keywords.insert("OUT", TokenKind::Out);
        keywords.insert("PARTS", TokenKind::Parts);
        keywords
    };
}

/// Single-pass tokenizer for HDL text. Whitespace and `//` line comments
/// are skipped and never reach the parser; scanning stops at the first
/// character that starts no token.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0 }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.input.len() {
            let ch = self.input[self.pos];
            if ch.is_ascii_whitespace() {
                self.pos += 1;
            } else if ch == b'/' && self.input.get(self.pos + 1) == Some(&b'/') {
                while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn punctuation(ch: u8) -> Option<TokenKind> {
        match ch {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b';' => Some(TokenKind::Semi),
            b',' => Some(TokenKind::Comma),
            b'=' => Some(TokenKind::Equals),
            b':' => Some(TokenKind::Colon),
            _ => None,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, HdlError> {
        self.skip_whitespace_and_comments();
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        let start = self.pos;
        let ch = self.input[start];

        if let Some(kind) = Self::punctuation(ch) {
            self.pos += 1;
            return Ok(Some(Token {
                kind,
                lexeme: (ch as char).to_string(),
                loc: Loc::new(start, self.pos),
            }));
        }

        if ch.is_ascii_alphabetic() || ch == b'_' {
            while self.pos < self.input.len() {
                let c = self.input[self.pos];
                if c.is_ascii_alphanumeric() || c == b'_' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let lexeme = std::str::from_utf8(&self.input[start..self.pos])
                .expect("identifier bytes are ASCII")
                .to_string();
            let kind = KEYWORDS.get(lexeme.as_str()).copied().unwrap_or(TokenKind::Ident);
            return Ok(Some(Token { kind, lexeme, loc: Loc::new(start, self.pos) }));
        }

        Err(HdlError::Lex(
            Loc::new(start, start + 1),
            format!("unrecognized character {:?}", ch as char),
        ))
    }
}

/// Tokenize a whole source unit. Leftmost-longest, no backtracking; the
/// first unrecognized character aborts the scan.
pub fn tokenize(text: &str) -> Result<Vec<Token>, HdlError> {
    let mut lexer = Lexer::new(text);
    let mut tokens = vec![];
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
