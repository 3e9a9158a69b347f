use super::*;

use log::*;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Parse one HDL source unit into a [`ChipDefinition`].
///
/// The grammar is fixed:
///
/// ```text
/// chip          := 'CHIP' IDENT '{' in_section out_section parts_section '}'
/// in_section    := 'IN' ident_list ';'
/// out_section   := 'OUT' ident_list ';'
/// parts_section := 'PARTS' ':' part*
/// part          := IDENT '(' binding (',' binding)* ')' ';'
/// binding       := IDENT '=' IDENT
/// ident_list    := IDENT (',' IDENT)*
/// ```
///
/// Sections are mandatory and must appear exactly once, in that order.
/// The first mismatch aborts with a [`HdlError::Parse`] naming the
/// expected token and the token actually found.
pub fn parse_chip(text: &str) -> Result<ChipDefinition, HdlError> {
    let tokens = tokenize(text)?;
    Parser::new(tokens).parse()
}

/// Strict LL(1) recursive descent over the token stream: one token of
/// lookahead, every non-terminal consumes tokens in grammar order, no
/// error recovery.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().map(|token| token.kind == kind).unwrap_or(false)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn end_loc(&self) -> Loc {
        match self.tokens.last() {
            Some(token) => Loc::new(token.loc.end(), token.loc.end()),
            None => Loc::new(0, 0),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, HdlError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(HdlError::Parse(
                token.loc,
                format!("expected {}, found '{}'", kind.describe(), token.lexeme),
            )),
            None => Err(HdlError::Parse(
                self.end_loc(),
                format!("expected {}, found end of input", kind.describe()),
            )),
        }
    }

    pub fn parse(&mut self) -> Result<ChipDefinition, HdlError> {
        self.expect(TokenKind::Chip)?;
        let name = self.expect(TokenKind::Ident)?.lexeme;
        self.expect(TokenKind::LBrace)?;

        self.expect(TokenKind::In)?;
        let inputs = self.ident_list()?;
        self.expect(TokenKind::Semi)?;

        self.expect(TokenKind::Out)?;
        let outputs = self.ident_list()?;
        self.expect(TokenKind::Semi)?;

        self.expect(TokenKind::Parts)?;
        self.expect(TokenKind::Colon)?;
        let mut parts = vec![];
        while self.peek().is_some() && !self.at(TokenKind::RBrace) {
            parts.push(self.part()?);
        }
        self.expect(TokenKind::RBrace)?;

        if let Some(token) = self.peek() {
            return Err(HdlError::Parse(
                token.loc,
                format!("expected end of input, found '{}'", token.lexeme),
            ));
        }

        // Pin names must be distinct across IN and OUT together.
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for pin in inputs.iter().chain(outputs.iter()) {
            if !seen.insert(pin.lexeme.as_str()) {
                return Err(HdlError::Parse(
                    pin.loc,
                    format!("duplicate pin name '{}'", pin.lexeme),
                ));
            }
        }

        debug!("parsed chip {name}: {} in, {} out, {} parts", inputs.len(), outputs.len(), parts.len());

        Ok(ChipDefinition {
            name,
            inputs: inputs.into_iter().map(|token| token.lexeme).collect(),
            outputs: outputs.into_iter().map(|token| token.lexeme).collect(),
            parts,
        })
    }

    fn ident_list(&mut self) -> Result<Vec<Token>, HdlError> {
        let mut idents = vec![self.expect(TokenKind::Ident)?];
        while self.eat(TokenKind::Comma) {
            idents.push(self.expect(TokenKind::Ident)?);
        }
        Ok(idents)
    }

    fn part(&mut self) -> Result<PartInstance, HdlError> {
        let chip_type = self.expect(TokenKind::Ident)?.lexeme;
        self.expect(TokenKind::LParen)?;

        let mut connections = BTreeMap::new();
        loop {
            let pin = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Equals)?;
            let signal = self.expect(TokenKind::Ident)?.lexeme;
            if connections.insert(pin.lexeme.clone(), signal).is_some() {
                return Err(HdlError::Parse(
                    pin.loc,
                    format!("pin '{}' is bound twice on part {chip_type}", pin.lexeme),
                ));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semi)?;

        Ok(PartInstance { chip_type, connections })
    }
}
