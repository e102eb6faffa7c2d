use paren_core::{Diagnostic, Range};

use crate::lexer::{parse_number, Token, TokenId, TokenKind};

/// A node of the parenthesized parse tree, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseKind {
    Array(Vec<ParseNode>),
    Number(f64),
    Variable(String),
    /// A stray close parenthesis.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub kind: ParseKind,
    pub first: TokenId,
    pub last: TokenId,
}

impl ParseNode {
    /// Source extent, from the first to the last constituent token.
    pub fn range(&self, tokens: &[Token]) -> Range {
        tokens[self.first].range.to(tokens[self.last].range)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    /// Indices of the non-comment tokens, in document order.
    ids: Vec<TokenId>,
    pos: usize,
}

/// Parse a token sequence into top-level nodes, recovering from
/// unbalanced parentheses with diagnostics and `Error` nodes so that a
/// complete tree always comes out.
pub fn parse(tokens: &[Token], diagnostics: &mut Vec<Diagnostic>) -> Vec<ParseNode> {
    let ids = (0..tokens.len())
        .filter(|&id| tokens[id].kind != TokenKind::Comment)
        .collect();
    let mut parser = Parser {
        tokens,
        ids,
        pos: 0,
    };

    let mut nodes = Vec::new();
    while parser.pos < parser.ids.len() {
        nodes.push(parser.parse_node(diagnostics));
    }
    nodes
}

impl<'a> Parser<'a> {
    fn parse_node(&mut self, diagnostics: &mut Vec<Diagnostic>) -> ParseNode {
        let id = self.ids[self.pos];
        self.pos += 1;
        let token = &self.tokens[id];
        match token.kind {
            TokenKind::LParen => {
                let mut children = Vec::new();
                loop {
                    if self.pos == self.ids.len() {
                        diagnostics.push(Diagnostic::new(token.range, "unclosed parenthesis"));
                        break;
                    }
                    if self.tokens[self.ids[self.pos]].kind == TokenKind::RParen {
                        self.pos += 1;
                        break;
                    }
                    children.push(self.parse_node(diagnostics));
                }
                // Close at the last consumed token, which is the `)` or,
                // at end of input, whatever came last.
                let last = self.ids[self.pos - 1];
                ParseNode {
                    kind: ParseKind::Array(children),
                    first: id,
                    last,
                }
            }
            TokenKind::RParen => {
                diagnostics.push(Diagnostic::new(token.range, "extra close parenthesis"));
                ParseNode {
                    kind: ParseKind::Error,
                    first: id,
                    last: id,
                }
            }
            TokenKind::Number => ParseNode {
                kind: ParseKind::Number(parse_number(&token.text).unwrap_or(0.0)),
                first: id,
                last: id,
            },
            TokenKind::Variable => ParseNode {
                kind: ParseKind::Variable(token.text.clone()),
                first: id,
                last: id,
            },
            TokenKind::Comment => unreachable!("comments are filtered before parsing"),
        }
    }
}
