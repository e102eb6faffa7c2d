use paren_core::Range;
use paren_reader::{Token, TokenId};

use crate::types::TypeId;

/// A resolved expression. Every node carries its type and the token pair
/// delimiting its source extent.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    pub ty: TypeId,
    pub first: TokenId,
    pub last: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    Defun {
        /// The function name as a variable node carrying the function type.
        name: Box<AstNode>,
        params: Vec<AstNode>,
        body: Vec<AstNode>,
    },
    If {
        cond: Box<AstNode>,
        con: Box<AstNode>,
        alt: Box<AstNode>,
    },
    Call {
        /// The callee variable; `None` when the operator position held a
        /// non-identifier.
        func: Option<Box<AstNode>>,
        args: Vec<AstNode>,
    },
    /// The empty form `()`.
    Unit,
    Number(f64),
    Variable {
        name: String,
        /// Binding-site token of the resolved definition, when one exists.
        def_token: Option<TokenId>,
    },
    /// Carried over from a malformed parse or expansion.
    Error,
}

impl AstNode {
    /// Source extent, from the first to the last constituent token.
    pub fn range(&self, tokens: &[Token]) -> Range {
        tokens[self.first].range.to(tokens[self.last].range)
    }
}
