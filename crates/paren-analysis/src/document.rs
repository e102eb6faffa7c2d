use std::collections::HashMap;

use paren_core::{Diagnostic, Position};
use paren_reader::{parse, tokenize, Token};

use crate::ast::{AstKind, AstNode};
use crate::expand::expand;
use crate::scope::ScopeSet;
use crate::types::TypeArena;
use crate::typing::typing;

/// The complete result of analyzing one version of one document.
#[derive(Debug)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub asts: Vec<AstNode>,
    pub scopes: ScopeSet,
    pub types: TypeArena,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline — lexer, parser, expander, type checker — on a
/// document text. Everything is built from scratch; nothing carries over
/// from earlier versions.
pub fn analyze(text: &str) -> Analysis {
    let mut diagnostics = Vec::new();
    let mut tokens = tokenize(text);
    let nodes = parse(&tokens, &mut diagnostics);
    let mut types = TypeArena::new();
    let (asts, scopes) = expand(&nodes, &mut tokens, &mut types, &mut diagnostics);
    typing(&asts, &tokens, &mut types, &mut diagnostics);
    Analysis {
        tokens,
        asts,
        scopes,
        types,
        diagnostics,
    }
}

impl Analysis {
    /// The deepest AST node whose range contains `position`, scanning
    /// top-level forms in document order. Top-level ranges never overlap,
    /// so the first containing form wins.
    pub fn find_ast_of_position(&self, position: Position) -> Option<&AstNode> {
        self.asts
            .iter()
            .find_map(|ast| self.find_in(ast, position))
    }

    fn find_in<'a>(&'a self, ast: &'a AstNode, position: Position) -> Option<&'a AstNode> {
        if !ast.range(&self.tokens).contains(position) {
            return None;
        }
        let inner = match &ast.kind {
            AstKind::Defun { name, params, body } => self
                .find_in(name, position)
                .or_else(|| params.iter().find_map(|p| self.find_in(p, position)))
                .or_else(|| body.iter().find_map(|b| self.find_in(b, position))),
            AstKind::If { cond, con, alt } => self
                .find_in(cond, position)
                .or_else(|| self.find_in(con, position))
                .or_else(|| self.find_in(alt, position)),
            AstKind::Call { func, args } => func
                .as_deref()
                .and_then(|f| self.find_in(f, position))
                .or_else(|| args.iter().find_map(|a| self.find_in(a, position))),
            AstKind::Unit | AstKind::Number(_) | AstKind::Variable { .. } | AstKind::Error => None,
        };
        Some(inner.unwrap_or(ast))
    }
}

/// Per-URI analyses. Every edit replaces the previous entry wholesale;
/// only the URI key persists across versions.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, Analysis>,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, analysis: Analysis) {
        self.documents.insert(uri.into(), analysis);
    }

    pub fn get(&self, uri: &str) -> Option<&Analysis> {
        self.documents.get(uri)
    }
}
