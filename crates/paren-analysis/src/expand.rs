use paren_core::{Diagnostic, Range};
use paren_reader::{DisplayKind, ParseKind, ParseNode, Token, TokenId};

use crate::ast::{AstKind, AstNode};
use crate::scope::{DefKind, Definition, ScopeId, ScopeSet};
use crate::types::{TypeArena, TypeId};

/// Expand parse nodes into resolved AST nodes, building the scope tree,
/// recognizing the `defun` and `if` special forms, and upgrading token
/// display kinds for semantic highlighting along the way.
pub fn expand(
    nodes: &[ParseNode],
    tokens: &mut [Token],
    types: &mut TypeArena,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<AstNode>, ScopeSet) {
    let scopes = ScopeSet::new(types);
    let mut expander = Expander {
        tokens,
        types,
        scopes,
        diagnostics,
    };
    let asts = nodes
        .iter()
        .map(|node| expander.expand1(node, ScopeSet::TOPLEVEL))
        .collect();
    (asts, expander.scopes)
}

struct Expander<'a> {
    tokens: &'a mut [Token],
    types: &'a mut TypeArena,
    scopes: ScopeSet,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Expander<'a> {
    fn node_range(&self, node: &ParseNode) -> Range {
        node.range(self.tokens)
    }

    fn error_node(&self, first: TokenId, last: TokenId) -> AstNode {
        AstNode {
            kind: AstKind::Error,
            ty: TypeArena::ERROR,
            first,
            last,
        }
    }

    fn expand1(&mut self, node: &ParseNode, scope: ScopeId) -> AstNode {
        match &node.kind {
            ParseKind::Array(children) => {
                if children.is_empty() {
                    return AstNode {
                        kind: AstKind::Unit,
                        ty: TypeArena::UNIT,
                        first: node.first,
                        last: node.last,
                    };
                }
                if let ParseKind::Variable(head) = &children[0].kind {
                    match head.as_str() {
                        "defun" => {
                            if scope != ScopeSet::TOPLEVEL {
                                self.diagnostics.push(Diagnostic::new(
                                    self.node_range(node),
                                    "nested function is not allowed",
                                ));
                            }
                            self.expand_defun(node, children, scope)
                        }
                        "if" => self.expand_if(node, children, scope),
                        _ => self.expand_call(node, children, head.clone(), scope),
                    }
                } else {
                    self.diagnostics.push(Diagnostic::new(
                        self.node_range(node),
                        "An operator must be an identifier",
                    ));
                    let args = children
                        .iter()
                        .map(|child| self.expand1(child, scope))
                        .collect();
                    AstNode {
                        kind: AstKind::Call { func: None, args },
                        ty: TypeArena::ERROR,
                        first: node.first,
                        last: node.last,
                    }
                }
            }
            ParseKind::Number(value) => AstNode {
                kind: AstKind::Number(*value),
                ty: TypeArena::NUMBER,
                first: node.first,
                last: node.last,
            },
            ParseKind::Variable(name) => {
                let resolved = self
                    .scopes
                    .find_definition(scope, name)
                    .map(|def| (def.token, def.ty));
                let (def_token, ty) = match resolved {
                    Some(found) => found,
                    None => {
                        self.diagnostics
                            .push(Diagnostic::new(self.node_range(node), "undefined variable"));
                        (None, self.types.fresh())
                    }
                };
                AstNode {
                    kind: AstKind::Variable {
                        name: name.clone(),
                        def_token,
                    },
                    ty,
                    first: node.first,
                    last: node.last,
                }
            }
            ParseKind::Error => self.error_node(node.first, node.last),
        }
    }

    fn expand_defun(&mut self, node: &ParseNode, children: &[ParseNode], scope: ScopeId) -> AstNode {
        self.tokens[children[0].first].display = Some(DisplayKind::Keyword);

        if children.len() < 3 {
            self.diagnostics
                .push(Diagnostic::new(self.node_range(node), "malformed defun"));
            return self.error_node(node.first, node.last);
        }
        let name = match &children[1].kind {
            ParseKind::Variable(name) => name.clone(),
            _ => {
                self.diagnostics.push(Diagnostic::new(
                    self.node_range(&children[1]),
                    "A variable is expected",
                ));
                return self.error_node(children[1].first, children[1].last);
            }
        };
        self.tokens[children[1].first].display = Some(DisplayKind::Function);
        let param_nodes = match &children[2].kind {
            ParseKind::Array(items) => items,
            _ => {
                self.diagnostics.push(Diagnostic::new(
                    self.node_range(&children[2]),
                    "An array of variables is expected",
                ));
                return self.error_node(node.first, node.last);
            }
        };

        // The local scope covers the body: from the first body token, or
        // the closing token when there is no body, to the closing token.
        let scope_first = if children.len() == 3 {
            node.last
        } else {
            children[3].first
        };
        let scope_range = self.tokens[scope_first]
            .range
            .to(self.tokens[node.last].range);
        let local = self.scopes.new_child(scope, Some(scope_range));

        let mut params = Vec::new();
        for param in param_nodes {
            let ParseKind::Variable(param_name) = &param.kind else {
                self.diagnostics.push(Diagnostic::new(
                    self.node_range(param),
                    "A variable is expected",
                ));
                return self.error_node(param.first, param.last);
            };
            let ty = self.types.fresh();
            if self.scopes.is_defined_locally(local, param_name) {
                self.diagnostics
                    .push(Diagnostic::new(self.node_range(param), "multiple definition"));
            }
            // A duplicate name overwrites the earlier binding.
            self.scopes.define(
                local,
                param_name.clone(),
                Definition {
                    kind: DefKind::Parameter,
                    token: Some(param.first),
                    ty,
                },
            );
            params.push(AstNode {
                kind: AstKind::Variable {
                    name: param_name.clone(),
                    def_token: None,
                },
                ty,
                first: param.first,
                last: param.last,
            });
        }

        let param_types: Vec<TypeId> = params.iter().map(|p| p.ty).collect();
        let result = self.types.fresh();
        let fn_ty = self.types.function(param_types, result);
        // Registered in the enclosing scope before the body expands, so
        // the body can refer to the function being defined.
        self.scopes.define(
            scope,
            name.clone(),
            Definition {
                kind: DefKind::Function,
                token: Some(children[1].first),
                ty: fn_ty,
            },
        );

        let body: Vec<AstNode> = children[3..]
            .iter()
            .map(|child| self.expand1(child, local))
            .collect();
        let name_node = AstNode {
            kind: AstKind::Variable {
                name,
                def_token: None,
            },
            ty: fn_ty,
            first: children[1].first,
            last: children[1].last,
        };
        AstNode {
            kind: AstKind::Defun {
                name: Box::new(name_node),
                params,
                body,
            },
            ty: fn_ty,
            first: node.first,
            last: node.last,
        }
    }

    fn expand_if(&mut self, node: &ParseNode, children: &[ParseNode], scope: ScopeId) -> AstNode {
        self.tokens[children[0].first].display = Some(DisplayKind::Keyword);

        if children.len() != 4 {
            self.diagnostics
                .push(Diagnostic::new(self.node_range(node), "malformed if"));
            return self.error_node(node.first, node.last);
        }
        let cond = self.expand1(&children[1], scope);
        let con = self.expand1(&children[2], scope);
        let alt = self.expand1(&children[3], scope);
        AstNode {
            kind: AstKind::If {
                cond: Box::new(cond),
                con: Box::new(con),
                alt: Box::new(alt),
            },
            ty: self.types.fresh(),
            first: node.first,
            last: node.last,
        }
    }

    fn expand_call(
        &mut self,
        node: &ParseNode,
        children: &[ParseNode],
        name: String,
        scope: ScopeId,
    ) -> AstNode {
        let head = &children[0];
        self.tokens[head.first].display = Some(DisplayKind::Function);

        let resolved = self
            .scopes
            .find_definition(scope, &name)
            .map(|def| (def.kind, def.token, def.ty));
        let arg_count = children.len() - 1;
        let (fn_ty, def_token) = match resolved {
            None => {
                self.diagnostics
                    .push(Diagnostic::new(self.node_range(head), "undefined variable"));
                // Fabricate unknowns of matching arity so later
                // unification degrades gracefully.
                let params: Vec<TypeId> = (0..arg_count).map(|_| self.types.fresh()).collect();
                let result = self.types.fresh();
                (self.types.function(params, result), None)
            }
            Some((DefKind::Function | DefKind::Subroutine, token, ty)) => (ty, token),
            Some((DefKind::Parameter, token, _)) => {
                self.diagnostics.push(Diagnostic::new(
                    self.node_range(head),
                    "A function is expected",
                ));
                let params = vec![TypeArena::ERROR; arg_count];
                (self.types.function(params, TypeArena::ERROR), token)
            }
        };
        let result_ty = match self.types.as_function(fn_ty) {
            Some((_, result)) => result,
            None => TypeArena::ERROR,
        };

        let func = AstNode {
            kind: AstKind::Variable { name, def_token },
            ty: fn_ty,
            first: head.first,
            last: head.last,
        };
        let args: Vec<AstNode> = children[1..]
            .iter()
            .map(|child| self.expand1(child, scope))
            .collect();
        AstNode {
            kind: AstKind::Call {
                func: Some(Box::new(func)),
                args,
            },
            ty: result_ty,
            first: node.first,
            last: node.last,
        }
    }
}
