use paren_core::Diagnostic;
use paren_reader::Token;

use crate::ast::{AstKind, AstNode};
use crate::types::TypeArena;

/// Type-check resolved ASTs, unifying type variables in place.
/// Diagnostics are the only observable output.
pub fn typing(
    asts: &[AstNode],
    tokens: &[Token],
    types: &mut TypeArena,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for ast in asts {
        typing1(ast, tokens, types, diagnostics);
    }
}

fn typing1(
    ast: &AstNode,
    tokens: &[Token],
    types: &mut TypeArena,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match &ast.kind {
        AstKind::Defun { name, body, .. } => {
            for form in body {
                typing1(form, tokens, types, diagnostics);
            }
            // The declared result type meets the last body form; a
            // body-less function's result stays unconstrained.
            if let Some(last) = body.last() {
                if let Some((_, result)) = types.as_function(name.ty) {
                    types.unify(result, last.ty, last.range(tokens), diagnostics);
                }
            }
        }
        AstKind::If { cond, con, alt } => {
            typing1(cond, tokens, types, diagnostics);
            typing1(con, tokens, types, diagnostics);
            typing1(alt, tokens, types, diagnostics);
            types.unify(TypeArena::BOOL, cond.ty, cond.range(tokens), diagnostics);
            types.unify(con.ty, alt.ty, alt.range(tokens), diagnostics);
            types.unify(ast.ty, con.ty, con.range(tokens), diagnostics);
        }
        AstKind::Call { func, args } => {
            if let Some(func) = func {
                if let Some((_, result)) = types.as_function(func.ty) {
                    types.unify(ast.ty, result, func.range(tokens), diagnostics);
                }
            }
            for arg in args {
                typing1(arg, tokens, types, diagnostics);
            }
            if let Some(func) = func {
                if let Some((params, _)) = types.as_function(func.ty) {
                    if params.len() != args.len() {
                        diagnostics.push(Diagnostic::new(
                            ast.range(tokens),
                            "wrong number of arguments",
                        ));
                    }
                    for (&param, arg) in params.iter().zip(args) {
                        types.unify(param, arg.ty, arg.range(tokens), diagnostics);
                    }
                }
            }
        }
        AstKind::Unit | AstKind::Number(_) | AstKind::Variable { .. } | AstKind::Error => {}
    }
}
