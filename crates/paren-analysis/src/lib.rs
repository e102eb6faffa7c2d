pub mod ast;
pub mod document;
pub mod expand;
pub mod scope;
pub mod types;
pub mod typing;

pub use ast::{AstKind, AstNode};
pub use document::{analyze, Analysis, DocumentStore};
pub use expand::expand;
pub use scope::{DefKind, Definition, Scope, ScopeId, ScopeSet};
pub use types::{Atom, TypeArena, TypeId};
pub use typing::typing;
