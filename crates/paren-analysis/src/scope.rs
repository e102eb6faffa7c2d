use std::collections::HashMap;

use paren_core::Range;
use paren_reader::TokenId;

use crate::types::{TypeArena, TypeId};

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    /// A `defun` parameter.
    Parameter,
    /// A `defun`-defined function.
    Function,
    /// A builtin from the global scope.
    Subroutine,
}

/// A single name binding.
#[derive(Debug, Clone)]
pub struct Definition {
    pub kind: DefKind,
    /// Binding-site token, used for go-to-definition. Builtins have no
    /// source location.
    pub token: Option<TokenId>,
    pub ty: TypeId,
}

/// Index into a [`ScopeSet`].
pub type ScopeId = usize;

/// A lexical scope: local definitions plus a parent link.
#[derive(Debug)]
pub struct Scope {
    pub definitions: HashMap<String, Definition>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Textual extent used for scope-sensitive completion. `None` for
    /// the global and toplevel scopes, which are always in view.
    pub range: Option<Range>,
}

/// Builtin subroutine signatures seeded into the global scope.
const BUILTINS: &[(&str, &[TypeId], TypeId)] = &[
    ("print", &[TypeArena::NUMBER], TypeArena::UNIT),
    ("+", &[TypeArena::NUMBER, TypeArena::NUMBER], TypeArena::NUMBER),
    ("-", &[TypeArena::NUMBER, TypeArena::NUMBER], TypeArena::NUMBER),
    ("*", &[TypeArena::NUMBER, TypeArena::NUMBER], TypeArena::NUMBER),
    ("=", &[TypeArena::NUMBER, TypeArena::NUMBER], TypeArena::BOOL),
];

/// The scope tree of one analysis. Index 0 is the global scope, index 1
/// the per-document toplevel scope; local scopes follow in creation
/// order as children of the scope their `defun` appeared in.
#[derive(Debug)]
pub struct ScopeSet {
    scopes: Vec<Scope>,
}

impl ScopeSet {
    pub const GLOBAL: ScopeId = 0;
    pub const TOPLEVEL: ScopeId = 1;

    /// A fresh scope tree: the global scope seeded with builtins, and an
    /// empty toplevel scope under it. The global scope is never written
    /// again after seeding.
    pub fn new(types: &mut TypeArena) -> Self {
        let mut set = ScopeSet {
            scopes: vec![Scope {
                definitions: HashMap::new(),
                parent: None,
                children: Vec::new(),
                range: None,
            }],
        };
        for &(name, params, result) in BUILTINS {
            let ty = types.function(params.to_vec(), result);
            set.scopes[Self::GLOBAL].definitions.insert(
                name.to_string(),
                Definition {
                    kind: DefKind::Subroutine,
                    token: None,
                    ty,
                },
            );
        }
        let toplevel = set.new_child(Self::GLOBAL, None);
        debug_assert_eq!(toplevel, Self::TOPLEVEL);
        set
    }

    /// Create a scope under `parent`.
    pub fn new_child(&mut self, parent: ScopeId, range: Option<Range>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            definitions: HashMap::new(),
            parent: Some(parent),
            children: Vec::new(),
            range,
        });
        self.scopes[parent].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Bind `name` in `scope`, replacing any earlier binding there.
    pub fn define(&mut self, scope: ScopeId, name: String, definition: Definition) {
        self.scopes[scope].definitions.insert(name, definition);
    }

    pub fn is_defined_locally(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope].definitions.contains_key(name)
    }

    /// Plain lexical lookup along the parent chain.
    pub fn find_definition(&self, mut scope: ScopeId, name: &str) -> Option<&Definition> {
        loop {
            if let Some(definition) = self.scopes[scope].definitions.get(name) {
                return Some(definition);
            }
            scope = self.scopes[scope].parent?;
        }
    }
}
