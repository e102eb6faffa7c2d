use paren_core::{Diagnostic, Range};

/// A concrete type atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    Number,
    Bool,
    Unit,
    /// Failure sentinel: unifies with anything without complaint, so one
    /// root cause produces one diagnostic instead of a cascade.
    Error,
}

impl Atom {
    pub fn name(self) -> &'static str {
        match self {
            Atom::Number => "number",
            Atom::Bool => "bool",
            Atom::Unit => "unit",
            Atom::Error => "error",
        }
    }
}

/// Index into a [`TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeId(u32);

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    /// An unbound type variable.
    Unbound,
    /// Forwarding link installed when a variable is bound. Each variable
    /// is bound at most once.
    Link(TypeId),
    Atom(Atom),
    Function { params: Vec<TypeId>, result: TypeId },
}

/// Arena of types for one analysis. Union-find without rank: binding a
/// variable rewrites its `Unbound` entry into a `Link`, and resolution
/// follows links until an atom, function, or unbound cell.
#[derive(Debug)]
pub struct TypeArena {
    entries: Vec<Entry>,
}

impl TypeArena {
    pub const NUMBER: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const UNIT: TypeId = TypeId(2);
    pub const ERROR: TypeId = TypeId(3);

    pub fn new() -> Self {
        TypeArena {
            entries: vec![
                Entry::Atom(Atom::Number),
                Entry::Atom(Atom::Bool),
                Entry::Atom(Atom::Unit),
                Entry::Atom(Atom::Error),
            ],
        }
    }

    fn push(&mut self, entry: Entry) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// A fresh unbound type variable.
    pub fn fresh(&mut self) -> TypeId {
        self.push(Entry::Unbound)
    }

    pub fn function(&mut self, params: Vec<TypeId>, result: TypeId) -> TypeId {
        self.push(Entry::Function { params, result })
    }

    /// Follow binding links to the most-resolved form.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        while let Entry::Link(next) = self.entries[id.0 as usize] {
            id = next;
        }
        id
    }

    /// Parameter and result types, if `id` resolves to a function.
    pub fn as_function(&self, id: TypeId) -> Option<(Vec<TypeId>, TypeId)> {
        match &self.entries[self.resolve(id).0 as usize] {
            Entry::Function { params, result } => Some((params.clone(), *result)),
            _ => None,
        }
    }

    /// Equate two types. Unbound variables bind to the other side;
    /// incompatible concrete types report `"<expected> is expected"` at
    /// the actual operand's range. The message is always phrased from the
    /// expected (first) side, so callers must respect the argument order.
    pub fn unify(
        &mut self,
        expected: TypeId,
        actual: TypeId,
        actual_range: Range,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let lhs = self.resolve(expected);
        let rhs = self.resolve(actual);
        if lhs == rhs {
            return;
        }
        if lhs == Self::ERROR || rhs == Self::ERROR {
            return;
        }
        match (&self.entries[lhs.0 as usize], &self.entries[rhs.0 as usize]) {
            (Entry::Unbound, _) => self.entries[lhs.0 as usize] = Entry::Link(rhs),
            (_, Entry::Unbound) => self.entries[rhs.0 as usize] = Entry::Link(lhs),
            _ => diagnostics.push(Diagnostic::new(
                actual_range,
                format!("{} is expected", self.display(expected)),
            )),
        }
    }

    /// Human-readable rendering: atoms by name, unresolved variables as
    /// `unknown`, functions as `(p1, p2) -> result`.
    pub fn display(&self, id: TypeId) -> String {
        let id = self.resolve(id);
        match &self.entries[id.0 as usize] {
            Entry::Unbound => "unknown".to_string(),
            Entry::Link(next) => self.display(*next),
            Entry::Atom(atom) => atom.name().to_string(),
            Entry::Function { params, result } => {
                let params: Vec<String> = params.iter().map(|&p| self.display(p)).collect();
                format!("({}) -> {}", params.join(", "), self.display(*result))
            }
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        TypeArena::new()
    }
}
