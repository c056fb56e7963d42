//! Lexical scopes (§3.5): a parent chain of name→value maps. The root
//! wraps the host's injected [`VariableMap`] read-only; every child scope
//! owns a mutable local map and a strong reference to its parent.
//!
//! Grounded on the teacher's rib-stack shape (`faxc-sem::scope::ScopeTree`)
//! but inverted from an arena-of-ribs into owned parent pointers: the
//! reducer's scopes are created and dropped dynamically per call/block,
//! which fits `Rc` parent links better than a flat index vector.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// Host-provided, insertion-ordered bindings (§3.4).
#[derive(Clone, Debug, Default)]
pub struct VariableMap {
    entries: IndexMap<String, Value>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges several maps into one, later maps overriding earlier keys
    /// (§6.3's documented merge helper).
    pub fn merge(maps: impl IntoIterator<Item = VariableMap>) -> VariableMap {
        let mut out = VariableMap::new();
        for map in maps {
            for (k, v) in map.entries {
                out.entries.insert(k, v);
            }
        }
        out
    }
}

enum ScopeKind {
    Root(VariableMap),
    Child { parent: Rc<Scope>, locals: RefCell<IndexMap<String, Value>> },
}

/// One level of lexical scope. Cloned as `Rc<Scope>` throughout the
/// reducer; never mutated through a shared parent reference, only through
/// the innermost scope's own `locals`.
pub struct Scope {
    kind: ScopeKind,
}

impl Scope {
    /// The root scope for a run, wrapping the host's variables read-only.
    pub fn root(variables: VariableMap) -> Rc<Scope> {
        Rc::new(Scope { kind: ScopeKind::Root(variables) })
    }

    /// A fresh child scope pointing back at `self`.
    pub fn new_child(self: &Rc<Self>) -> Rc<Scope> {
        Rc::new(Scope {
            kind: ScopeKind::Child { parent: Rc::clone(self), locals: RefCell::new(IndexMap::new()) },
        })
    }

    /// Walks local → parent, returning the first binding found.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        match &self.kind {
            ScopeKind::Root(variables) => variables.get(name).cloned(),
            ScopeKind::Child { parent, locals } => {
                if let Some(v) = locals.borrow().get(name) {
                    Some(v.clone())
                } else {
                    parent.lookup(name)
                }
            }
        }
    }

    /// Writes into the innermost scope's own local map. Writing through
    /// the root scope is a no-op by design: the injected `VariableMap` is
    /// read-only (§3.5, §8.1 scope isolation), so a bare `set` at the
    /// template's outermost level creates a binding in the synthetic
    /// top-level child scope the reducer always opens first, never here.
    pub fn write(&self, name: impl Into<String>, value: Value) {
        match &self.kind {
            ScopeKind::Root(_) => {}
            ScopeKind::Child { locals, .. } => {
                locals.borrow_mut().insert(name.into(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_parent_and_write_stays_local() {
        let mut vars = VariableMap::new();
        vars.insert("x", Value::Bool(true));
        let root = Scope::root(vars);
        let child = root.new_child();
        assert_eq!(child.lookup("x"), Some(Value::Bool(true)));

        child.write("y", Value::Bool(false));
        assert_eq!(child.lookup("y"), Some(Value::Bool(false)));
        assert_eq!(root.lookup("y"), None);
    }

    #[test]
    fn merge_lets_later_maps_override_earlier_keys() {
        let mut a = VariableMap::new();
        a.insert("x", Value::Bool(true));
        let mut b = VariableMap::new();
        b.insert("x", Value::Bool(false));
        let merged = VariableMap::merge([a, b]);
        assert_eq!(merged.get("x"), Some(&Value::Bool(false)));
    }
}
