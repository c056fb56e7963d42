//! Global string interner.
//!
//! Identifiers produced by the tokenizer are interned into [`Symbol`], a
//! cheap `Copy` handle, rather than carried around as owned `String`s. The
//! interner is process-global: symbols created in one run remain valid and
//! comparable across the lifetime of the host process, which matters since
//! a single host can invoke `run_once` many times over the same constant
//! identifiers (`if`, `for`, `end`, ...).

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// An interned identifier.
///
/// Cheap to copy and compare; use [`Symbol::as_str`] to recover the text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, Symbol>,
}

impl Interner {
    fn new() -> Self {
        Self { strings: Vec::new(), lookup: FxHashMap::default() }
    }

    fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(text) {
            return sym;
        }
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(leaked);
        self.lookup.insert(leaked, sym);
        sym
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(Interner::new()))
}

impl Symbol {
    /// Intern `text`, returning the symbol for it.
    pub fn intern(text: &str) -> Symbol {
        interner().write().intern(text)
    }

    /// Recover the original string for this symbol.
    ///
    /// The returned slice is valid for the process lifetime: the interner
    /// never evicts or reuses entries.
    pub fn as_str(self) -> &'static str {
        interner().read().resolve(self)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::intern(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "foo");
    }

    #[test]
    fn different_text_interns_distinct_symbols() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("bar");
        assert_ne!(a, b);
    }
}
