//! Interned identifiers.
//!
//! The compiler is single-threaded and synchronous (see the concurrency
//! model), so the interner is a plain `RefCell`-guarded table rather than
//! the teacher's lock-free concurrent one — there is never a second thread
//! to contend with.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

/// A deduplicated identifier. Cheap to copy and compare; the backing
/// string lives in the thread-local [`Interner`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn intern(s: &str) -> Symbol {
        INTERNER.with(|i| i.borrow_mut().intern(s))
    }

    pub fn as_str(&self) -> &'static str {
        INTERNER.with(|i| i.borrow().resolve(*self))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Interner {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(s) {
            return Symbol(id);
        }
        // Leaked once per distinct identifier for the life of the process;
        // the interner itself never shrinks, so this is bounded by the
        // number of distinct names in one compilation.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        Symbol(id)
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_text_yields_the_same_symbol() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_text_yields_distinct_symbols() {
        assert_ne!(Symbol::intern("foo"), Symbol::intern("bar"));
    }

    #[test]
    fn round_trips_through_as_str() {
        let s = Symbol::intern("self");
        assert_eq!(s.as_str(), "self");
    }
}
