//! The lexically scoped environment tree.
//!
//! Each scope is a singly-linked, parent-pointing node built by the parser
//! as it descends into blocks, function bodies, and for-loops, then walked
//! by the elaborator for name resolution. Declarations are recorded in
//! insertion order so that `getInOrder` and forward-reference rejection
//! within a block both have an O(1)/O(n) answer without a second index.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use lumen_types::{Bottom, Type};
use lumen_util::{DefId, Symbol};

/// What a name at this scope refers to: enough of the original
/// declaration for the elaborator and codegen to act on, without forcing
/// the environment to co-own the full statement tree.
#[derive(Debug)]
pub struct Binding {
    pub name: Symbol,
    pub def_id: DefId,
    pub is_const: bool,
    /// Filled in by the elaborator once the declaration's type is known;
    /// the parser may leave this `None` for `let x = ...;` with no
    /// annotation.
    pub ty: RefCell<Option<Rc<Type>>>,
}

impl Binding {
    pub fn new(name: Symbol, def_id: DefId, is_const: bool) -> Rc<Binding> {
        Rc::new(Binding {
            name,
            def_id,
            is_const,
            ty: RefCell::new(None),
        })
    }
}

/// Outcome of declaring a name in a scope, per `spec.md` §3.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redeclaration {
    /// Not declared anywhere in the visible chain.
    Unique,
    /// Declared in an ancestor scope (shadowing is fine).
    Alias,
    /// Already declared at this exact level — an error.
    Redeclaration,
}

/// Canonical handles to the six primitive types, reachable from every
/// node in the tree through its root.
#[derive(Clone)]
pub struct BottomTypes {
    pub void: Rc<Type>,
    pub int: Rc<Type>,
    pub bool_: Rc<Type>,
    pub char_: Rc<Type>,
    pub float: Rc<Type>,
    pub self_ref: Rc<Type>,
}

pub struct Environment {
    pub parent: Option<Rc<Environment>>,
    pub bottom_types: BottomTypes,
    members: RefCell<IndexMap<Symbol, Rc<Binding>>>,
}

impl Environment {
    pub fn root(bottom_types: BottomTypes) -> Rc<Environment> {
        Rc::new(Environment {
            parent: None,
            bottom_types,
            members: RefCell::new(IndexMap::new()),
        })
    }

    pub fn generate_inner_environment(self: &Rc<Self>) -> Rc<Environment> {
        Rc::new(Environment {
            parent: Some(Rc::clone(self)),
            bottom_types: self.bottom_types.clone(),
            members: RefCell::new(IndexMap::new()),
        })
    }

    pub fn bottom(&self, kind: Bottom) -> Rc<Type> {
        match kind {
            Bottom::Void => Rc::clone(&self.bottom_types.void),
            Bottom::Int => Rc::clone(&self.bottom_types.int),
            Bottom::Bool => Rc::clone(&self.bottom_types.bool_),
            Bottom::Char => Rc::clone(&self.bottom_types.char_),
            Bottom::Float => Rc::clone(&self.bottom_types.float),
            Bottom::SelfRef => Rc::clone(&self.bottom_types.self_ref),
        }
    }

    /// Appends `binding` in insertion order. Callers must check
    /// [`Environment::redeclaration_state`] first; this does not itself
    /// reject a duplicate at this level.
    pub fn add_member(&self, binding: Rc<Binding>) {
        self.members.borrow_mut().insert(binding.name, binding);
    }

    pub fn redeclaration_state(&self, name: Symbol) -> Redeclaration {
        if self.members.borrow().contains_key(&name) {
            return Redeclaration::Redeclaration;
        }
        let mut scope = self.parent.as_ref();
        while let Some(env) = scope {
            if env.members.borrow().contains_key(&name) {
                return Redeclaration::Alias;
            }
            scope = env.parent.as_ref();
        }
        Redeclaration::Unique
    }

    /// First hit walking outward from this scope.
    pub fn get_member(&self, name: Symbol) -> Option<Rc<Binding>> {
        if let Some(b) = self.members.borrow().get(&name) {
            return Some(Rc::clone(b));
        }
        self.parent.as_ref().and_then(|p| p.get_member(name))
    }

    /// The binding declared at this level only, ignoring ancestors.
    pub fn get_member_local(&self, name: Symbol) -> Option<Rc<Binding>> {
        self.members.borrow().get(&name).cloned()
    }

    pub fn get_in_order(&self, i: usize) -> Option<Rc<Binding>> {
        self.members.borrow().get_index(i).map(|(_, v)| Rc::clone(v))
    }

    pub fn member_count(&self) -> usize {
        self.members.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_types::TypeContext;
    use lumen_util::DefIdGenerator;

    fn bottoms(ctx: &TypeContext) -> BottomTypes {
        BottomTypes {
            void: ctx.void(),
            int: ctx.int(),
            bool_: ctx.bool_ty(),
            char_: ctx.char_ty(),
            float: ctx.float(),
            self_ref: ctx.self_ref(),
        }
    }

    #[test]
    fn redeclaration_at_same_level_is_detected() {
        let ctx = TypeContext::new();
        let root = Environment::root(bottoms(&ctx));
        let mut ids = DefIdGenerator::new();
        let x = Symbol::intern("x");
        assert_eq!(root.redeclaration_state(x), Redeclaration::Unique);
        root.add_member(Binding::new(x, ids.next(), false));
        assert_eq!(root.redeclaration_state(x), Redeclaration::Redeclaration);
    }

    #[test]
    fn shadowing_in_child_scope_is_alias_not_redeclaration() {
        let ctx = TypeContext::new();
        let root = Environment::root(bottoms(&ctx));
        let mut ids = DefIdGenerator::new();
        let x = Symbol::intern("x");
        root.add_member(Binding::new(x, ids.next(), false));
        let child = root.generate_inner_environment();
        assert_eq!(child.redeclaration_state(x), Redeclaration::Alias);
    }

    #[test]
    fn get_member_walks_outward() {
        let ctx = TypeContext::new();
        let root = Environment::root(bottoms(&ctx));
        let mut ids = DefIdGenerator::new();
        let x = Symbol::intern("x");
        root.add_member(Binding::new(x, ids.next(), false));
        let child = root.generate_inner_environment();
        assert!(child.get_member(x).is_some());
        assert!(child.get_member_local(x).is_none());
    }

    #[test]
    fn get_in_order_reflects_insertion_order() {
        let ctx = TypeContext::new();
        let root = Environment::root(bottoms(&ctx));
        let mut ids = DefIdGenerator::new();
        let a = Symbol::intern("a");
        let b = Symbol::intern("b");
        root.add_member(Binding::new(a, ids.next(), false));
        root.add_member(Binding::new(b, ids.next(), false));
        assert_eq!(root.get_in_order(0).unwrap().name, a);
        assert_eq!(root.get_in_order(1).unwrap().name, b);
    }
}
