//! Definition identifiers handed out to every declaration the elaborator
//! registers (variables, functions, classes, impls, type aliases).

use crate::define_idx;
use crate::index::Idx;

define_idx!(DefId);

impl DefId {
    pub const DUMMY: DefId = DefId::new(u32::MAX as usize);
}

/// Hands out fresh [`DefId`]s in declaration order within one compilation.
#[derive(Default)]
pub struct DefIdGenerator {
    next: u32,
}

impl DefIdGenerator {
    pub fn new() -> Self {
        DefIdGenerator { next: 0 }
    }

    pub fn next(&mut self) -> DefId {
        let id = DefId::new(self.next as usize);
        self.next = self
            .next
            .checked_add(1)
            .expect("exhausted DefId space");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_assigned_in_order_and_distinct() {
        let mut gen = DefIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }
}
