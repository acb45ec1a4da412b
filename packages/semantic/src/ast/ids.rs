//! Declaration arena.
//!
//! The specification's C++ source links declarations together with raw
//! back-pointers (`container`, `base_struct`, `vtable_owner`,
//! `original_decl`). Per the design notes (§9 "Replace back-pointer graphs
//! with arenas + indices"), every [`Decl`](super::decl::Decl) here lives in
//! one flat [`DeclArena`] and is addressed by a [`DeclId`]; the logical
//! graph becomes index-keyed relations instead of pointers, so nothing can
//! outlive its owner.

use super::decl::Decl;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        DeclArena::default()
    }

    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len() as u32).map(DeclId)
    }
}

impl Index<DeclId> for DeclArena {
    type Output = Decl;
    fn index(&self, id: DeclId) -> &Decl {
        self.get(id)
    }
}

impl IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Decl {
        self.get_mut(id)
    }
}
