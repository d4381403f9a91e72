//! Child Extractor - direct references of one object as a list
//!
//! Same enumeration hook the emitter uses for `refs`, exposed on its own for
//! callers building a graph without writing a snapshot.

use crate::object::{Address, ObjectModel};

/// Direct children of `handle` in visitation order
///
/// Duplicates and self references are kept. Empty when the type cannot
/// enumerate children.
pub fn referents<M: ObjectModel>(model: &M, handle: M::Handle) -> Vec<M::Handle> {
    let mut children = Vec::new();
    model.visit_children(handle, &mut |child| children.push(child));
    children
}

/// Addresses of the direct children of `handle`, in visitation order
pub fn referent_addresses<M: ObjectModel>(model: &M, handle: M::Handle) -> Vec<Address> {
    let mut addresses = Vec::new();
    model.visit_children(handle, &mut |child| addresses.push(model.address(child)));
    addresses
}
