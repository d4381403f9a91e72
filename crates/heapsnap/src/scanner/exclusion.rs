//! Exclusion Filter - the caller's "do not dump" collection
//!
//! Orchestrators dump a handful of ubiquitous objects (small ints, common
//! strings, builtin types) once up front and then pass them here so they are
//! not repeated for every root that touches them. The collection is itself a
//! live object, so it is excluded too.
//!
//! Membership is by value equality, not identity. An object that merely
//! equals an excluded one is skipped as well; this matches what the
//! collection semantics of most runtimes give for free and is accepted as an
//! approximation.

use crate::object::{Address, MembershipError, ObjectModel};
use rustc_hash::FxHashMap;

/// A borrowed "do not dump" collection
pub trait ExclusionCollection<H> {
    /// Address of the collection object itself, if it lives in the heap
    fn self_address(&self) -> Option<Address>;

    fn is_empty(&self) -> bool;

    /// Whether some member equals `candidate`
    fn contains(&self, candidate: H) -> Result<bool, MembershipError>;
}

/// Exclusion test used by the emitter for one top-level dump
pub struct ExclusionFilter<'a, H> {
    collection: Option<&'a dyn ExclusionCollection<H>>,
}

impl<H> Clone for ExclusionFilter<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for ExclusionFilter<'_, H> {}

impl<'a, H: Copy> ExclusionFilter<'a, H> {
    /// Filter that lets everything through
    pub const fn none() -> Self {
        Self { collection: None }
    }

    pub fn new(collection: &'a dyn ExclusionCollection<H>) -> Self {
        Self {
            collection: Some(collection),
        }
    }

    /// True when the filter can never exclude anything
    pub fn is_inactive(&self) -> bool {
        self.collection.map_or(true, |c| c.is_empty())
    }

    /// Whether the object at `address` must not be dumped
    ///
    /// A failed membership test counts as "not excluded".
    pub fn is_excluded(&self, address: Address, handle: H) -> bool {
        let collection = match self.collection {
            Some(c) if !c.is_empty() => c,
            _ => return false,
        };
        if collection.self_address() == Some(address) {
            return true;
        }
        match collection.contains(handle) {
            Ok(found) => found,
            Err(err) => {
                log::trace!("exclusion test for {} failed, keeping it: {}", address, err);
                false
            },
        }
    }
}

/// Exclusion collection comparing members through `ObjectModel::value_eq`
///
/// Members with a [`value_hash`](ObjectModel::value_hash) are bucketed by it,
/// so a hashable candidate is only compared against its own bucket and the
/// members that have no hash. A failed comparison against one member does not
/// stop the search; it is reported only when no member matched.
///
/// # Example
///
/// ```rust
/// use heapsnap::{EqualitySet, ExclusionCollection, SyntheticHeap};
///
/// let mut heap = SyntheticHeap::new();
/// let a = heap.str(b"__doc__");
/// let b = heap.str(b"__doc__");
///
/// let nodump = EqualitySet::new(&heap, vec![a]);
/// assert_eq!(nodump.contains(b), Ok(true));
/// ```
pub struct EqualitySet<'a, M: ObjectModel> {
    model: &'a M,
    members: Vec<M::Handle>,
    buckets: FxHashMap<u64, Vec<usize>>,
    unhashed: Vec<usize>,
    self_address: Option<Address>,
}

impl<'a, M: ObjectModel> EqualitySet<'a, M> {
    pub fn new(model: &'a M, members: Vec<M::Handle>) -> Self {
        let mut set = Self {
            model,
            members: Vec::with_capacity(members.len()),
            buckets: FxHashMap::default(),
            unhashed: Vec::new(),
            self_address: None,
        };
        for member in members {
            set.push(member);
        }
        set
    }

    /// Record the heap object that holds this collection
    pub fn with_self_address(mut self, address: Address) -> Self {
        self.self_address = Some(address);
        self
    }

    pub fn push(&mut self, member: M::Handle) {
        let index = self.members.len();
        self.members.push(member);
        match self.model.value_hash(member) {
            Some(hash) => self.buckets.entry(hash).or_default().push(index),
            None => self.unhashed.push(index),
        }
    }

    pub fn members(&self) -> &[M::Handle] {
        &self.members
    }

    fn first_match(
        &self,
        indices: impl Iterator<Item = usize>,
        candidate: M::Handle,
    ) -> Result<bool, MembershipError> {
        let mut failure = None;
        for index in indices {
            match self.model.value_eq(self.members[index], candidate) {
                Ok(true) => return Ok(true),
                Ok(false) => {},
                Err(err) => {
                    failure.get_or_insert(err);
                },
            }
        }
        failure.map_or(Ok(false), Err)
    }
}

impl<M: ObjectModel> ExclusionCollection<M::Handle> for EqualitySet<'_, M> {
    fn self_address(&self) -> Option<Address> {
        self.self_address
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn contains(&self, candidate: M::Handle) -> Result<bool, MembershipError> {
        match self.model.value_hash(candidate) {
            Some(hash) => {
                let bucket = self.buckets.get(&hash).map_or(&[][..], Vec::as_slice);
                self.first_match(bucket.iter().chain(&self.unhashed).copied(), candidate)
            },
            None => self.first_match(0..self.members.len(), candidate),
        }
    }
}
