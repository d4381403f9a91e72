//! Size Module - shallow footprint of one object
//!
//! The footprint is what the allocator actually handed out for the object,
//! not what it logically holds: a list with room for eight entries costs
//! eight slots even when it holds one.
//!
//! # Rules (first match wins)
//!
//! 1. Sequence: `base + capacity * pointer_width`
//! 2. Set: `base + slots * entry_width` when the table is heap allocated
//! 3. Map: as Set
//! 4. Text: `base + chars * char_width`
//! 5. Overrides: registered hook for the type name, then self-reported size,
//!    each plus the GC header when the type has one, never below `base`
//! 6. GenericVariable: `base + length * item_stride`, undefined length is 0
//! 7. Fixed: `base`
//!
//! `base` is the declared basic size plus the GC header for GC-tracked types.

pub mod overrides;

pub use overrides::SizeOverrides;

use crate::object::{Layout, ObjectModel};

/// Shallow size of `handle` with no overrides registered
#[inline]
pub fn size_of<M: ObjectModel>(model: &M, handle: M::Handle) -> u64 {
    SizeCalculator::new(model).size_of(handle)
}

/// Computes shallow footprints against one object model
pub struct SizeCalculator<'a, M: ObjectModel> {
    model: &'a M,
    overrides: Option<&'a SizeOverrides<M::Handle>>,
}

impl<'a, M: ObjectModel> SizeCalculator<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            overrides: None,
        }
    }

    pub fn with_overrides(model: &'a M, overrides: &'a SizeOverrides<M::Handle>) -> Self {
        Self {
            model,
            overrides: Some(overrides),
        }
    }

    /// Fixed footprint: basic size plus the GC header if tracked
    pub fn base_size(&self, handle: M::Handle) -> u64 {
        let ty = self.model.type_of(handle);
        self.with_gc_header(ty.has_gc(), ty.basic_size)
    }

    pub fn size_of(&self, handle: M::Handle) -> u64 {
        let base = self.base_size(handle);

        match self.model.layout(handle) {
            Layout::Sequence {
                capacity,
                pointer_width,
            } => base.saturating_add(capacity.saturating_mul(pointer_width)),
            Layout::Set(table) | Layout::Map(table) => {
                if table.is_heap_allocated() {
                    base.saturating_add(table.slots.saturating_mul(table.entry_width))
                } else {
                    base
                }
            },
            Layout::Text { chars, char_width } => {
                base.saturating_add(chars.saturating_mul(char_width))
            },
            Layout::GenericVariable { item_stride } => match self.override_size(handle) {
                Some(size) => size,
                None => {
                    let items = self.model.length(handle).unwrap_or(0);
                    base.saturating_add(items.saturating_mul(item_stride))
                },
            },
            Layout::Fixed => self.override_size(handle).unwrap_or(base),
        }
    }

    fn override_size(&self, handle: M::Handle) -> Option<u64> {
        let ty = self.model.type_of(handle);
        let reported = self
            .overrides
            .and_then(|overrides| overrides.lookup(ty.name, handle))
            .or_else(|| self.model.self_reported_size(handle))?;
        let base = self.with_gc_header(ty.has_gc(), ty.basic_size);
        Some(self.with_gc_header(ty.has_gc(), reported).max(base))
    }

    #[inline]
    fn with_gc_header(&self, has_gc: bool, size: u64) -> u64 {
        if has_gc {
            size.saturating_add(self.model.gc_header_size())
        } else {
            size
        }
    }
}
