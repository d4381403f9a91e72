//! Size Overrides - per-type footprint hooks
//!
//! Some objects hold memory the object model cannot see, such as a
//! compressor's internal window buffers. An override registered under the
//! type name replaces the generic rules for those objects.

use indexmap::IndexMap;
use std::fmt;

type SizeHook<H> = Box<dyn Fn(H) -> Option<u64>>;

/// Registry of size hooks keyed by type name
///
/// A hook returning `None` declines, and the calculator falls back to the
/// object's self-reported size and then the generic rules.
///
/// # Example
///
/// ```rust
/// use heapsnap::{SizeOverrides, SyntheticHeap, ObjectSpec, SizeCalculator};
///
/// let mut heap = SyntheticHeap::new();
/// let obj = heap.insert(ObjectSpec::new("Compress", 64));
///
/// let mut overrides = SizeOverrides::new();
/// overrides.register("Compress", |_| Some(256_000));
///
/// let calc = SizeCalculator::with_overrides(&heap, &overrides);
/// assert_eq!(calc.size_of(obj), 256_000);
/// ```
pub struct SizeOverrides<H> {
    hooks: IndexMap<String, SizeHook<H>>,
}

impl<H> SizeOverrides<H> {
    pub fn new() -> Self {
        Self {
            hooks: IndexMap::new(),
        }
    }

    /// Register `hook` for `type_name`, replacing any previous hook
    pub fn register<F>(&mut self, type_name: impl Into<String>, hook: F)
    where
        F: Fn(H) -> Option<u64> + 'static,
    {
        self.hooks.insert(type_name.into(), Box::new(hook));
    }

    /// Drop the hook for `type_name`; returns whether one was registered
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.hooks.shift_remove(type_name).is_some()
    }

    /// Run the hook for `type_name`, if any
    pub fn lookup(&self, type_name: &str, handle: H) -> Option<u64> {
        self.hooks.get(type_name).and_then(|hook| hook(handle))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<H> Default for SizeOverrides<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for SizeOverrides<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeOverrides")
            .field("types", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_register_and_lookup() {
        let mut overrides: SizeOverrides<u32> = SizeOverrides::new();
        assert!(overrides.is_empty());

        overrides.register("Custom", |h| Some(u64::from(h) * 10));
        assert_eq!(overrides.lookup("Custom", 3), Some(30));
        assert_eq!(overrides.lookup("Other", 3), None);
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_declining_hook_is_still_called() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&calls);

        let mut overrides: SizeOverrides<u32> = SizeOverrides::new();
        overrides.register("Custom", move |h| {
            log.borrow_mut().push(h);
            None
        });

        assert_eq!(overrides.lookup("Custom", 7), None);
        assert_eq!(*calls.borrow(), vec![7]);
    }

    #[test]
    fn test_unregister() {
        let mut overrides: SizeOverrides<u32> = SizeOverrides::new();
        overrides.register("Custom", |_| Some(1));
        assert!(overrides.unregister("Custom"));
        assert!(!overrides.unregister("Custom"));
        assert_eq!(overrides.lookup("Custom", 0), None);
    }
}
