//! Object Module - the view of a managed heap the scanner works against
//!
//! The scanner never touches process memory itself. Everything it needs to
//! know about an object comes through the [`ObjectModel`] trait, which a
//! runtime binding implements for its own object representation.
//!
//! # Layout Dispatch
//!
//! ```text
//! Layout::Sequence        base + capacity * pointer_width
//! Layout::Set / Map       base + slots * entry_width   (heap table only)
//! Layout::Text            base + chars * char_width
//! Layout::GenericVariable base + length * item_stride
//! Layout::Fixed           base
//!
//! base = basic_size + gc_header_size (if HAVE_GC)
//! ```

pub mod synthetic;

pub use synthetic::{ObjectId, ObjectSpec, SyntheticHeap};

use std::fmt;

/// Stable numeric identity of one live object
///
/// Only meaningful for the duration of one dump pass: the runtime may reuse
/// an address once the object it named is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u64);

impl Address {
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

/// Capability bits carried by a [`TypeDescriptor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TypeFlags(u8);

impl TypeFlags {
    /// Instances carry a cyclic-GC bookkeeping header
    pub const HAVE_GC: TypeFlags = TypeFlags(1 << 0);
    /// Instances answer a length query
    pub const HAS_LENGTH: TypeFlags = TypeFlags(1 << 1);
    /// Instances can enumerate the objects they reference
    pub const HAS_TRAVERSE: TypeFlags = TypeFlags(1 << 2);
    /// Instances have inline items of a fixed stride
    pub const VARIABLE_SIZED: TypeFlags = TypeFlags(1 << 3);

    #[inline]
    pub const fn empty() -> Self {
        TypeFlags(0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: TypeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: TypeFlags) -> Self {
        TypeFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for TypeFlags {
    type Output = TypeFlags;

    fn bitor(self, rhs: TypeFlags) -> TypeFlags {
        self.union(rhs)
    }
}

/// Static description of an object's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor<'a> {
    /// Type name as the runtime reports it
    pub name: &'a str,
    /// Declared fixed footprint of an instance, without the GC header
    pub basic_size: u64,
    pub flags: TypeFlags,
}

impl<'a> TypeDescriptor<'a> {
    pub const fn new(name: &'a str, basic_size: u64, flags: TypeFlags) -> Self {
        Self {
            name,
            basic_size,
            flags,
        }
    }

    #[inline]
    pub const fn has_gc(&self) -> bool {
        self.flags.contains(TypeFlags::HAVE_GC)
    }

    #[inline]
    pub const fn has_length(&self) -> bool {
        self.flags.contains(TypeFlags::HAS_LENGTH)
    }

    #[inline]
    pub const fn has_traverse(&self) -> bool {
        self.flags.contains(TypeFlags::HAS_TRAVERSE)
    }
}

/// Hash-table storage of a set or map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    /// Address of the table currently in use
    pub table_ptr: u64,
    /// Address of the small table embedded in the object itself
    pub inline_ptr: u64,
    /// Number of slots in the table (mask + 1)
    pub slots: u64,
    /// Bytes per slot
    pub entry_width: u64,
}

impl TableInfo {
    /// True when the table lives in a separate heap allocation
    #[inline]
    pub const fn is_heap_allocated(&self) -> bool {
        self.table_ptr != self.inline_ptr
    }
}

/// Structural category of an object, resolved by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Dynamic array of references; `capacity` is the allocated slot count
    Sequence { capacity: u64, pointer_width: u64 },
    Set(TableInfo),
    Map(TableInfo),
    /// Narrow or wide character buffer
    Text { chars: u64, char_width: u64 },
    /// Inline items of a fixed stride; item count comes from `length`
    GenericVariable { item_stride: u64 },
    Fixed,
}

/// A borrowed character buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text<'a> {
    /// One byte per character
    Narrow(&'a [u8]),
    /// One 16-bit code unit per character
    Wide(&'a [u16]),
}

impl Text<'_> {
    /// Character count (bytes or code units)
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Text::Narrow(bytes) => bytes.len(),
            Text::Wide(units) => units.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload worth recording in an object's `value` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar<'a> {
    /// Character data; recorded with its length
    Text(Text<'a>),
    /// Machine integer
    Int(i64),
    /// Short descriptive string, e.g. `True` for a boolean or the code name
    /// of an execution frame
    Label(&'a str),
}

/// Raised by a provider when two objects cannot be compared for equality
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("objects are not comparable: {0}")]
pub struct MembershipError(pub String);

/// Object-model provider
///
/// Answers every question the scanner asks about a live object. Handles are
/// borrowed tokens: cheap to copy, valid for the duration of one call into
/// the scanner, and never stored past it.
pub trait ObjectModel {
    type Handle: Copy + fmt::Debug;

    /// Identity of the object
    fn address(&self, handle: Self::Handle) -> Address;

    fn type_of(&self, handle: Self::Handle) -> TypeDescriptor<'_>;

    /// Size of the GC bookkeeping header prepended to `HAVE_GC` objects
    fn gc_header_size(&self) -> u64;

    fn layout(&self, handle: Self::Handle) -> Layout;

    /// Logical length, or `None` where length is undefined for the object
    fn length(&self, handle: Self::Handle) -> Option<u64>;

    /// Name of modules, functions and types
    fn name(&self, handle: Self::Handle) -> Option<Text<'_>> {
        let _ = handle;
        None
    }

    fn scalar(&self, handle: Self::Handle) -> Option<Scalar<'_>> {
        let _ = handle;
        None
    }

    /// Call `visit` once per directly referenced object, in the runtime's
    /// traversal order
    ///
    /// Returns `false` without calling `visit` when the type cannot enumerate
    /// its children.
    fn visit_children(&self, handle: Self::Handle, visit: &mut dyn FnMut(Self::Handle)) -> bool;

    /// Footprint the object reports for itself, without the GC header
    fn self_reported_size(&self, handle: Self::Handle) -> Option<u64> {
        let _ = handle;
        None
    }

    /// Value equality as the runtime defines it
    ///
    /// Defaults to identity.
    fn value_eq(
        &self,
        a: Self::Handle,
        b: Self::Handle,
    ) -> Result<bool, MembershipError> {
        Ok(self.address(a) == self.address(b))
    }

    /// Hash consistent with [`value_eq`](ObjectModel::value_eq)
    ///
    /// Objects that compare equal must hash equal. `None` means the object
    /// has no usable hash; exclusion then falls back to comparing it against
    /// every member.
    fn value_hash(&self, handle: Self::Handle) -> Option<u64> {
        let _ = handle;
        None
    }

    /// True for type objects of builtin types, which a root enumerator never
    /// reports on its own
    fn is_builtin_type_object(&self, handle: Self::Handle) -> bool {
        let _ = handle;
        false
    }
}

impl<M: ObjectModel + ?Sized> ObjectModel for &M {
    type Handle = M::Handle;

    fn address(&self, handle: Self::Handle) -> Address {
        (**self).address(handle)
    }

    fn type_of(&self, handle: Self::Handle) -> TypeDescriptor<'_> {
        (**self).type_of(handle)
    }

    fn gc_header_size(&self) -> u64 {
        (**self).gc_header_size()
    }

    fn layout(&self, handle: Self::Handle) -> Layout {
        (**self).layout(handle)
    }

    fn length(&self, handle: Self::Handle) -> Option<u64> {
        (**self).length(handle)
    }

    fn name(&self, handle: Self::Handle) -> Option<Text<'_>> {
        (**self).name(handle)
    }

    fn scalar(&self, handle: Self::Handle) -> Option<Scalar<'_>> {
        (**self).scalar(handle)
    }

    fn visit_children(&self, handle: Self::Handle, visit: &mut dyn FnMut(Self::Handle)) -> bool {
        (**self).visit_children(handle, visit)
    }

    fn self_reported_size(&self, handle: Self::Handle) -> Option<u64> {
        (**self).self_reported_size(handle)
    }

    fn value_eq(
        &self,
        a: Self::Handle,
        b: Self::Handle,
    ) -> Result<bool, MembershipError> {
        (**self).value_eq(a, b)
    }

    fn value_hash(&self, handle: Self::Handle) -> Option<u64> {
        (**self).value_hash(handle)
    }

    fn is_builtin_type_object(&self, handle: Self::Handle) -> bool {
        (**self).is_builtin_type_object(handle)
    }
}
