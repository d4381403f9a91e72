//! Synthetic Heap - an in-memory object graph implementing [`ObjectModel`]
//!
//! Useful wherever a real runtime is not at hand: fixtures, benchmarks, and
//! replaying a graph recovered from elsewhere. The convenience constructors
//! model a 64-bit interpreter with CPython-2-like layouts:
//!
//! | Kind      | basic size | GC | layout                                 |
//! |-----------|------------|----|----------------------------------------|
//! | list      | 40         | yes| Sequence, 8-byte slots                 |
//! | tuple     | 24         | yes| GenericVariable, 8-byte items          |
//! | set       | 200        | yes| Set, 8-slot inline table, 16-byte slot |
//! | dict      | 248        | yes| Map, 8-slot inline table, 24-byte slot |
//! | str       | 37         | no | Text, 1 byte per char                  |
//! | unicode   | 48         | no | Text, 2 bytes per code unit            |
//! | int       | 24         | no | Fixed                                  |
//! | object    | 16         | no | Fixed                                  |
//! | module    | 56         | yes| Fixed                                  |
//! | type      | 872        | yes| Fixed                                  |
//!
//! Children are attached after creation so cycles, including self
//! references, are easy to build.

use super::{
    Address, Layout, MembershipError, ObjectModel, Scalar, TableInfo, Text, TypeDescriptor,
    TypeFlags,
};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// First address handed out
pub const BASE_ADDRESS: u64 = 0x10_0000;

/// Distance between consecutive synthetic addresses
pub const ADDRESS_STRIDE: u64 = 64;

pub const POINTER_WIDTH: u64 = 8;
pub const GC_HEADER_SIZE: u64 = 24;

const SMALL_TABLE_SLOTS: u64 = 8;
const SMALL_TABLE_FILL: usize = 5;

/// Handle into a [`SyntheticHeap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextData {
    Narrow(Vec<u8>),
    Wide(Vec<u16>),
}

impl TextData {
    fn as_text(&self) -> Text<'_> {
        match self {
            TextData::Narrow(bytes) => Text::Narrow(bytes),
            TextData::Wide(units) => Text::Wide(units),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScalarData {
    Text(TextData),
    Int(i64),
    Label(String),
}

/// Equality behaviour of a synthetic object
#[derive(Debug, Clone, PartialEq, Eq)]
enum Equality {
    Identity,
    Key(String),
    Unhashable,
}

/// Description of one object to insert into a [`SyntheticHeap`]
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    type_name: String,
    basic_size: u64,
    flags: TypeFlags,
    layout: Layout,
    length: Option<u64>,
    name: Option<TextData>,
    scalar: Option<ScalarData>,
    self_size: Option<u64>,
    builtin_type: bool,
    equality: Equality,
}

impl ObjectSpec {
    /// A fixed-size object with no capabilities
    pub fn new(type_name: impl Into<String>, basic_size: u64) -> Self {
        Self {
            type_name: type_name.into(),
            basic_size,
            flags: TypeFlags::empty(),
            layout: Layout::Fixed,
            length: None,
            name: None,
            scalar: None,
            self_size: None,
            builtin_type: false,
            equality: Equality::Identity,
        }
    }

    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Logical length; also sets `HAS_LENGTH`
    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self.flags = self.flags | TypeFlags::HAS_LENGTH;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(TextData::Narrow(name.into().into_bytes()));
        self
    }

    pub fn text(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.scalar = Some(ScalarData::Text(TextData::Narrow(bytes.into())));
        self
    }

    pub fn wide_text(mut self, units: impl Into<Vec<u16>>) -> Self {
        self.scalar = Some(ScalarData::Text(TextData::Wide(units.into())));
        self
    }

    pub fn int(mut self, value: i64) -> Self {
        self.scalar = Some(ScalarData::Int(value));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.scalar = Some(ScalarData::Label(label.into()));
        self
    }

    /// Size the object reports for itself, like `__sizeof__`
    pub fn self_size(mut self, size: u64) -> Self {
        self.self_size = Some(size);
        self
    }

    /// Mark as the type object of a builtin type
    pub fn builtin_type(mut self) -> Self {
        self.builtin_type = true;
        self
    }

    /// Objects sharing a key compare equal
    pub fn eq_key(mut self, key: impl Into<String>) -> Self {
        self.equality = Equality::Key(key.into());
        self
    }

    /// Equality tests involving this object fail
    pub fn unhashable(mut self) -> Self {
        self.equality = Equality::Unhashable;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    address: u64,
    spec: ObjectSpec,
    children: Vec<ObjectId>,
}

/// In-memory object graph
#[derive(Debug, Clone)]
pub struct SyntheticHeap {
    nodes: Vec<Node>,
    gc_header_size: u64,
}

impl Default for SyntheticHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticHeap {
    pub fn new() -> Self {
        Self::with_gc_header(GC_HEADER_SIZE)
    }

    pub fn with_gc_header(gc_header_size: u64) -> Self {
        Self {
            nodes: Vec::new(),
            gc_header_size,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert an object and return its handle
    pub fn insert(&mut self, spec: ObjectSpec) -> ObjectId {
        let id = ObjectId(self.nodes.len());
        let address = BASE_ADDRESS + (id.0 as u64) * ADDRESS_STRIDE;
        self.nodes.push(Node {
            address,
            spec,
            children: Vec::new(),
        });
        id
    }

    /// Append a reference from `parent` to `child`; enables traversal
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) {
        let node = self.node_mut(parent);
        node.spec.flags = node.spec.flags | TypeFlags::HAS_TRAVERSE;
        node.children.push(child);
    }

    /// Replace the references of `parent`; enables traversal
    pub fn set_children(&mut self, parent: ObjectId, children: Vec<ObjectId>) {
        let node = self.node_mut(parent);
        node.spec.flags = node.spec.flags | TypeFlags::HAS_TRAVERSE;
        node.children = children;
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        &self.node(id).children
    }

    /// Every handle in insertion order
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.nodes.len()).map(ObjectId)
    }

    /// Handles of GC-tracked objects, like a collector's object list
    ///
    /// Untracked leaves such as strings and ints never show up here.
    pub fn gc_objects(&self) -> Vec<ObjectId> {
        self.ids()
            .filter(|&id| self.node(id).spec.flags.contains(TypeFlags::HAVE_GC))
            .collect()
    }

    // === Convenience constructors ===

    /// `list` with the given allocated capacity; `capacity` is raised to the
    /// item count when smaller
    pub fn list(&mut self, items: &[ObjectId], capacity: u64) -> ObjectId {
        let capacity = capacity.max(items.len() as u64);
        let id = self.insert(
            ObjectSpec::new("list", 40)
                .flags(TypeFlags::HAVE_GC | TypeFlags::HAS_TRAVERSE)
                .layout(Layout::Sequence {
                    capacity,
                    pointer_width: POINTER_WIDTH,
                })
                .length(items.len() as u64),
        );
        self.set_children(id, items.to_vec());
        id
    }

    pub fn tuple(&mut self, items: &[ObjectId]) -> ObjectId {
        let id = self.insert(
            ObjectSpec::new("tuple", 24)
                .flags(TypeFlags::HAVE_GC | TypeFlags::HAS_TRAVERSE | TypeFlags::VARIABLE_SIZED)
                .layout(Layout::GenericVariable {
                    item_stride: POINTER_WIDTH,
                })
                .length(items.len() as u64),
        );
        self.set_children(id, items.to_vec());
        id
    }

    pub fn set(&mut self, items: &[ObjectId]) -> ObjectId {
        let id = self.insert(ObjectSpec::new("set", 200));
        let table = self.table_for(id, items.len(), 16);
        self.replace_layout(id, Layout::Set(table), items.len());
        self.set_children(id, items.to_vec());
        id
    }

    /// `dict`; children are visited key, value, key, value
    pub fn dict(&mut self, entries: &[(ObjectId, ObjectId)]) -> ObjectId {
        let id = self.insert(ObjectSpec::new("dict", 248));
        let table = self.table_for(id, entries.len(), 24);
        self.replace_layout(id, Layout::Map(table), entries.len());
        let children = entries.iter().flat_map(|&(k, v)| [k, v]).collect();
        self.set_children(id, children);
        id
    }

    /// Narrow string; equal contents compare equal
    pub fn str(&mut self, bytes: &[u8]) -> ObjectId {
        self.insert(
            ObjectSpec::new("str", 37)
                .layout(Layout::Text {
                    chars: bytes.len() as u64,
                    char_width: 1,
                })
                .length(bytes.len() as u64)
                .text(bytes.to_vec())
                .eq_key(format!("str:{}", String::from_utf8_lossy(bytes))),
        )
    }

    /// Wide string of 16-bit code units
    pub fn unicode(&mut self, units: &[u16]) -> ObjectId {
        self.insert(
            ObjectSpec::new("unicode", 48)
                .layout(Layout::Text {
                    chars: units.len() as u64,
                    char_width: 2,
                })
                .length(units.len() as u64)
                .wide_text(units.to_vec())
                .eq_key(format!("unicode:{}", String::from_utf16_lossy(units))),
        )
    }

    pub fn int(&mut self, value: i64) -> ObjectId {
        self.insert(
            ObjectSpec::new("int", 24)
                .int(value)
                .eq_key(format!("int:{}", value)),
        )
    }

    pub fn bool(&mut self, value: bool) -> ObjectId {
        let label = if value { "True" } else { "False" };
        self.insert(
            ObjectSpec::new("bool", 24)
                .label(label)
                .eq_key(format!("int:{}", value as i64)),
        )
    }

    /// Bare `object()` instance
    pub fn object(&mut self) -> ObjectId {
        self.insert(ObjectSpec::new("object", 16))
    }

    /// Module referencing its namespace dict
    pub fn module(&mut self, name: &str, namespace: ObjectId) -> ObjectId {
        let id = self.insert(
            ObjectSpec::new("module", 56)
                .flags(TypeFlags::HAVE_GC)
                .name(name),
        );
        self.add_child(id, namespace);
        id
    }

    /// Type object; `builtin` types are not heap types
    pub fn type_object(&mut self, name: &str, builtin: bool) -> ObjectId {
        let mut spec = ObjectSpec::new("type", 872)
            .flags(TypeFlags::HAVE_GC | TypeFlags::HAS_TRAVERSE)
            .name(name);
        if builtin {
            spec = spec.builtin_type();
        }
        self.insert(spec)
    }

    // === Internals ===

    fn node(&self, id: ObjectId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ObjectId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn table_for(&self, id: ObjectId, used: usize, entry_width: u64) -> TableInfo {
        let inline_ptr = self.node(id).address + 16;
        if used <= SMALL_TABLE_FILL {
            return TableInfo {
                table_ptr: inline_ptr,
                inline_ptr,
                slots: SMALL_TABLE_SLOTS,
                entry_width,
            };
        }
        // Tables grow to the next power of two above four times the fill.
        let slots = ((used as u64) * 4 + 1).next_power_of_two();
        TableInfo {
            table_ptr: inline_ptr | 0x8000_0000_0000,
            inline_ptr,
            slots,
            entry_width,
        }
    }

    fn replace_layout(&mut self, id: ObjectId, layout: Layout, len: usize) {
        let node = self.node_mut(id);
        node.spec.layout = layout;
        node.spec.length = Some(len as u64);
        node.spec.flags = node.spec.flags
            | TypeFlags::HAVE_GC
            | TypeFlags::HAS_LENGTH
            | TypeFlags::HAS_TRAVERSE;
    }
}

impl ObjectModel for SyntheticHeap {
    type Handle = ObjectId;

    fn address(&self, handle: ObjectId) -> Address {
        Address(self.node(handle).address)
    }

    fn type_of(&self, handle: ObjectId) -> TypeDescriptor<'_> {
        let spec = &self.node(handle).spec;
        TypeDescriptor::new(&spec.type_name, spec.basic_size, spec.flags)
    }

    fn gc_header_size(&self) -> u64 {
        self.gc_header_size
    }

    fn layout(&self, handle: ObjectId) -> Layout {
        self.node(handle).spec.layout
    }

    fn length(&self, handle: ObjectId) -> Option<u64> {
        self.node(handle).spec.length
    }

    fn name(&self, handle: ObjectId) -> Option<Text<'_>> {
        self.node(handle).spec.name.as_ref().map(TextData::as_text)
    }

    fn scalar(&self, handle: ObjectId) -> Option<Scalar<'_>> {
        self.node(handle).spec.scalar.as_ref().map(|scalar| match scalar {
            ScalarData::Text(text) => Scalar::Text(text.as_text()),
            ScalarData::Int(value) => Scalar::Int(*value),
            ScalarData::Label(label) => Scalar::Label(label),
        })
    }

    fn visit_children(&self, handle: ObjectId, visit: &mut dyn FnMut(ObjectId)) -> bool {
        let node = self.node(handle);
        if !node.spec.flags.contains(TypeFlags::HAS_TRAVERSE) {
            return false;
        }
        for &child in &node.children {
            visit(child);
        }
        true
    }

    fn self_reported_size(&self, handle: ObjectId) -> Option<u64> {
        self.node(handle).spec.self_size
    }

    fn value_eq(&self, a: ObjectId, b: ObjectId) -> Result<bool, MembershipError> {
        if a == b {
            return Ok(true);
        }
        let (left, right) = (&self.node(a).spec, &self.node(b).spec);
        match (&left.equality, &right.equality) {
            (Equality::Unhashable, _) | (_, Equality::Unhashable) => Err(MembershipError(
                format!("unhashable type: '{}'", left.type_name),
            )),
            (Equality::Key(l), Equality::Key(r)) => Ok(l == r),
            _ => Ok(false),
        }
    }

    fn value_hash(&self, handle: ObjectId) -> Option<u64> {
        let node = self.node(handle);
        let mut hasher = FxHasher::default();
        match &node.spec.equality {
            Equality::Identity => node.address.hash(&mut hasher),
            Equality::Key(key) => key.hash(&mut hasher),
            Equality::Unhashable => return None,
        }
        Some(hasher.finish())
    }

    fn is_builtin_type_object(&self, handle: ObjectId) -> bool {
        self.node(handle).spec.builtin_type
    }
}
