//! Scanner Module - turning objects into snapshot records
//!
//! This module serializes one object at a time onto a byte sink and decides
//! which of its neighbours are serialized along with it.
//!
//! Components:
//! - Text escaper: bounded JSON string encoding of raw character buffers
//! - Exclusion filter: caller-supplied "do not dump" collection
//! - Record emitter: one JSON-lines record per object
//! - Traversal policy: how far a single dump reaches
//! - Child extractor: an object's direct references as a flat list
//!
//! Nothing here deduplicates. An object reachable from two roots is written
//! twice unless the caller tracks what it already dumped (see [`crate::walk`]).

pub mod emitter;
pub mod escape;
pub mod exclusion;
pub mod referents;
pub mod traversal;

pub use emitter::{dump_object, DumpStats, RecordEmitter};
pub use escape::{TextEscaper, MAX_TEXT_CHARS};
pub use exclusion::{EqualitySet, ExclusionCollection, ExclusionFilter};
pub use referents::{referent_addresses, referents};
pub use traversal::RecurseMode;
