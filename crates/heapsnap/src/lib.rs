//! # heapsnap - Heap Snapshot Scanner
//!
//! heapsnap writes an offline-analyzable snapshot of a live object graph. Every
//! visited object becomes one self-contained JSON-lines record carrying its
//! address, type, shallow size, an optional scalar payload, and the addresses
//! of the objects it references. Records stream to the sink as they are
//! produced; a separate tool loads them later to rebuild the graph.
//!
//! ## Overview
//!
//! - **Footprint**: shallow sizes that include allocator over-provisioning
//!   (list capacity, hash table slots, GC headers)
//! - **Bounded text**: string payloads are escaped and cut to 100 characters
//! - **Controlled reach**: a recursion mode decides which neighbours get a
//!   record of their own, so edges resolve without walking the whole heap
//!
//! The runtime is reached only through the [`ObjectModel`] trait.
//! [`SyntheticHeap`] implements it for an in-memory graph.
//!
//! ## Quick Start
//!
//! ```rust
//! use heapsnap::{RecordEmitter, RecurseMode, SnapshotRecord, SyntheticHeap};
//!
//! fn main() -> Result<(), heapsnap::ScanError> {
//!     let mut heap = SyntheticHeap::new();
//!     let a = heap.str(b"a");
//!     let b = heap.str(b"b");
//!     let lst = heap.list(&[a, b], 4);
//!
//!     let mut emitter = RecordEmitter::new(&heap, Vec::new());
//!     emitter.emit(lst, RecurseMode::LeafOnly)?;
//!
//!     let out = String::from_utf8_lossy(&emitter.into_inner()).into_owned();
//!     let records = SnapshotRecord::parse_stream(&out)?;
//!     assert_eq!(records.len(), 3);
//!     assert_eq!(records[0].type_name, "list");
//!     assert_eq!(records[0].len, Some(2));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌────────────────────┐
//! │  Root enumerator │─────▶│ Traversal policy   │◀──┐ one hop
//! │  (caller / walk) │      └─────────┬──────────┘───┘
//! └──────────────────┘                ▼
//!                           ┌────────────────────┐
//!                           │  Exclusion filter  │
//!                           └─────────┬──────────┘
//!                                     ▼
//!            ┌──────────────┐  ┌────────────┐  ┌──────────────┐
//!            │ Size calc    │─▶│  Emitter   │◀─│ Text escaper │
//!            └──────────────┘  └─────┬──────┘  └──────────────┘
//!                                    ▼
//!                              io::Write sink
//! ```
//!
//! ## Example: Full-heap Pass
//!
//! ```rust
//! use heapsnap::{walk, EqualitySet, RecordEmitter, ScanConfig, SyntheticHeap};
//!
//! let mut heap = SyntheticHeap::new();
//! let doc = heap.str(b"__doc__");
//! let ns = heap.dict(&[(doc, doc)]);
//! let _m = heap.module("app", ns);
//!
//! // Common strings are dumped once up front and skipped afterwards.
//! let nodump = EqualitySet::new(&heap, vec![doc]);
//! let mut emitter = RecordEmitter::with_config(&heap, Vec::new(), &ScanConfig::default())?
//!     .exclude(&nodump);
//! let stats = walk::dump_roots(&mut emitter, &[doc], &heap.gc_objects())?;
//! assert_eq!(stats.records, 3);
//! # Ok::<(), heapsnap::ScanError>(())
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Scan configuration and validation
//! - [`error`]: Error types
//! - [`logging`]: Scan events and the process-wide logger
//! - [`object`]: The object model trait and the synthetic heap
//! - [`record`]: Typed view of one output line
//! - [`scanner`]: Escaping, exclusion, record emission, and recursion policy
//! - [`size`]: Shallow size rules and overrides
//! - [`walk`]: Root-driven passes with deduplication
//!
//! ## Limitations
//!
//! - **No retained sizes**: sizes are shallow; aggregation is the reader's job
//! - **No concurrent mutation**: the graph must hold still during a dump

// Object model and sizing
pub mod object;
pub mod size;

// Serialization
pub mod record;
pub mod scanner;
pub mod walk;

// Support
pub mod config;
pub mod error;
pub mod logging;

pub use config::{ConfigError, ScanConfig};
pub use error::{Result, ScanError};
pub use object::{
    Address, Layout, ObjectId, ObjectModel, ObjectSpec, Scalar, SyntheticHeap, TableInfo, Text,
    TypeDescriptor, TypeFlags,
};
pub use record::{RecordValue, SnapshotRecord};
pub use scanner::{
    dump_object, referents, DumpStats, EqualitySet, ExclusionCollection, RecordEmitter,
    RecurseMode, TextEscaper,
};
pub use size::{size_of, SizeCalculator, SizeOverrides};
pub use walk::{dump_all_referenced, dump_roots, recursive_items};

/// heapsnap version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
