//! Test Utilities for the heapsnap Integration Suite
//!
//! Fixtures build small graphs on `SyntheticHeap`; helpers run a dump into
//! memory and parse the output back with serde so assertions work on records
//! rather than raw bytes.

#![allow(dead_code)]

use heapsnap::{
    ObjectId, ObjectModel, RecordEmitter, RecurseMode, Result, ScanConfig, SnapshotRecord,
    SyntheticHeap,
};
use std::io::{self, Write};

/// ============================================================================
/// HEAP FIXTURE
/// ============================================================================

/// A list holding two strings and itself
///
/// ```text
/// items ──▶ [ "first", "second", items ]
/// ```
pub struct SelfListFixture {
    pub heap: SyntheticHeap,
    pub list: ObjectId,
    pub first: ObjectId,
    pub second: ObjectId,
}

impl SelfListFixture {
    pub fn new() -> Self {
        let mut heap = SyntheticHeap::new();
        let first = heap.str(b"first");
        let second = heap.str(b"second");
        let list = heap.list(&[first, second], 4);
        heap.add_child(list, list);
        Self {
            heap,
            list,
            first,
            second,
        }
    }

    pub fn address(&self, id: ObjectId) -> u64 {
        self.heap.address(id).get()
    }
}

/// A container with one text leaf and one nested container
pub struct MixedContainerFixture {
    pub heap: SyntheticHeap,
    pub outer: ObjectId,
    pub text: ObjectId,
    pub inner: ObjectId,
}

impl MixedContainerFixture {
    pub fn new() -> Self {
        let mut heap = SyntheticHeap::new();
        let deep = heap.str(b"deep");
        let inner = heap.list(&[deep], 1);
        let text = heap.str(b"leaf");
        let outer = heap.list(&[text, inner], 2);
        Self {
            heap,
            outer,
            text,
            inner,
        }
    }
}

/// ============================================================================
/// DUMP HELPERS
/// ============================================================================

/// Emit `root` with `mode` into memory and return the raw output
pub fn emit_bytes(heap: &SyntheticHeap, root: ObjectId, mode: RecurseMode) -> Result<Vec<u8>> {
    let mut emitter = RecordEmitter::new(heap, Vec::new());
    emitter.emit(root, mode)?;
    Ok(emitter.into_inner())
}

/// Emit `root` with `mode` and parse every line
pub fn emit_records(
    heap: &SyntheticHeap,
    root: ObjectId,
    mode: RecurseMode,
) -> Result<Vec<SnapshotRecord>> {
    let bytes = emit_bytes(heap, root, mode)?;
    let text = String::from_utf8(bytes).expect("snapshot output must be ASCII");
    SnapshotRecord::parse_stream(&text)
}

/// Config with a given recursion mode and default everything else
pub fn config_with(recurse: RecurseMode) -> ScanConfig {
    ScanConfig {
        recurse,
        ..Default::default()
    }
}

/// Assert every output line is valid JSON with the required keys
pub fn assert_well_formed(output: &[u8]) {
    let text = std::str::from_utf8(output).expect("snapshot output must be ASCII");
    for line in text.lines() {
        let value: serde_json::Value =
            serde_json::from_str(line).unwrap_or_else(|e| panic!("bad line {:?}: {}", line, e));
        for key in ["address", "type", "size", "refs"] {
            assert!(value.get(key).is_some(), "missing {} in {}", key, line);
        }
        assert!(line.ends_with("]}"), "refs must close the record: {}", line);
    }
}

/// ============================================================================
/// SINKS
/// ============================================================================

/// Sink that accepts `budget` bytes and then fails every write
pub struct FailingWriter {
    pub written: Vec<u8>,
    budget: usize,
}

impl FailingWriter {
    pub fn new(budget: usize) -> Self {
        Self {
            written: Vec::new(),
            budget,
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.budget {
            return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
