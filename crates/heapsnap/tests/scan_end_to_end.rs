//! End-to-end Tests - whole snapshots through real sinks
//!
//! A list holding two strings and itself is the reference graph: it has a
//! leaf, a duplicate-free edge list, and a self edge.

mod common;

use common::{assert_well_formed, config_with, emit_records, FailingWriter, SelfListFixture};
use heapsnap::{
    dump_all_referenced, dump_roots, EqualitySet, ObjectModel, RecordEmitter, RecordValue,
    RecurseMode, ScanError, SnapshotRecord, SyntheticHeap,
};
use std::io::{BufWriter, Write};

/// ============================================================================
/// REFERENCE GRAPH PER MODE
/// ============================================================================

#[test]
fn test_self_list_leaf_only() {
    let fx = SelfListFixture::new();
    let records = emit_records(&fx.heap, fx.list, RecurseMode::LeafOnly).unwrap();

    assert_eq!(records.len(), 3);
    let top = &records[0];
    assert_eq!(top.type_name, "list");
    assert_eq!(top.len, Some(2));
    assert_eq!(
        top.refs,
        vec![fx.address(fx.first), fx.address(fx.second), fx.address(fx.list)]
    );
    assert!(top.refs.contains(&top.address));

    assert_eq!(records[1].value, Some(RecordValue::Text("first".to_string())));
    assert_eq!(records[2].value, Some(RecordValue::Text("second".to_string())));
    assert_eq!(records[2].len, Some(6));
}

#[test]
fn test_self_list_one_layer_repeats_self() {
    let fx = SelfListFixture::new();
    let records = emit_records(&fx.heap, fx.list, RecurseMode::OneLayer).unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[3], records[0]);
}

#[test]
fn test_self_list_no_recurse() {
    let fx = SelfListFixture::new();
    let records = emit_records(&fx.heap, fx.list, RecurseMode::NoRecurse).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].refs.len(), 3);
}

/// ============================================================================
/// SINKS
/// ============================================================================

#[test]
fn test_file_sink_round_trip() -> anyhow::Result<()> {
    let fx = SelfListFixture::new();
    let file = tempfile::NamedTempFile::new()?;

    {
        let writer = BufWriter::new(file.reopen()?);
        let config = config_with(RecurseMode::OneLayer);
        let mut emitter = RecordEmitter::with_config(&fx.heap, writer, &config)?;
        emitter.dump(fx.list)?;
        emitter.sink_mut().flush()?;
    }

    let raw = std::fs::read(file.path())?;
    assert_well_formed(&raw);
    let records = SnapshotRecord::parse_stream(std::str::from_utf8(&raw)?)?;
    assert_eq!(records.len(), 4);
    Ok(())
}

#[test]
fn test_sink_failure_propagates_and_keeps_whole_records() {
    let fx = SelfListFixture::new();
    let mut first_record = Vec::new();
    RecordEmitter::new(&fx.heap, &mut first_record)
        .emit(fx.list, RecurseMode::NoRecurse)
        .unwrap();

    let mut sink = FailingWriter::new(first_record.len());
    let err = RecordEmitter::new(&fx.heap, &mut sink)
        .emit(fx.list, RecurseMode::OneLayer)
        .unwrap_err();

    assert!(matches!(err, ScanError::Sink(_)));
    assert!(err.is_sink_failure());
    assert_eq!(sink.written, first_record);
}

/// ============================================================================
/// WALKS
/// ============================================================================

#[test]
fn test_dump_all_referenced_dedups_self_list() {
    let fx = SelfListFixture::new();
    let mut emitter = RecordEmitter::new(&fx.heap, Vec::new());
    let stats = dump_all_referenced(&mut emitter, &[fx.list]).unwrap();

    assert_eq!(stats.records, 3);
    assert_eq!(stats.edges, 3);
    let text = String::from_utf8(emitter.into_inner()).unwrap();
    let mut addresses: Vec<u64> = SnapshotRecord::parse_stream(&text)
        .unwrap()
        .iter()
        .map(|r| r.address)
        .collect();
    addresses.sort_unstable();
    addresses.dedup();
    assert_eq!(addresses.len(), 3);
}

/// Every edge of a full pass resolves to a record when leaves are reached
/// through LeafOnly and common strings through the prelude
#[test]
fn test_full_pass_resolves_every_edge() {
    let mut heap = SyntheticHeap::new();
    let doc = heap.str(b"__doc__");
    let name = heap.str(b"name");
    let value = heap.int(3);
    let ns = heap.dict(&[(doc, doc), (name, value)]);
    let module = heap.module("app.models", ns);
    let holder = heap.list(&[module, ns], 2);
    heap.add_child(holder, holder);

    let nodump = EqualitySet::new(&heap, vec![doc]);
    let mut emitter = RecordEmitter::new(&heap, Vec::new()).exclude(&nodump);
    let stats = dump_roots(&mut emitter, &[doc], &heap.gc_objects()).unwrap();

    let text = String::from_utf8(emitter.into_inner()).unwrap();
    let records = SnapshotRecord::parse_stream(&text).unwrap();
    assert_eq!(stats.records as usize, records.len());

    let written: std::collections::HashSet<u64> = records.iter().map(|r| r.address).collect();
    for record in &records {
        for target in &record.refs {
            assert!(written.contains(target), "dangling edge to {}", target);
        }
    }
    // doc once from the prelude, never again
    let doc_address = heap.address(doc).get();
    assert_eq!(records.iter().filter(|r| r.address == doc_address).count(), 1);
    assert_eq!(records.iter().filter(|r| r.type_name == "module").count(), 1);
}
