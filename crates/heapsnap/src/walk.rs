//! Walk Module - root-driven snapshot passes
//!
//! The emitter never deduplicates; whoever picks the roots is responsible for
//! dumping each object at most once. These helpers are the two usual ways of
//! doing that:
//!
//! - [`dump_roots`]: trust the root list (e.g. a collector's list of tracked
//!   objects) and let the recursion mode pick up untracked leaves.
//! - [`dump_all_referenced`]: follow every edge from the roots, remembering
//!   addresses already written. Smaller output, but the seen set costs memory
//!   proportional to the heap.

use crate::error::Result;
use crate::logging::{log_event, ScanEvent};
use crate::object::{Address, ObjectModel};
use crate::scanner::emitter::{DumpStats, RecordEmitter};
use crate::scanner::exclusion::ExclusionFilter;
use crate::scanner::referents::referents;
use crate::scanner::RecurseMode;
use rustc_hash::FxHashSet;
use std::io::Write;
use std::time::Instant;

/// Dump `prelude` unfiltered, then every root with the emitter's exclusion
/// and recursion mode
///
/// The prelude holds the objects the exclusion collection keeps out of the
/// main pass, so they still appear exactly once in the snapshot.
pub fn dump_roots<M, W>(
    emitter: &mut RecordEmitter<'_, M, W>,
    prelude: &[M::Handle],
    roots: &[M::Handle],
) -> Result<DumpStats>
where
    M: ObjectModel,
    W: Write,
{
    let started = Instant::now();
    let before = emitter.stats();
    log_event(ScanEvent::DumpStart {
        roots: prelude.len() + roots.len(),
        mode: emitter.recurse_mode().to_string(),
    });

    let exclusion = emitter.exclusion();
    emitter.set_exclusion(ExclusionFilter::none());
    let prelude_result = prelude
        .iter()
        .try_for_each(|&handle| emitter.emit(handle, RecurseMode::NoRecurse));
    emitter.set_exclusion(exclusion);
    prelude_result?;

    for &root in roots {
        emitter.dump(root)?;
    }

    let stats = delta(before, emitter.stats());
    finish(stats, started);
    Ok(stats)
}

/// Dump everything reachable from `roots`, each address once
///
/// Objects are written without recursion; the walk itself reaches every
/// neighbour. Excluded objects are not written but their children are still
/// followed.
pub fn dump_all_referenced<M, W>(
    emitter: &mut RecordEmitter<'_, M, W>,
    roots: &[M::Handle],
) -> Result<DumpStats>
where
    M: ObjectModel,
    W: Write,
{
    let started = Instant::now();
    let before = emitter.stats();
    log_event(ScanEvent::DumpStart {
        roots: roots.len(),
        mode: "all-referenced".to_string(),
    });

    let model = emitter.model();
    let mut seen: FxHashSet<Address> = FxHashSet::default();
    let mut pending: Vec<M::Handle> = roots.iter().rev().copied().collect();

    while let Some(next) = pending.pop() {
        if !seen.insert(model.address(next)) {
            continue;
        }
        emitter.emit(next, RecurseMode::NoRecurse)?;
        let children = referents(model, next);
        pending.extend(
            children
                .into_iter()
                .rev()
                .filter(|&child| !seen.contains(&model.address(child))),
        );
    }

    let stats = delta(before, emitter.stats());
    finish(stats, started);
    Ok(stats)
}

/// Every object reachable from `root`, once each, in first-visit order
pub fn recursive_items<M: ObjectModel>(model: &M, root: M::Handle) -> Vec<M::Handle> {
    let mut items = Vec::new();
    let mut seen: FxHashSet<Address> = FxHashSet::default();
    let mut pending = vec![root];

    while let Some(item) = pending.pop() {
        if !seen.insert(model.address(item)) {
            continue;
        }
        items.push(item);
        let children = referents(model, item);
        pending.extend(
            children
                .into_iter()
                .rev()
                .filter(|&child| !seen.contains(&model.address(child))),
        );
    }
    items
}

fn delta(before: DumpStats, after: DumpStats) -> DumpStats {
    DumpStats {
        records: after.records - before.records,
        excluded: after.excluded - before.excluded,
        edges: after.edges - before.edges,
        bytes: after.bytes - before.bytes,
    }
}

fn finish(stats: DumpStats, started: Instant) {
    log_event(ScanEvent::DumpEnd {
        records: stats.records,
        excluded: stats.excluded,
        bytes: stats.bytes,
        duration_ms: started.elapsed().as_secs_f64() * 1000.0,
    });
}
