//! Record Emitter - one JSON-lines record per visited object
//!
//! # Record Layout
//!
//! ```text
//! {"address": 140521, "type": "list", "size": 96, "len": 3, "refs": [1001, 1002, 1003]}
//!  ^ always           ^ always        ^ always    ^ optional  ^ always
//! ```
//!
//! Optional keys appear in this order: `name` (modules, functions, types),
//! then either `len` + `value` (text), `value` (integers and labels), or
//! `len` alone (anything else with a defined length).
//!
//! Each record is assembled in a scratch buffer and handed to the sink with a
//! single `write_all`, so records reach the sink whole and in emission order.
//! An encode failure discards the half-built record.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::logging::{log_event, ScanEvent};
use crate::object::{Address, ObjectModel, Scalar, Text};
use crate::scanner::escape::TextEscaper;
use crate::scanner::exclusion::{ExclusionCollection, ExclusionFilter};
use crate::scanner::referents::referents;
use crate::scanner::traversal::RecurseMode;
use crate::size::{SizeCalculator, SizeOverrides};
use std::fmt;
use std::io::Write;

/// Counters for one emitter's lifetime
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpStats {
    /// Records written to the sink
    pub records: u64,
    /// Objects skipped by the exclusion filter
    pub excluded: u64,
    /// Entries written into `refs` lists
    pub edges: u64,
    /// Bytes written to the sink
    pub bytes: u64,
}

/// Serializes objects of one model onto one sink
///
/// # Example
///
/// ```rust
/// use heapsnap::{RecordEmitter, RecurseMode, SyntheticHeap};
///
/// let mut heap = SyntheticHeap::new();
/// let s = heap.str(b"hi");
/// let lst = heap.list(&[s], 4);
///
/// let mut emitter = RecordEmitter::new(&heap, Vec::new());
/// emitter.emit(lst, RecurseMode::LeafOnly)?;
/// assert_eq!(emitter.stats().records, 2);
/// # Ok::<(), heapsnap::ScanError>(())
/// ```
pub struct RecordEmitter<'a, M: ObjectModel, W: Write> {
    model: &'a M,
    sink: W,
    sizes: SizeCalculator<'a, M>,
    escaper: TextEscaper,
    exclusion: ExclusionFilter<'a, M::Handle>,
    recurse: RecurseMode,
    verbose: bool,
    stats: DumpStats,
    line: Vec<u8>,
}

impl<'a, M: ObjectModel, W: Write> RecordEmitter<'a, M, W> {
    /// Emitter with the default configuration and no exclusions
    pub fn new(model: &'a M, sink: W) -> Self {
        let config = ScanConfig::default();
        Self::build(model, sink, &config)
    }

    /// Emitter using `config`, which is validated first
    pub fn with_config(model: &'a M, sink: W, config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(model, sink, config))
    }

    fn build(model: &'a M, sink: W, config: &ScanConfig) -> Self {
        Self {
            model,
            sink,
            sizes: SizeCalculator::new(model),
            escaper: TextEscaper::new(config.encode_limit),
            exclusion: ExclusionFilter::none(),
            recurse: config.recurse,
            verbose: config.verbose,
            stats: DumpStats::default(),
            line: Vec::with_capacity(256),
        }
    }

    /// Skip members of `collection` (and the collection itself)
    pub fn exclude(mut self, collection: &'a dyn ExclusionCollection<M::Handle>) -> Self {
        self.exclusion = ExclusionFilter::new(collection);
        self
    }

    /// Drop any exclusion collection
    pub fn without_exclusion(mut self) -> Self {
        self.exclusion = ExclusionFilter::none();
        self
    }

    /// Consult `overrides` when sizing objects
    pub fn size_overrides(mut self, overrides: &'a SizeOverrides<M::Handle>) -> Self {
        self.sizes = SizeCalculator::with_overrides(self.model, overrides);
        self
    }

    pub fn model(&self) -> &'a M {
        self.model
    }

    pub fn recurse_mode(&self) -> RecurseMode {
        self.recurse
    }

    pub fn exclusion(&self) -> ExclusionFilter<'a, M::Handle> {
        self.exclusion
    }

    pub(crate) fn set_exclusion(&mut self, exclusion: ExclusionFilter<'a, M::Handle>) {
        self.exclusion = exclusion;
    }

    pub fn stats(&self) -> DumpStats {
        self.stats
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Emit `handle` with the configured recursion mode
    pub fn dump(&mut self, handle: M::Handle) -> Result<()> {
        self.emit(handle, self.recurse)
    }

    /// Write the record for `handle`, then neighbour records per `mode`
    ///
    /// Writes nothing for excluded objects. Sink failures and encode
    /// overflows propagate; records already written stay on the sink.
    pub fn emit(&mut self, handle: M::Handle, mode: RecurseMode) -> Result<()> {
        let model = self.model;
        let address = model.address(handle);
        if self.exclusion.is_excluded(address, handle) {
            self.stats.excluded += 1;
            if self.verbose {
                log_event(ScanEvent::Excluded {
                    address: address.get(),
                });
            }
            return Ok(());
        }

        let traversable = match self.write_record(handle, address) {
            Ok(traversable) => traversable,
            Err(err) => {
                if let ScanError::EncodeOverflow { needed, limit } = &err {
                    log_event(ScanEvent::EncodeAborted {
                        address: address.get(),
                        needed: *needed,
                        limit: *limit,
                    });
                }
                return Err(err);
            },
        };

        if traversable && mode.recurses() {
            for child in referents(model, handle) {
                if mode.should_dump_child(model, child) {
                    self.emit(child, RecurseMode::NoRecurse)?;
                }
            }
        }
        Ok(())
    }

    /// Build and write one record; returns whether the object has children
    fn write_record(&mut self, handle: M::Handle, address: Address) -> Result<bool> {
        let model = self.model;
        let ty = model.type_of(handle);
        let size = self.sizes.size_of(handle);
        let line = &mut self.line;
        line.clear();

        line.extend_from_slice(b"{\"address\": ");
        push_display(line, address);
        line.extend_from_slice(b", \"type\": ");
        self.escaper
            .escape_into(line, Text::Narrow(ty.name.as_bytes()), None)?;
        line.extend_from_slice(b", \"size\": ");
        push_display(line, size);

        if let Some(name) = model.name(handle) {
            line.extend_from_slice(b", \"name\": ");
            self.escaper.escape_into(line, name, Some(name.len()))?;
        }

        match model.scalar(handle) {
            Some(Scalar::Text(text)) => {
                line.extend_from_slice(b", \"len\": ");
                push_display(line, text.len());
                line.extend_from_slice(b", \"value\": ");
                self.escaper.escape_into(line, text, Some(text.len()))?;
            },
            Some(Scalar::Int(value)) => {
                line.extend_from_slice(b", \"value\": ");
                push_display(line, value);
            },
            Some(Scalar::Label(label)) => {
                // Escaped per UTF-16 unit so non-ASCII labels survive.
                let units: Vec<u16> = label.encode_utf16().collect();
                line.extend_from_slice(b", \"value\": ");
                self.escaper
                    .escape_into(line, Text::Wide(&units), Some(units.len()))?;
            },
            None => {
                if ty.has_length() {
                    if let Some(len) = model.length(handle) {
                        line.extend_from_slice(b", \"len\": ");
                        push_display(line, len);
                    }
                }
            },
        }

        line.extend_from_slice(b", \"refs\": [");
        let mut first = true;
        let mut edges = 0u64;
        let traversable = model.visit_children(handle, &mut |child| {
            if first {
                first = false;
            } else {
                line.extend_from_slice(b", ");
            }
            push_display(line, model.address(child));
            edges += 1;
        });
        line.extend_from_slice(b"]}\n");

        self.sink.write_all(&self.line)?;

        let bytes = self.line.len() as u64;
        self.stats.records += 1;
        self.stats.edges += edges;
        self.stats.bytes += bytes;
        if self.verbose {
            log_event(ScanEvent::RecordWritten {
                address: address.get(),
                type_name: ty.name.to_string(),
                size,
                bytes,
            });
        }
        Ok(traversable)
    }
}

#[inline]
fn push_display(buf: &mut Vec<u8>, value: impl fmt::Display) {
    // Writing into a Vec cannot fail.
    let _ = write!(buf, "{}", value);
}

/// Dump one root onto `sink` in a single call
///
/// Convenience for callers driving their own root enumeration: builds an
/// emitter, applies `exclusion`, emits `handle` with `mode`, and returns the
/// counters.
pub fn dump_object<M, W>(
    sink: W,
    model: &M,
    handle: M::Handle,
    exclusion: Option<&dyn ExclusionCollection<M::Handle>>,
    mode: RecurseMode,
) -> Result<DumpStats>
where
    M: ObjectModel,
    W: Write,
{
    let mut emitter = RecordEmitter::new(model, sink);
    if let Some(collection) = exclusion {
        emitter = emitter.exclude(collection);
    }
    emitter.emit(handle, mode)?;
    Ok(emitter.stats())
}
