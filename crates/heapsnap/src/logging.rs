//! Scan Logging and Tracing
//!
//! Logging for snapshot passes, useful for:
//! - Seeing how large a dump got and how long it took
//! - Debugging exclusion sets and encode limits
//!
//! Log Levels:
//! - ERROR: Aborted encodes
//! - INFO: Dump start / end
//! - DEBUG: Excluded objects
//! - TRACE: Per-record writes
//!
//! Console output goes through the `log` facade, so whichever logger the
//! host process installed decides where it ends up.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

/// Log level for scan events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn as_log(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Scan event types
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A top-level dump started
    DumpStart { roots: usize, mode: String },

    /// One record reached the sink
    RecordWritten {
        address: u64,
        type_name: String,
        size: u64,
        bytes: u64,
    },

    /// An object was skipped by the exclusion filter
    Excluded { address: u64 },

    /// Escaping text for an object exceeded the byte bound
    EncodeAborted {
        address: u64,
        needed: usize,
        limit: usize,
    },

    /// A top-level dump finished
    DumpEnd {
        records: u64,
        excluded: u64,
        bytes: u64,
        duration_ms: f64,
    },
}

/// Scan logger configuration
#[derive(Debug, Clone)]
pub struct ScanLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Forward events to the `log` facade
    pub console: bool,

    /// Render events as JSON objects
    pub json: bool,

    /// Prefix rendered events with a wall-clock timestamp
    pub timestamps: bool,

    /// Number of most recent events kept in memory
    pub retain: usize,
}

impl Default for ScanLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: true,
            retain: 1024,
        }
    }
}

/// Scan logger - centralized logging for snapshot passes
pub struct ScanLogger {
    config: ScanLoggerConfig,
    events: Mutex<VecDeque<(Instant, ScanEvent)>>,
}

impl ScanLogger {
    /// Create new scan logger
    pub fn new(config: ScanLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Log a scan event
    pub fn log(&self, event: ScanEvent) {
        let level = Self::event_level(&event);
        if level > self.config.level {
            return;
        }

        if self.config.console {
            let rendered = self.render(&event);
            log::log!(level.as_log(), "{}", rendered);
        }

        if self.config.retain > 0 {
            let mut events = self.events.lock();
            if events.len() >= self.config.retain {
                events.pop_front();
            }
            events.push_back((Instant::now(), event));
        }
    }

    /// Get log level for event
    fn event_level(event: &ScanEvent) -> LogLevel {
        match event {
            ScanEvent::EncodeAborted { .. } => LogLevel::Error,
            ScanEvent::DumpStart { .. } | ScanEvent::DumpEnd { .. } => LogLevel::Info,
            ScanEvent::Excluded { .. } => LogLevel::Debug,
            ScanEvent::RecordWritten { .. } => LogLevel::Trace,
        }
    }

    /// Render an event as a single line
    pub fn render(&self, event: &ScanEvent) -> String {
        let body = if self.config.json {
            Self::render_json(event)
        } else {
            Self::render_human(event)
        };

        if self.config.timestamps {
            let now = chrono::Local::now();
            format!("[{}] {}", now.format("%Y-%m-%d %H:%M:%S%.3f"), body)
        } else {
            body
        }
    }

    /// Render in human-readable format
    fn render_human(event: &ScanEvent) -> String {
        match event {
            ScanEvent::DumpStart { roots, mode } => {
                format!("[heapsnap] Dump started ({} roots, {})", roots, mode)
            },
            ScanEvent::RecordWritten {
                address,
                type_name,
                size,
                bytes,
            } => format!(
                "[heapsnap] Record {} ({}, {} bytes) written in {} bytes",
                address, type_name, size, bytes
            ),
            ScanEvent::Excluded { address } => {
                format!("[heapsnap] Object {} excluded", address)
            },
            ScanEvent::EncodeAborted {
                address,
                needed,
                limit,
            } => format!(
                "[heapsnap] Encoding object {} needs {} bytes, limit {}",
                address, needed, limit
            ),
            ScanEvent::DumpEnd {
                records,
                excluded,
                bytes,
                duration_ms,
            } => format!(
                "[heapsnap] Dump completed ({} records, {} excluded, {} bytes, {:.2}ms)",
                records, excluded, bytes, duration_ms
            ),
        }
    }

    /// Render in JSON format
    fn render_json(event: &ScanEvent) -> String {
        let json = match event {
            ScanEvent::DumpStart { roots, mode } => serde_json::json!({
                "type": "dump_start",
                "roots": roots,
                "mode": mode
            }),
            ScanEvent::RecordWritten {
                address,
                type_name,
                size,
                bytes,
            } => serde_json::json!({
                "type": "record_written",
                "address": address,
                "type_name": type_name,
                "size": size,
                "bytes": bytes
            }),
            ScanEvent::Excluded { address } => serde_json::json!({
                "type": "excluded",
                "address": address
            }),
            ScanEvent::EncodeAborted {
                address,
                needed,
                limit,
            } => serde_json::json!({
                "type": "encode_aborted",
                "address": address,
                "needed": needed,
                "limit": limit
            }),
            ScanEvent::DumpEnd {
                records,
                excluded,
                bytes,
                duration_ms,
            } => serde_json::json!({
                "type": "dump_end",
                "records": records,
                "excluded": excluded,
                "bytes": bytes,
                "duration_ms": duration_ms
            }),
        };
        json.to_string()
    }

    /// Get retained events, oldest first
    pub fn get_events(&self) -> Vec<(Instant, ScanEvent)> {
        self.events.lock().iter().cloned().collect()
    }

    /// Clear retained events
    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    /// Get retained event count
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl Default for ScanLogger {
    fn default() -> Self {
        Self::new(ScanLoggerConfig::default())
    }
}

lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<ScanLogger> = Mutex::new(ScanLogger::default());
}

/// Log a scan event to the global logger
pub fn log_event(event: ScanEvent) {
    GLOBAL_LOGGER.lock().log(event);
}

/// Configure the global logger
pub fn configure_logger(config: ScanLoggerConfig) {
    *GLOBAL_LOGGER.lock() = ScanLogger::new(config);
}

/// Get global logger retained event count
pub fn get_event_count() -> usize {
    GLOBAL_LOGGER.lock().event_count()
}

/// Get the global logger's retained events
pub fn get_events() -> Vec<(Instant, ScanEvent)> {
    GLOBAL_LOGGER.lock().get_events()
}
