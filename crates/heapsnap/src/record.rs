//! Snapshot Record - typed view of one output line
//!
//! The emitter writes records directly as bytes; this is the shape a reader
//! gets back when it parses a line.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// `value` key of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Int(i64),
    Text(String),
}

/// One object of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub address: u64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,
    pub refs: Vec<u64>,
}

impl SnapshotRecord {
    /// Parse one JSON-lines record
    ///
    /// # Example
    ///
    /// ```rust
    /// use heapsnap::SnapshotRecord;
    ///
    /// let rec = SnapshotRecord::parse_line(
    ///     r#"{"address": 140521, "type": "list", "size": 96, "len": 3, "refs": [1001, 1002, 1003]}"#,
    /// )?;
    /// assert_eq!(rec.len, Some(3));
    /// assert_eq!(rec.refs, vec![1001, 1002, 1003]);
    /// # Ok::<(), heapsnap::ScanError>(())
    /// ```
    pub fn parse_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim_end())?)
    }

    /// Parse every non-empty line of a snapshot
    ///
    /// A truncated final line (a dump aborted mid-write) is an error; callers
    /// that want to tolerate it can parse line by line instead.
    pub fn parse_stream(text: &str) -> Result<Vec<Self>> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::parse_line)
            .collect()
    }
}
