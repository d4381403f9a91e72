//! Traversal Controller - which neighbours get a record of their own
//!
//! A full-heap walk driven by the collector's object list only reaches
//! GC-tracked objects. Leaves such as strings and ints are never roots, so
//! unless they are dumped when a parent references them, the parent's edge
//! to them dangles. The recursion mode decides how far one dump call reaches
//! to close that gap; it never goes more than one hop.

use crate::config::ConfigError;
use crate::object::ObjectModel;
use std::fmt;
use std::str::FromStr;

/// Recursion policy for one dump call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecurseMode {
    /// Only the requested object
    NoRecurse,
    /// The object plus every direct child, each without further recursion
    OneLayer,
    /// The object plus children that a root enumerator would never reach:
    /// objects without child enumeration and builtin type objects
    #[default]
    LeafOnly,
}

impl RecurseMode {
    /// Legacy integer depth: 0 none, 1 leaves only, 2 one full layer
    pub const fn depth(self) -> u8 {
        match self {
            RecurseMode::NoRecurse => 0,
            RecurseMode::LeafOnly => 1,
            RecurseMode::OneLayer => 2,
        }
    }

    pub const fn recurses(self) -> bool {
        !matches!(self, RecurseMode::NoRecurse)
    }

    /// Whether `child` gets its own record when its parent is dumped in this mode
    pub fn should_dump_child<M: ObjectModel>(self, model: &M, child: M::Handle) -> bool {
        match self {
            RecurseMode::NoRecurse => false,
            RecurseMode::OneLayer => true,
            RecurseMode::LeafOnly => {
                !model.type_of(child).has_traverse() || model.is_builtin_type_object(child)
            },
        }
    }
}

impl TryFrom<u8> for RecurseMode {
    type Error = ConfigError;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        match depth {
            0 => Ok(RecurseMode::NoRecurse),
            1 => Ok(RecurseMode::LeafOnly),
            2 => Ok(RecurseMode::OneLayer),
            other => Err(ConfigError::InvalidRecurseMode(format!(
                "depth must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl FromStr for RecurseMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "none" | "no-recurse" => Ok(RecurseMode::NoRecurse),
            "1" | "leaf" | "leaf-only" => Ok(RecurseMode::LeafOnly),
            "2" | "one-layer" | "layer" => Ok(RecurseMode::OneLayer),
            other => Err(ConfigError::InvalidRecurseMode(other.to_string())),
        }
    }
}

impl fmt::Display for RecurseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecurseMode::NoRecurse => "no-recurse",
            RecurseMode::OneLayer => "one-layer",
            RecurseMode::LeafOnly => "leaf-only",
        };
        f.write_str(name)
    }
}
