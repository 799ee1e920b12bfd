//! Walk-unique identifiers for label instances.
//!
//! A label entry names a position in the document, but a prototype shared
//! by several assembly instances is visited once per instance. Each visit
//! gets its own [`Uid`]: the entry plus a per-entry serial number.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Identifier of one visit of a label: `entry.serial`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid {
    entry: String,
    serial: u32,
}

impl Uid {
    /// Build a uid from its parts.
    pub fn new(entry: impl Into<String>, serial: u32) -> Self {
        Self {
            entry: entry.into(),
            serial,
        }
    }

    /// The label entry this uid was derived from.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// How many earlier visits of the same entry preceded this one.
    pub fn serial(&self) -> u32 {
        self.serial
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entry, self.serial)
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hands out a fresh [`Uid`] for every visit of an entry.
///
/// Serials start at 0 and grow by one per call for the same entry, so an
/// allocator never returns the same uid twice until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct UidAllocator {
    last_serial: HashMap<String, u32>,
}

impl UidAllocator {
    /// Create an allocator with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next uid for `entry`.
    pub fn allocate(&mut self, entry: &str) -> Uid {
        let serial = match self.last_serial.get_mut(entry) {
            Some(last) => {
                *last += 1;
                *last
            }
            None => {
                self.last_serial.insert(entry.to_string(), 0);
                0
            }
        };
        Uid::new(entry, serial)
    }

    /// Last serial handed out for `entry`, if any.
    pub fn last_serial(&self, entry: &str) -> Option<u32> {
        self.last_serial.get(entry).copied()
    }

    /// Forget all history; the next uid of every entry has serial 0.
    pub fn reset(&mut self) {
        self.last_serial.clear();
    }

    /// Number of distinct entries seen.
    pub fn len(&self) -> usize {
        self.last_serial.len()
    }

    /// Whether no uid has been allocated since creation or the last reset.
    pub fn is_empty(&self) -> bool {
        self.last_serial.is_empty()
    }
}
