//! Opaque row handles for rendered meetings.
//!
//! Meeting names are free text and make poor element identifiers, so
//! presenters keep a [`RowTable`] that hands out a stable [`RowHandle`] per
//! rendered meeting instead.

use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of one rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(u64);

impl RowHandle {
    /// Returns the raw numeric id.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Mapping from meeting name to row handle.
///
/// Handles are never reused within one table, so a row removed and rendered
/// again gets a fresh handle.
#[derive(Debug, Default)]
pub struct RowTable {
    next_id: u64,
    rows: HashMap<String, RowHandle>,
}

impl RowTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `name`, allocating one if the meeting has no
    /// row yet. The flag is true when the handle was just allocated.
    pub fn attach(&mut self, name: &str) -> (RowHandle, bool) {
        if let Some(handle) = self.rows.get(name) {
            return (*handle, false);
        }
        self.next_id += 1;
        let handle = RowHandle(self.next_id);
        self.rows.insert(name.to_string(), handle);
        (handle, true)
    }

    /// Returns the handle for `name`, if it has a row.
    pub fn get(&self, name: &str) -> Option<RowHandle> {
        self.rows.get(name).copied()
    }

    /// Forgets the row for `name` and returns its handle.
    pub fn detach(&mut self, name: &str) -> Option<RowHandle> {
        self.rows.remove(name)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
