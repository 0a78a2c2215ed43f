//! Allocation of record identifiers.
//!
//! All CATMAID records share a single primary-key namespace. The
//! [`IdAllocator`] tracks every identifier claimed during one conversion and
//! hands out fresh ones above the highest claimed value.

use std::collections::BTreeSet;

/// A primary key in either data model.
pub type Id = u64;

/// Registry of identifiers already in use within one conversion.
///
/// An allocator is created for each conversion and dropped with it, so no
/// identifier state leaks between unrelated inputs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    used: BTreeSet<Id>,
}

impl IdAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as used.
    ///
    /// Reserving an identifier more than once has no further effect.
    pub fn reserve(&mut self, id: Id) {
        self.used.insert(id);
    }

    /// Returns `true` if `id` has been reserved.
    #[must_use]
    pub fn is_reserved(&self, id: Id) -> bool {
        self.used.contains(&id)
    }

    /// Returns an unused identifier without reserving it.
    ///
    /// This is one more than the highest reserved identifier, or `1` if
    /// nothing has been reserved. Callers must [`reserve`](Self::reserve) the
    /// result before relying on it in later calls.
    ///
    /// Returns `None` once [`Id::MAX`] is reserved.
    #[must_use]
    pub fn next(&self) -> Option<Id> {
        self.used.last().map_or(Some(1), |max| max.checked_add(1))
    }

    /// Returns a fresh identifier and reserves it.
    ///
    /// Returns `None`, reserving nothing, once [`Id::MAX`] is reserved.
    pub fn mint(&mut self) -> Option<Id> {
        let id = self.next()?;
        self.reserve(id);
        Some(id)
    }
}

impl Extend<Id> for IdAllocator {
    fn extend<T: IntoIterator<Item = Id>>(&mut self, iter: T) {
        self.used.extend(iter);
    }
}
