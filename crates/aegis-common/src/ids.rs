//! Identifiers for combat entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a combat entity.
///
/// Used both for the owner of a status-effect manager and for the optional
/// source of an applied effect (attribution only, never used in math).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Reserved "nobody" identifier, never handed out by an allocator.
    pub const NULL: Self = Self(0);

    /// Wraps a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `false` for [`EntityId::NULL`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out sequential entity identifiers.
///
/// Owned by whoever spawns entities (a simulation, a test); there is no
/// process-wide counter.
#[derive(Debug, Clone)]
pub struct EntityIdAllocator {
    next: u64,
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityIdAllocator {
    /// Creates an allocator whose first identifier is `#1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next unused identifier.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Number of identifiers handed out so far.
    #[must_use]
    pub const fn allocated(&self) -> u64 {
        self.next - 1
    }
}
