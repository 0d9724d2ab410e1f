//! Entity handles

use std::fmt;

/// Opaque handle to an entity owned by a [`super::World`].
///
/// Ids are handed out sequentially and never reused within a world, so a
/// stale handle simply stops resolving after the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    pub(super) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id, stable for the entity's lifetime
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}
