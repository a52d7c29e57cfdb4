//! # Entity Identity
//!
//! Entities are opaque numeric handles. The id indexes the [`EntityIndex`]
//! lookup table; everything outside the core addresses an entity by id only.
//!
//! [`EntityIndex`]: crate::ecs::EntityIndex

use std::fmt;

/// Unique identifier for a live entity.
///
/// Ids are recycled: once an entity is destroyed, its id becomes eligible
/// for reuse by a later creation. Two simultaneously live entities never
/// share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Invalid entity id, never handed out by the index.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates an id from its raw table index.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw table index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks whether this is the invalid sentinel id.
    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability interface for storable entity types.
///
/// Any `'static` type that can report and accept an [`EntityId`] qualifies;
/// there is no mandatory base type. The [`EntityIndex`] stamps the id into a
/// freshly stored instance and reads it back for diagnostics.
///
/// # Example
///
/// ```rust,ignore
/// struct Probe {
///     id: EntityId,
///     charge: u32,
/// }
///
/// impl Entity for Probe {
///     fn id(&self) -> EntityId { self.id }
///     fn set_id(&mut self, id: EntityId) { self.id = id; }
/// }
/// ```
///
/// [`EntityIndex`]: crate::ecs::EntityIndex
pub trait Entity: 'static {
    /// Returns the id assigned to this instance, or [`EntityId::INVALID`]
    /// before it has been stored.
    fn id(&self) -> EntityId;

    /// Assigns the id. Called exactly once per instance, at creation.
    fn set_id(&mut self, id: EntityId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_id_is_invalid() {
        assert!(EntityId::default().is_invalid());
        assert_eq!(EntityId::default(), EntityId::INVALID);
    }

    #[test]
    fn raw_roundtrip() {
        let id = EntityId::new(12345);
        assert_eq!(id.raw(), 12345);
        assert!(!id.is_invalid());
    }

    #[test]
    fn display_is_raw_index() {
        assert_eq!(EntityId::new(7).to_string(), "7");
    }
}
