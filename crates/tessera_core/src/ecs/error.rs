//! # Core Error Types
//!
//! Every contract violation the runtime core can detect. Nothing here is
//! retried internally: an operation either succeeds synchronously or
//! reports one of these variants. The reference design aborted the process
//! on most of them; surfacing them as values keeps the violation visible
//! without taking the process down.

use thiserror::Error;

use super::entity::EntityId;
use super::system::SystemId;

/// Errors reported by the scheduler, the entity index, and the arenas.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An operation named a system id that was never registered.
    #[error("system {0} is not registered")]
    UnknownSystem(SystemId),

    /// A system id was registered twice.
    #[error("system {0} is already registered")]
    DuplicateSystem(SystemId),

    /// A dependency edge from a system to itself.
    #[error("system {0} cannot depend on itself")]
    SelfDependency(SystemId),

    /// The dependency relation contains a cycle; no work order exists.
    ///
    /// The id names the system at which the traversal closed the cycle.
    #[error("dependency cycle detected at system {0}")]
    DependencyCycle(SystemId),

    /// A work-state mask whose length does not match the work order.
    #[error("work-state mask length {actual} does not match work order length {expected}")]
    WorkStateMask {
        /// Length of the current work order.
        expected: usize,
        /// Length of the mask that was supplied.
        actual: usize,
    },

    /// An entity id beyond the bounds of the lookup table.
    #[error("entity id {0} is out of table bounds")]
    IdOutOfRange(EntityId),

    /// An entity id that was released (or never acquired).
    #[error("entity id {0} is not live")]
    StaleEntity(EntityId),

    /// A typed lookup with the wrong entity type for the id.
    #[error("entity {id} holds a `{actual}`, not a `{requested}`")]
    WrongEntityType {
        /// The offending id.
        id: EntityId,
        /// Type the caller asked for.
        requested: &'static str,
        /// Type the entity was created with.
        actual: &'static str,
    },

    /// An arena slot reference that is vacant or out of range.
    #[error("slot {slot} in chunk {chunk} is vacant or out of range")]
    InvalidSlot {
        /// Chunk id within the arena.
        chunk: u32,
        /// Slot number within the chunk.
        slot: u32,
    },

    /// Configuration text that failed to parse or validate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
