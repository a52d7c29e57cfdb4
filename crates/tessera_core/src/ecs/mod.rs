//! # Entity Component System Runtime
//!
//! The two hard services of the runtime core:
//!
//! - **Scheduling**: systems declare dependencies and priorities once;
//!   the scheduler derives a single deterministic work order and drives
//!   the three per-frame phases over it.
//! - **Entity lifecycle**: entities live in per-type chunked arenas and
//!   are addressed from the outside only by recycled numeric ids.
//!
//! Both services are single-threaded and synchronous by design.

mod entity;
mod error;
mod index;
mod scheduler;
mod store;
mod system;

pub use entity::{Entity, EntityId};
pub use error::CoreError;
pub use index::EntityIndex;
pub use scheduler::{Scheduler, WorkStateMask};
pub use store::{ChunkedStore, EntitySlot};
pub use system::{
    System, SystemId, SystemPriority, HIGHEST_SYSTEM_PRIORITY, LOWEST_SYSTEM_PRIORITY,
    NORMAL_SYSTEM_PRIORITY,
};
