//! # TESSERA Core Runtime
//!
//! The runtime core of the TESSERA entity-component-system framework:
//! system scheduling and entity lifecycle, nothing else.
//!
//! ## Architecture Rules
//!
//! 1. **Deterministic scheduling** - the work order depends only on the
//!    registered systems, their priorities, and their dependency edges
//! 2. **No per-entity heap churn** - entity storage grows by whole chunks,
//!    backed by fixed-slot pools
//! 3. **Single-threaded by contract** - every operation is a plain
//!    synchronous call; there are no locks because there is nothing to lock
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{Scheduler, SystemId};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.register(SystemId::new(0), MovementSystem::default())?;
//! scheduler.compute_work_order()?;
//! scheduler.update(dt);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod memory;

pub use config::CoreConfig;
pub use ecs::{
    ChunkedStore, CoreError, Entity, EntityId, EntityIndex, EntitySlot, Scheduler, System,
    SystemId, SystemPriority, WorkStateMask, HIGHEST_SYSTEM_PRIORITY, LOWEST_SYSTEM_PRIORITY,
    NORMAL_SYSTEM_PRIORITY,
};
pub use memory::{SlotIndex, SlotPool};
