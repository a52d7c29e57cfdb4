//! # Memory Management
//!
//! Fixed-slot pools backing the entity arenas.
//!
//! ## Design Philosophy
//!
//! Each pool reserves its buffer once, up front. Creating and destroying
//! entities afterwards only moves indices on and off a free list:
//! - No per-entity heap allocations
//! - No pointer arithmetic - slots are addressed by small integers
//! - Deterministic slot reuse

mod pool;

pub use pool::{SlotIndex, SlotPool};
