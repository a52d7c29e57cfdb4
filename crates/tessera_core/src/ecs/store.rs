//! # Chunked Entity Arena
//!
//! Per-type storage for entity instances. Instances live in fixed-capacity
//! chunks, each backed by one [`SlotPool`]; the arena grows by whole chunks
//! and never by single instances, so creating an entity allocates at most
//! once per `chunk_capacity` creations.
//!
//! The original design recovered a chunk from a raw instance address by
//! range test; here an instance is addressed by an explicit
//! `(chunk, slot)` pair instead, which removes the pointer arithmetic and
//! makes a dangling reference detectable.

use crate::memory::{SlotIndex, SlotPool};

use super::error::CoreError;

/// Location of one stored instance: chunk id plus slot within the chunk.
///
/// Chunk ids are stable for the lifetime of the arena - chunks are only
/// ever appended, never removed or reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntitySlot {
    /// Index of the owning chunk.
    pub chunk: u32,
    /// Slot within that chunk's pool.
    pub slot: SlotIndex,
}

/// A chunked arena holding every instance of one entity type.
///
/// # Growth policy
///
/// The free-slot scan walks chunks newest-first and a chunk is skipped only
/// when completely full; a new chunk is appended only once every existing
/// chunk is full. Total capacity is always
/// `chunk_count() * chunk_capacity()`.
///
/// # Teardown
///
/// Dropping the arena drops every instance still resident in its chunks.
pub struct ChunkedStore<T> {
    /// Chunks in creation order; the newest chunk is last.
    chunks: Vec<SlotPool<T>>,
    /// Fixed number of slots per chunk.
    chunk_capacity: usize,
}

impl<T> ChunkedStore<T> {
    /// Creates an arena with a single empty chunk of `chunk_capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    #[must_use]
    pub fn new(chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > 0, "chunk capacity must be greater than zero");
        Self {
            chunks: vec![SlotPool::new(chunk_capacity)],
            chunk_capacity,
        }
    }

    /// Returns the fixed per-chunk slot count.
    #[inline]
    #[must_use]
    pub const fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Returns the number of chunks currently allocated.
    #[inline]
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the number of live instances across all chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.iter().map(SlotPool::len).sum()
    }

    /// Returns `true` if no instance is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(SlotPool::is_empty)
    }

    /// Returns the total slot capacity across all chunks.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_capacity
    }

    /// Stores an instance, growing by one chunk only if every chunk is full.
    ///
    /// The scan prefers the most recently added chunk, which is the chunk
    /// most likely to have free slots.
    pub fn insert(&mut self, value: T) -> EntitySlot {
        let chunk = match self.chunks.iter().rposition(|c| !c.is_full()) {
            Some(index) => index,
            None => {
                self.chunks.push(SlotPool::new(self.chunk_capacity));
                self.chunks.len() - 1
            }
        };

        let slot = self.chunks[chunk]
            .insert(value)
            .expect("scanned chunk must have a free slot");

        EntitySlot {
            chunk: chunk as u32,
            slot,
        }
    }

    /// Removes an instance, returning it to the caller.
    ///
    /// The vacated slot becomes available for reuse by a later `insert`.
    pub fn remove(&mut self, at: EntitySlot) -> Result<T, CoreError> {
        self.chunks
            .get_mut(at.chunk as usize)
            .and_then(|chunk| chunk.remove(at.slot))
            .ok_or(CoreError::InvalidSlot {
                chunk: at.chunk,
                slot: at.slot.raw(),
            })
    }

    /// Returns a reference to the instance at `at`, if live.
    #[must_use]
    pub fn get(&self, at: EntitySlot) -> Option<&T> {
        self.chunks.get(at.chunk as usize)?.get(at.slot)
    }

    /// Returns a mutable reference to the instance at `at`, if live.
    pub fn get_mut(&mut self, at: EntitySlot) -> Option<&mut T> {
        self.chunks.get_mut(at.chunk as usize)?.get_mut(at.slot)
    }

    /// Iterates over every live instance, oldest chunk first.
    pub fn iter(&self) -> impl Iterator<Item = (EntitySlot, &T)> {
        self.chunks.iter().enumerate().flat_map(|(chunk, pool)| {
            pool.iter().map(move |(slot, value)| {
                (
                    EntitySlot {
                        chunk: chunk as u32,
                        slot,
                    },
                    value,
                )
            })
        })
    }
}
