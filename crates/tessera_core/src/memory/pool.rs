//! # Slot Pool
//!
//! Fixed-capacity slot storage for values that are created and destroyed
//! frequently. One pool backs one entity chunk.

/// Index of a slot inside a [`SlotPool`].
///
/// Slots are addressed by a small integer rather than a raw address, so a
/// stale index can never read another chunk's memory - at worst it names a
/// vacant slot, which every accessor reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Returns the raw slot number.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A pool of fixed-size slots for values of one type.
///
/// The backing storage and the free list are both reserved in full when the
/// pool is created; `insert` and `remove` never touch the heap afterwards.
///
/// # Thread Safety
///
/// The pool is NOT thread-safe. The runtime core is single-threaded and
/// each entity arena owns its pools exclusively.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: SlotPool<Particle> = SlotPool::new(256);
///
/// let slot = pool.insert(Particle::default()).unwrap();
/// let particle = pool.get(slot).unwrap();
/// pool.remove(slot);
/// ```
pub struct SlotPool<T> {
    /// The slot array; `None` marks a vacant slot.
    slots: Box<[Option<T>]>,
    /// Indices of vacant slots, popped from the back.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    occupied: usize,
}

impl<T> SlotPool<T> {
    /// Creates a pool with the given number of slots, all vacant.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or exceeds `u32::MAX` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "slot pool capacity must be greater than zero");
        assert!(
            capacity <= u32::MAX as usize,
            "slot pool capacity cannot exceed u32::MAX"
        );

        let slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        let free_list: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            slots: slots.into_boxed_slice(),
            free_list,
            occupied: 0,
        }
    }

    /// Returns the total number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns `true` if every slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    /// Stores a value in a vacant slot.
    ///
    /// O(1); returns `None` if the pool is full, leaving the value dropped.
    pub fn insert(&mut self, value: T) -> Option<SlotIndex> {
        let index = self.free_list.pop()?;

        self.slots[index as usize] = Some(value);
        self.occupied += 1;

        Some(SlotIndex(index))
    }

    /// Vacates a slot, returning its value.
    ///
    /// O(1); returns `None` if the slot is already vacant or out of range.
    pub fn remove(&mut self, slot: SlotIndex) -> Option<T> {
        let value = self.slots.get_mut(slot.0 as usize)?.take()?;
        self.free_list.push(slot.0);
        self.occupied -= 1;

        Some(value)
    }

    /// Returns a reference to the value in a slot, if occupied.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: SlotIndex) -> Option<&T> {
        self.slots.get(slot.0 as usize)?.as_ref()
    }

    /// Returns a mutable reference to the value in a slot, if occupied.
    #[inline]
    pub fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut T> {
        self.slots.get_mut(slot.0 as usize)?.as_mut()
    }

    /// Iterates over every occupied slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (SlotIndex(index as u32), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_then_remove() {
        let mut pool: SlotPool<u32> = SlotPool::new(8);

        let slot = pool.insert(42).unwrap();
        assert_eq!(*pool.get(slot).unwrap(), 42);
        assert_eq!(pool.len(), 1);

        assert_eq!(pool.remove(slot), Some(42));
        assert_eq!(pool.len(), 0);
        assert!(pool.get(slot).is_none());
    }

    #[test]
    fn full_pool_rejects_insert() {
        let mut pool: SlotPool<u8> = SlotPool::new(2);

        pool.insert(1).unwrap();
        pool.insert(2).unwrap();
        assert!(pool.is_full());
        assert!(pool.insert(3).is_none());
    }

    #[test]
    fn vacated_slot_is_reused_last_in_first_out() {
        let mut pool: SlotPool<u32> = SlotPool::new(4);

        let a = pool.insert(1).unwrap();
        let _b = pool.insert(2).unwrap();
        pool.remove(a);

        // The most recently vacated slot is handed out next.
        let c = pool.insert(3).unwrap();
        assert_eq!(a, c);
        assert_eq!(*pool.get(c).unwrap(), 3);
    }

    #[test]
    fn remove_vacant_slot_is_none() {
        let mut pool: SlotPool<u32> = SlotPool::new(2);
        let slot = pool.insert(7).unwrap();
        assert!(pool.remove(slot).is_some());
        assert!(pool.remove(slot).is_none());
    }

    #[test]
    fn iter_visits_occupied_slots_in_index_order() {
        let mut pool: SlotPool<u32> = SlotPool::new(4);
        let a = pool.insert(10).unwrap();
        let b = pool.insert(20).unwrap();
        pool.remove(a);

        let collected: Vec<(SlotIndex, u32)> = pool.iter().map(|(s, v)| (s, *v)).collect();
        assert_eq!(collected, vec![(b, 20)]);
    }
}
