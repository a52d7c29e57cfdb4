//! # Entity Index
//!
//! Global id-to-instance lookup. The index owns one [`ChunkedStore`] per
//! concrete entity type, hands out recycled numeric ids, and is the only
//! path between an [`EntityId`] and the instance behind it.
//!
//! Ids are recycled last-released-first, which keeps reuse deterministic
//! for tests and replays. A released id is detected on lookup; it is never
//! silently resolved to another entity.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;

use crate::config::CoreConfig;

use super::entity::{Entity, EntityId};
use super::error::CoreError;
use super::store::{ChunkedStore, EntitySlot};

/// Type-erased arena access used by the registry.
trait AnyStore {
    /// Upcast for typed read access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed write access.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Removes and drops the instance at `at` without knowing its type.
    fn discard(&mut self, at: EntitySlot) -> Result<(), CoreError>;
}

impl<T: Entity> AnyStore for ChunkedStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn discard(&mut self, at: EntitySlot) -> Result<(), CoreError> {
        self.remove(at).map(drop)
    }
}

/// What a live id resolves to.
#[derive(Clone, Copy)]
struct EntityRecord {
    /// Concrete type the entity was created with.
    type_id: TypeId,
    /// Type name, kept for error messages.
    type_name: &'static str,
    /// Location in that type's arena.
    slot: EntitySlot,
}

/// Owner of every entity arena and the id lifecycle.
///
/// # Example
///
/// ```rust,ignore
/// let mut index = EntityIndex::new();
///
/// let id = index.create(Probe { id: EntityId::INVALID, charge: 3 });
/// assert_eq!(index.get::<Probe>(id)?.charge, 3);
/// index.destroy(id)?;
/// ```
pub struct EntityIndex {
    /// One type-erased arena per concrete entity type.
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
    /// Lookup table indexed by raw id; `None` marks a released id.
    lut: Vec<Option<EntityRecord>>,
    /// Released ids, reused newest-first.
    free_ids: Vec<u32>,
    /// Number of live entities across all types.
    live: usize,
    /// Tuning knobs applied to newly created arenas.
    config: CoreConfig,
}

impl EntityIndex {
    /// Creates an index with the default [`CoreConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    /// Creates an index with explicit tuning knobs.
    #[must_use]
    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            stores: HashMap::new(),
            lut: Vec::with_capacity(config.id_table_reserve),
            free_ids: Vec::new(),
            live: 0,
            config,
        }
    }

    /// Returns the number of currently live entities, all types combined.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Stores an entity, assigns it a fresh id, and returns that id.
    ///
    /// The id is stamped into the instance via [`Entity::set_id`] before
    /// this returns; `T`'s arena is created on first use.
    pub fn create<T: Entity>(&mut self, entity: T) -> EntityId {
        let chunk_capacity = self.config.chunk_capacity;
        let id = self.acquire_id();
        let store = self
            .stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ChunkedStore::<T>::new(chunk_capacity)));
        let store = store
            .as_any_mut()
            .downcast_mut::<ChunkedStore<T>>()
            .expect("registry must hold the arena created for this type");

        let at = store.insert(entity);

        store
            .get_mut(at)
            .expect("freshly stored instance must be live")
            .set_id(id);

        self.lut[id.raw() as usize] = Some(EntityRecord {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            slot: at,
        });
        self.live += 1;

        id
    }

    /// Destroys the entity behind `id`, dropping the instance and releasing
    /// the id for reuse.
    pub fn destroy(&mut self, id: EntityId) -> Result<(), CoreError> {
        let record = self.record(id)?;
        let store = self
            .stores
            .get_mut(&record.type_id)
            .expect("arena must exist for a live entity");
        store.discard(record.slot)?;

        self.lut[id.raw() as usize] = None;
        self.free_ids.push(id.raw());
        self.live -= 1;

        Ok(())
    }

    /// Resolves a live id to its instance.
    ///
    /// Out-of-range, released, and wrong-typed ids are all reported as
    /// errors; a lookup never yields another entity's data.
    pub fn get<T: Entity>(&self, id: EntityId) -> Result<&T, CoreError> {
        let record = self.checked_record::<T>(id)?;
        let store = self
            .stores
            .get(&record.type_id)
            .and_then(|s| s.as_any().downcast_ref::<ChunkedStore<T>>())
            .expect("arena must exist for a live entity");

        store.get(record.slot).ok_or(CoreError::InvalidSlot {
            chunk: record.slot.chunk,
            slot: record.slot.slot.raw(),
        })
    }

    /// Resolves a live id to its instance, mutably.
    pub fn get_mut<T: Entity>(&mut self, id: EntityId) -> Result<&mut T, CoreError> {
        let record = self.checked_record::<T>(id)?;
        let store = self
            .stores
            .get_mut(&record.type_id)
            .and_then(|s| s.as_any_mut().downcast_mut::<ChunkedStore<T>>())
            .expect("arena must exist for a live entity");

        store.get_mut(record.slot).ok_or(CoreError::InvalidSlot {
            chunk: record.slot.chunk,
            slot: record.slot.slot.raw(),
        })
    }

    /// Checks whether `id` refers to a live entity of any type.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_ok()
    }

    /// Hands out an unused id, recycling released ids newest-first.
    fn acquire_id(&mut self) -> EntityId {
        match self.free_ids.pop() {
            Some(raw) => EntityId::new(raw),
            None => {
                let raw = self.lut.len() as u32;
                self.lut.push(None);
                EntityId::new(raw)
            }
        }
    }

    /// Resolves an id to its record, reporting range and liveness errors.
    fn record(&self, id: EntityId) -> Result<EntityRecord, CoreError> {
        let index = id.raw() as usize;
        if id.is_invalid() || index >= self.lut.len() {
            return Err(CoreError::IdOutOfRange(id));
        }
        self.lut[index].ok_or(CoreError::StaleEntity(id))
    }

    /// Like [`Self::record`], additionally checking the entity's type.
    fn checked_record<T: Entity>(&self, id: EntityId) -> Result<EntityRecord, CoreError> {
        let record = self.record(id)?;
        if record.type_id != TypeId::of::<T>() {
            return Err(CoreError::WrongEntityType {
                id,
                requested: any::type_name::<T>(),
                actual: record.type_name,
            });
        }
        Ok(record)
    }
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new()
    }
}
