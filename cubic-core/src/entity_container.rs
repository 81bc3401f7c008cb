//! Opaque entity records kept by columns and cubes.
//!
//! Entity simulation lives elsewhere; here entities are only carried so they
//! persist with the cube or column they were saved in.
use simdnbt::owned::NbtCompound;
use uuid::Uuid;

/// A saved entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Unique id.
    pub id: Uuid,
    /// Serialized entity state.
    pub data: NbtCompound,
}

impl EntityRecord {
    /// Creates a record with a random id.
    #[must_use]
    pub fn new(data: NbtCompound) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
        }
    }
}

/// The entities of one column or cube.
#[derive(Debug, Clone, Default)]
pub struct EntityContainer {
    entities: Vec<EntityRecord>,
    modified: bool,
}

impl EntityContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity, replacing any record with the same id.
    pub fn add(&mut self, record: EntityRecord) {
        self.entities.retain(|existing| existing.id != record.id);
        self.entities.push(record);
        self.modified = true;
    }

    /// Removes an entity by id.
    pub fn remove(&mut self, id: Uuid) -> Option<EntityRecord> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        self.modified = true;
        Some(self.entities.remove(index))
    }

    /// Looks up an entity by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// All entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether the container changed since the last save.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the modified flag.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }
}
