/// Entity storage with stable handles.
///
/// Records live in insertion order under monotonic `EntityId`s that are
/// never reused. Removal is two-phase: `kill` tags a record dead during
/// the frame, `compact` drops dead records once at the end of it. Dead
/// records are invisible to `get`, `iter` and `len` in between.

use crate::domain::entity::{Enemy, Item, Projectile};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(u32);

#[derive(Clone, Debug)]
struct Slot<T> {
    id: EntityId,
    alive: bool,
    value: T,
}

#[derive(Clone, Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    next_id: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { slots: Vec::new(), next_id: 0 }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena::default()
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, alive: true, value });
        id
    }

    // Slots stay sorted by id: ids are monotonic and compaction keeps order.
    fn slot_index(&self, id: EntityId) -> Option<usize> {
        self.slots.binary_search_by_key(&id, |s| s.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let slot = &self.slots[self.slot_index(id)?];
        slot.alive.then_some(&slot.value)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let i = self.slot_index(id)?;
        let slot = &mut self.slots[i];
        if slot.alive { Some(&mut slot.value) } else { None }
    }

    /// Tag a record dead. Returns false if it was already dead or gone.
    pub fn kill(&mut self, id: EntityId) -> bool {
        match self.slot_index(id) {
            Some(i) if self.slots[i].alive => {
                self.slots[i].alive = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().filter(|s| s.alive).map(|s| (s.id, &s.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots.iter_mut().filter(|s| s.alive).map(|s| (s.id, &mut s.value))
    }

    /// Snapshot of live ids, for loops that mutate other records.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Drop dead records. Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|s| s.alive);
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every dynamic record in the world, grouped by kind.
#[derive(Clone, Debug, Default)]
pub struct Entities {
    pub enemies: Arena<Enemy>,
    /// Never killed; pickup sets `Item::collected` instead.
    pub items: Arena<Item>,
    pub projectiles: Arena<Projectile>,
}

impl Entities {
    pub fn compact(&mut self) {
        self.enemies.compact();
        self.items.compact();
        self.projectiles.compact();
    }
}
