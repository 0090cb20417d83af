//! Generational arena.
//!
//! Lines are allocated in an [`Arena`] and referenced by [`Handle`]. Freed slots are reused, and
//! each reuse bumps the slot generation so a stale handle resolves to `None` instead of aliasing
//! the new occupant.

/// Index of a value stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation the handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Slot storage with a free list.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Store `value`, reusing a freed slot when available.
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;

        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            if let Slot::Vacant {
                generation,
                next_free,
            } = *slot
            {
                self.free_head = next_free;
                *slot = Slot::Occupied { generation, value };
                return Handle { index, generation };
            }
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Remove the value behind `handle`, returning it if the handle was live.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return None,
        }

        let vacant = Slot::Vacant {
            generation: handle.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Slot::Occupied { value, .. } = std::mem::replace(slot, vacant) else {
            return None;
        };
        self.free_head = Some(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Borrow the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.slots.get(handle.index())? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Mutably borrow the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index())? {
            Slot::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Whether `handle` still refers to a live value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free every slot. Outstanding handles become stale.
    pub fn clear(&mut self) {
        let mut free_head = None;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            let generation = match slot {
                Slot::Occupied { generation, .. } => generation.wrapping_add(1),
                Slot::Vacant { generation, .. } => *generation,
            };
            *slot = Slot::Vacant {
                generation,
                next_free: free_head,
            };
            free_head = Some(index as u32);
        }
        self.free_head = free_head;
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
