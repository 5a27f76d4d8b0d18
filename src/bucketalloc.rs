// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Slot arena with a free list and generation-tagged handles.
//
// Freed slots are recycled, and each reuse bumps the slot's generation so
// a handle kept past `free` no longer resolves. Used for the sweep's active
// regions, which are created and destroyed constantly while edges still
// point at them.

use std::ops::{Index, IndexMut};

/// A reference to a live slot in a [`BucketAlloc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

pub struct BucketAlloc<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> BucketAlloc<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store `item`, reusing a freed slot when one is available.
    pub fn alloc(&mut self, item: T) -> Handle {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.item = Some(item);
            Handle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                item: Some(item),
            });
            Handle {
                index,
                generation: 0,
            }
        }
    }

    /// Release the slot and return its item. Stale handles return `None`.
    pub fn free(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let item = slot.item.take()?;
        self.free_list.push(handle.index);
        Some(item)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.item.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.item.as_mut()
    }
}

impl<T> Default for BucketAlloc<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for BucketAlloc<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(item) => item,
            None => panic!("stale arena handle {:?}", handle),
        }
    }
}

impl<T> IndexMut<Handle> for BucketAlloc<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(item) => item,
            None => panic!("stale arena handle {:?}", handle),
        }
    }
}
