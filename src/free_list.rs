//! The free-list directory: one LIFO doubly linked list per size class.
//!
//! The directory lives inside the heap itself, at the front of the
//! managed region, framed by its own boundary tags so neighbor
//! arithmetic treats it as an ordinary allocated block. Each slot is an
//! 8-byte nullable block pointer naming the head of one list. List links
//! are stored in the payload of the free blocks themselves, so both
//! operations touch only the link words and the header size.

use std::ptr::null_mut;

use crate::block::{block_size, next_free, prev_free, set_next_free, set_prev_free};
use crate::globals::DSIZE;
use crate::size_class::{class_index, NUM_SIZE_CLASSES};

/// Size of the directory's sentinel block: one slot per class plus the
/// boundary-tag pair.
pub const TABLE_BLOCK_SIZE: usize = NUM_SIZE_CLASSES * DSIZE + DSIZE;

pub struct FreeTable {
    base: *mut u8,
}

impl FreeTable {
    /// A directory not yet backed by heap memory. Usable only after
    /// [`FreeTable::bind`].
    pub const fn unbound() -> Self {
        Self { base: null_mut() }
    }

    /// Take ownership of the slot array at `base` and empty every list.
    pub unsafe fn bind(base: *mut u8) -> Self {
        for class in 1..=NUM_SIZE_CLASSES {
            base.add((class - 1) * DSIZE).cast::<*mut u8>().write(null_mut());
        }
        Self { base }
    }

    fn slot(&self, class: usize) -> *mut *mut u8 {
        debug_assert!((1..=NUM_SIZE_CLASSES).contains(&class));
        unsafe { self.base.add((class - 1) * DSIZE).cast() }
    }

    pub unsafe fn head(&self, class: usize) -> *mut u8 {
        self.slot(class).read()
    }

    pub unsafe fn set_head(&mut self, class: usize, bp: *mut u8) {
        self.slot(class).write(bp)
    }

    /// Push `bp` onto the head of the list for its size. `bp` must carry
    /// free boundary tags and must not currently sit on any list.
    pub unsafe fn insert(&mut self, bp: *mut u8) {
        let class = class_index(block_size(bp));
        let head = self.head(class);
        set_prev_free(bp, null_mut());
        set_next_free(bp, head);
        if !head.is_null() {
            set_prev_free(head, bp);
        }
        self.set_head(class, bp);
    }

    /// Unlink `bp` from the list it sits on.
    pub unsafe fn remove(&mut self, bp: *mut u8) {
        let prev = prev_free(bp);
        let next = next_free(bp);
        if prev.is_null() {
            self.set_head(class_index(block_size(bp)), next);
        } else {
            set_next_free(prev, next);
        }
        if !next.is_null() {
            set_prev_free(next, prev);
        }
    }
}
