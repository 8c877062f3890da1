//! The unidirectional break the heap grows through.
//!
//! A fixed span of address space is reserved up front and handed out
//! linearly, sbrk-style. Nothing is ever returned; the break only moves
//! up. A footprint limit below the reservation can be set to make the
//! break refuse further growth, which is how out-of-memory behavior is
//! exercised in tests.

use std::ptr::null_mut;

use crate::globals::WSIZE;
use crate::mmap::Mmap;

pub struct MoreCore {
    map: Mmap,
    brk: *mut u8,
    footprint_limit: usize,
}

impl MoreCore {
    pub fn new(capacity: usize) -> Self {
        let map = Mmap::new(capacity);
        let brk = map.start();
        Self {
            map,
            brk,
            footprint_limit: capacity,
        }
    }

    /// Advance the break by `incr` bytes and return the old break, or
    /// null if the new break would exceed the reservation or the
    /// footprint limit. State is unchanged on refusal.
    pub fn sbrk(&mut self, incr: usize) -> *mut u8 {
        debug_assert!(incr > 0 && incr % WSIZE == 0);
        let old = self.brk;
        let new = match (old as usize).checked_add(incr) {
            Some(new) => new,
            None => return null_mut(),
        };
        if new > self.map.end() as usize || self.footprint() + incr > self.footprint_limit {
            return null_mut();
        }
        self.map.commit(old, incr);
        self.brk = new as *mut u8;
        old
    }

    /// Inclusive lower bound of the heap.
    pub fn heap_lo(&self) -> *mut u8 {
        self.map.start()
    }

    /// Inclusive upper bound: the last byte below the break.
    pub fn heap_hi(&self) -> *mut u8 {
        (self.brk as usize - 1) as *mut u8
    }

    /// Bytes obtained through the break so far.
    pub fn footprint(&self) -> usize {
        self.brk as usize - self.map.start() as usize
    }

    pub fn footprint_limit(&self) -> usize {
        self.footprint_limit
    }

    pub fn set_footprint_limit(&mut self, limit: usize) {
        self.footprint_limit = limit.min(self.map.size());
    }
}
