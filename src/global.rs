//! Process-wide heap instance and the classical C-style entry points.
//!
//! The heap value itself is single-threaded; here one instance is held
//! behind a mutex and created lazily on first use, which is what the
//! malloc-family free functions and the [`GlobalAlloc`] adapter go
//! through.

use core::alloc::{GlobalAlloc, Layout};
use std::ptr::null_mut;

use parking_lot::Mutex;

use crate::globals::{ALIGNMENT, MAX_HEAP};
use crate::heap::Heap;

static HEAP: Mutex<Option<Heap>> = Mutex::new(None);

fn with_heap<R>(f: impl FnOnce(&mut Heap) -> R) -> R {
    let mut heap = HEAP.lock();
    f(heap.get_or_insert_with(|| Heap::new(MAX_HEAP)))
}

pub fn malloc(size: usize) -> *mut u8 {
    with_heap(|heap| heap.malloc(size))
}

pub fn free(ptr: *mut u8) {
    with_heap(|heap| heap.free(ptr))
}

pub fn realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    with_heap(|heap| heap.realloc(ptr, size))
}

pub fn calloc(count: usize, size: usize) -> *mut u8 {
    with_heap(|heap| heap.calloc(count, size))
}

/// Rust allocator facade over the process-wide heap.
///
/// The heap only guarantees 8-byte alignment, so any layout demanding
/// more is refused with a null return.
pub struct Segalloc;

unsafe impl GlobalAlloc for Segalloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return null_mut();
        }
        malloc(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        free(ptr)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return null_mut();
        }
        calloc(layout.size(), 1)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return null_mut();
        }
        crate::global::realloc(ptr, new_size)
    }
}
