//! The heap proper: placement, splitting, coalescing and the four
//! classical entry points.

use std::ptr::{self, null_mut};

use crate::block::{
    block_size, header, is_allocated, next_block, next_free, prev_block, prev_footer, write_tags,
    BlockWord,
};
use crate::free_list::{FreeTable, TABLE_BLOCK_SIZE};
use crate::globals::{CHUNKSIZE, DSIZE, MIN_BLOCK_SIZE, WSIZE};
use crate::morecore::MoreCore;
use crate::size_class::{class_index, NUM_SIZE_CLASSES};
use crate::stats::HeapStats;
use crate::utils::align_down;

/// A single contiguous heap managed through segregated free lists.
///
/// The value is single-threaded; callers that share one across threads
/// provide their own exclusion (see [`crate::global`] for the locked
/// process-wide instance).
pub struct Heap {
    pub(crate) mem: MoreCore,
    /// Prologue block pointer; null until the lazy first-use setup ran.
    pub(crate) base: *mut u8,
    pub(crate) free_table: FreeTable,
    pub(crate) extension_count: usize,
    pub(crate) alloc_count: usize,
    pub(crate) free_count: usize,
}

// The heap exclusively owns the mapping all of its raw pointers point
// into, so moving it across threads is sound.
unsafe impl Send for Heap {}

/// Request size with boundary-tag overhead folded in, rounded to the
/// alignment granule and clamped to the minimum block. None when the
/// rounding itself cannot be represented.
fn adjusted_size(size: usize) -> Option<usize> {
    if size <= DSIZE {
        Some(MIN_BLOCK_SIZE)
    } else {
        size.checked_add(2 * DSIZE - 1).map(|s| align_down(s, DSIZE))
    }
}

impl Heap {
    /// Create a heap backed by `capacity` bytes of reserved address
    /// space. No memory is carved up until the first allocation.
    pub fn new(capacity: usize) -> Self {
        Self {
            mem: MoreCore::new(capacity),
            base: null_mut(),
            free_table: FreeTable::unbound(),
            extension_count: 0,
            alloc_count: 0,
            free_count: 0,
        }
    }

    /// One-shot setup of the managed region; idempotent.
    ///
    /// A single break extension lays down, low to high: one padding
    /// word, the directory sentinel block holding the free-list slots,
    /// the prologue pair, and the epilogue word. The region then grows
    /// by an initial chunk so the first fit has something to scan.
    fn init(&mut self) -> bool {
        if !self.base.is_null() {
            return true;
        }
        unsafe {
            let start = self.mem.sbrk(TABLE_BLOCK_SIZE + 2 * DSIZE);
            if start.is_null() {
                return false;
            }
            let table_bp = start.add(DSIZE);
            write_tags(table_bp, TABLE_BLOCK_SIZE, true);
            self.free_table = FreeTable::bind(table_bp);

            let base = table_bp.add(TABLE_BLOCK_SIZE);
            write_tags(base, DSIZE, true);
            header(base.add(DSIZE)).write(BlockWord::pack(0, true));
            self.base = base;

            if self.extend(CHUNKSIZE / WSIZE).is_null() {
                self.base = null_mut();
                return false;
            }
        }
        true
    }

    /// Grow the managed region by `words` words (rounded up to an even
    /// count) and return the resulting free block, coalesced with a free
    /// left neighbor if there is one. Null if the break refused.
    unsafe fn extend(&mut self, words: usize) -> *mut u8 {
        let size = if words % 2 == 1 {
            (words + 1) * WSIZE
        } else {
            words * WSIZE
        };

        // The old epilogue word is exactly where the new block's header
        // belongs, so the returned break pointer is already a block
        // pointer.
        let bp = self.mem.sbrk(size);
        if bp.is_null() {
            return null_mut();
        }
        write_tags(bp, size, false);
        header(next_block(bp)).write(BlockWord::pack(0, true));
        self.extension_count += 1;

        self.coalesce(bp)
    }

    /// Boundary-tag coalescing of `bp`, whose tags are already free but
    /// which sits on no list yet. Returns the merged block after
    /// publishing it on the list for its final size.
    unsafe fn coalesce(&mut self, mut bp: *mut u8) -> *mut u8 {
        let prev_alloc = (*prev_footer(bp)).allocated();
        let next_bp = next_block(bp);
        let next_alloc = is_allocated(next_bp);
        let mut size = block_size(bp);

        if prev_alloc && next_alloc {
            self.free_table.insert(bp);
        } else if prev_alloc && !next_alloc {
            self.free_table.remove(next_bp);
            size += block_size(next_bp);
            write_tags(bp, size, false);
            self.free_table.insert(bp);
        } else if !prev_alloc && next_alloc {
            let prev_bp = prev_block(bp);
            self.free_table.remove(prev_bp);
            size += block_size(prev_bp);
            write_tags(prev_bp, size, false);
            bp = prev_bp;
            self.free_table.insert(bp);
        } else {
            let prev_bp = prev_block(bp);
            self.free_table.remove(prev_bp);
            self.free_table.remove(next_bp);
            size += block_size(prev_bp) + block_size(next_bp);
            write_tags(prev_bp, size, false);
            bp = prev_bp;
            self.free_table.insert(bp);
        }

        bp
    }

    /// First fit over the classes that could hold `asize`. A class spans
    /// a size range, so every node of a list is inspected rather than
    /// just its head.
    unsafe fn find_fit(&self, asize: usize) -> *mut u8 {
        for class in class_index(asize)..=NUM_SIZE_CLASSES {
            let mut bp = self.free_table.head(class);
            while !bp.is_null() {
                if block_size(bp) >= asize {
                    return bp;
                }
                bp = next_free(bp);
            }
        }
        null_mut()
    }

    /// Commit `asize` bytes of the free block `bp`, splitting off the
    /// remainder when it can stand as a block of its own.
    unsafe fn place(&mut self, bp: *mut u8, asize: usize) {
        let csize = block_size(bp);
        self.free_table.remove(bp);

        if csize - asize >= MIN_BLOCK_SIZE {
            write_tags(bp, asize, true);
            let rem = next_block(bp);
            write_tags(rem, csize - asize, false);
            // The remainder cannot merge left, but the generic path also
            // covers a free right neighbor.
            self.coalesce(rem);
        } else {
            write_tags(bp, csize, true);
        }
    }

    /// Allocate `size` bytes. Returns an 8-aligned payload pointer, or
    /// null when the request is zero or the break refuses to grow.
    pub fn malloc(&mut self, size: usize) -> *mut u8 {
        if self.base.is_null() && !self.init() {
            return null_mut();
        }
        if size == 0 {
            return null_mut();
        }
        let asize = match adjusted_size(size) {
            Some(asize) => asize,
            None => return null_mut(),
        };
        unsafe {
            let mut bp = self.find_fit(asize);
            if bp.is_null() {
                bp = self.extend(asize.max(CHUNKSIZE) / WSIZE);
                if bp.is_null() {
                    return null_mut();
                }
            }
            self.place(bp, asize);
            self.alloc_count += 1;
            bp
        }
    }

    /// Release the block at `ptr`. Null is a no-op. `ptr` must have come
    /// out of this heap and must not have been released already.
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        unsafe {
            let size = block_size(ptr);
            write_tags(ptr, size, false);
            self.coalesce(ptr);
        }
        self.free_count += 1;
    }

    /// Resize the allocation at `ptr` to `size` bytes.
    ///
    /// A shrinking or same-size request returns `ptr` unchanged, keeping
    /// the block's full extent. Growth allocates fresh space, copies the
    /// old payload and releases the old block; on failure the old block
    /// is left intact and null is returned.
    pub fn realloc(&mut self, ptr: *mut u8, size: usize) -> *mut u8 {
        if size == 0 {
            self.free(ptr);
            return null_mut();
        }
        if ptr.is_null() {
            return self.malloc(size);
        }
        unsafe {
            let old_size = block_size(ptr);
            match adjusted_size(size) {
                Some(asize) if asize <= old_size => return ptr,
                Some(_) => {}
                None => return null_mut(),
            }
            let new_ptr = self.malloc(size);
            if new_ptr.is_null() {
                return null_mut();
            }
            ptr::copy_nonoverlapping(ptr, new_ptr, old_size - DSIZE);
            self.free(ptr);
            new_ptr
        }
    }

    /// Allocate `count * size` bytes with every payload byte zeroed.
    /// A product that overflows is treated as an unsatisfiable request.
    pub fn calloc(&mut self, count: usize, size: usize) -> *mut u8 {
        let bytes = match count.checked_mul(size) {
            Some(bytes) => bytes,
            None => return null_mut(),
        };
        let ptr = self.malloc(bytes);
        if !ptr.is_null() {
            unsafe {
                ptr::write_bytes(ptr, 0, block_size(ptr) - DSIZE);
            }
        }
        ptr
    }

    pub fn statistics(&self) -> HeapStats {
        HeapStats {
            footprint: self.mem.footprint(),
            heap_extensions: self.extension_count,
            total_allocations: self.alloc_count,
            total_frees: self.free_count,
        }
    }

    /// Cap the break below the reserved capacity; further growth past the
    /// cap is refused. Test hook for out-of-memory paths.
    pub fn set_footprint_limit(&mut self, limit: usize) {
        self.mem.set_footprint_limit(limit);
    }
}
