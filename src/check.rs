//! Heap consistency checking.
//!
//! One observer predicate that walks the physical block sequence and
//! every free list and reports each violated invariant on stderr. Used
//! by the tests after every public call; never mutates the heap.

use crate::block::{
    block_size, footer, header, is_allocated, next_block, next_free, prev_free,
};
use crate::globals::{ALIGNMENT, DSIZE, MIN_BLOCK_SIZE};
use crate::heap::Heap;
use crate::size_class::{class_index, NUM_SIZE_CLASSES};
use crate::utils::is_aligned;

impl Heap {
    /// Verify every structural invariant of the heap. Returns true iff
    /// all hold; `verbose` additionally prints each block during the
    /// physical walk. A heap that has not yet been touched is trivially
    /// consistent.
    pub fn check_heap(&self, verbose: bool) -> bool {
        if self.base.is_null() {
            return true;
        }
        let mut ok = true;
        unsafe {
            // Prologue shape, then the physical walk up to the epilogue.
            if block_size(self.base) != DSIZE || !is_allocated(self.base) {
                eprintln!("bad prologue at {:p}", self.base);
                ok = false;
            }
            ok &= self.check_block(self.base);

            let mut physical_free = 0usize;
            let mut last_was_free = false;
            let mut bp = next_block(self.base);
            while block_size(bp) > 0 {
                if verbose {
                    self.print_block(bp);
                }
                ok &= self.check_block(bp);
                if !is_allocated(bp) {
                    physical_free += 1;
                    if last_was_free {
                        eprintln!("adjacent free blocks at {:p}", bp);
                        ok = false;
                    }
                    last_was_free = true;
                } else {
                    last_was_free = false;
                }
                bp = next_block(bp);
            }

            if block_size(bp) != 0 || !is_allocated(bp) {
                eprintln!("bad epilogue at {:p}", bp);
                ok = false;
            }

            // Every list, node by node.
            let mut listed_free = 0usize;
            for class in 1..=NUM_SIZE_CLASSES {
                let mut fp = self.free_table.head(class);
                while !fp.is_null() {
                    if !self.in_heap(fp) {
                        eprintln!("list {}: node {:p} is out of bounds", class, fp);
                        ok = false;
                        break;
                    }
                    ok &= self.check_free_block(fp, class);
                    listed_free += 1;
                    fp = next_free(fp);
                }
            }

            // Both walks must agree on how many free blocks exist.
            if listed_free != physical_free {
                eprintln!(
                    "free block count mismatch: walk found {}, lists hold {}",
                    physical_free, listed_free
                );
                ok = false;
            }
        }
        ok
    }

    fn in_heap(&self, p: *const u8) -> bool {
        p >= self.mem.heap_lo() as *const u8 && p <= self.mem.heap_hi() as *const u8
    }

    unsafe fn check_block(&self, bp: *mut u8) -> bool {
        let mut ok = true;
        if !self.in_heap(bp) {
            eprintln!("block {:p} is out of bounds", bp);
            ok = false;
        }
        if !is_aligned(bp as usize, ALIGNMENT) {
            eprintln!("block {:p} is not doubleword aligned", bp);
            ok = false;
        }
        let size = block_size(bp);
        if size % ALIGNMENT != 0 {
            eprintln!("block {:p} has unaligned size {}", bp, size);
            ok = false;
        }
        if size < MIN_BLOCK_SIZE && bp != self.base {
            eprintln!("block {:p} is below the minimum size ({})", bp, size);
            ok = false;
        }
        if (*header(bp)) != (*footer(bp)) {
            eprintln!("block {:p}: header does not match footer", bp);
            ok = false;
        }
        ok
    }

    unsafe fn check_free_block(&self, fp: *mut u8, class: usize) -> bool {
        let mut ok = true;
        if is_allocated(fp) {
            eprintln!("list {}: node {:p} is marked allocated", class, fp);
            ok = false;
        }

        let prev = prev_free(fp);
        let next = next_free(fp);
        if !prev.is_null() {
            if !self.in_heap(prev) {
                eprintln!("list {}: prev link of {:p} is out of bounds", class, fp);
                ok = false;
            } else if next_free(prev) != fp {
                eprintln!("list {}: broken link between {:p} and {:p}", class, prev, fp);
                ok = false;
            }
        }
        if !next.is_null() {
            if !self.in_heap(next) {
                eprintln!("list {}: next link of {:p} is out of bounds", class, fp);
                ok = false;
            } else if prev_free(next) != fp {
                eprintln!("list {}: broken link between {:p} and {:p}", class, fp, next);
                ok = false;
            }
        }
        if prev == fp || next == fp {
            eprintln!("list {}: node {:p} links to itself", class, fp);
            ok = false;
        }
        if class_index(block_size(fp)) != class {
            eprintln!(
                "node {:p} of size {} sits on list {} instead of {}",
                fp,
                block_size(fp),
                class,
                class_index(block_size(fp))
            );
            ok = false;
        }
        ok
    }

    unsafe fn print_block(&self, bp: *mut u8) {
        let head = *header(bp);
        let foot = *footer(bp);
        eprintln!(
            "{:p}: header [{}|{}] footer [{}|{}]",
            bp,
            head.block_size(),
            if head.allocated() { "a" } else { "f" },
            foot.block_size(),
            if foot.allocated() { "a" } else { "f" },
        );
    }
}
