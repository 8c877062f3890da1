//! Byte-level view of a heap block.
//!
//! Every block, allocated or free, is laid out as
//!
//! ```text
//! +--------+---------------------------+--------+
//! | header |          payload          | footer |
//! +--------+---------------------------+--------+
//!   4 bytes                              4 bytes
//! ```
//!
//! and a block pointer `bp` always names the first payload byte, so the
//! header sits at `bp - 4` and the footer at `bp + size - 8`. Header and
//! footer carry the same word. When the block is free, the first two
//! payload double words hold the previous and next links of the free
//! list the block sits on.

use modular_bitfield::prelude::*;

use crate::globals::{ALIGNMENT, DSIZE, WSIZE};

// The boundary-tag word.
//
// +-----------+------+-------------------------------------------+
// | name      | bits |                                           |
// +-----------+------+-------------------------------------------+
// | allocated |    1 | Set while the block is handed out.        |
// | unused    |    2 |                                           |
// | size      |   29 | Block size in 8-byte units; sizes are     |
// |           |      | always a multiple of 8 so the raw word is |
// |           |      | exactly `size | allocated`.               |
// +-----------+------+-------------------------------------------+
#[bitfield(bits = 32)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlockWord {
    pub allocated: bool,
    #[skip]
    __: B2,
    pub size: B29,
}

impl BlockWord {
    pub fn pack(size: usize, allocated: bool) -> Self {
        debug_assert!(size % ALIGNMENT == 0);
        Self::new()
            .with_size((size / ALIGNMENT) as u32)
            .with_allocated(allocated)
    }

    /// Block size in bytes.
    #[inline(always)]
    pub fn block_size(self) -> usize {
        self.size() as usize * ALIGNMENT
    }
}

/// Header word of the block at `bp`.
#[inline(always)]
pub unsafe fn header(bp: *mut u8) -> *mut BlockWord {
    bp.sub(WSIZE).cast()
}

/// Footer word of the block at `bp`. Reads the header to find it.
#[inline(always)]
pub unsafe fn footer(bp: *mut u8) -> *mut BlockWord {
    bp.add(block_size(bp) - DSIZE).cast()
}

/// Footer word of the physical predecessor of `bp`.
#[inline(always)]
pub unsafe fn prev_footer(bp: *mut u8) -> *mut BlockWord {
    bp.sub(DSIZE).cast()
}

#[inline(always)]
pub unsafe fn block_size(bp: *mut u8) -> usize {
    (*header(bp)).block_size()
}

#[inline(always)]
pub unsafe fn is_allocated(bp: *mut u8) -> bool {
    (*header(bp)).allocated()
}

/// Stamp matching header and footer words for a block of `size` bytes.
#[inline]
pub unsafe fn write_tags(bp: *mut u8, size: usize, allocated: bool) {
    let word = BlockWord::pack(size, allocated);
    header(bp).write(word);
    bp.add(size - DSIZE).cast::<BlockWord>().write(word);
}

/// Physical successor; valid as long as the epilogue terminates the heap.
#[inline(always)]
pub unsafe fn next_block(bp: *mut u8) -> *mut u8 {
    bp.add(block_size(bp))
}

/// Physical predecessor, located through its footer; valid as long as the
/// prologue bounds the heap on the left.
#[inline(always)]
pub unsafe fn prev_block(bp: *mut u8) -> *mut u8 {
    bp.sub((*prev_footer(bp)).block_size())
}

#[inline(always)]
pub unsafe fn prev_free(bp: *mut u8) -> *mut u8 {
    bp.cast::<*mut u8>().read()
}

#[inline(always)]
pub unsafe fn next_free(bp: *mut u8) -> *mut u8 {
    bp.add(DSIZE).cast::<*mut u8>().read()
}

#[inline(always)]
pub unsafe fn set_prev_free(bp: *mut u8, link: *mut u8) {
    bp.cast::<*mut u8>().write(link)
}

#[inline(always)]
pub unsafe fn set_next_free(bp: *mut u8, link: *mut u8) {
    bp.add(DSIZE).cast::<*mut u8>().write(link)
}
