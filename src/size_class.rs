//! Size-class selection for the segregated free lists.

use crate::globals::ALIGNMENT;

/// Number of free lists, including the open-ended tail class.
pub const NUM_SIZE_CLASSES: usize = 18;

/// Upper bound of each bounded class, in 8-byte units. Class `k` holds
/// free blocks whose size in units falls in `(CLASS_LIMITS[k-2],
/// CLASS_LIMITS[k-1]]`; everything above the last limit lands in the
/// tail class.
pub const CLASS_LIMITS: [usize; NUM_SIZE_CLASSES - 1] = [
    3, 4, 5, 6, 7, 8, 9, 10, 12, 16, 32, 64, 128, 256, 512, 1024, 2048,
];

/// Class index (1-based) for a block of `size` bytes.
pub fn class_index(size: usize) -> usize {
    let units = size / ALIGNMENT;
    for (i, limit) in CLASS_LIMITS.iter().enumerate() {
        if units <= *limit {
            return i + 1;
        }
    }
    NUM_SIZE_CLASSES
}
