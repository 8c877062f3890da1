/// Header/footer word size in bytes.
pub const WSIZE: usize = 4;
/// Double word, the pointer and alignment granule.
pub const DSIZE: usize = 8;
/// Every payload pointer handed out is aligned to this.
pub const ALIGNMENT: usize = DSIZE;
/// Smallest block that can still hold boundary tags plus two list links
/// when free.
pub const MIN_BLOCK_SIZE: usize = 3 * DSIZE;
/// Default amount the break is advanced by when the free lists come up
/// empty. Tuned for small mixed workloads; any multiple of `DSIZE` works.
pub const CHUNKSIZE: usize = 168;
/// Address space reserved for the process-wide heap.
pub const MAX_HEAP: usize = 256 * 1024 * 1024;
