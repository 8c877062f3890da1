use std::fmt;

use crate::utils::formatted_size;

/// Counters the heap keeps about itself. Observational only.
pub struct HeapStats {
    /// Bytes obtained through the break so far.
    pub footprint: usize,
    pub heap_extensions: usize,
    pub total_allocations: usize,
    pub total_frees: usize,
}

impl fmt::Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Heap statistics:")?;
        writeln!(f, " footprint: {}", formatted_size(self.footprint))?;
        writeln!(f, " heap extensions: {}", self.heap_extensions)?;
        writeln!(f, " allocations: {}", self.total_allocations)?;
        writeln!(f, " frees: {}", self.total_frees)
    }
}
