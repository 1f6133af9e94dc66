//! State returned from copy operations.

use crate::options::Strategy;

/// Result state from a copy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Strategy used for the transfer.
    pub strategy: Strategy,

    /// Size of each read request in bytes.
    pub chunk_size: usize,

    /// Number of bytes written to the output.
    pub bytes_copied: u64,

    /// Number of reads that returned data.
    pub reads: u64,

    /// Number of write calls that accepted data.
    pub writes: u64,
}

impl State {
    /// Create an empty State for a transfer about to start.
    pub fn new(strategy: Strategy, chunk_size: usize) -> Self {
        Self {
            strategy,
            chunk_size,
            bytes_copied: 0,
            reads: 0,
            writes: 0,
        }
    }
}
