//! Configuration options for copy operations.

use std::num::NonZeroUsize;

/// How the transfer buffer is sized and allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Read and write one byte at a time.
    Byte,
    /// Page-sized chunks in an ordinary heap buffer.
    Block,
    /// Page-sized chunks in a page-aligned buffer.
    Aligned,
    /// Chunks sized from the page size and the filesystem's preferred I/O
    /// size, in a page-aligned buffer.
    #[default]
    FsAware,
}

impl Strategy {
    /// Short lowercase name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Byte => "byte",
            Strategy::Block => "block",
            Strategy::Aligned => "aligned",
            Strategy::FsAware => "fs-aware",
        }
    }
}

/// Options for controlling the copy behavior.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Buffer strategy to use.
    pub strategy: Strategy,

    /// Fixed chunk size overriding the selected one.
    ///
    /// Applies to every strategy except [`Strategy::Byte`]. For the aligned
    /// strategies the buffer start is still page-aligned.
    pub block_size: Option<NonZeroUsize>,

    /// Advise the kernel that the file will be read sequentially.
    ///
    /// Uses `posix_fadvise(POSIX_FADV_SEQUENTIAL)` on Linux and is ignored
    /// elsewhere. A failed hint is logged and the copy proceeds.
    pub fadvise: bool,
}

impl Options {
    /// Create a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set or clear the fixed chunk size.
    pub fn with_block_size(mut self, block_size: Option<NonZeroUsize>) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable the sequential-access hint.
    pub fn with_fadvise(mut self, fadvise: bool) -> Self {
        self.fadvise = fadvise;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();
        assert_eq!(opts.strategy, Strategy::FsAware);
        assert!(opts.block_size.is_none());
        assert!(!opts.fadvise);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = Options::new()
            .with_strategy(Strategy::Block)
            .with_block_size(NonZeroUsize::new(262144))
            .with_fadvise(true);

        assert_eq!(opts.strategy, Strategy::Block);
        assert_eq!(opts.block_size.map(NonZeroUsize::get), Some(262144));
        assert!(opts.fadvise);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Byte.name(), "byte");
        assert_eq!(Strategy::Block.name(), "block");
        assert_eq!(Strategy::Aligned.name(), "aligned");
        assert_eq!(Strategy::FsAware.name(), "fs-aware");
    }
}
