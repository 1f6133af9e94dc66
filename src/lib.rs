//! # blkcat
//!
//! A Rust crate for copying a file to a writer through page-aligned,
//! filesystem-block-sized buffers.
//!
//! ## Overview
//!
//! `blkcat` implements the transfer loop of a minimal `cat`, together with
//! the two pieces that decide how efficient that loop is:
//!
//! - **Block-size selection**: the chunk size is the least common multiple
//!   of the memory page size and the filesystem's preferred I/O size
//!   (`st_blksize`), capped at 1 MiB.
//! - **Aligned allocation**: [`AlignedBuffer`] owns a heap block and exposes
//!   a page-aligned window inside it, releasing the whole block on drop.
//!
//! ## Strategies
//!
//! - [`Strategy::Byte`]: one byte per read and write
//! - [`Strategy::Block`]: page-sized chunks in a plain heap buffer
//! - [`Strategy::Aligned`]: page-sized chunks in a page-aligned buffer
//! - [`Strategy::FsAware`]: filesystem-aware chunk size, page-aligned buffer
//!
//! All strategies produce byte-identical output.
//!
//! ## Example
//!
//! ```no_run
//! use blkcat::{BlkCat, Options, Strategy};
//! use std::io;
//! use std::path::Path;
//!
//! let path = Path::new("/path/to/file");
//! let mut out = io::stdout().lock();
//!
//! // Simple copy
//! let state = path.blk_cat(&mut out).unwrap();
//!
//! // Copy with options
//! let options = Options::new().with_strategy(Strategy::Aligned);
//! let state = path.blk_cat_opt(&mut out, &options).unwrap();
//! eprintln!("Copied {} bytes in {} reads", state.bytes_copied, state.reads);
//! ```

mod block_size;
mod buffer;
mod cat;
mod error;
mod options;
mod state;

pub use block_size::{
    block_size_for, gcd, lcm, page_size, sanitize_fs_block_size, select_block_size,
    DEFAULT_FS_BLOCK_SIZE, DEFAULT_PAGE_SIZE, MAX_BLOCK_SIZE, MIN_FS_BLOCK_SIZE,
};
pub use buffer::AlignedBuffer;
pub use cat::BlkCat;
pub use error::{Error, Result};
pub use options::{Options, Strategy};
pub use state::State;
