//! Core copy trait and implementations.
//!
//! This module provides the [`BlkCat`] trait which copies the contents of a
//! file to a writer, using the buffer strategy selected in [`Options`].

use crate::block_size::{page_size, select_block_size};
use crate::buffer::AlignedBuffer;
use crate::error::{Error, Result};
use crate::options::{Options, Strategy};
use crate::state::State;

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

/// Trait for copying a file's contents to a writer.
///
/// # Example
///
/// ```no_run
/// use blkcat::{BlkCat, Options, Strategy};
/// use std::io;
/// use std::path::Path;
///
/// let path = Path::new("/path/to/file");
/// let mut out = io::stdout().lock();
///
/// // Copy with the filesystem-aware strategy
/// let state = path.blk_cat(&mut out).unwrap();
///
/// // Copy one byte at a time
/// let opts = Options::new().with_strategy(Strategy::Byte);
/// let state = path.blk_cat_opt(&mut out, &opts).unwrap();
/// ```
pub trait BlkCat {
    /// Copy the whole file to `out` with default options.
    fn blk_cat<W: Write>(&self, out: &mut W) -> Result<State> {
        self.blk_cat_opt(out, &Options::default())
    }

    /// Copy the whole file to `out` with options.
    ///
    /// Bytes already written when a read or write fails stay written. The
    /// transfer buffer is released before this returns, on every path.
    fn blk_cat_opt<W: Write>(&self, out: &mut W, options: &Options) -> Result<State>;
}

/// Internal helper to perform the actual copy.
struct CopyContext<'a> {
    file: &'a File,
    options: &'a Options,
}

impl<'a> CopyContext<'a> {
    fn new(file: &'a File, options: &'a Options) -> Self {
        Self { file, options }
    }

    fn copy_to<W: Write>(&self, out: &mut W) -> Result<State> {
        if self.options.fadvise {
            advise_sequential(self.file);
        }

        let strategy = self.options.strategy;
        let state = match strategy {
            Strategy::Byte => {
                let mut byte = [0u8; 1];
                self.pump_into(out, &mut byte, State::new(strategy, 1))?
            }
            Strategy::Block => {
                let size = self.chunk_size(page_size());
                let mut buf = heap_buffer(size)?;
                self.pump_into(out, &mut buf, State::new(strategy, size))?
            }
            Strategy::Aligned => {
                let size = self.chunk_size(page_size());
                let mut buf = AlignedBuffer::new(size).map_err(Error::Allocate)?;
                self.pump_into(out, &mut buf, State::new(strategy, size))?
            }
            Strategy::FsAware => {
                let size = self.chunk_size(select_block_size(self.file));
                let mut buf = AlignedBuffer::new(size).map_err(Error::Allocate)?;
                self.pump_into(out, &mut buf, State::new(strategy, size))?
            }
        };

        out.flush().map_err(Error::Write)?;
        Ok(state)
    }

    /// The override from options if set, otherwise `selected`.
    fn chunk_size(&self, selected: usize) -> usize {
        self.options.block_size.map_or(selected, |n| n.get())
    }

    fn pump_into<W: Write>(&self, out: &mut W, buf: &mut [u8], mut state: State) -> Result<State> {
        tracing::debug!(
            strategy = state.strategy.name(),
            chunk_size = state.chunk_size,
            "starting copy"
        );
        pump(self.file, out, buf, &mut state)?;
        Ok(state)
    }
}

/// Allocate a zeroed heap buffer, reporting allocation failure as an error.
fn heap_buffer(size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|e| Error::Allocate(io::Error::new(io::ErrorKind::OutOfMemory, e)))?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Read chunks from `reader` into `buf` and write each one to `out` until
/// end of file.
fn pump<R: Read, W: Write>(
    mut reader: R,
    out: &mut W,
    buf: &mut [u8],
    state: &mut State,
) -> Result<()> {
    loop {
        let n = match reader.read(buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        };
        state.reads += 1;
        write_chunk(out, &buf[..n], state)?;
    }
}

/// Write all of `chunk`, retrying partial writes from where they stopped.
fn write_chunk<W: Write>(out: &mut W, chunk: &[u8], state: &mut State) -> Result<()> {
    let mut written = 0;
    while written < chunk.len() {
        match out.write(&chunk[written..]) {
            Ok(0) => {
                return Err(Error::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                )));
            }
            Ok(n) => {
                written += n;
                state.writes += 1;
                state.bytes_copied += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Write(e)),
        }
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn advise_sequential(file: &File) {
    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL) };
    if ret != 0 {
        let err = io::Error::from_raw_os_error(ret);
        tracing::warn!(error = %err, "posix_fadvise failed, continuing without hint");
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_sequential(file: &File) {
    tracing::debug!(fd = file.as_raw_fd(), "sequential hint not supported on this platform");
}

/// Close `file`, reporting a failed `close` instead of ignoring it.
fn close(file: File) -> Result<()> {
    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just released by `File` and is closed exactly once here.
    if unsafe { libc::close(fd) } == -1 {
        return Err(Error::Close(io::Error::last_os_error()));
    }
    Ok(())
}

// Implementation for Path
impl BlkCat for Path {
    fn blk_cat_opt<W: Write>(&self, out: &mut W, options: &Options) -> Result<State> {
        let file = File::open(self).map_err(|source| Error::Open {
            path: self.to_path_buf(),
            source,
        })?;
        let state = CopyContext::new(&file, options).copy_to(out)?;
        close(file)?;
        Ok(state)
    }
}

// Implementation for PathBuf
impl BlkCat for PathBuf {
    fn blk_cat_opt<W: Write>(&self, out: &mut W, options: &Options) -> Result<State> {
        self.as_path().blk_cat_opt(out, options)
    }
}

// Implementation for File
impl BlkCat for File {
    fn blk_cat_opt<W: Write>(&self, out: &mut W, options: &Options) -> Result<State> {
        CopyContext::new(self, options).copy_to(out)
    }
}
