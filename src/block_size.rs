//! Transfer chunk size selection.
//!
//! The chunk size used by the copy loop is derived from two platform hints:
//! the memory page size (queried once per process via `sysconf`) and the
//! preferred I/O block size the filesystem reports for a file (`st_blksize`).
//! The chosen size is the least common multiple of the two, so a buffer of
//! that size is both page-aligned friendly and a whole number of filesystem
//! blocks.

use once_cell::sync::Lazy;
use std::fs::File;
use std::io;
use std::os::unix::fs::MetadataExt;

/// Page size assumed when the platform query fails.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Filesystem block size substituted for implausible `st_blksize` values.
pub const DEFAULT_FS_BLOCK_SIZE: usize = 4096;

/// Smallest filesystem block size accepted as genuine.
pub const MIN_FS_BLOCK_SIZE: usize = 512;

/// Upper bound on a selected chunk size (1 MiB).
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024;

/// Process-wide page size.
///
/// The page size cannot change while the process runs, so it is queried
/// once and reused by both the selector and the aligned allocator.
static PAGE_SIZE: Lazy<usize> = Lazy::new(query_page_size);

fn query_page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match resolve_page_size(raw) {
        Some(size) => size,
        None => {
            let err = io::Error::last_os_error();
            tracing::warn!(
                raw,
                error = %err,
                fallback = DEFAULT_PAGE_SIZE,
                "sysconf(_SC_PAGESIZE) failed, using fallback page size"
            );
            DEFAULT_PAGE_SIZE
        }
    }
}

/// Interpret a raw `sysconf(_SC_PAGESIZE)` result.
///
/// Returns `None` for `-1` and for anything that cannot serve as an
/// alignment boundary (zero, negative, not a power of two).
fn resolve_page_size(raw: libc::c_long) -> Option<usize> {
    usize::try_from(raw).ok().filter(|n| n.is_power_of_two())
}

/// Get the platform memory page size in bytes.
///
/// Falls back to [`DEFAULT_PAGE_SIZE`] (with a warning) if the platform
/// query fails. Always a power of two.
pub fn page_size() -> usize {
    *PAGE_SIZE
}

/// Greatest common divisor using the Euclidean algorithm.
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple, or `None` if it does not fit in a `usize`.
///
/// `lcm(0, n)` is `0`.
pub fn lcm(a: usize, b: usize) -> Option<usize> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Validate a filesystem-reported block size.
///
/// Some filesystems and drivers report zero or otherwise nonsensical
/// values. Anything that is not a power of two of at least
/// [`MIN_FS_BLOCK_SIZE`] bytes is replaced by [`DEFAULT_FS_BLOCK_SIZE`].
pub fn sanitize_fs_block_size(raw: u64) -> usize {
    match usize::try_from(raw) {
        Ok(size) if size.is_power_of_two() && size >= MIN_FS_BLOCK_SIZE => size,
        _ => {
            tracing::debug!(
                raw,
                fallback = DEFAULT_FS_BLOCK_SIZE,
                "implausible filesystem block size"
            );
            DEFAULT_FS_BLOCK_SIZE
        }
    }
}

/// Compute the chunk size for a given page size and filesystem hint.
///
/// With no filesystem hint the page size is used as-is. Otherwise the
/// result is `lcm(page_size, sanitized_hint)`, except that a result above
/// [`MAX_BLOCK_SIZE`] collapses to the page size rather than to the cap.
///
/// A `page_size` that is not a power of two is replaced by
/// [`DEFAULT_PAGE_SIZE`], so the result is never zero.
pub fn block_size_for(page_size: usize, fs_block_size: Option<u64>) -> usize {
    let page_size = if page_size.is_power_of_two() {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    };

    let Some(raw) = fs_block_size else {
        return page_size;
    };

    let fs_block_size = sanitize_fs_block_size(raw);
    match lcm(page_size, fs_block_size) {
        Some(size) if size <= MAX_BLOCK_SIZE => size,
        _ => page_size,
    }
}

/// Select the chunk size to use for copying `file`.
///
/// Queries the filesystem's preferred I/O size with `fstat`. If that fails
/// the failure is logged and only the page size is used. Never fails.
pub fn select_block_size(file: &File) -> usize {
    block_size_from_probe(page_size(), file.metadata().map(|meta| meta.blksize()))
}

/// Chunk size from the outcome of an `st_blksize` query.
fn block_size_from_probe(page_size: usize, probe: io::Result<u64>) -> usize {
    let fs_block_size = match probe {
        Ok(blksize) => Some(blksize),
        Err(e) => {
            tracing::warn!(error = %e, "fstat failed, using page size as block size");
            None
        }
    };

    let size = block_size_for(page_size, fs_block_size);
    tracing::debug!(size, ?fs_block_size, "selected block size");
    size
}
