//! CLI tool for copying a file to standard output.
//!
//! This tool uses the `blkcat` library to copy a single file to stdout
//! through a page-aligned, filesystem-block-sized buffer.

use blkcat::{page_size, BlkCat, Options, Strategy};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::os::fd::AsFd;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Copy a file to standard output.
///
/// The transfer buffer is sized from the memory page size and the
/// filesystem's preferred I/O block size, and starts on a page boundary.
#[derive(Parser, Debug)]
#[command(name = "blkcat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the file to copy
    path: PathBuf,

    /// Buffer strategy
    #[arg(short, long, value_enum, default_value_t = Mode::FsAware)]
    strategy: Mode,

    /// Fixed chunk size in bytes (ignored by the byte strategy)
    #[arg(short, long)]
    block_size: Option<NonZeroUsize>,

    /// Advise the kernel that the file is read sequentially
    #[arg(long)]
    fadvise: bool,

    /// Enable verbose output (page size, block size, transfer counters)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One byte per read and write
    Byte,
    /// Page-sized chunks in a heap buffer
    Block,
    /// Page-sized chunks in a page-aligned buffer
    Aligned,
    /// Filesystem-aware chunk size in a page-aligned buffer
    FsAware,
}

impl From<Mode> for Strategy {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Byte => Strategy::Byte,
            Mode::Block => Strategy::Block,
            Mode::Aligned => Strategy::Aligned,
            Mode::FsAware => Strategy::FsAware,
        }
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_target(false)
        .with_ansi(false)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> blkcat::Result<()> {
    if args.verbose {
        print_verbose_info(&args.path);
    }

    let options = Options::new()
        .with_strategy(args.strategy.into())
        .with_block_size(args.block_size)
        .with_fadvise(args.fadvise);

    let mut stdout = raw_stdout()?;
    let state = args.path.blk_cat_opt(&mut stdout, &options)?;

    if args.verbose {
        eprintln!();
        eprintln!("Strategy: {}", state.strategy.name());
        eprintln!("Chunk size: {} (0x{:x})", state.chunk_size, state.chunk_size);
        eprintln!(
            "Copied {} bytes in {} read(s) and {} write(s)",
            state.bytes_copied, state.reads, state.writes
        );
    }

    Ok(())
}

/// Unbuffered handle on fd 1, so every chunk reaches `write(2)` as-is.
fn raw_stdout() -> blkcat::Result<File> {
    io::stdout()
        .as_fd()
        .try_clone_to_owned()
        .map(File::from)
        .map_err(blkcat::Error::Write)
}

fn print_verbose_info(path: &Path) {
    eprintln!("File: {}", path.display());
    eprintln!("Page size: {}", page_size());

    // Failures here are reported again, fatally, by the copy itself.
    match std::fs::metadata(path) {
        Ok(meta) => {
            eprintln!("Size: {}", meta.len());
            eprintln!("Filesystem block size: {}", meta.blksize());
        }
        Err(e) => {
            eprintln!("Filesystem block size: (unable to query: {})", e);
        }
    }
}
