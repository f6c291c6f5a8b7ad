use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::Direction;

/// Fatal conditions raised while transcoding one file.
///
/// Every variant aborts the current file only; whether the process keeps
/// going with the next file is the caller's decision.
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "input file {path:?} is {size} bytes, greater than the supported maximum {max} bytes (~{}GiB)",
        gib(.max)
    )]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("cannot query size of {path:?}: {source}")]
    SizeQuery { path: PathBuf, source: io::Error },

    #[error("cannot open {path:?} for reading: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot create {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("read from {path:?} failed: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot resume {path:?} at offset {offset}: {source}")]
    Seek {
        path: PathBuf,
        offset: u64,
        source: io::Error,
    },

    #[error("write to output stream failed: {0}")]
    Write(#[from] io::Error),

    #[error("short write: wrote {written} of {requested} bytes")]
    ShortWrite { requested: usize, written: usize },

    #[error("{direction} failed with error: {code}")]
    Codec { direction: Direction, code: i32 },

    #[error("unrecoverable data in {path:?} at offset {offset}")]
    Unrecoverable { path: PathBuf, offset: u64 },

    #[error("codec made no progress with {remaining} bytes left in the slice")]
    NoProgress { remaining: usize },

    #[error("{path:?} ended after {read} of {expected} bytes")]
    Truncated {
        path: PathBuf,
        read: u64,
        expected: u64,
    },

    #[error("timing ledger is empty; stats need at least one codec call")]
    EmptyLedger,

    #[error("timing ledger spans zero time; throughput is undefined")]
    ZeroElapsed,

    #[error("cannot remove source {path:?}: {source}")]
    RemoveSource { path: PathBuf, source: io::Error },

    #[error("configuration error: {0}")]
    Config(String),
}

fn gib(max: &u64) -> u64 {
    max.saturating_add(1) >> 30
}

pub type Result<T> = std::result::Result<T, Error>;
