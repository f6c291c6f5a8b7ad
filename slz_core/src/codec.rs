use std::fmt;

/// Which way a transcode call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

impl Direction {
    pub fn is_compress(self) -> bool {
        matches!(self, Direction::Compress)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Compress => f.write_str("compression"),
            Direction::Decompress => f.write_str("decompression"),
        }
    }
}

/// Status reported by a single codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call finished the work it was able to do.
    Ok,
    /// The destination filled up before the source was consumed. Progress
    /// made so far is still reported and valid.
    BufferTooSmall,
    /// The source holds data the codec cannot decode.
    DataError,
    /// Any other failure, carrying a codec-specific code.
    Failure(i32),
}

impl Status {
    /// Numeric code for diagnostics.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::BufferTooSmall => -3,
            Status::DataError => -4,
            Status::Failure(code) => code,
        }
    }
}

/// Result of one codec call: the status plus how many source bytes were
/// consumed and how many destination bytes were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcode {
    pub status: Status,
    pub consumed: usize,
    pub produced: usize,
}

impl Transcode {
    pub fn new(status: Status, consumed: usize, produced: usize) -> Self {
        Self {
            status,
            consumed,
            produced,
        }
    }
}

/// The transcode primitive driven by the pipeline.
///
/// A session is set up once per process and handed to every pipeline call as
/// `&mut dyn Codec`; it is never entered concurrently. Implementations:
/// - consume a prefix of `src` and write their output to the front of `dst`,
///   never past `dst.len()`;
/// - report partial progress alongside `BufferTooSmall` and `DataError`, so
///   output produced before the stop is kept;
/// - keep no state between calls that would make a later call depend on an
///   earlier slice.
pub trait Codec {
    /// Human-readable name for progress output.
    fn name(&self) -> &str;

    /// Run one transcode call over `src` into `dst`.
    fn transcode(&mut self, direction: Direction, src: &[u8], dst: &mut [u8]) -> Transcode;

    /// Worst-case compressed size for `len` input bytes.
    fn compress_bound(&self, len: usize) -> usize;

    /// Smallest destination that lets a decompress call over well-formed
    /// input always make progress.
    fn min_decompress_capacity(&self) -> usize {
        0
    }
}
