use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::chunk::{ChunkOutcome, ChunkProcessor};
use crate::codec::{Codec, Direction};
use crate::config::{PipelineConfig, MAX_FILE_SIZE};
use crate::error::{Error, Result};
use crate::stats::StatsReport;
use crate::timing::TimingLedger;

/// What happened to one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub direction: Direction,
    /// Source size as queried before processing.
    pub input_bytes: u64,
    /// Bytes written to the destination.
    pub output_bytes: u64,
    /// Source bytes accounted for by the codec, including regions skipped
    /// after a data fault. Equals `input_bytes` on success.
    pub consumed_bytes: u64,
    pub slices: usize,
    pub chunks: usize,
    /// Data faults recovered from by skipping undecodable bytes. Members
    /// merely cut by a slice edge are re-read and not counted.
    pub recovered_faults: usize,
    /// Source bytes discarded across all recovered faults.
    pub skipped_bytes: u64,
    /// `None` when no codec call was made (empty source) or the calls took
    /// no measurable time.
    pub stats: Option<StatsReport>,
}

/// Transcodes whole files through a codec session in bounded slices.
///
/// # Per-file sequence
/// 1. Query the source size; reject it above [`MAX_FILE_SIZE`] before
///    anything is allocated or created.
/// 2. Size the source buffer as `min(size, window_ceiling)` and the
///    destination buffer from the codec bound (compress) or the expansion
///    factor (decompress).
/// 3. Read a slice, hand it to the [`ChunkProcessor`], repeat until the whole
///    file is accounted for. A recoverable data fault moves the read cursor
///    to the resume point instead of failing the file.
/// 4. Derive stats from the timing ledger.
/// 5. Once both files have been opened, the source is removed when
///    processing ends, successfully or not, unless `keep_source` is set.
///
/// Buffers, handles and the ledger are scoped to a single file. The codec
/// session is borrowed for the pipeline's lifetime and reused across files.
pub struct Pipeline<'a> {
    codec: &'a mut dyn Codec,
    config: &'a PipelineConfig,
}

/// Handles and buffer sizes for a file that passed the up-front checks.
struct OpenFiles {
    input: File,
    output: File,
    size: u64,
    window: usize,
    dst_capacity: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(codec: &'a mut dyn Codec, config: &'a PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { codec, config })
    }

    pub fn transcode_file(
        &mut self,
        source: &Path,
        dest: &Path,
        direction: Direction,
    ) -> Result<FileReport> {
        let files = self.open(source, dest, direction)?;
        // handles are closed when `process` returns
        let result = self.process(files, source, direction);

        if !self.config.keep_source {
            match (&result, fs::remove_file(source)) {
                (Ok(_), Ok(())) => info!("removed source {:?}", source),
                (Err(_), Ok(())) => warn!("removed source {:?} after a failed run", source),
                (Ok(_), Err(e)) => {
                    return Err(Error::RemoveSource {
                        path: source.to_path_buf(),
                        source: e,
                    })
                }
                (Err(_), Err(e)) => warn!("cannot remove source {:?}: {}", source, e),
            }
        }
        result
    }

    fn open(&self, source: &Path, dest: &Path, direction: Direction) -> Result<OpenFiles> {
        let size = fs::metadata(source)
            .map_err(|e| Error::SizeQuery {
                path: source.to_path_buf(),
                source: e,
            })?
            .len();
        if size > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge {
                path: source.to_path_buf(),
                size,
                max: MAX_FILE_SIZE,
            });
        }

        let window = self.config.window_for(size);
        let dst_capacity = match (window, direction) {
            (0, _) => 0,
            (_, Direction::Compress) => self.codec.compress_bound(window),
            (_, Direction::Decompress) => window
                .saturating_mul(self.config.expansion_factor)
                .max(self.codec.min_decompress_capacity()),
        };

        let input = File::open(source).map_err(|e| Error::Open {
            path: source.to_path_buf(),
            source: e,
        })?;
        let output = File::create(dest).map_err(|e| Error::Create {
            path: dest.to_path_buf(),
            source: e,
        })?;

        info!(
            "{} {:?} -> {:?} with {} ({} bytes, window {}, output buffer {})",
            if direction.is_compress() {
                "Compressing"
            } else {
                "Decompressing"
            },
            source,
            dest,
            self.codec.name(),
            size,
            window,
            dst_capacity
        );
        Ok(OpenFiles {
            input,
            output,
            size,
            window,
            dst_capacity,
        })
    }

    fn process(&mut self, files: OpenFiles, source: &Path, direction: Direction) -> Result<FileReport> {
        let OpenFiles {
            mut input,
            mut output,
            size: file_size,
            window,
            dst_capacity,
        } = files;
        let mut src_buf = vec![0u8; window];
        let mut dst_buf = vec![0u8; dst_capacity];

        let mut ledger = TimingLedger::new();
        let mut processor = ChunkProcessor::new(&mut *self.codec, direction, &mut ledger);

        // Absolute source offset of the next unprocessed byte.
        let mut offset = 0u64;
        let mut output_bytes = 0u64;
        let mut slices = 0usize;
        let mut chunks = 0usize;
        let mut recovered_faults = 0usize;
        let mut skipped_bytes = 0u64;

        while offset < file_size {
            let want = (file_size - offset).min(window as u64) as usize;
            let read = read_slice(&mut input, &mut src_buf[..want]).map_err(|e| Error::Read {
                path: source.to_path_buf(),
                source: e,
            })?;
            if read == 0 {
                return Err(Error::Truncated {
                    path: source.to_path_buf(),
                    read: offset,
                    expected: file_size,
                });
            }
            info!("Reading input file {:?} ({} bytes at offset {})", source, read, offset);

            let slice = processor.process_slice(&src_buf[..read], &mut dst_buf, &mut output)?;
            slices += 1;
            chunks += slice.chunks;
            output_bytes += slice.produced as u64;

            match slice.outcome {
                ChunkOutcome::Success { .. } => offset += read as u64,
                ChunkOutcome::RecoverableDataError { consumed } => {
                    if consumed == 0 {
                        return Err(Error::Unrecoverable {
                            path: source.to_path_buf(),
                            offset,
                        });
                    }
                    let fault_at = offset + (consumed - slice.skipped) as u64;
                    offset += consumed as u64;
                    input.seek(SeekFrom::Start(offset)).map_err(|e| Error::Seek {
                        path: source.to_path_buf(),
                        offset,
                        source: e,
                    })?;
                    if slice.skipped > 0 {
                        recovered_faults += 1;
                        skipped_bytes += slice.skipped as u64;
                        warn!(
                            "data error in {:?}: skipped {} undecodable bytes at offset {}, resuming at offset {}",
                            source, slice.skipped, fault_at, offset
                        );
                    } else {
                        debug!(
                            "{:?}: slice stops decoding {} of {} bytes in, re-reading from offset {}",
                            source, consumed, read, offset
                        );
                    }
                }
                ChunkOutcome::FatalError { code } => {
                    return Err(Error::Codec { direction, code });
                }
            }
        }
        output.flush()?;

        let stats = match StatsReport::from_ledger(&ledger, file_size, output_bytes, direction) {
            Ok(stats) => Some(stats),
            Err(Error::EmptyLedger) => None,
            Err(Error::ZeroElapsed) => {
                debug!("{:?}: codec calls took no measurable time, no stats", source);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FileReport {
            direction,
            input_bytes: file_size,
            output_bytes,
            consumed_bytes: offset,
            slices,
            chunks,
            recovered_faults,
            skipped_bytes,
            stats,
        })
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_slice<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
