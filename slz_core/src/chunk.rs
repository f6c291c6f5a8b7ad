use std::io::Write;

use log::debug;

use crate::codec::{Codec, Direction, Status};
use crate::error::{Error, Result};
use crate::timing::TimingLedger;

/// Code attached to a fatal outcome when the codec claims more progress
/// than its buffers allow.
pub const INVALID_PROGRESS: i32 = i32::MIN;

/// How the last codec call of a slice ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The slice was fully consumed. Counts are slice totals.
    Success { consumed: usize, produced: usize },
    /// Decompression hit undecodable data. `consumed` is the number of slice
    /// bytes accounted for before the fault; output for them has been written.
    RecoverableDataError { consumed: usize },
    /// The codec failed in a way nothing downstream can validate.
    FatalError { code: i32 },
}

/// Totals for one slice, whatever the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceResult {
    pub outcome: ChunkOutcome,
    pub consumed: usize,
    pub produced: usize,
    /// Bytes the codec discarded without output when it reported a data
    /// fault, i.e. input it skipped to get back in sync. Zero when the fault
    /// only marks where the decodable prefix ends.
    pub skipped: usize,
    /// Codec calls made for this slice.
    pub chunks: usize,
}

/// Drives the codec over one in-memory slice, flushing each chunk's output
/// to the sink before the next call.
pub struct ChunkProcessor<'a> {
    codec: &'a mut dyn Codec,
    direction: Direction,
    ledger: &'a mut TimingLedger,
}

impl<'a> ChunkProcessor<'a> {
    pub fn new(codec: &'a mut dyn Codec, direction: Direction, ledger: &'a mut TimingLedger) -> Self {
        Self {
            codec,
            direction,
            ledger,
        }
    }

    /// Process `src` to exhaustion, a data fault, or a fatal codec status.
    ///
    /// Every call receives all of `dst`; the capacity is never shrunk between
    /// calls. I/O faults on the sink and calls that make no progress are
    /// returned as errors.
    pub fn process_slice<W: Write + ?Sized>(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
        sink: &mut W,
    ) -> Result<SliceResult> {
        let capacity = dst.len();
        let mut consumed = 0usize;
        let mut produced = 0usize;
        let mut chunks = 0usize;
        let mut skipped = 0usize;

        let outcome = loop {
            if consumed == src.len() {
                break ChunkOutcome::Success { consumed, produced };
            }
            let remaining = &src[consumed..];
            let codec = &mut *self.codec;
            let direction = self.direction;
            let call = self
                .ledger
                .time(|| codec.transcode(direction, remaining, &mut dst[..capacity]));
            chunks += 1;

            if call.consumed > remaining.len() || call.produced > capacity {
                break ChunkOutcome::FatalError {
                    code: INVALID_PROGRESS,
                };
            }

            match call.status {
                Status::Ok | Status::BufferTooSmall => {
                    write_chunk(sink, &dst[..call.produced])?;
                    consumed += call.consumed;
                    produced += call.produced;
                    debug!(
                        "chunk {}: {:?} consumed {} produced {}, {} bytes left in slice",
                        chunks,
                        call.status,
                        call.consumed,
                        call.produced,
                        src.len() - consumed
                    );
                    if call.consumed == 0 {
                        return Err(Error::NoProgress {
                            remaining: remaining.len(),
                        });
                    }
                }
                Status::DataError if self.direction == Direction::Decompress => {
                    write_chunk(sink, &dst[..call.produced])?;
                    consumed += call.consumed;
                    produced += call.produced;
                    if call.produced == 0 {
                        skipped = call.consumed;
                    }
                    debug!(
                        "chunk {}: data error after {} bytes of the slice ({} skipped)",
                        chunks, consumed, skipped
                    );
                    break ChunkOutcome::RecoverableDataError { consumed };
                }
                status => break ChunkOutcome::FatalError { code: status.code() },
            }
        };

        Ok(SliceResult {
            outcome,
            consumed,
            produced,
            skipped,
            chunks,
        })
    }
}

/// Write one chunk in a single call; anything short of the full length is
/// a fatal I/O fault.
fn write_chunk<W: Write + ?Sized>(sink: &mut W, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    let written = sink.write(bytes)?;
    if written != bytes.len() {
        return Err(Error::ShortWrite {
            requested: bytes.len(),
            written,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Transcode;
    use std::collections::VecDeque;
    use std::io;

    /// Copies input to output, limited by the destination capacity. A byte
    /// equal to `poison` is treated as undecodable.
    struct CopyCodec {
        poison: Option<u8>,
    }

    impl Codec for CopyCodec {
        fn name(&self) -> &str {
            "copy"
        }

        fn transcode(&mut self, _direction: Direction, src: &[u8], dst: &mut [u8]) -> Transcode {
            let clean = match self.poison {
                Some(p) => src.iter().position(|&b| b == p).unwrap_or(src.len()),
                None => src.len(),
            };
            let n = clean.min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
            let status = if n < clean {
                Status::BufferTooSmall
            } else if clean < src.len() {
                Status::DataError
            } else {
                Status::Ok
            };
            Transcode::new(status, n, n)
        }

        fn compress_bound(&self, len: usize) -> usize {
            len
        }
    }

    /// Replays a fixed sequence of results, writing `produced` bytes of 0xAB.
    struct ScriptedCodec {
        script: VecDeque<Transcode>,
    }

    impl Codec for ScriptedCodec {
        fn name(&self) -> &str {
            "scripted"
        }

        fn transcode(&mut self, _direction: Direction, _src: &[u8], dst: &mut [u8]) -> Transcode {
            let t = self.script.pop_front().expect("script exhausted");
            let n = t.produced.min(dst.len());
            dst[..n].fill(0xAB);
            t
        }

        fn compress_bound(&self, len: usize) -> usize {
            len
        }
    }

    struct ShortSink;

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn run(
        codec: &mut dyn Codec,
        direction: Direction,
        src: &[u8],
        capacity: usize,
    ) -> (Result<SliceResult>, Vec<u8>, TimingLedger) {
        let mut ledger = TimingLedger::new();
        let mut dst = vec![0u8; capacity];
        let mut out = Vec::new();
        let res = ChunkProcessor::new(codec, direction, &mut ledger).process_slice(src, &mut dst, &mut out);
        (res, out, ledger)
    }

    #[test]
    fn single_call_when_destination_is_large_enough() {
        let src = data(1000);
        let (res, out, ledger) = run(&mut CopyCodec { poison: None }, Direction::Compress, &src, 2000);
        let res = res.unwrap();
        assert_eq!(
            res.outcome,
            ChunkOutcome::Success {
                consumed: 1000,
                produced: 1000
            }
        );
        assert_eq!(res.chunks, 1);
        assert_eq!(ledger.len(), 1);
        assert_eq!(out, src);
    }

    #[test]
    fn buffer_too_small_loses_nothing() {
        let src = data(1000);
        let (big, big_out, _) = run(&mut CopyCodec { poison: None }, Direction::Decompress, &src, 4096);
        let (small, small_out, ledger) =
            run(&mut CopyCodec { poison: None }, Direction::Decompress, &src, 7);
        let (big, small) = (big.unwrap(), small.unwrap());

        assert_eq!(small.consumed, big.consumed);
        assert_eq!(small.produced, big.produced);
        assert_eq!(small_out, big_out);
        // ceil(1000 / 7) calls, one ledger sample each
        assert_eq!(small.chunks, 143);
        assert_eq!(ledger.len(), 143);
    }

    #[test]
    fn data_error_keeps_prior_output_and_reports_valid_prefix() {
        let mut src = data(600);
        src.iter_mut().for_each(|b| {
            if *b == 0xEE {
                *b = 0
            }
        });
        src[450] = 0xEE;
        let (res, out, _) = run(
            &mut CopyCodec { poison: Some(0xEE) },
            Direction::Decompress,
            &src,
            100,
        );
        let res = res.unwrap();
        assert_eq!(res.outcome, ChunkOutcome::RecoverableDataError { consumed: 450 });
        assert_eq!(res.consumed, 450);
        assert_eq!(res.skipped, 0);
        assert_eq!(out, &src[..450]);
    }

    #[test]
    fn data_error_without_output_counts_as_skipped() {
        let mut codec = ScriptedCodec {
            script: VecDeque::from([
                Transcode::new(Status::BufferTooSmall, 4, 8),
                Transcode::new(Status::DataError, 3, 0),
            ]),
        };
        let (res, out, _) = run(&mut codec, Direction::Decompress, &data(10), 8);
        let res = res.unwrap();
        assert_eq!(res.outcome, ChunkOutcome::RecoverableDataError { consumed: 7 });
        assert_eq!(res.skipped, 3);
        assert_eq!(res.produced, 8);
        assert_eq!(out, vec![0xAB; 8]);
    }

    #[test]
    fn data_error_while_compressing_is_fatal() {
        let mut codec = ScriptedCodec {
            script: VecDeque::from([Transcode::new(Status::DataError, 0, 0)]),
        };
        let (res, _, _) = run(&mut codec, Direction::Compress, &data(10), 64);
        assert_eq!(
            res.unwrap().outcome,
            ChunkOutcome::FatalError {
                code: Status::DataError.code()
            }
        );
    }

    #[test]
    fn failure_stops_the_slice_after_flushing_earlier_chunks() {
        let mut codec = ScriptedCodec {
            script: VecDeque::from([
                Transcode::new(Status::BufferTooSmall, 4, 8),
                Transcode::new(Status::Failure(-7), 0, 0),
            ]),
        };
        let (res, out, ledger) = run(&mut codec, Direction::Compress, &data(10), 8);
        let res = res.unwrap();
        assert_eq!(res.outcome, ChunkOutcome::FatalError { code: -7 });
        assert_eq!(res.consumed, 4);
        assert_eq!(out, vec![0xAB; 8]);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn overreported_progress_is_fatal() {
        let mut codec = ScriptedCodec {
            script: VecDeque::from([Transcode::new(Status::Ok, 11, 0)]),
        };
        let (res, _, _) = run(&mut codec, Direction::Compress, &data(10), 8);
        assert_eq!(
            res.unwrap().outcome,
            ChunkOutcome::FatalError {
                code: INVALID_PROGRESS
            }
        );
    }

    #[test]
    fn stalled_codec_is_an_error() {
        let mut codec = ScriptedCodec {
            script: VecDeque::from([Transcode::new(Status::BufferTooSmall, 0, 0)]),
        };
        let (res, _, _) = run(&mut codec, Direction::Decompress, &data(10), 8);
        assert!(matches!(res, Err(Error::NoProgress { remaining: 10 })));
    }

    #[test]
    fn output_without_consuming_input_is_a_stall() {
        // would otherwise repeat forever, writing the same output each time
        let mut codec = ScriptedCodec {
            script: VecDeque::from([
                Transcode::new(Status::Ok, 0, 5),
                Transcode::new(Status::Ok, 0, 5),
            ]),
        };
        let (res, out, ledger) = run(&mut codec, Direction::Compress, &data(10), 8);
        assert!(matches!(res, Err(Error::NoProgress { remaining: 10 })));
        assert_eq!(ledger.len(), 1);
        assert_eq!(out.len(), 5);
        assert_eq!(codec.script.len(), 1);
    }

    #[test]
    fn short_write_is_fatal() {
        let src = data(32);
        let mut ledger = TimingLedger::new();
        let mut dst = vec![0u8; 64];
        let mut codec = CopyCodec { poison: None };
        let res = ChunkProcessor::new(&mut codec, Direction::Compress, &mut ledger)
            .process_slice(&src, &mut dst, &mut ShortSink);
        assert!(matches!(
            res,
            Err(Error::ShortWrite {
                requested: 32,
                written: 16
            })
        ));
    }

    #[test]
    fn empty_slice_makes_no_calls() {
        let (res, out, ledger) = run(&mut CopyCodec { poison: None }, Direction::Compress, &[], 8);
        assert_eq!(res.unwrap().chunks, 0);
        assert!(out.is_empty());
        assert!(ledger.is_empty());
    }
}
