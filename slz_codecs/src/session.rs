use log::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use slz_core::{Codec, Direction, Status, Transcode};

use crate::block::BlockCodec;
use crate::format::{
    HeaderParse, MemberHeader, DEFAULT_CHUNK_SIZE, FLAG_STORED, HEADER_SIZE, MAX_CHUNK_SIZE,
};
use crate::{block_codec, Algorithm};

/// Failure code returned when a block algorithm cannot compress a chunk.
pub const FAIL_COMPRESS: i32 = -2;

/// Parameters negotiated once when the session is set up.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub algorithm: Algorithm,
    /// Compression level, 1..=9.
    pub level: u32,
    /// Raw bytes per member, 1..=MAX_CHUNK_SIZE.
    pub chunk_size: u32,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Deflate,
            level: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl SessionParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=9).contains(&self.level) {
            anyhow::bail!("compression level {} out of range 1..=9", self.level);
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "chunk size {} out of range 1..={}",
                self.chunk_size,
                MAX_CHUNK_SIZE
            );
        }
        Ok(())
    }
}

/// Codec session: turns slices into sequences of independent members and
/// back.
///
/// # Compressed layout
/// ```text
/// [MEMBER 0] [MEMBER 1] ... [MEMBER N-1]
/// MEMBER = [HEADER: 28 bytes][PAYLOAD: payload_len bytes]
/// ```
/// Every member covers at most `chunk_size` raw bytes and is decodable on
/// its own, so decompression can pick up again at any member boundary.
///
/// A session is set up once and reused for every file of a run; dropping it
/// is the teardown.
pub struct Session {
    params: SessionParams,
    encoder: Box<dyn BlockCodec>,
    /// One per algorithm, indexed by `Algorithm as usize`.
    decoders: Vec<Box<dyn BlockCodec>>,
}

impl Session {
    pub fn setup(params: SessionParams) -> anyhow::Result<Self> {
        params.validate()?;
        let encoder = block_codec(params.algorithm, params.level);
        let decoders = Algorithm::ALL
            .iter()
            .map(|&a| block_codec(a, params.level))
            .collect();
        debug!("session set up: {:?}", params);
        Ok(Self {
            params,
            encoder,
            decoders,
        })
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    fn decoder(&self, id: u8) -> Option<&dyn BlockCodec> {
        let algorithm = Algorithm::from_id(id).ok()?;
        Some(self.decoders[algorithm as usize].as_ref())
    }

    fn compress(&self, src: &[u8], dst: &mut [u8]) -> Transcode {
        let chunk_size = self.params.chunk_size as usize;
        let mut consumed = 0;
        let mut produced = 0;

        while consumed < src.len() {
            let end = (consumed + chunk_size).min(src.len());
            let chunk = &src[consumed..end];
            if dst.len() - produced < HEADER_SIZE + chunk.len() {
                return Transcode::new(Status::BufferTooSmall, consumed, produced);
            }

            let compressed = match self.encoder.compress_block(chunk) {
                Ok(c) => c,
                Err(e) => {
                    warn!("{} failed on a {} byte chunk: {:#}", self.encoder.name(), chunk.len(), e);
                    return Transcode::new(Status::Failure(FAIL_COMPRESS), consumed, produced);
                }
            };
            let (flags, payload) = if compressed.len() < chunk.len() {
                (0, compressed.as_slice())
            } else {
                (FLAG_STORED, chunk)
            };

            let header = MemberHeader {
                codec_id: self.encoder.id(),
                flags,
                raw_len: chunk.len() as u32,
                payload_len: payload.len() as u32,
                checksum: xxh3_64(payload),
            };
            dst[produced..produced + HEADER_SIZE].copy_from_slice(&header.to_bytes());
            produced += HEADER_SIZE;
            dst[produced..produced + payload.len()].copy_from_slice(payload);
            produced += payload.len();
            consumed = end;
        }

        Transcode::new(Status::Ok, consumed, produced)
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Transcode {
        let mut consumed = 0;
        let mut produced = 0;

        while consumed < src.len() {
            let rest = &src[consumed..];
            let header = match MemberHeader::parse(rest) {
                HeaderParse::Valid(h) => h,
                // A member cut by the slice boundary is re-read from the
                // next slice, starting at `consumed`.
                HeaderParse::Truncated => {
                    return Transcode::new(Status::DataError, consumed, produced)
                }
                HeaderParse::Corrupt => return corrupt_at(src, consumed, produced),
            };
            let member_len = header.member_len();
            if rest.len() < member_len {
                return Transcode::new(Status::DataError, consumed, produced);
            }
            let raw_len = header.raw_len as usize;
            if dst.len() - produced < raw_len {
                return Transcode::new(Status::BufferTooSmall, consumed, produced);
            }

            let payload = &rest[HEADER_SIZE..member_len];
            if xxh3_64(payload) != header.checksum {
                debug!("member at slice offset {}: payload checksum mismatch", consumed);
                return corrupt_at(src, consumed, produced);
            }
            let out = &mut dst[produced..produced + raw_len];
            if header.is_stored() {
                out.copy_from_slice(payload);
            } else {
                let Some(decoder) = self.decoder(header.codec_id) else {
                    debug!("member at slice offset {}: unknown codec id {}", consumed, header.codec_id);
                    return corrupt_at(src, consumed, produced);
                };
                if let Err(e) = decoder.decompress_block(payload, out) {
                    debug!("member at slice offset {}: {:#}", consumed, e);
                    return corrupt_at(src, consumed, produced);
                }
            }

            consumed += member_len;
            produced += raw_len;
        }

        Transcode::new(Status::Ok, consumed, produced)
    }
}

/// Report a corrupt member found at `offset` within `src`.
///
/// Past the first member, the valid prefix is reported so the caller can
/// resume right at the fault. At offset 0 there is no valid prefix; the
/// corrupt span is skipped up to the next plausible header (or the whole
/// slice when there is none) and reported as consumed with no output.
fn corrupt_at(src: &[u8], offset: usize, produced: usize) -> Transcode {
    if offset > 0 {
        return Transcode::new(Status::DataError, offset, produced);
    }
    let skip = (1..src.len())
        .find(|&p| MemberHeader::parse(&src[p..]) != HeaderParse::Corrupt)
        .unwrap_or(src.len());
    warn!("skipping {} bytes of corrupt data", skip);
    Transcode::new(Status::DataError, skip, 0)
}

impl Codec for Session {
    fn name(&self) -> &str {
        self.encoder.name()
    }

    fn transcode(&mut self, direction: Direction, src: &[u8], dst: &mut [u8]) -> Transcode {
        match direction {
            Direction::Compress => self.compress(src, dst),
            Direction::Decompress => self.decompress(src, dst),
        }
    }

    fn compress_bound(&self, len: usize) -> usize {
        len + len.div_ceil(self.params.chunk_size as usize) * HEADER_SIZE
    }

    fn min_decompress_capacity(&self) -> usize {
        MAX_CHUNK_SIZE as usize
    }
}
