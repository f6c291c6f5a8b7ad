use xxhash_rust::xxh3::xxh3_64;

/// Magic bytes opening every member.
pub const MAGIC: &[u8; 4] = b"SLZ\x01";

/// Fixed size of a member header in bytes.
///   magic[4] + codec_id:u8 + flags:u8 + reserved:u16
///   + raw_len:u32 + payload_len:u32 + checksum:u64 + header_check:u32
///   = 4 + 1 + 1 + 2 + 4 + 4 + 8 + 4 = 28
pub const HEADER_SIZE: usize = 28;

/// Bytes covered by `header_check`.
const CHECKED_LEN: usize = 24;

/// Largest raw chunk a member may carry: half of a 2 MiB - 5 KiB pinned
/// allocation.
pub const MAX_CHUNK_SIZE: u32 = (2 * 1024 * 1024 - 5 * 1024) / 2;

/// Default raw bytes per member: 64 KB.
pub const DEFAULT_CHUNK_SIZE: u32 = 64 * 1024;

/// Suffix appended to compressed file names.
pub const SUFFIX: &str = ".slz";

// ── Flags ──────────────────────────────────────────────────────────────────

/// Payload holds the raw bytes verbatim; the algorithm did not shrink them.
pub const FLAG_STORED: u8 = 1 << 0;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_STORE: u8 = 0;
pub const CODEC_DEFLATE: u8 = 1;
pub const CODEC_LZ4: u8 = 2;
pub const CODEC_ZSTD: u8 = 3;

// ── Header ─────────────────────────────────────────────────────────────────

/// Decoded member header. One member carries one compressed chunk and is
/// decodable on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHeader {
    pub codec_id: u8,
    pub flags: u8,
    /// Length of the chunk before compression.
    pub raw_len: u32,
    /// Length of the payload following the header.
    pub payload_len: u32,
    /// xxhash3-64 of the payload bytes.
    pub checksum: u64,
}

/// Result of looking for a header at the front of a byte slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderParse {
    Valid(MemberHeader),
    /// The bytes present are consistent with a header, but there are too few.
    Truncated,
    Corrupt,
}

impl MemberHeader {
    pub fn is_stored(&self) -> bool {
        self.flags & FLAG_STORED != 0
    }

    /// Header plus payload.
    pub fn member_len(&self) -> usize {
        HEADER_SIZE + self.payload_len as usize
    }

    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(MAGIC);
        buf[4] = self.codec_id;
        buf[5] = self.flags;
        // buf[6..8] reserved, stays zero
        buf[8..12].copy_from_slice(&self.raw_len.to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf[16..24].copy_from_slice(&self.checksum.to_le_bytes());
        let check = xxh3_64(&buf[..CHECKED_LEN]) as u32;
        buf[24..28].copy_from_slice(&check.to_le_bytes());
        buf
    }

    /// Parse the header at the front of `buf`.
    ///
    /// A short `buf` is `Truncated` only while its bytes still agree with
    /// the magic; anything that fails the magic, the header check or the
    /// field limits is `Corrupt`.
    pub fn parse(buf: &[u8]) -> HeaderParse {
        let magic_len = buf.len().min(MAGIC.len());
        if buf[..magic_len] != MAGIC[..magic_len] {
            return HeaderParse::Corrupt;
        }
        if buf.len() < HEADER_SIZE {
            return HeaderParse::Truncated;
        }

        let stored_check = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);
        if xxh3_64(&buf[..CHECKED_LEN]) as u32 != stored_check {
            return HeaderParse::Corrupt;
        }
        if buf[6] != 0 || buf[7] != 0 {
            return HeaderParse::Corrupt;
        }

        let header = MemberHeader {
            codec_id: buf[4],
            flags: buf[5],
            raw_len: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            payload_len: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            checksum: u64::from_le_bytes([
                buf[16], buf[17], buf[18], buf[19], buf[20], buf[21], buf[22], buf[23],
            ]),
        };

        let lengths_ok = header.raw_len != 0
            && header.raw_len <= MAX_CHUNK_SIZE
            && if header.is_stored() {
                header.payload_len == header.raw_len
            } else {
                header.payload_len < header.raw_len
            };
        if !lengths_ok {
            return HeaderParse::Corrupt;
        }
        HeaderParse::Valid(header)
    }
}
