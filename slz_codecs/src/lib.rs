mod block;
mod deflate_codec;
pub mod format;
mod lz4_codec;
mod passthrough;
mod session;
mod zstd_codec;

pub use block::BlockCodec;
pub use deflate_codec::DeflateCodec;
pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use session::{Session, SessionParams, FAIL_COMPRESS};
pub use zstd_codec::ZstdCodec;

use format::{CODEC_DEFLATE, CODEC_LZ4, CODEC_STORE, CODEC_ZSTD};

/// Block algorithm selected for compression. Decompression reads the
/// algorithm from each member and needs no selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Store,
    Deflate,
    Lz4,
    Zstd,
}

impl Algorithm {
    pub const ALL: &'static [Algorithm] = &[
        Algorithm::Store,
        Algorithm::Deflate,
        Algorithm::Lz4,
        Algorithm::Zstd,
    ];

    /// Resolve a CLI-facing name.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        match name {
            "store" | "none" => Ok(Algorithm::Store),
            "deflate" | "gzip" => Ok(Algorithm::Deflate),
            "lz4" => Ok(Algorithm::Lz4),
            "zstd" => Ok(Algorithm::Zstd),
            other => anyhow::bail!(
                "unknown algorithm '{}'. Valid options: deflate, lz4, zstd, store",
                other
            ),
        }
    }

    /// Resolve the on-disk codec id found in a member header.
    pub fn from_id(id: u8) -> anyhow::Result<Self> {
        match id {
            CODEC_STORE => Ok(Algorithm::Store),
            CODEC_DEFLATE => Ok(Algorithm::Deflate),
            CODEC_LZ4 => Ok(Algorithm::Lz4),
            CODEC_ZSTD => Ok(Algorithm::Zstd),
            _ => anyhow::bail!("unknown codec id {}; supported: 0 (store), 1 (deflate), 2 (lz4), 3 (zstd)", id),
        }
    }
}

/// Build the block codec for `algorithm` at `level`.
pub fn block_codec(algorithm: Algorithm, level: u32) -> Box<dyn BlockCodec> {
    match algorithm {
        Algorithm::Store => Box::new(PassThroughCodec),
        Algorithm::Deflate => Box::new(DeflateCodec::new(level)),
        Algorithm::Lz4 => Box::new(Lz4Codec),
        Algorithm::Zstd => Box::new(ZstdCodec::new(level as i32)),
    }
}
