use crate::block::BlockCodec;
use crate::format::CODEC_ZSTD;

/// Zstandard block codec.
///
/// Each chunk is compressed as its own zstd frame at the configured level.
///
/// Best for: general text, JSON, logs, mixed structured data.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, higher = slower / smaller).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCodec for ZstdCodec {
    fn id(&self) -> u8 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(zstd::bulk::compress(raw, self.level)?)
    }

    fn decompress_block(&self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<()> {
        let n = zstd::bulk::decompress_to_buffer(payload, out)?;
        if n != out.len() {
            anyhow::bail!("zstd block decoded to {} bytes, expected {}", n, out.len());
        }
        Ok(())
    }
}
