use lz4_flex::block::{compress, decompress_into};

use crate::block::BlockCodec;
use crate::format::CODEC_LZ4;

/// LZ4 block codec.
///
/// Fastest decompression of the bundled codecs. The raw length lives in the
/// member header, so blocks are written without lz4_flex's size prefix.
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn id(&self) -> u8 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(compress(raw))
    }

    fn decompress_block(&self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<()> {
        let n = decompress_into(payload, out)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        if n != out.len() {
            anyhow::bail!("lz4 block decoded to {} bytes, expected {}", n, out.len());
        }
        Ok(())
    }
}
