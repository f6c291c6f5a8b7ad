use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::block::BlockCodec;
use crate::format::CODEC_DEFLATE;

/// Raw deflate block codec (no zlib or gzip wrapper; the member header
/// carries lengths and checksum).
pub struct DeflateCodec {
    /// Compression level, 1..=9.
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 1 }
    }
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

impl BlockCodec for DeflateCodec {
    fn id(&self) -> u8 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut enc = DeflateEncoder::new(Vec::with_capacity(raw.len()), Compression::new(self.level));
        enc.write_all(raw)?;
        Ok(enc.finish()?)
    }

    fn decompress_block(&self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<()> {
        let mut dec = Decompress::new(false);
        let status = dec.decompress(payload, out, FlushDecompress::Finish)?;
        if status != Status::StreamEnd {
            anyhow::bail!(
                "deflate block did not end within {} output bytes ({:?})",
                out.len(),
                status
            );
        }
        if dec.total_out() != out.len() as u64 || dec.total_in() != payload.len() as u64 {
            anyhow::bail!(
                "deflate block consumed {}/{} bytes and produced {}/{}",
                dec.total_in(),
                payload.len(),
                dec.total_out(),
                out.len()
            );
        }
        Ok(())
    }
}
