use crate::block::BlockCodec;
use crate::format::CODEC_STORE;

/// No-op codec: chunks are never shrunk, so every member ends up stored.
///
/// Useful for:
/// - Exercising the slicing and recovery machinery independently of any
///   algorithm.
/// - Data that is already compressed (e.g., JPEG, MP4) where further
///   compression would only cost time.
pub struct PassThroughCodec;

impl BlockCodec for PassThroughCodec {
    fn id(&self) -> u8 {
        CODEC_STORE
    }

    fn name(&self) -> &'static str {
        "store"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress_block(&self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<()> {
        if payload.len() != out.len() {
            anyhow::bail!(
                "stored payload is {} bytes but chunk is {}",
                payload.len(),
                out.len()
            );
        }
        out.copy_from_slice(payload);
        Ok(())
    }
}
