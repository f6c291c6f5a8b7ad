/// A compression algorithm applied to one chunk at a time.
///
/// Each `BlockCodec` implementation:
/// - Is identified by a stable numeric `id()` stored in every member header.
/// - Compresses and decompresses chunks independently; no state carries over
///   from one chunk to the next. This is what lets a decoder resume at any
///   member boundary after a corrupt region.
pub trait BlockCodec: Send + Sync {
    /// Stable codec ID stored in the member header.
    fn id(&self) -> u8;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Compress a single chunk.
    ///
    /// The result may be larger than `raw`; the session then stores the chunk
    /// verbatim instead.
    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decompress `payload` into `out`, which is exactly the chunk's raw
    /// length. Producing any other number of bytes is an error.
    fn decompress_block(&self, payload: &[u8], out: &mut [u8]) -> anyhow::Result<()>;
}
