use crate::error::{Error, Result};

/// Largest source file the pipeline accepts. Byte counters and buffer
/// arithmetic are 32-bit wide.
pub const MAX_FILE_SIZE: u64 = u32::MAX as u64;

/// Default working-buffer ceiling: 512 MiB read into memory per slice.
pub const DEFAULT_WINDOW_CEILING: usize = 512 * 1024 * 1024;

/// Estimated worst-case growth of decompressed data relative to its input.
pub const DEFAULT_EXPANSION_FACTOR: usize = 5;

/// Per-process pipeline settings, built once and passed by reference to
/// every file.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum bytes read into the source buffer per slice.
    pub window_ceiling: usize,
    /// Destination capacity multiplier applied to the slice when
    /// decompressing.
    pub expansion_factor: usize,
    /// Keep the source file after a successful run instead of deleting it.
    pub keep_source: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_ceiling: DEFAULT_WINDOW_CEILING,
            expansion_factor: DEFAULT_EXPANSION_FACTOR,
            keep_source: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_ceiling == 0 {
            return Err(Error::Config("window ceiling must be non-zero".into()));
        }
        if self.window_ceiling as u64 > MAX_FILE_SIZE {
            return Err(Error::Config(format!(
                "window ceiling {} exceeds the maximum file size {}",
                self.window_ceiling, MAX_FILE_SIZE
            )));
        }
        if self.expansion_factor == 0 {
            return Err(Error::Config("expansion factor must be non-zero".into()));
        }
        Ok(())
    }

    /// Bytes read per slice for a file of `file_size` bytes.
    pub fn window_for(&self, file_size: u64) -> usize {
        file_size.min(self.window_ceiling as u64) as usize
    }
}
