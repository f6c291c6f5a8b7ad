pub mod chunk;
pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod timing;

pub use chunk::{ChunkOutcome, ChunkProcessor, SliceResult};
pub use codec::{Codec, Direction, Status, Transcode};
pub use config::{PipelineConfig, MAX_FILE_SIZE};
pub use error::{Error, Result};
pub use pipeline::{FileReport, Pipeline};
pub use stats::StatsReport;
pub use timing::{TimingLedger, TimingSample};
