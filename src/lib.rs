pub mod batch;
pub mod cli;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod matcher;
pub mod pool;
pub mod processing;
pub mod report;
pub mod stats;
pub mod utils;

pub use batch::{collect_jobs, derive_output_path, Job, OutputPathPolicy, Processor, ProcessorConfig};
pub use error::{CompressionError, ErrorKind, Result};
pub use formats::CodecFormat;
pub use matcher::{should_include, PathMatcher};
pub use pool::{execute_jobs, execute_jobs_with, JobResult};
pub use processing::{
    compress_image, Codec, CodecRegistry, CompressionBackend, CompressionOptions,
};
pub use stats::{aggregate, Statistics};
