pub const DEFAULT_QUALITY: u8 = 80;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_PALETTE_SIZE: u16 = 256;
pub const MIN_PALETTE_SIZE: u16 = 2;
pub const MAX_PALETTE_SIZE: u16 = 256;

/// Worker count used when the caller asks for zero workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.jpg", "*.jpeg", "*.png", "*.webp"];

/// Inserted between stem and extension when output lands beside the input.
pub const COMPRESSED_SUFFIX: &str = "_compressed";

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 4;

// Quality thresholds for choosing the PNG deflater
pub const PNG_ZOPFLI_QUALITY: u8 = 90;
pub const PNG_HIGH_QUALITY: u8 = 70;

pub const WORKER_THREAD_PREFIX: &str = "squeeze-worker";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
