use crate::constants::{
    DEFAULT_PALETTE_SIZE, DEFAULT_QUALITY, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL,
    MAX_PALETTE_SIZE, MAX_QUALITY, MIN_PALETTE_SIZE, OXIPNG_PRESET, PNG_HIGH_QUALITY,
    PNG_ZOPFLI_QUALITY, ZOPFLI_ITERATIONS,
};
use crate::error::{CompressionError, Result};
use crate::formats::{CodecFormat, SIGNATURE_LEN};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader};
use oxipng::{Deflaters, Options};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::num::NonZeroU8;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    /// Lossy quality, 0 (smallest) to 100 (best)
    pub quality: u8,
    /// Colour budget for palette-based formats
    pub palette_size: u16,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            palette_size: DEFAULT_PALETTE_SIZE,
        }
    }
}

impl CompressionOptions {
    pub fn new(quality: Option<u8>, palette_size: Option<u16>) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if quality > MAX_QUALITY {
            return Err(CompressionError::InvalidQuality(quality));
        }

        let palette_size = palette_size.unwrap_or(DEFAULT_PALETTE_SIZE);
        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&palette_size) {
            return Err(CompressionError::InvalidPaletteSize(
                palette_size,
                MIN_PALETTE_SIZE,
                MAX_PALETTE_SIZE,
            ));
        }

        Ok(Self {
            quality,
            palette_size,
        })
    }
}

/// Compresses one file into another.
///
/// Implementations must create or overwrite `output` and must not leave a
/// partial file behind when they fail. Any `Fn(&Path, &Path,
/// &CompressionOptions) -> Result<()>` closure is a backend, which keeps
/// stubs in tests short.
pub trait CompressionBackend: Send + Sync {
    fn compress(&self, input: &Path, output: &Path, options: &CompressionOptions) -> Result<()>;
}

impl<F> CompressionBackend for F
where
    F: Fn(&Path, &Path, &CompressionOptions) -> Result<()> + Send + Sync,
{
    fn compress(&self, input: &Path, output: &Path, options: &CompressionOptions) -> Result<()> {
        self(input, output, options)
    }
}

/// Encoder for a single image format.
pub trait Codec: Send + Sync {
    fn format(&self) -> CodecFormat;

    fn encode(&self, img: &DynamicImage, options: &CompressionOptions) -> Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JpegCodec;

impl Codec for JpegCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Jpeg
    }

    fn encode(&self, img: &DynamicImage, options: &CompressionOptions) -> Result<Vec<u8>> {
        // JPEG has no alpha channel and the encoder rejects quality 0
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let quality = options.quality.max(1);

        let mut buf = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
            .map_err(|e| CompressionError::compression("JPEG", "encoding failed", e))?;
        Ok(buf)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl PngCodec {
    fn oxipng_options(options: &CompressionOptions) -> Options {
        let mut oxipng_options = Options::from_preset(OXIPNG_PRESET);
        oxipng_options.force = true;

        oxipng_options.deflate = if options.quality >= PNG_ZOPFLI_QUALITY {
            Deflaters::Zopfli {
                iterations: NonZeroU8::new(ZOPFLI_ITERATIONS).unwrap_or(NonZeroU8::MIN),
            }
        } else if options.quality >= PNG_HIGH_QUALITY {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            }
        } else {
            Deflaters::Libdeflater {
                compression: LIBDEFLATER_LOW_LEVEL,
            }
        };
        oxipng_options
    }
}

impl Codec for PngCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Png
    }

    /// Re-encodes losslessly; oxipng performs any palette and bit-depth
    /// reduction that keeps every colour intact.
    fn encode(&self, img: &DynamicImage, options: &CompressionOptions) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        img.write_to(&mut Cursor::new(&mut raw), image::ImageFormat::Png)
            .map_err(|e| CompressionError::compression("PNG", "encoding failed", e))?;

        oxipng::optimize_from_memory(&raw, &Self::oxipng_options(options))
            .map_err(|e| CompressionError::PngOptimization(e.to_string()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WebPCodec;

impl Codec for WebPCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::WebP
    }

    // The image crate only ships a lossless WebP encoder, so quality is unused.
    fn encode(&self, img: &DynamicImage, _options: &CompressionOptions) -> Result<Vec<u8>> {
        let rgba = DynamicImage::ImageRgba8(img.to_rgba8());

        let mut buf = Vec::new();
        rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
            .map_err(|e| CompressionError::compression("WebP", "encoding failed", e))?;
        Ok(buf)
    }
}

/// Lookup table from format tag to codec, built once and passed to whoever
/// needs to compress files.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<CodecFormat, Arc<dyn Codec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_codecs() -> Self {
        let mut registry = Self::new();
        registry.register(JpegCodec);
        registry.register(PngCodec);
        registry.register(WebPCodec);
        registry
    }

    /// Adds a codec, replacing any codec already registered for its format.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) {
        self.codecs.insert(codec.format(), Arc::new(codec));
    }

    pub fn get(&self, format: CodecFormat) -> Option<&dyn Codec> {
        self.codecs.get(&format).map(|codec| codec.as_ref())
    }

    pub fn formats(&self) -> Vec<CodecFormat> {
        let mut formats: Vec<_> = self.codecs.keys().copied().collect();
        formats.sort_by_key(|f| f.tag());
        formats
    }

    /// Picks the codec for `input`: by extension, then by magic bytes.
    pub fn resolve(&self, input: &Path) -> Result<&dyn Codec> {
        let format = match CodecFormat::from_path(input) {
            Some(format) => format,
            None => sniff_format(input)?,
        };

        self.get(format)
            .ok_or_else(|| CompressionError::UnsupportedFormat(format.tag().to_string()))
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

impl CompressionBackend for CodecRegistry {
    fn compress(&self, input: &Path, output: &Path, options: &CompressionOptions) -> Result<()> {
        let codec = self.resolve(input)?;
        let format = codec.format();

        let img = ImageReader::open(input)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                CompressionError::compression(format.to_string(), "input is not a valid image", e)
            })?;

        let encoded = codec.encode(&img, options)?;
        debug!(
            input = %input.display(),
            %format,
            bytes = encoded.len(),
            "encoded image"
        );

        write_atomically(output, &encoded)
    }
}

fn sniff_format(input: &Path) -> Result<CodecFormat> {
    let mut header = Vec::with_capacity(SIGNATURE_LEN);
    File::open(input)?
        .take(SIGNATURE_LEN as u64)
        .read_to_end(&mut header)?;

    CodecFormat::from_signature(&header).ok_or_else(|| {
        CompressionError::UnsupportedFormat(format!(
            "unrecognised image data in {}",
            input.display()
        ))
    })
}

/// Writes through a temp file in the destination directory so a failed
/// write never leaves a truncated output.
fn write_atomically(output: &Path, data: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Compresses a single file with the default codecs and returns
/// `(original_size, compressed_size)`.
pub fn compress_image(
    input: &Path,
    output: &Path,
    options: &CompressionOptions,
) -> Result<(u64, u64)> {
    if !input.is_file() {
        return Err(CompressionError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a file", input.display()),
        )));
    }

    let original_size = fs::metadata(input)?.len();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CompressionError::OutputDirCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    CodecRegistry::with_default_codecs().compress(input, output, options)?;

    let compressed_size = fs::metadata(output)?.len();
    Ok((original_size, compressed_size))
}
