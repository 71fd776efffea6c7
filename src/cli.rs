use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dir-squeeze",
    about = "Compress every image in a directory tree with a bounded worker pool",
    long_about = "dir-squeeze walks a directory, selects images with include/exclude glob patterns, \
                  and recompresses them in parallel (JPEG, PNG via oxipng, lossless WebP). \
                  Outputs are written next to the inputs with a _compressed suffix, or mirrored \
                  under an output directory.",
    version,
    after_help = "EXAMPLES:\n  \
    dir-squeeze batch ./photos -r -q 75\n  \
    dir-squeeze batch ./photos -o ./out --include '*.png' --exclude '*_thumb*' --stats\n  \
    dir-squeeze compress photo.jpg -o small.jpg -q 60"
)]
pub struct Args {
    #[arg(short = 'v', long, global = true, help = "Show per-file results and debug logs")]
    pub verbose: bool,

    #[arg(long, global = true, conflicts_with = "verbose", help = "Only print errors")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct QualityArgs {
    #[arg(
        short = 'q',
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Compression quality (0-100, default: 80)",
        long_help = "Compression quality from 0 (smallest) to 100 (best). \
                     For PNG: >=90 uses Zopfli, >=70 uses high compression, <70 uses standard compression."
    )]
    pub quality: Option<u8>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u16).range(2..=256),
        help = "Palette size for palette-based formats (2-256, default: 256)"
    )]
    pub palette_size: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Compress all matching images in a directory",
        long_about = "Collect matching files from a directory (optionally recursively) and \
                      compress them in parallel. Per-file failures are reported and make the \
                      exit status non-zero, but never stop the rest of the batch."
    )]
    Batch {
        #[arg(help = "Input directory")]
        input: PathBuf,

        #[arg(
            short = 'o',
            long,
            help = "Output directory (default: next to each input)",
            long_help = "Mirror the input tree under this directory. \
                         Without it, each output is written beside its input as <name>_compressed.<ext>."
        )]
        output: Option<PathBuf>,

        #[command(flatten)]
        quality: QualityArgs,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel workers (default: number of CPUs)"
        )]
        workers: Option<usize>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Comma separated include patterns (default: *.jpg,*.jpeg,*.png,*.webp)"
        )]
        include: Vec<String>,

        #[arg(long, value_delimiter = ',', help = "Comma separated exclude patterns")]
        exclude: Vec<String>,

        #[arg(long, help = "Print batch statistics after the run")]
        stats: bool,
    },

    #[command(about = "Compress a single image file")]
    Compress {
        #[arg(help = "Input image file path")]
        input: PathBuf,

        #[arg(
            short = 'o',
            long,
            help = "Output image file path (default: <name>_compressed.<ext>)"
        )]
        output: Option<PathBuf>,

        #[command(flatten)]
        quality: QualityArgs,
    },
}

/// Trims each pattern and drops empty entries, so `"*.jpg, *.png,"` works.
pub fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
