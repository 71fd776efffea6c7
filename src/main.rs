use anyhow::{bail, Context, Result};
use clap::Parser;
use dir_squeeze::cli::{normalize_patterns, Args, Commands, QualityArgs};
use dir_squeeze::logger::{init_logging, is_quiet};
use dir_squeeze::report::{print_job_results, print_summary};
use dir_squeeze::utils::{create_progress_bar, format_file_size};
use dir_squeeze::{
    aggregate, compress_image, derive_output_path, CompressionOptions, Processor, ProcessorConfig,
};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Batch {
            input,
            output,
            quality,
            workers,
            recursive,
            include,
            exclude,
            stats,
        } => run_batch(BatchRun {
            input,
            output,
            quality,
            workers,
            recursive,
            include,
            exclude,
            stats,
            verbose: args.verbose,
        }),
        Commands::Compress {
            input,
            output,
            quality,
        } => run_compress(&input, output, &quality),
    }
}

struct BatchRun {
    input: PathBuf,
    output: Option<PathBuf>,
    quality: QualityArgs,
    workers: Option<usize>,
    recursive: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    stats: bool,
    verbose: bool,
}

fn options_from(quality: &QualityArgs) -> Result<CompressionOptions> {
    CompressionOptions::new(quality.quality, quality.palette_size)
        .context("Invalid compression options")
}

fn run_batch(run: BatchRun) -> Result<()> {
    let start_time = Instant::now();
    let options = options_from(&run.quality)?;

    let mut config = ProcessorConfig::new(run.workers.unwrap_or_else(num_cpus::get), run.output)
        .with_recursive(run.recursive);
    let include = normalize_patterns(&run.include);
    if !include.is_empty() {
        config = config.with_include_patterns(include);
    }
    config = config.with_exclude_patterns(normalize_patterns(&run.exclude));

    let progress = if is_quiet() {
        ProgressBar::hidden()
    } else {
        create_progress_bar(0)
    };
    let processor =
        Processor::with_default_codecs(config).context("Invalid batch configuration")?;

    let jobs = processor
        .collect_jobs(&run.input, &options)
        .with_context(|| format!("Failed to collect images from {}", run.input.display()))?;

    if jobs.is_empty() {
        progress.finish_and_clear();
        dir_squeeze::report!("⚠️  No image files found in {}", run.input.display());
        return Ok(());
    }

    dir_squeeze::report!("📊 Found {} image files to process", jobs.len());
    progress.set_length(jobs.len() as u64);

    // ticks for every job, including ones that fail before reaching a codec
    let results = processor.execute_with(jobs, |_| progress.inc(1))?;
    progress.finish_and_clear();

    let statistics = aggregate(&results);
    if run.verbose {
        print_job_results(&results);
    }

    if run.stats {
        print_summary(&statistics, start_time.elapsed());
    } else {
        dir_squeeze::report!(
            "✅ Processed {}/{} files",
            statistics.success_files,
            statistics.total_files
        );
    }

    if statistics.has_failures() {
        bail!(
            "{} of {} files failed to compress",
            statistics.failed_files,
            statistics.total_files
        );
    }
    Ok(())
}

fn run_compress(input: &Path, output: Option<PathBuf>, quality: &QualityArgs) -> Result<()> {
    let options = options_from(quality)?;
    let output = output.unwrap_or_else(|| {
        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        derive_output_path(input, parent, None)
    });

    dir_squeeze::report!("🗜️  Compressing image: {}", input.display());
    let (original_size, compressed_size) = compress_image(input, &output, &options)
        .with_context(|| format!("Failed to compress {}", input.display()))?;

    dir_squeeze::report!("📁 Output: {}", output.display());
    dir_squeeze::report!(
        "📈 {} -> {} ({:.1}%)",
        format_file_size(original_size),
        format_file_size(compressed_size),
        dir_squeeze::utils::calculate_compression_ratio(original_size, compressed_size)
    );
    Ok(())
}
