//! Human-readable output for the command-line front end.

use crate::pool::JobResult;
use crate::stats::Statistics;
use crate::utils::format_file_size;
use std::time::Duration;

/// One line per job, successes and failures alike.
pub fn job_line(result: &JobResult) -> String {
    match &result.error {
        None => format!(
            "✅ {} -> {} ({} -> {}, {:.1}%)",
            result.job.input_path.display(),
            result.job.output_path.display(),
            format_file_size(result.original_size),
            format_file_size(result.compressed_size),
            result.compression_ratio()
        ),
        Some(e) => format!("❌ {}: {}", result.job.input_path.display(), e),
    }
}

pub fn print_job_results(results: &[JobResult]) {
    for result in results {
        crate::report!("{}", job_line(result));
    }
}

pub fn summary_lines(stats: &Statistics, elapsed: Duration) -> Vec<String> {
    let mut lines = vec![
        "📊 Batch Compression Summary:".to_string(),
        format!(
            "  ✅ Successfully processed: {}/{} files",
            stats.success_files, stats.total_files
        ),
        format!(
            "  📊 Total original size: {}",
            format_file_size(stats.total_original_size)
        ),
        format!(
            "  📊 Total compressed size: {}",
            format_file_size(stats.total_compressed_size)
        ),
        format!("  💾 Space saved: {}", format_saved(stats.bytes_saved())),
        format!("  🎯 Overall compression ratio: {:.1}%", stats.compression_ratio),
        format!("  ⏱️  Total time: {:?}", elapsed),
    ];

    if stats.has_failures() {
        lines.push(format!("  ⚠️  Failed files: {}", stats.failed_files));
    }
    lines
}

fn format_saved(bytes: i128) -> String {
    let magnitude = format_file_size(bytes.unsigned_abs().min(u64::MAX as u128) as u64);
    if bytes < 0 {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

pub fn print_summary(stats: &Statistics, elapsed: Duration) {
    crate::report!("");
    for line in summary_lines(stats, elapsed) {
        crate::report!("{}", line);
    }
}
