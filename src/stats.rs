use crate::pool::JobResult;
use crate::utils::calculate_compression_ratio;

/// Batch-wide summary derived from a list of [`JobResult`]s.
///
/// Size totals cover successful jobs only; a failed job just bumps
/// `failed_files`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub total_files: usize,
    pub success_files: usize,
    pub failed_files: usize,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
    /// Percentage saved across successful jobs; 0 when nothing was measured
    pub compression_ratio: f64,
}

impl Statistics {
    pub fn bytes_saved(&self) -> i128 {
        self.total_original_size as i128 - self.total_compressed_size as i128
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }
}

pub fn aggregate<'a, I>(results: I) -> Statistics
where
    I: IntoIterator<Item = &'a JobResult>,
{
    let mut stats = results
        .into_iter()
        .fold(Statistics::default(), |mut stats, result| {
            stats.total_files += 1;
            if result.is_success() {
                stats.success_files += 1;
                stats.total_original_size += result.original_size;
                stats.total_compressed_size += result.compressed_size;
            } else {
                stats.failed_files += 1;
            }
            stats
        });

    stats.compression_ratio =
        calculate_compression_ratio(stats.total_original_size, stats.total_compressed_size);
    stats
}
