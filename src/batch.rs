use crate::constants::{COMPRESSED_SUFFIX, DEFAULT_INCLUDE_PATTERNS, DEFAULT_WORKER_COUNT};
use crate::error::{CompressionError, Result};
use crate::matcher::PathMatcher;
use crate::pool::{execute_jobs, execute_jobs_with, JobResult};
use crate::processing::{CodecRegistry, CompressionBackend, CompressionOptions};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

/// One file-level unit of compression work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub options: CompressionOptions,
}

/// Where compressed files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPathPolicy {
    /// `photo.jpg` becomes `photo_compressed.jpg` in the same directory.
    BesideInput,
    /// Mirror the input tree under this directory.
    UnderDir(PathBuf),
}

impl OutputPathPolicy {
    pub fn from_output_dir(output_dir: Option<&Path>) -> Self {
        match output_dir {
            Some(dir) if !dir.as_os_str().is_empty() => OutputPathPolicy::UnderDir(dir.to_path_buf()),
            _ => OutputPathPolicy::BesideInput,
        }
    }

    pub fn derive(&self, input_path: &Path, input_dir: &Path) -> PathBuf {
        match self {
            OutputPathPolicy::BesideInput => compressed_sibling(input_path),
            OutputPathPolicy::UnderDir(output_dir) => match input_path.strip_prefix(input_dir) {
                Ok(relative) if !relative.as_os_str().is_empty() => output_dir.join(relative),
                _ => match input_path.file_name() {
                    Some(name) => output_dir.join(name),
                    None => output_dir.clone(),
                },
            },
        }
    }
}

/// Maps an input file to its output location. Never touches the filesystem.
pub fn derive_output_path(input_path: &Path, input_dir: &Path, output_dir: Option<&Path>) -> PathBuf {
    OutputPathPolicy::from_output_dir(output_dir).derive(input_path, input_dir)
}

/// `photo.jpg` -> `photo_compressed.jpg`. The extension is everything from
/// the last `.` of the file name, so `.png` becomes `_compressed.png`.
fn compressed_sibling(input_path: &Path) -> PathBuf {
    let Some(name) = input_path.file_name() else {
        let mut path = input_path.as_os_str().to_os_string();
        path.push(COMPRESSED_SUFFIX);
        return PathBuf::from(path);
    };

    let file_name: OsString = match name.to_str() {
        Some(name) => {
            let (stem, ext) = name.rfind('.').map_or((name, ""), |i| name.split_at(i));
            format!("{}{}{}", stem, COMPRESSED_SUFFIX, ext).into()
        }
        None => {
            let mut file_name = input_path
                .file_stem()
                .map(|s| s.to_os_string())
                .unwrap_or_default();
            file_name.push(COMPRESSED_SUFFIX);
            if let Some(ext) = input_path.extension() {
                file_name.push(".");
                file_name.push(ext);
            }
            file_name
        }
    };

    input_path.with_file_name(file_name)
}

/// Walks `input_dir` and turns every matching regular file into a [`Job`].
///
/// Entries are visited in pre-order with siblings sorted by name, so an
/// unchanged tree always yields jobs in the same order. Subdirectories are
/// pruned unless `recursive` is set. Any error while walking aborts the
/// whole collection.
pub fn collect_jobs(
    input_dir: &Path,
    recursive: bool,
    matcher: &PathMatcher,
    policy: &OutputPathPolicy,
    options: &CompressionOptions,
) -> Result<Vec<Job>> {
    match fs::metadata(input_dir) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => return Err(CompressionError::NotADirectory(input_dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CompressionError::DirectoryNotFound(input_dir.to_path_buf()))
        }
        Err(e) => return Err(CompressionError::Io(e)),
    }

    let walker = WalkDir::new(input_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| recursive || entry.depth() == 0 || !entry.file_type().is_dir());

    let mut jobs = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if matcher.matches_path(path) {
            let output_path = policy.derive(path, input_dir);
            debug!(input = %path.display(), output = %output_path.display(), "queued job");
            jobs.push(Job {
                input_path: path.to_path_buf(),
                output_path,
                options: *options,
            });
        }
    }

    Ok(jobs)
}

/// Run-wide settings for a [`Processor`].
///
/// Fields are private so the worker count can never drop below one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    worker_count: usize,
    output_dir: Option<PathBuf>,
    recursive: bool,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_COUNT, None)
    }
}

impl ProcessorConfig {
    /// A worker count of zero falls back to [`DEFAULT_WORKER_COUNT`]; an
    /// empty output directory means "write beside each input".
    pub fn new(worker_count: usize, output_dir: Option<PathBuf>) -> Self {
        let worker_count = if worker_count == 0 {
            DEFAULT_WORKER_COUNT
        } else {
            worker_count
        };

        Self {
            worker_count,
            output_dir: output_dir.filter(|dir| !dir.as_os_str().is_empty()),
            recursive: false,
            include_patterns: DEFAULT_INCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_include_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    pub fn output_policy(&self) -> OutputPathPolicy {
        OutputPathPolicy::from_output_dir(self.output_dir())
    }
}

/// Drives batch runs: collect jobs, execute them, hand back the results.
pub struct Processor<B = CodecRegistry> {
    config: ProcessorConfig,
    matcher: PathMatcher,
    backend: B,
}

impl Processor<CodecRegistry> {
    pub fn with_default_codecs(config: ProcessorConfig) -> Result<Self> {
        Self::new(config, CodecRegistry::with_default_codecs())
    }
}

impl<B: CompressionBackend> Processor<B> {
    /// Fails if any include/exclude pattern is malformed.
    pub fn new(config: ProcessorConfig, backend: B) -> Result<Self> {
        let matcher = PathMatcher::new(&config.include_patterns, &config.exclude_patterns)?;
        Ok(Self {
            config,
            matcher,
            backend,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn collect_jobs(&self, input_dir: &Path, options: &CompressionOptions) -> Result<Vec<Job>> {
        collect_jobs(
            input_dir,
            self.config.recursive,
            &self.matcher,
            &self.config.output_policy(),
            options,
        )
    }

    pub fn execute(&self, jobs: Vec<Job>) -> Result<Vec<JobResult>> {
        execute_jobs(jobs, self.config.worker_count, &self.backend)
    }

    /// [`Processor::execute`] with a per-result hook, e.g. for progress.
    pub fn execute_with<F>(&self, jobs: Vec<Job>, on_result: F) -> Result<Vec<JobResult>>
    where
        F: Fn(&JobResult) + Sync,
    {
        execute_jobs_with(jobs, self.config.worker_count, &self.backend, on_result)
    }

    /// Compresses every matching file under `input_dir`.
    ///
    /// Only collection problems are returned as errors; per-file failures
    /// are recorded in the individual [`JobResult`]s.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        options: &CompressionOptions,
    ) -> Result<Vec<JobResult>> {
        let start_time = Instant::now();

        let jobs = self.collect_jobs(input_dir, options)?;
        info!(
            input = %input_dir.display(),
            jobs = jobs.len(),
            workers = self.config.worker_count,
            recursive = self.config.recursive,
            "collected jobs"
        );

        let results = self.execute(jobs)?;
        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            processed = results.len(),
            failed,
            elapsed = ?start_time.elapsed(),
            "batch finished"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(b"fake image data").unwrap();
    }

    fn default_matcher() -> PathMatcher {
        PathMatcher::new(DEFAULT_INCLUDE_PATTERNS, Vec::<&str>::new()).unwrap()
    }

    fn collect(dir: &Path, recursive: bool, policy: &OutputPathPolicy) -> Vec<Job> {
        collect_jobs(
            dir,
            recursive,
            &default_matcher(),
            policy,
            &CompressionOptions::default(),
        )
        .unwrap()
    }

    fn file_names(jobs: &[Job]) -> Vec<String> {
        jobs.iter()
            .map(|j| j.input_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_processor_config_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.output_dir(), None);
        assert!(!config.recursive());
        assert_eq!(
            config.include_patterns(),
            &["*.jpg", "*.jpeg", "*.png", "*.webp"]
        );
        assert!(config.exclude_patterns().is_empty());
    }

    #[test]
    fn test_processor_config_normalizes_worker_count() {
        assert_eq!(ProcessorConfig::new(8, None).worker_count(), 8);
        assert_eq!(ProcessorConfig::new(0, None).worker_count(), 4);
    }

    #[test]
    fn test_processor_config_empty_output_dir() {
        let config = ProcessorConfig::new(2, Some(PathBuf::new()));
        assert_eq!(config.output_dir(), None);
        assert_eq!(config.output_policy(), OutputPathPolicy::BesideInput);
    }

    #[test]
    fn test_processor_config_builders() {
        let config = ProcessorConfig::new(2, Some(PathBuf::from("/tmp/out")))
            .with_recursive(true)
            .with_include_patterns(["*.jpg", "*.png"])
            .with_exclude_patterns(vec!["*_thumb*".to_string()]);

        assert!(config.recursive());
        assert_eq!(config.include_patterns(), &["*.jpg", "*.png"]);
        assert_eq!(config.exclude_patterns(), &["*_thumb*"]);
        assert_eq!(
            config.output_policy(),
            OutputPathPolicy::UnderDir(PathBuf::from("/tmp/out"))
        );
    }

    #[test]
    fn test_processor_rejects_bad_pattern() {
        let config = ProcessorConfig::default().with_include_patterns(["[oops"]);
        let result = Processor::with_default_codecs(config);
        assert!(matches!(result, Err(CompressionError::InvalidPattern { .. })));
    }

    #[test]
    fn test_derive_output_path_beside_input() {
        let result = derive_output_path(Path::new("/input/image.jpg"), Path::new("/input"), None);
        assert_eq!(result, PathBuf::from("/input/image_compressed.jpg"));

        let result = derive_output_path(
            Path::new("/input/deep/archive.tar.png"),
            Path::new("/input"),
            Some(Path::new("")),
        );
        assert_eq!(result, PathBuf::from("/input/deep/archive.tar_compressed.png"));
    }

    #[test]
    fn test_derive_output_path_without_extension() {
        let result = derive_output_path(Path::new("/input/README"), Path::new("/input"), None);
        assert_eq!(result, PathBuf::from("/input/README_compressed"));
    }

    #[test]
    fn test_derive_output_path_dot_names() {
        let dir = Path::new("/in");
        assert_eq!(
            derive_output_path(Path::new("/in/.png"), dir, None),
            PathBuf::from("/in/_compressed.png")
        );
        assert_eq!(
            derive_output_path(Path::new("/in/.hidden.jpg"), dir, None),
            PathBuf::from("/in/.hidden_compressed.jpg")
        );
        assert_eq!(
            derive_output_path(Path::new("/in/archive.tar.png"), dir, None),
            PathBuf::from("/in/archive.tar_compressed.png")
        );
    }

    #[test]
    fn test_derive_output_path_preserves_structure() {
        let out = Some(Path::new("/output"));

        let result = derive_output_path(Path::new("/input/subdir/image.jpg"), Path::new("/input"), out);
        assert_eq!(result, PathBuf::from("/output/subdir/image.jpg"));

        let result = derive_output_path(Path::new("/input/image.png"), Path::new("/input"), out);
        assert_eq!(result, PathBuf::from("/output/image.png"));

        let result = derive_output_path(Path::new("in/sub/a.jpg"), Path::new("in"), Some(Path::new("out")));
        assert_eq!(result, PathBuf::from("out/sub/a.jpg"));
    }

    #[test]
    fn test_derive_output_path_outside_input_dir() {
        let result = derive_output_path(
            Path::new("/elsewhere/photos/image.jpg"),
            Path::new("/input"),
            Some(Path::new("/output")),
        );
        assert_eq!(result, PathBuf::from("/output/image.jpg"));
    }

    #[test]
    fn test_collect_jobs_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let result = collect_jobs(
            &missing,
            false,
            &default_matcher(),
            &OutputPathPolicy::BesideInput,
            &CompressionOptions::default(),
        );
        assert!(matches!(result, Err(CompressionError::DirectoryNotFound(p)) if p == missing));
    }

    #[test]
    fn test_collect_jobs_input_is_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.jpg");
        touch(&file);

        let result = collect_jobs(
            &file,
            false,
            &default_matcher(),
            &OutputPathPolicy::BesideInput,
            &CompressionOptions::default(),
        );
        assert!(matches!(result, Err(CompressionError::NotADirectory(_))));
    }

    #[test]
    fn test_collect_jobs_non_recursive() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("b.png"));
        touch(&temp_dir.path().join("a.jpg"));
        touch(&temp_dir.path().join("notes.txt"));
        touch(&temp_dir.path().join("subdir/nested.jpg"));

        let jobs = collect(temp_dir.path(), false, &OutputPathPolicy::BesideInput);
        assert_eq!(file_names(&jobs), vec!["a.jpg", "b.png"]);
        assert_eq!(
            jobs[0].output_path,
            temp_dir.path().join("a_compressed.jpg")
        );
    }

    #[test]
    fn test_collect_jobs_recursive_preorder() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("z.jpg"));
        touch(&temp_dir.path().join("a/deeper/x.webp"));
        touch(&temp_dir.path().join("a/m.png"));
        touch(&temp_dir.path().join("b.jpeg"));

        let jobs = collect(temp_dir.path(), true, &OutputPathPolicy::BesideInput);
        assert_eq!(file_names(&jobs), vec!["x.webp", "m.png", "b.jpeg", "z.jpg"]);
    }

    #[test]
    fn test_collect_jobs_mirrors_tree_under_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        let output = temp_dir.path().join("out");
        touch(&input.join("sub/a.jpg"));
        touch(&input.join("b.png"));

        let jobs = collect(&input, true, &OutputPathPolicy::UnderDir(output.clone()));
        let outputs: Vec<_> = jobs.iter().map(|j| j.output_path.clone()).collect();
        assert_eq!(outputs, vec![output.join("b.png"), output.join("sub/a.jpg")]);
        // collection never creates directories
        assert!(!output.exists());
    }

    #[test]
    fn test_collect_jobs_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let jobs = collect(temp_dir.path(), true, &OutputPathPolicy::BesideInput);
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_collect_jobs_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.jpg", "a.png", "b.webp", "d/e.jpg"] {
            touch(&temp_dir.path().join(name));
        }

        let first = collect(temp_dir.path(), true, &OutputPathPolicy::BesideInput);
        let second = collect(temp_dir.path(), true, &OutputPathPolicy::BesideInput);
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_jobs_broken_symlink_aborts() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("a.jpg"));
        std::os::unix::fs::symlink(
            temp_dir.path().join("missing.jpg"),
            temp_dir.path().join("link.jpg"),
        )
        .unwrap();

        let result = collect_jobs(
            temp_dir.path(),
            false,
            &default_matcher(),
            &OutputPathPolicy::BesideInput,
            &CompressionOptions::default(),
        );
        assert!(matches!(result, Err(CompressionError::Traversal(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_jobs_symlink_cycle_aborts() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("sub").join("a.jpg"));
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("sub").join("loop"))
            .unwrap();

        let result = collect_jobs(
            temp_dir.path(),
            true,
            &default_matcher(),
            &OutputPathPolicy::BesideInput,
            &CompressionOptions::default(),
        );
        match result {
            Err(err @ CompressionError::Traversal(_)) => {
                assert_eq!(err.kind(), crate::error::ErrorKind::Traversal)
            }
            other => panic!("expected traversal error, got {:?}", other),
        }
    }

    #[test]
    fn test_processor_collect_uses_config() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("keep.jpg"));
        touch(&temp_dir.path().join("skip_thumb.jpg"));
        touch(&temp_dir.path().join("sub/deep.jpg"));

        let config = ProcessorConfig::new(2, None)
            .with_recursive(true)
            .with_exclude_patterns(["*_thumb*"]);
        let processor = Processor::with_default_codecs(config).unwrap();

        let jobs = processor
            .collect_jobs(temp_dir.path(), &CompressionOptions::default())
            .unwrap();
        assert_eq!(file_names(&jobs), vec!["keep.jpg", "deep.jpg"]);
    }
}
