use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_quiet_mode(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "dir_squeeze=debug,warn"
    } else {
        "dir_squeeze=info,warn"
    }
}

/// Install the stderr `tracing` subscriber and record quiet mode.
///
/// `RUST_LOG` wins over the flags. Calling this twice is harmless; the
/// second subscriber is simply not installed.
pub fn init_logging(verbose: bool, quiet: bool) {
    set_quiet_mode(quiet);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Print a user-facing line on stdout unless quiet mode is on.
#[macro_export]
macro_rules! report {
    ($($arg:tt)*) => {
        if !$crate::logger::is_quiet() {
            println!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "dir_squeeze=info,warn");
        assert_eq!(default_directive(true, false), "dir_squeeze=debug,warn");
        assert_eq!(default_directive(true, true), "error");
        assert_eq!(default_directive(false, true), "error");
    }
}
