//! Helpers shared by the library and the command line tool.

use once_cell::sync::Lazy;

/// Environment variable overriding the default worker count.
pub const NUM_THREADS_ENV: &str = "PATVIEW_NUM_THREADS";

static DEFAULT_THREADS: Lazy<usize> = Lazy::new(|| {
    std::env::var(NUM_THREADS_ENV)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
});

/// Worker count used when none is given: `PATVIEW_NUM_THREADS`, or the
/// number of available cores.
pub fn default_threads() -> usize {
    *DEFAULT_THREADS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threads_positive() {
        assert!(default_threads() >= 1);
    }
}
