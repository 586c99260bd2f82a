use std::path::PathBuf;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Errors raised by `patview`.
///
/// Configuration variants are returned before any read is processed. A
/// failing range query is reported per region by the multi-region driver
/// and only surfaces as an error on the single-region path.
#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    /// Region could not be resolved (non-numeric, inverted, unknown
    /// chromosome or no sites inside it).
    #[error("Invalid region '{region}': {reason}")]
    InvalidRegion { region: String, reason: String },

    /// Sub-sampling rate outside of `[0.0, 1.0]`.
    #[error("Sub-sampling rate must be within [0.0, 1.0], got {0}")]
    InvalidSampleRate(f64),

    /// Minimal read length must be at least 1.
    #[error("Minimal read length must be >= 1, got {0}")]
    InvalidMinLen(usize),

    /// Worker count must be positive.
    #[error("Number of threads must be >= 1, got {0}")]
    InvalidThreads(usize),

    /// The external range query failed.
    #[error("Range query '{query}' failed: {reason}")]
    RegionQuery { query: String, reason: String },

    /// Malformed bed file.
    #[error("Invalid bed file {path}: {reason}")]
    InvalidBed { path: PathBuf, reason: String },

    /// Malformed reference dictionary.
    #[error("Invalid reference dictionary: {0}")]
    InvalidReference(String),

    #[error("Could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewError {
    pub(crate) fn invalid_region(
        region: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ViewError::InvalidRegion {
            region: region.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a configuration error, i.e. raised before any
    /// processing started.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ViewError::InvalidRegion { .. }
                | ViewError::InvalidSampleRate(_)
                | ViewError::InvalidMinLen(_)
                | ViewError::InvalidThreads(_)
        )
    }
}
