//! # patview
//!
//! `patview` extracts read-level methylation records ("pat" files) for a
//! genomic region or for every region of a bed file.
//!
//! A pat file is a bgzip-compressed, tabix-indexed, tab-separated file with
//! one read per line: `chrom, start site, pattern, count[, tags...]`. The
//! pattern holds one character per CpG site: `C` (methylated), `T`
//! (unmethylated) or `.` (no call).
//!
//! For each requested region the reads returned by the range query go
//! through the [`filter`] pipeline:
//!
//! * reads not overlapping the region are dropped;
//! * `strict` clips reads to the region boundaries;
//! * `strip` removes `.` padding from both read ends;
//! * reads covering fewer than `min_len` sites are dropped;
//! * counts are binomially sub-sampled;
//! * reads are sorted by `(start, pattern)` and identical calls collapsed.
//!
//! Many regions are processed by [`MultiRegionDriver`] on a bounded rayon
//! pool. Output always follows the input region order.
//!
//! ## Usage
//!
//! ```no_run
//! use patview::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = TabixPatSource::new("sample.pat.gz")?;
//!     let reference = ReferenceIndex::from_path("CpG.bed.gz")?;
//!     let config = FilterConfig::default()
//!         .with_strict(true)
//!         .with_strip(true);
//!
//!     let viewer = PatViewer::try_new(&source, config)?
//!         .with_reference(Some(&reference));
//!     let mut writer = PatWriter::from_path(None::<&str>)?;
//!     let mut diagnostics = Diagnostics::new();
//!     viewer.view_region(
//!         &RegionRequest::parse_region("chr1:10000-20000")?,
//!         &mut writer,
//!         &mut diagnostics,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! Default number of worker threads can be set with the
//! `PATVIEW_NUM_THREADS` environment variable.

pub mod data_structs;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod io;
pub mod multi;
pub mod prelude;
pub mod reference;
pub mod region;
pub mod utils;
pub mod view;

pub use crate::data_structs::{
    BedInterval,
    Read,
    SiteInterval,
};
pub use crate::diagnostics::{
    Diagnostics,
    Warning,
};
pub use crate::error::{
    Result,
    ViewError,
};
pub use crate::filter::{
    FilterConfig,
    FilterPipeline,
    ViewStats,
};
pub use crate::multi::{
    MultiRegionDriver,
    RegionOutcome,
    RegionResult,
};
pub use crate::view::{
    PatViewer,
    ViewSummary,
};

/// Crates re-exported for the command line tool.
pub mod exports {
    pub use {
        anyhow,
        itertools,
        log,
        serde_json,
    };
}
