//! Bounded-parallel processing of many bed regions.
//!
//! Regions are handled in super-chunks of [`SUPER_CHUNK_SIZE`]. A
//! super-chunk is split into contiguous slices of
//! `max(1, chunk_len / threads)` regions, one pool task per slice. Tasks
//! send their results through a channel tagged with the slice index and the
//! driver puts them back in input order before handing the chunk to the
//! sink. The pool is drained before the next super-chunk starts.

use std::ops::Range;

use crossbeam::channel;
use itertools::Itertools;
use log::{
    debug,
    info,
};
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};

use crate::data_structs::{
    BedInterval,
    Read,
};
use crate::diagnostics::{
    Diagnostics,
    Warning,
};
use crate::error::{
    Result,
    ViewError,
};
use crate::filter::{
    FilterConfig,
    FilterPipeline,
    ViewStats,
};
use crate::io::bed::check_disjoint;
use crate::io::source::PatSource;
use crate::io::writer::is_sink_closed;
use crate::reference::ReferenceIndex;
use crate::region::RegionResolver;

/// Regions per super-chunk. Bounds peak memory between output flushes.
pub const SUPER_CHUNK_SIZE: usize = 100;

/// What happened to one region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Reads(Vec<Read>),
    /// Region has no sites or the query matched no loci.
    NoData,
    /// Range query failed; siblings are unaffected.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionResult {
    /// Position of the region in the input list.
    pub index:   usize,
    pub label:   String,
    pub outcome: RegionOutcome,
    pub stats:   ViewStats,
}

impl RegionResult {
    pub fn reads(&self) -> &[Read] {
        match &self.outcome {
            RegionOutcome::Reads(reads) => reads,
            _ => &[],
        }
    }

    /// Line printed before the region's reads.
    pub fn label_line(&self) -> String {
        match self.outcome {
            RegionOutcome::Reads(_) => self.label.clone(),
            RegionOutcome::NoData => format!("{} - No CpGs", self.label),
            RegionOutcome::Failed(_) => format!("{} - query failed", self.label),
        }
    }
}

/// Outcome of a whole multi-region run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub stats:          ViewStats,
    pub regions_empty:  usize,
    pub regions_failed: usize,
    /// The sink stopped accepting output; remaining regions were skipped.
    pub sink_closed:    bool,
}

/// Contiguous slices of `len` items for `threads` workers.
pub fn partition(
    len: usize,
    threads: usize,
) -> Vec<Range<usize>> {
    let step = (len / threads.max(1)).max(1);
    (0..len)
        .step_by(step)
        .map(|start| start..(start + step).min(len))
        .collect()
}

pub struct MultiRegionDriver<'a> {
    source:    &'a dyn PatSource,
    config:    &'a FilterConfig,
    reference: Option<&'a ReferenceIndex>,
    threads:   usize,
}

impl<'a> MultiRegionDriver<'a> {
    pub fn new(
        source: &'a dyn PatSource,
        config: &'a FilterConfig,
        threads: usize,
    ) -> Result<Self> {
        if threads == 0 {
            return Err(ViewError::InvalidThreads(threads));
        }
        config.validate()?;
        Ok(Self {
            source,
            config,
            reference: None,
            threads,
        })
    }

    /// Checks bed chromosomes against a reference.
    pub fn with_reference(
        mut self,
        reference: Option<&'a ReferenceIndex>,
    ) -> Self {
        self.reference = reference;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn process_region(
        &self,
        index: usize,
        bed: &BedInterval,
        diagnostics: &mut Diagnostics,
    ) -> RegionResult {
        let resolver = RegionResolver::new(self.reference);
        let label = bed.label();
        let no_data = |label: String| {
            RegionResult {
                index,
                label,
                outcome: RegionOutcome::NoData,
                stats: ViewStats {
                    regions: 1,
                    ..Default::default()
                },
            }
        };

        let region = match resolver.resolve_bed(bed) {
            Ok(region) => region,
            Err(e) => {
                debug!("{}", e);
                return no_data(label);
            },
        };

        let result = self
            .source
            .fetch_interval(region.interval())
            .and_then(|lines| {
                if lines.is_empty() {
                    diagnostics.push(Warning::EmptySource {
                        scope: label.clone(),
                    });
                    return Ok(None);
                }
                FilterPipeline::new(self.config)
                    .run_stream(lines, region.interval(), index as u64, diagnostics)
                    .map(Some)
            });

        match result {
            Ok(Some(output)) => {
                RegionResult {
                    index,
                    label,
                    outcome: RegionOutcome::Reads(output.reads),
                    stats: output.stats,
                }
            },
            Ok(None) => no_data(label),
            Err(e) => {
                diagnostics.push(Warning::RegionQueryFailed {
                    region: label.clone(),
                    reason: e.to_string(),
                });
                RegionResult {
                    index,
                    label,
                    outcome: RegionOutcome::Failed(e.to_string()),
                    stats: ViewStats {
                        regions: 1,
                        ..Default::default()
                    },
                }
            },
        }
    }

    /// Runs the pipeline for a contiguous slice of regions starting at
    /// input position `offset`.
    fn process_slice(
        &self,
        offset: usize,
        regions: &[BedInterval],
    ) -> (Vec<RegionResult>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let results = regions
            .iter()
            .enumerate()
            .map(|(i, bed)| self.process_region(offset + i, bed, &mut diagnostics))
            .collect_vec();
        (results, diagnostics)
    }

    /// Processes one super-chunk on `pool` and returns its results in input
    /// order.
    fn process_chunk(
        &self,
        pool: &ThreadPool,
        offset: usize,
        regions: &[BedInterval],
    ) -> (Vec<RegionResult>, Diagnostics) {
        let slices = partition(regions.len(), self.threads);
        let (sender, receiver) = channel::unbounded();

        pool.scope(|s| {
            for (slice_idx, range) in slices.iter().cloned().enumerate() {
                let sender = sender.clone();
                let slice = &regions[range.clone()];
                s.spawn(move |_| {
                    let output = self.process_slice(offset + range.start, slice);
                    // Receiver outlives the scope.
                    let _ = sender.send((slice_idx, output));
                });
            }
        });
        drop(sender);

        let mut diagnostics = Diagnostics::new();
        let results = receiver
            .into_iter()
            .sorted_by_key(|(slice_idx, _)| *slice_idx)
            .flat_map(|(_, (results, slice_diagnostics))| {
                diagnostics.extend(slice_diagnostics);
                results
            })
            .collect_vec();
        (results, diagnostics)
    }

    /// Processes all `regions`, passing each super-chunk's results to `sink`
    /// in input order.
    ///
    /// A sink error of kind `BrokenPipe` stops the run gracefully; other
    /// sink errors are returned.
    pub fn run<F>(
        &self,
        regions: &[BedInterval],
        diagnostics: &mut Diagnostics,
        mut sink: F,
    ) -> Result<DriverSummary>
    where
        F: FnMut(&[RegionResult]) -> std::io::Result<()>, {
        check_disjoint(regions, diagnostics);
        if regions.len() > SUPER_CHUNK_SIZE {
            diagnostics.push(Warning::LargeRegionList {
                regions: regions.len(),
            });
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;
        info!(
            "Viewing {} regions with {} threads",
            regions.len(),
            self.threads
        );

        let mut summary = DriverSummary::default();
        for (chunk_idx, chunk) in regions.chunks(SUPER_CHUNK_SIZE).enumerate() {
            let offset = chunk_idx * SUPER_CHUNK_SIZE;
            debug!("Processing regions {}..{}", offset, offset + chunk.len());

            let (results, chunk_diagnostics) = self.process_chunk(&pool, offset, chunk);
            diagnostics.extend(chunk_diagnostics);

            for result in results.iter() {
                summary.stats += result.stats;
                match result.outcome {
                    RegionOutcome::NoData => summary.regions_empty += 1,
                    RegionOutcome::Failed(_) => summary.regions_failed += 1,
                    RegionOutcome::Reads(_) => {},
                }
            }

            match sink(results.as_slice()) {
                Ok(()) => {},
                Err(e) if is_sink_closed(&e) => {
                    info!("Output closed, stopping after {} regions", offset + chunk.len());
                    summary.sink_closed = true;
                    break;
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(summary)
    }

    /// Processes all regions and returns every result.
    pub fn collect(
        &self,
        regions: &[BedInterval],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<RegionResult>> {
        let mut all = Vec::with_capacity(regions.len());
        self.run(regions, diagnostics, |results| {
            all.extend_from_slice(results);
            Ok(())
        })?;
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(100, 8, 12, 9)]
    #[case(100, 1, 100, 1)]
    #[case(5, 8, 1, 5)]
    #[case(0, 4, 0, 0)]
    fn test_partition(
        #[case] len: usize,
        #[case] threads: usize,
        #[case] first_len: usize,
        #[case] n_slices: usize,
    ) {
        let slices = partition(len, threads);
        assert_eq!(slices.len(), n_slices);
        if let Some(first) = slices.first() {
            assert_eq!(first.len(), first_len);
        }
        // Contiguous and complete
        let flat = slices.into_iter().flatten().collect_vec();
        assert_eq!(flat, (0..len).collect_vec());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let source = crate::io::MemoryPatSource::default();
        let config = FilterConfig::default();
        assert!(matches!(
            MultiRegionDriver::new(&source, &config, 0),
            Err(ViewError::InvalidThreads(0))
        ));
    }

    #[test]
    fn test_label_lines() {
        let mut result = RegionResult {
            index:   0,
            label:   "chr1:1-10".into(),
            outcome: RegionOutcome::NoData,
            stats:   ViewStats::default(),
        };
        assert_eq!(result.label_line(), "chr1:1-10 - No CpGs");
        result.outcome = RegionOutcome::Reads(vec![]);
        assert_eq!(result.label_line(), "chr1:1-10");
    }
}
