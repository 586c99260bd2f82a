//! Read-level filter pipeline.
//!
//! A region is processed as a chain of stages over an owned `Vec<Read>`;
//! every stage consumes the previous sequence and returns a new one:
//!
//! 1. parse lines ([`RecordParser`])
//! 2. drop reads not overlapping the interval
//! 3. clip reads to the interval ([`BoundaryTrimmer`], strict mode)
//! 4. strip `.` padding ([`PaddingStripper`])
//! 5. drop reads shorter than `min_len`
//! 6. binomial thinning ([`ReadSampler`])
//! 7. stable sort by `(start, pattern)` and collapse identical calls

mod sample;
mod strip;
mod trim;

use std::ops::AddAssign;

use itertools::Itertools;
use log::debug;
pub use sample::{
    stream_seed,
    validate_rate,
    ReadSampler,
};
use serde::{
    Deserialize,
    Serialize,
};
pub use strip::PaddingStripper;
pub use trim::BoundaryTrimmer;

use crate::data_structs::{
    Read,
    SiteInterval,
};
use crate::diagnostics::Diagnostics;
use crate::error::{
    Result,
    ViewError,
};
use crate::io::record::RecordParser;

/// Immutable filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Clip reads to the requested interval.
    pub strict:     bool,
    /// Strip `.` padding from read ends.
    pub strip:      bool,
    /// Minimal number of sites a read must cover.
    pub min_len:    usize,
    /// Binomial sub-sampling rate.
    pub sub_sample: Option<f64>,
    /// Base seed for sub-sampling. Entropy-seeded when `None`.
    pub seed:       Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strict:     false,
            strip:      false,
            min_len:    1,
            sub_sample: None,
            seed:       None,
        }
    }
}

impl FilterConfig {
    pub fn try_new(
        strict: bool,
        strip: bool,
        min_len: usize,
        sub_sample: Option<f64>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let config = Self {
            strict,
            strip,
            min_len,
            sub_sample,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_strict(
        mut self,
        strict: bool,
    ) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_strip(
        mut self,
        strip: bool,
    ) -> Self {
        self.strip = strip;
        self
    }

    pub fn with_min_len(
        mut self,
        min_len: usize,
    ) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn with_sub_sample(
        mut self,
        rate: Option<f64>,
    ) -> Self {
        self.sub_sample = rate;
        self
    }

    pub fn with_seed(
        mut self,
        seed: Option<u64>,
    ) -> Self {
        self.seed = seed;
        self
    }

    /// Must be called before any read is processed.
    pub fn validate(&self) -> Result<()> {
        if self.min_len < 1 {
            return Err(ViewError::InvalidMinLen(self.min_len));
        }
        if let Some(rate) = self.sub_sample {
            validate_rate(rate)?;
        }
        Ok(())
    }

    /// Sampler for one stream of reads (one region). Streams get distinct
    /// seeds so that results do not depend on how regions are scheduled.
    fn sampler(
        &self,
        stream: u64,
    ) -> Result<Option<ReadSampler>> {
        self.sub_sample
            .map(|rate| {
                ReadSampler::new(rate, self.seed.map(|seed| stream_seed(seed, stream)))
            })
            .transpose()
    }
}

/// Per-stage read counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    pub regions:          usize,
    pub reads_parsed:     usize,
    pub outside_interval: usize,
    pub stripped_empty:   usize,
    pub too_short:        usize,
    pub sampled_out:      usize,
    pub collapsed:        usize,
    pub reads_written:    usize,
}

impl AddAssign for ViewStats {
    fn add_assign(
        &mut self,
        rhs: Self,
    ) {
        self.regions += rhs.regions;
        self.reads_parsed += rhs.reads_parsed;
        self.outside_interval += rhs.outside_interval;
        self.stripped_empty += rhs.stripped_empty;
        self.too_short += rhs.too_short;
        self.sampled_out += rhs.sampled_out;
        self.collapsed += rhs.collapsed;
        self.reads_written += rhs.reads_written;
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutput {
    pub reads: Vec<Read>,
    pub stats: ViewStats,
}

/// Applies [`FilterConfig`] to the lines of one region.
#[derive(Debug, Clone, Copy)]
pub struct FilterPipeline<'a> {
    config: &'a FilterConfig,
}

impl<'a> FilterPipeline<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        self.config
    }

    /// Runs the pipeline with sampling stream 0.
    pub fn run<I, S>(
        &self,
        lines: I,
        interval: Option<&SiteInterval>,
        diagnostics: &mut Diagnostics,
    ) -> Result<FilterOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        self.run_stream(lines, interval, 0, diagnostics)
    }

    /// Runs the pipeline. `stream` selects the sampling seed stream, the
    /// multi-region driver passes the region index.
    pub fn run_stream<I, S>(
        &self,
        lines: I,
        interval: Option<&SiteInterval>,
        stream: u64,
        diagnostics: &mut Diagnostics,
    ) -> Result<FilterOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        let scope = interval
            .map(ToString::to_string)
            .unwrap_or_else(|| "whole genome".to_string());
        let reads = RecordParser::new(scope).parse(lines, diagnostics);
        self.filter_reads(reads, interval, stream)
    }

    /// Runs every stage after parsing.
    pub fn filter_reads(
        &self,
        reads: Vec<Read>,
        interval: Option<&SiteInterval>,
        stream: u64,
    ) -> Result<FilterOutput> {
        let mut stats = ViewStats {
            regions: 1,
            reads_parsed: reads.len(),
            ..Default::default()
        };

        let mut reads = match interval {
            Some(interval) => {
                let before = reads.len();
                let kept = reads
                    .into_iter()
                    .filter(|read| read.overlaps(interval))
                    .collect_vec();
                stats.outside_interval = before - kept.len();
                kept
            },
            None => reads,
        };

        if let (true, Some(interval)) = (self.config.strict, interval) {
            reads = BoundaryTrimmer::new(interval).apply(reads);
        }

        if self.config.strip {
            let before = reads.len();
            reads = PaddingStripper::new().apply(reads);
            stats.stripped_empty = before - reads.len();
        }

        // min_len >= 1 also removes reads emptied by double clipping.
        let before = reads.len();
        reads.retain(|read| read.pattern.len() >= self.config.min_len);
        stats.too_short = before - reads.len();

        if let Some(mut sampler) = self.config.sampler(stream)? {
            let before = reads.len();
            reads = sampler.apply(reads);
            stats.sampled_out = before - reads.len();
        }

        reads.sort_by(Read::cmp_position);
        let before = reads.len();
        let reads = collapse(reads);
        stats.collapsed = before - reads.len();
        stats.reads_written = reads.len();

        debug!(
            "Filtered {}: {} parsed, {} kept",
            interval
                .map(ToString::to_string)
                .unwrap_or_else(|| "whole genome".into()),
            stats.reads_parsed,
            stats.reads_written
        );
        Ok(FilterOutput { reads, stats })
    }
}

/// Merges adjacent reads with identical `(start, pattern)` by summing their
/// counts. The first read of a run keeps its tags.
pub fn collapse(reads: Vec<Read>) -> Vec<Read> {
    reads
        .into_iter()
        .coalesce(|mut prev, next| {
            if prev.same_call(&next) {
                prev.count += next.count;
                Ok(prev)
            } else {
                Err((prev, next))
            }
        })
        .collect()
}
