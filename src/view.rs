//! Top-level viewing: a single region or a list of bed regions, written to
//! a [`PatWriter`].

use std::io::Write;

use log::info;
use serde::Serialize;

use crate::data_structs::BedInterval;
use crate::diagnostics::Diagnostics;
use crate::error::{
    Result,
    ViewError,
};
use crate::filter::{
    FilterConfig,
    FilterPipeline,
    ViewStats,
};
use crate::io::source::PatSource;
use crate::io::writer::{
    is_sink_closed,
    PatWriter,
};
use crate::multi::{
    MultiRegionDriver,
    RegionResult,
};
use crate::reference::ReferenceIndex;
use crate::region::{
    RegionRequest,
    RegionResolver,
};

/// Result of a view run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub stats:          ViewStats,
    pub regions_empty:  usize,
    pub regions_failed: usize,
    /// Output consumer stopped reading. Not an error.
    pub sink_closed:    bool,
}

/// Writes one chunk of multi-region results.
pub fn write_results<W: Write>(
    writer: &mut PatWriter<W>,
    results: &[RegionResult],
    print_region: bool,
) -> std::io::Result<()> {
    for result in results {
        if print_region {
            writer.write_label(&result.label_line())?;
        }
        writer.write_reads(result.reads())?;
    }
    writer.flush()
}

pub struct PatViewer<'a> {
    source:       &'a dyn PatSource,
    reference:    Option<&'a ReferenceIndex>,
    config:       FilterConfig,
    threads:      usize,
    print_region: bool,
}

impl<'a> PatViewer<'a> {
    /// Validates `config`; fails before anything is read.
    pub fn try_new(
        source: &'a dyn PatSource,
        config: FilterConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            reference: None,
            config,
            threads: 1,
            print_region: false,
        })
    }

    pub fn with_reference(
        mut self,
        reference: Option<&'a ReferenceIndex>,
    ) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_threads(
        mut self,
        threads: usize,
    ) -> Result<Self> {
        if threads == 0 {
            return Err(ViewError::InvalidThreads(threads));
        }
        self.threads = threads;
        Ok(self)
    }

    pub fn with_print_region(
        mut self,
        print_region: bool,
    ) -> Self {
        self.print_region = print_region;
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Views a single region. Region resolution errors are returned before
    /// the source is queried.
    pub fn view_region<W: Write>(
        &self,
        request: &RegionRequest,
        writer: &mut PatWriter<W>,
        diagnostics: &mut Diagnostics,
    ) -> Result<ViewSummary> {
        let region = RegionResolver::new(self.reference).resolve(request)?;
        info!("Viewing {}", region);

        let lines = self.source.fetch_interval(region.interval())?;
        let output = FilterPipeline::new(&self.config).run(
            lines,
            region.interval(),
            diagnostics,
        )?;

        let mut summary = ViewSummary {
            stats: output.stats,
            ..Default::default()
        };
        let written = writer
            .write_reads(output.reads.iter())
            .and_then(|_| writer.flush());
        match written {
            Ok(()) => {},
            Err(e) if is_sink_closed(&e) => summary.sink_closed = true,
            Err(e) => return Err(e.into()),
        }
        Ok(summary)
    }

    /// Views every bed region, preserving input order.
    pub fn view_bed<W: Write>(
        &self,
        regions: &[BedInterval],
        writer: &mut PatWriter<W>,
        diagnostics: &mut Diagnostics,
    ) -> Result<ViewSummary> {
        self.view_bed_with_progress(regions, writer, diagnostics, |_| {})
    }

    /// Like [`view_bed`](Self::view_bed), calling `progress` with the number
    /// of regions completed after every super-chunk.
    pub fn view_bed_with_progress<W, P>(
        &self,
        regions: &[BedInterval],
        writer: &mut PatWriter<W>,
        diagnostics: &mut Diagnostics,
        mut progress: P,
    ) -> Result<ViewSummary>
    where
        W: Write,
        P: FnMut(usize), {
        let driver = MultiRegionDriver::new(self.source, &self.config, self.threads)?
            .with_reference(self.reference);
        let print_region = self.print_region;

        let summary = driver.run(regions, diagnostics, |results| {
            write_results(writer, results, print_region)?;
            progress(results.len());
            Ok(())
        })?;

        Ok(ViewSummary {
            stats:          summary.stats,
            regions_empty:  summary.regions_empty,
            regions_failed: summary.regions_failed,
            sink_closed:    summary.sink_closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;
    use crate::io::MemoryPatSource;

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(
            &mut self,
            _buf: &[u8],
        ) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_closed_sink_is_not_an_error() {
        let source = MemoryPatSource::new(["chr1\t1\tCT\t1"]);
        let viewer = PatViewer::try_new(&source, FilterConfig::default()).unwrap();
        let mut writer = PatWriter::new(ClosedSink);
        let summary = viewer
            .view_region(
                &RegionRequest::WholeGenome,
                &mut writer,
                &mut Diagnostics::new(),
            )
            .unwrap();
        assert!(summary.sink_closed);
    }

    #[test]
    fn test_invalid_config_fails_before_reading() {
        let source = MemoryPatSource::default();
        let config = FilterConfig::default().with_sub_sample(Some(2.0));
        assert!(matches!(
            PatViewer::try_new(&source, config),
            Err(ViewError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_invalid_region_fails_without_output() {
        let source = MemoryPatSource::new(["chr1\t1\tCT\t1"]);
        let viewer = PatViewer::try_new(&source, FilterConfig::default()).unwrap();
        let mut writer = PatWriter::new(Vec::new());
        let result = viewer.view_region(
            &RegionRequest::Chrom("chr1".into()),
            &mut writer,
            &mut Diagnostics::new(),
        );
        assert!(matches!(result, Err(ViewError::InvalidRegion { .. })));
        assert!(writer.into_inner().unwrap().is_empty());
    }
}
