use std::fs::File;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::ProgressBar;
use log::info;
use patview::exports::serde_json;
use patview::prelude::*;

use crate::utils::{
    init_pbar,
    UtilsArgs,
};

enum ViewMode {
    Region(RegionRequest),
    Bed(PathBuf),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ViewArgs {
    #[arg(value_parser, help = "Path to a bgzipped, tabix-indexed pat file.")]
    input: PathBuf,

    #[arg(
        short = 'r',
        long,
        conflicts_with_all = ["sites", "bed_file"],
        help = "Genomic region: chrom or chrom:start-end (1-based, inclusive). Requires --genome-dict for coordinates.",
        help_heading = "REGION"
    )]
    region:      Option<String>,
    #[arg(
        short = 's',
        long,
        conflicts_with = "bed_file",
        help = "Site range start-end (half-open, site indices).",
        help_heading = "REGION"
    )]
    sites:       Option<String>,
    #[arg(
        short = 'L',
        long,
        help = "Bed file with regions: chrom, start, end, site start, site end.",
        help_heading = "REGION"
    )]
    bed_file:    Option<PathBuf>,
    #[arg(
        long,
        help = "CpG reference dictionary (chrom, position, site index).",
        help_heading = "REGION"
    )]
    genome_dict: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = false,
        help = "Clip reads to the region boundaries.",
        help_heading = "FILTER"
    )]
    strict:     bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Remove '.' padding from both read ends.",
        help_heading = "FILTER"
    )]
    strip:      bool,
    #[arg(
        long,
        default_value_t = 1,
        help = "Minimal number of sites a read must cover.",
        help_heading = "FILTER"
    )]
    min_len:    usize,
    #[arg(
        long,
        help = "Binomially sub-sample read counts with this rate [0, 1].",
        help_heading = "FILTER"
    )]
    sub_sample: Option<f64>,
    #[arg(
        long,
        help = "Seed for sub-sampling.",
        help_heading = "FILTER"
    )]
    seed:       Option<u64>,

    #[arg(
        long,
        default_value_t = false,
        help = "Print a label line before every region (bed mode).",
        help_heading = "OUTPUT"
    )]
    print_region:  bool,
    #[arg(
        short = 'o',
        long,
        help = "Output path. Defaults to stdout.",
        help_heading = "OUTPUT"
    )]
    out_path:      Option<PathBuf>,
    #[arg(
        long,
        help = "Write run statistics as JSON to this path.",
        help_heading = "OUTPUT"
    )]
    stats:         Option<PathBuf>,
    #[arg(
        long,
        default_value = "tabix",
        help = "tabix executable used for range queries.",
        help_heading = "OUTPUT"
    )]
    tabix:         PathBuf,
    #[arg(
        long,
        help = "Kill a tabix query still running after this many seconds. The region is reported as failed.",
        help_heading = "OUTPUT"
    )]
    tabix_timeout: Option<u64>,
}

impl ViewArgs {
    fn filter_config(&self) -> anyhow::Result<FilterConfig> {
        Ok(FilterConfig::try_new(
            self.strict,
            self.strip,
            self.min_len,
            self.sub_sample,
            self.seed,
        )?)
    }

    fn mode(&self) -> anyhow::Result<ViewMode> {
        let mode = match (&self.region, &self.sites, &self.bed_file) {
            (Some(region), ..) => ViewMode::Region(RegionRequest::parse_region(region)?),
            (None, Some(sites), _) => ViewMode::Region(RegionRequest::parse_sites(sites)?),
            (None, None, Some(bed_path)) => ViewMode::Bed(bed_path.clone()),
            (None, None, None) => ViewMode::Region(RegionRequest::WholeGenome),
        };
        Ok(mode)
    }

    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        if !self.input.is_file() {
            eprintln!(
                "Path {} does not exist.",
                style(self.input.display()).red()
            );
            exit(-1);
        }

        // Configuration is validated before any record is read.
        let config = self.filter_config()?;
        let mode = self.mode()?;
        let reference = self
            .genome_dict
            .as_ref()
            .map(|path| {
                ReferenceIndex::from_path(path).with_context(|| {
                    format!("Failed to load reference dictionary {}", path.display())
                })
            })
            .transpose()?;

        let source = TabixPatSource::new(&self.input)?
            .with_tabix(&self.tabix)
            .with_timeout(self.tabix_timeout.map(Duration::from_secs));
        let needs_index = !matches!(mode, ViewMode::Region(RegionRequest::WholeGenome));
        if needs_index && !source.has_index() {
            eprintln!(
                "Pat file {} has no {} index.",
                style(self.input.display()).red(),
                style("tabix").yellow()
            );
            exit(-1);
        }

        let viewer = PatViewer::try_new(&source, config)?
            .with_reference(reference.as_ref())
            .with_threads(utils.threads())?
            .with_print_region(self.print_region);
        let mut writer = PatWriter::from_path(self.out_path.as_ref())
            .context("Failed to open output")?;
        let mut diagnostics = Diagnostics::new();

        let summary = match &mode {
            ViewMode::Bed(bed_path) => {
                let regions = read_bed(bed_path).with_context(|| {
                    format!("Failed to read bed file {}", bed_path.display())
                })?;
                let progress_bar = if utils.progress {
                    init_pbar(regions.len())?
                }
                else {
                    ProgressBar::hidden()
                };
                let summary = viewer.view_bed_with_progress(
                    &regions,
                    &mut writer,
                    &mut diagnostics,
                    |done| progress_bar.inc(done as u64),
                )?;
                progress_bar.finish_and_clear();
                summary
            },
            ViewMode::Region(request) => {
                viewer.view_region(request, &mut writer, &mut diagnostics)?
            },
        };

        if summary.sink_closed {
            info!("Output closed by consumer");
        }
        info!(
            "{} reads written ({} regions, {} empty, {} failed, {} warnings)",
            summary.stats.reads_written,
            summary.stats.regions,
            summary.regions_empty,
            summary.regions_failed,
            diagnostics.len()
        );

        if let Some(stats_path) = &self.stats {
            let file = File::create(stats_path).with_context(|| {
                format!("Failed to create stats file {}", stats_path.display())
            })?;
            serde_json::to_writer_pretty(file, &summary)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::{
        CommandFactory,
        Parser,
    };

    use super::*;

    #[derive(Parser, Debug)]
    struct ViewCli {
        #[command(flatten)]
        args: ViewArgs,
    }

    fn parse(args: &[&str]) -> ViewArgs {
        ViewCli::try_parse_from(std::iter::once("view").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_sub_sample_rate_bounds() {
        let args = parse(&["sample.pat.gz", "--sub-sample", "0"]);
        assert_eq!(args.filter_config().unwrap().sub_sample, Some(0.0));

        let args = parse(&["sample.pat.gz", "--sub-sample", "1"]);
        assert!(args.filter_config().is_ok());

        let args = parse(&["sample.pat.gz", "--sub-sample", "1.5"]);
        assert!(args.filter_config().is_err());
    }

    #[test]
    fn test_sub_sample_help_matches_accepted_range() {
        let command = ViewCli::command();
        let help = command
            .get_arguments()
            .find(|arg| arg.get_id() == "sub_sample")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();
        assert!(help.contains("[0, 1]"), "{}", help);
    }

    #[test]
    fn test_tabix_timeout_option() {
        let args = parse(&["sample.pat.gz", "--tabix-timeout", "30"]);
        assert_eq!(args.tabix_timeout, Some(30));
        assert_eq!(parse(&["sample.pat.gz"]).tabix_timeout, None);
    }
}
