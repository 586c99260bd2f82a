use clap::Args;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use log::LevelFilter;

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(
        short = '@',
        long,
        help = "Number of threads to use. Defaults to PATVIEW_NUM_THREADS or all cores.",
        help_heading = "UTILS"
    )]
    pub threads:  Option<usize>,
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v info, -vv debug).",
        help_heading = "UTILS"
    )]
    pub verbose:  u8,
    #[arg(
        long,
        default_value_t = false,
        help = "Display progress bar (bed mode).",
        help_heading = "UTILS"
    )]
    pub progress: bool,
}

impl UtilsArgs {
    pub fn setup(&self) -> anyhow::Result<()> {
        init_logger(self.verbose)
    }

    pub fn threads(&self) -> usize {
        self.threads
            .unwrap_or_else(patview::utils::default_threads)
    }
}

/// Warnings always reach stderr; `-v` adds info, `-vv` debug. `RUST_LOG`
/// overrides both.
pub(crate) fn init_logger(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.try_init()?;
    Ok(())
}

pub(crate) fn init_pbar(total: usize) -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}, ETA: {eta}] \
                 [{bar:40.cyan/blue}] {pos:>5.green}/{len:5} {msg}",
            )?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Processing regions...");
    Ok(progress_bar)
}
