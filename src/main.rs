use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use spotify_activity::config::ConfigBuilder;
use spotify_activity::logging::{self, Level};
use spotify_activity::{Config, Credentials, Error, Pipeline, RenderMode};

/// Render recent Spotify plays into a README section
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Output style
    #[arg(short, long, value_enum)]
    mode: Option<RenderMode>,
    /// Trailing window in days
    #[arg(short, long)]
    days: Option<u32>,
    /// Maximum number of rows fetched from the play log
    #[arg(long)]
    limit: Option<usize>,
    /// Number of ranked tracks shown by the table and svg modes
    #[arg(long)]
    top: Option<usize>,
    /// README to update
    #[arg(short, long)]
    readme: Option<PathBuf>,
    /// Where the svg card is written, relative to the README
    #[arg(long)]
    svg_path: Option<PathBuf>,
    /// Config file, defaults to activity.yml or activity.yaml when present
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init();

    let args = Args::parse();

    let builder = match &args.config {
        Some(path) => {
            let yaml = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
            ConfigBuilder::parse(&yaml)?
        }
        None => Config::load_with_fallback(["activity.yml", "activity.yaml"])?,
    };
    let config = builder
        .mode(args.mode)
        .days(args.days)
        .limit(args.limit)
        .top(args.top)
        .readme(args.readme)
        .svg_path(args.svg_path)
        .compile();

    let credentials = Credentials::from_env()?;

    log::info!("updating {} with the last {} days ({})", config.readme.display(), config.days, config.mode);
    let report = Pipeline::new(config, credentials)?.run().await?;

    let warnings = report.diagnostics.at_least(Level::Warn).count();
    log::info!(
        "rendered {} plays as {} into {} with {warnings} warnings",
        report.records,
        report.mode,
        report.readme.display(),
    );
    Ok(())
}
