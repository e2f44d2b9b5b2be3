mod cli;
mod frontend;
mod logging;
mod markers;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use eegstim_experiment::{
    AbortToken, Driver, ExitStatus, ExperimentConfig, MarkerSink, RunOutcome, Session,
};
use eegstim_render::SkiaTextRenderer;
use eegstim_timing::HighPrecisionTimer;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::frontend::WindowFrontend;
use crate::logging::{LogConfig, init_logging};
use crate::markers::{LogMarkerSink, UdpMarkerSink};

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// What `--dry-run` prints.
#[derive(Serialize)]
struct DryRun<'a> {
    config: &'a ExperimentConfig,
    session: &'a Session,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format.into())
        .with_ansi(io::stderr().is_terminal());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("cannot initialise logging: {e}");
    }

    let status = match run(&cli) {
        Ok(status) => status,
        Err(e) => {
            error!("{e:#}");
            ExitStatus::Fatal
        }
    };
    info!(code = status.code(), ?status, "exiting");
    ExitCode::from(status.code())
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let config = match cli.experiment_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Ok(ExitStatus::InvalidSetup);
        }
    };
    let session = match Session::generate(&config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "cannot build session");
            return Ok(ExitStatus::InvalidSetup);
        }
    };

    if cli.dry_run {
        let plan = DryRun {
            config: &config,
            session: &session,
        };
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(ExitStatus::Completed);
    }

    let markers: Box<dyn MarkerSink> = if cli.no_udp {
        info!("markers go to the log only");
        Box::new(LogMarkerSink::default())
    } else {
        let sink = UdpMarkerSink::connect(&cli.marker_addr)
            .with_context(|| format!("cannot open marker outlet to {}", cli.marker_addr))?;
        info!(addr = %sink.target(), "markers broadcast over UDP");
        Box::new(sink)
    };

    let font = resolve_font(cli.font.as_deref())?;
    info!(font = %font.display(), "loading font");
    let renderer = SkiaTextRenderer::from_font_file(&font, 1, 1)?;
    let frontend = WindowFrontend::open(config.display, renderer)?;

    let driver = Driver::new(
        config,
        session,
        frontend,
        markers,
        HighPrecisionTimer::new(),
        AbortToken::new(),
    )?;
    let report = driver.run()?;

    match &report.outcome {
        RunOutcome::Completed => info!(
            seed = report.seed,
            trials = report.trials_completed,
            markers = report.markers_emitted,
            "experiment complete"
        ),
        RunOutcome::Aborted(reason) => warn!(
            %reason,
            seed = report.seed,
            trials = report.trials_completed,
            markers = report.markers_emitted,
            "experiment aborted"
        ),
    }
    Ok(report.outcome.exit_status())
}

fn resolve_font(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match FONT_CANDIDATES.iter().map(Path::new).find(|p| p.is_file()) {
        Some(path) => Ok(path.to_path_buf()),
        None => bail!("no system font found; pass one with --font"),
    }
}
