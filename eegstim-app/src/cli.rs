use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use eegstim_experiment::{ConfigError, DisplayMode, ExperimentConfig};

use crate::logging::LogFormat;

pub const DEFAULT_MARKER_ADDR: &str = "255.255.255.255:16571";

/// Presents alternating active/rest blocks and broadcasts start/end markers for EEG recording.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON file with run parameters. Flags override values from the file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub trials_per_state: Option<usize>,

    #[arg(long)]
    pub active_secs: Option<f64>,

    #[arg(long)]
    pub iti_min_secs: Option<f64>,

    #[arg(long)]
    pub iti_max_secs: Option<f64>,

    #[arg(long)]
    pub fixation_secs: Option<f64>,

    #[arg(long)]
    pub end_screen_secs: Option<f64>,

    #[arg(long, value_enum)]
    pub display: Option<DisplayArg>,

    /// Fixes the trial order, payloads and intervals. Random when absent.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Longest allowed run of one condition.
    #[arg(long)]
    pub max_run: Option<usize>,

    /// Generation attempts before giving up.
    #[arg(long)]
    pub attempts: Option<usize>,

    #[arg(long)]
    pub active_label: Option<String>,

    #[arg(long)]
    pub rest_label: Option<String>,

    #[arg(long)]
    pub no_countdown: bool,

    /// Show a welcome screen and wait for SPACE before the first trial.
    #[arg(long)]
    pub await_start: bool,

    /// TrueType font for on-screen text. Common system fonts are tried otherwise.
    #[arg(long)]
    pub font: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MARKER_ADDR)]
    pub marker_addr: String,

    /// Log markers instead of sending them over UDP.
    #[arg(long)]
    pub no_udp: bool,

    /// Print the generated session as JSON and exit.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DisplayArg {
    Fullscreen,
    Windowed,
}

impl From<DisplayArg> for DisplayMode {
    fn from(value: DisplayArg) -> Self {
        match value {
            DisplayArg::Fullscreen => DisplayMode::Fullscreen,
            DisplayArg::Windowed => DisplayMode::Windowed,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then flags. Not validated yet.
    pub fn experiment_config(&self) -> Result<ExperimentConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)?,
            None => ExperimentConfig::default(),
        };

        if let Some(n) = self.trials_per_state {
            config.trials_per_state = n;
        }
        if let Some(secs) = self.active_secs {
            config.active_ms = secs_to_ms(secs);
        }
        if let Some(secs) = self.iti_min_secs {
            config.iti_range_ms.0 = secs_to_ms(secs);
        }
        if let Some(secs) = self.iti_max_secs {
            config.iti_range_ms.1 = secs_to_ms(secs);
        }
        if let Some(secs) = self.fixation_secs {
            config.initial_fixation_ms = secs_to_ms(secs);
        }
        if let Some(secs) = self.end_screen_secs {
            config.end_screen_ms = secs_to_ms(secs);
        }
        if let Some(display) = self.display {
            config.display = display.into();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(r) = self.max_run {
            config.max_run = r;
        }
        if let Some(attempts) = self.attempts {
            config.max_attempts = attempts;
        }
        if let Some(label) = &self.active_label {
            config.labels.active = label.clone();
        }
        if let Some(label) = &self.rest_label {
            config.labels.rest = label.clone();
        }
        if self.no_countdown {
            config.show_countdown = false;
        }
        if self.await_start {
            config.await_start = true;
        }
        Ok(config)
    }
}

/// Negative and NaN inputs collapse to zero, which validation rejects.
fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round().max(0.0) as u64
}
