//! Error types for configuring and running a presentation.

use thiserror::Error;

/// Invalid run parameters. Always detected before anything is shown or emitted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("trials per state must be at least 1")]
    NoTrials,

    #[error("{requested} trials per state requested, at most {max} allowed")]
    TooManyTrials { requested: usize, max: usize },

    #[error("{field} must be greater than zero")]
    NonPositiveDuration { field: &'static str },

    #[error("{field} range is inverted: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        min: u64,
        max: u64,
    },

    #[error("poll slice must be between 1 and 10 ms, got {0} ms")]
    PollSlice(u64),

    #[error("generation attempt budget must be at least 1")]
    NoAttempts,

    #[error("invalid condition labels: {0}")]
    Labels(String),

    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The balance and run-length constraints could not be met within the attempt budget.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error(
        "no balanced sequence of {trials_per_state} trials per state with runs of at most \
         {max_run} found in {attempts} attempts"
    )]
    Exhausted {
        trials_per_state: usize,
        max_run: usize,
        attempts: usize,
    },
}

/// Anything that prevents a session from being built.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// The display surface can no longer be drawn to.
#[derive(Debug, Error)]
#[error("display failure: {0}")]
pub struct DisplayError(pub String);

/// A marker could not be delivered.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("marker transport failed for {label}: {source}")]
    Transport {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode marker {label}: {source}")]
    Encode {
        label: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal failures of a run. Aborts are outcomes, not errors.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Marker(#[from] MarkerError),
}
