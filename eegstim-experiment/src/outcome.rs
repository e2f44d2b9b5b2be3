use crate::abort::AbortReason;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            RunOutcome::Completed => ExitStatus::Completed,
            RunOutcome::Aborted(_) => ExitStatus::Aborted,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub seed: u64,
    /// Trials whose phase fully elapsed.
    pub trials_completed: usize,
    pub markers_emitted: usize,
}

/// Process exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Completed,
    /// Unexpected failure: marker transport, window system.
    Fatal,
    /// Invalid configuration or infeasible sequence constraints.
    InvalidSetup,
    /// Operator stop, window closed, or display failure.
    Aborted,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Completed => 0,
            ExitStatus::Fatal => 1,
            ExitStatus::InvalidSetup => 2,
            ExitStatus::Aborted => 3,
        }
    }
}
