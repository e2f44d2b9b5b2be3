use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    OperatorRequested,
    DisplayClosed,
    DisplayFailure(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::OperatorRequested => f.write_str("operator requested stop"),
            AbortReason::DisplayClosed => f.write_str("display closed"),
            AbortReason::DisplayFailure(detail) => write!(f, "display failure: {detail}"),
        }
    }
}

/// A wait or render point observed a tripped abort token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run interrupted: {0}")]
pub struct Interrupted(pub AbortReason);

/// Per-run cancellation flag. Set at most once; the first reason wins and is never cleared.
///
/// Clones share the same flag, so input handlers can hold one while the driver checks another.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    reason: Arc<OnceLock<AbortReason>>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the token. Returns `false` if it had already been tripped.
    pub fn abort(&self, reason: AbortReason) -> bool {
        self.reason.set(reason).is_ok()
    }

    pub fn is_aborted(&self) -> bool {
        self.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<&AbortReason> {
        self.reason.get()
    }

    /// `Err` carrying the winning reason once tripped.
    pub fn check(&self) -> Result<(), Interrupted> {
        match self.reason.get() {
            Some(reason) => Err(Interrupted(reason.clone())),
            None => Ok(()),
        }
    }
}
